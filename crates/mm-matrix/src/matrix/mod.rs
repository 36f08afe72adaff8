//! Membership Matrix
//!
//! Axis gating, column assembly, row ordering, the renderable view and the
//! service, session and HTTP layers built on them.

pub mod axis;
pub mod columns;
pub mod rows;
pub mod view;
pub mod service;
pub mod session;
pub mod api;

pub use axis::{is_searchable, AxisVisibility, MatrixFilter, MIN_QUERY_CHARS};
pub use columns::build_columns;
pub use rows::{sort_rows, RowPager, DEFAULT_PAGE_SIZE};
pub use view::{ColumnView, EmptyRows, MatrixView, RowView};
pub use service::{Actor, MatrixService, MatrixSettings, DEFAULT_MAX_PAGES};
pub use session::{FetchOutcome, MatrixSession};
pub use api::{health_router, matrix_router, MatrixState};
