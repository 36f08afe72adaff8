//! Shared Module
//!
//! Cross-cutting concerns: errors, authorization, session resolution,
//! notifications, and fetch debouncing/sequencing.

pub mod error;
pub mod authorization;
pub mod session;
pub mod notification;
pub mod sequence;
pub mod debounce;

pub use error::{MatrixError, Result};
pub use authorization::{MembershipPolicy, RolePolicy, MANAGER_ROLE};
pub use session::{extract_bearer_token, SessionVerifier};
pub use notification::{Notifier, NoOpNotifier, TracingNotifier, MEMBERSHIP_UPDATED, SUCCESS_TITLE};
pub use sequence::{RequestSequencer, RequestTicket};
pub use debounce::{Debouncer, DEFAULT_DEBOUNCE};
