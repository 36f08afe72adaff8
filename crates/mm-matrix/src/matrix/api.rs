//! Membership Matrix API
//!
//! JSON endpoints for rendering the matrix and toggling memberships.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::group::entity::PinnedGroup;
use crate::matrix::axis::MatrixFilter;
use crate::matrix::service::MatrixService;
use crate::matrix::view::MatrixView;
use crate::shared::error::{ErrorResponse, MatrixError};
use crate::shared::session::extract_bearer_token;

/// Bearer token from the Authorization header, if any
pub struct SessionToken(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(extract_bearer_token)
            .map(String::from);
        Ok(SessionToken(token))
    }
}

/// Matrix filter as sent by clients. Directory size flags fall back to the
/// server's configuration.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterRequest {
    pub query_user: String,
    pub query_group: String,
    pub groups_filter: Vec<PinnedGroup>,
    pub add_joined_groups: bool,
    pub many_users: Option<bool>,
    pub many_groups: Option<bool>,
}

impl FilterRequest {
    fn into_filter(self, state: &MatrixState) -> MatrixFilter {
        MatrixFilter {
            query_user: self.query_user,
            query_group: self.query_group,
            groups_filter: self.groups_filter,
            add_joined_groups: self.add_joined_groups,
            many_users: self.many_users.unwrap_or(state.many_users),
            many_groups: self.many_groups.unwrap_or(state.many_groups),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViewRequest {
    #[serde(default)]
    pub filter: FilterRequest,
    /// Rows to fetch; defaults to one page, capped at the configured maximum
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CellToggleRequest {
    #[serde(default)]
    pub filter: FilterRequest,
    pub limit: Option<usize>,
    pub group_id: String,
    pub principal_id: String,
    /// New membership state
    pub checked: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ColumnToggleRequest {
    #[serde(default)]
    pub filter: FilterRequest,
    pub limit: Option<usize>,
    pub group_id: String,
    /// Defaults to the rows currently visible for the filter
    pub principal_ids: Option<Vec<String>>,
    pub checked: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Clone)]
pub struct MatrixState {
    pub service: MatrixService,
    /// Default for filters that leave `manyUsers` unset
    pub many_users: bool,
    /// Default for filters that leave `manyGroups` unset
    pub many_groups: bool,
}

impl MatrixState {
    pub fn new(service: MatrixService) -> Self {
        Self {
            service,
            many_users: false,
            many_groups: false,
        }
    }

    pub fn with_directory_size(mut self, many_users: bool, many_groups: bool) -> Self {
        self.many_users = many_users;
        self.many_groups = many_groups;
        self
    }

    fn limit(&self, requested: Option<usize>) -> usize {
        self.service.settings().clamp_limit(requested)
    }
}

/// Render the matrix
#[utoipa::path(
    post,
    path = "/view",
    tag = "matrix",
    operation_id = "postApiMatrixView",
    request_body = ViewRequest,
    responses(
        (status = 200, description = "Matrix rendered", body = MatrixView)
    ),
    security(("bearer_auth" = []))
)]
pub async fn view_matrix(
    State(state): State<MatrixState>,
    SessionToken(token): SessionToken,
    Json(req): Json<ViewRequest>,
) -> Result<Json<MatrixView>, MatrixError> {
    let actor = state.service.resolve_actor(token.as_deref()).await;
    let limit = state.limit(req.limit);
    let filter = req.filter.into_filter(&state);

    Ok(Json(state.service.snapshot(&filter, limit, &actor).await))
}

/// Set one user's membership in one group
#[utoipa::path(
    post,
    path = "/cells",
    tag = "matrix",
    operation_id = "postApiMatrixCells",
    request_body = CellToggleRequest,
    responses(
        (status = 200, description = "Membership updated", body = MatrixView),
        (status = 400, description = "Group is not a matrix column", body = ErrorResponse),
        (status = 403, description = "Column not assignable", body = ErrorResponse),
        (status = 409, description = "Cell is being updated", body = ErrorResponse),
        (status = 502, description = "Directory failure", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn toggle_cell(
    State(state): State<MatrixState>,
    SessionToken(token): SessionToken,
    Json(req): Json<CellToggleRequest>,
) -> Result<Json<MatrixView>, MatrixError> {
    let actor = state.service.resolve_actor(token.as_deref()).await;
    let limit = state.limit(req.limit);
    let filter = req.filter.into_filter(&state);

    let view = state
        .service
        .toggle_cell(&actor, &filter, limit, &req.group_id, &req.principal_id, req.checked)
        .await?;
    Ok(Json(view))
}

/// Set membership in one group for a whole column of users
#[utoipa::path(
    post,
    path = "/columns",
    tag = "matrix",
    operation_id = "postApiMatrixColumns",
    request_body = ColumnToggleRequest,
    responses(
        (status = 200, description = "Memberships updated", body = MatrixView),
        (status = 400, description = "Group is not a matrix column", body = ErrorResponse),
        (status = 403, description = "Column not assignable", body = ErrorResponse),
        (status = 409, description = "A cell of the column is being updated", body = ErrorResponse),
        (status = 502, description = "Directory failure", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn toggle_column(
    State(state): State<MatrixState>,
    SessionToken(token): SessionToken,
    Json(req): Json<ColumnToggleRequest>,
) -> Result<Json<MatrixView>, MatrixError> {
    let actor = state.service.resolve_actor(token.as_deref()).await;
    let limit = state.limit(req.limit);
    let filter = req.filter.into_filter(&state);

    let view = state
        .service
        .toggle_column(
            &actor,
            &filter,
            limit,
            &req.group_id,
            req.principal_ids.as_deref(),
            req.checked,
        )
        .await?;
    Ok(Json(view))
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    operation_id = "getHealth",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "UP".to_string(),
    })
}

pub fn matrix_router(state: MatrixState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(view_matrix))
        .routes(routes!(toggle_cell))
        .routes(routes!(toggle_column))
        .with_state(state)
}

pub fn health_router() -> OpenApiRouter {
    OpenApiRouter::new().routes(routes!(health))
}
