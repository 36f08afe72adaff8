//! REST directory client
//!
//! Talks to a Plone-style REST API:
//! - `GET  {base}/@users/{id}`
//! - `GET  {base}/@users?query=..&groups-filter:list=..&limit=..`
//! - `GET  {base}/@groups?query=..`
//! - `PATCH {base}/@groups/{id}` with `{"users": {"<id>": true|false}}`
//!
//! Ids are sent as single percent-encoded path segments.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info};

use super::{Directory, MembershipPatch, PrincipalQuery};
use crate::group::entity::Group;
use crate::principal::entity::Principal;
use crate::shared::error::{MatrixError, Result};

pub struct RestDirectory {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl RestDirectory {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into();
        let base_url = Url::parse(&base_url)
            .map_err(|e| MatrixError::directory(format!("Invalid directory URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(MatrixError::directory(format!(
                "Directory URL {} cannot hold a path",
                base_url
            )));
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Authenticate every request with a bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.is_empty()).then_some(token);
        self
    }

    /// Base URL extended by `segments`, each percent-encoded on its own
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| MatrixError::directory(format!("Directory URL {} cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let builder = self
            .client
            .request(method, self.endpoint(segments)?)
            .header(header::ACCEPT, "application/json");
        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn check(response: Response, entity_type: &str, id: &str) -> Result<Response> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(MatrixError::not_found(entity_type, id)),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(MatrixError::directory(format!(
                    "{} {} request failed with {}: {}",
                    entity_type, id, status, body
                )))
            }
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl Directory for RestDirectory {
    async fn fetch_principal(&self, id: &str) -> Result<Principal> {
        let response = self
            .request(Method::GET, &["@users", id])?
            .send()
            .await?;
        let response = Self::check(response, "Principal", id).await?;
        Self::read_json(response).await
    }

    async fn list_principals(&self, query: &PrincipalQuery) -> Result<Vec<Principal>> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if !query.search.is_empty() {
            params.push(("query", query.search.clone()));
        }
        for group in &query.groups_filter {
            params.push(("groups-filter:list", group.clone()));
        }
        if query.limit > 0 {
            params.push(("limit", query.limit.to_string()));
        }

        debug!(search = %query.search, groups = query.groups_filter.len(), limit = query.limit, "Listing users");
        let response = self
            .request(Method::GET, &["@users"])?
            .query(&params)
            .send()
            .await?;
        let response = Self::check(response, "Principal", "*").await?;
        Self::read_json(response).await
    }

    async fn list_groups(&self, search: &str) -> Result<Vec<Group>> {
        let mut builder = self.request(Method::GET, &["@groups"])?;
        if !search.is_empty() {
            builder = builder.query(&[("query", search)]);
        }

        debug!(search, "Listing groups");
        let response = builder.send().await?;
        let response = Self::check(response, "Group", "*").await?;
        Self::read_json(response).await
    }

    async fn set_group_members(&self, group_id: &str, members: &MembershipPatch) -> Result<()> {
        let response = self
            .request(Method::PATCH, &["@groups", group_id])?
            .json(&json!({ "users": members }))
            .send()
            .await?;
        Self::check(response, "Group", group_id).await?;

        info!(group_id, changes = members.len(), "Group membership patched");
        Ok(())
    }
}
