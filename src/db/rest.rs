use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::auth::RestAuth;
use crate::client::ApiClient;
use crate::db::{Gateway, Query, Row};
use crate::error::AppError;

/// PostgREST-backed gateway. Requests run as the signed-in user when the
/// auth provider holds a session, otherwise with the public key.
pub struct RestGateway {
    api: ApiClient,
    auth: Arc<RestAuth>,
}

impl RestGateway {
    pub fn new(api: ApiClient, auth: Arc<RestAuth>) -> Self {
        Self { api, auth }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let token = self.auth.access_token();
        self.api
            .request(method, self.api.config().rest_url(path), token.as_deref())
    }

    async fn rows(response: reqwest::Response) -> Result<Vec<Row>, AppError> {
        let response = ApiClient::check(response).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl Gateway for RestGateway {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, AppError> {
        tracing::debug!(table, "select");
        let mut params = query.to_params();
        if query.columns.is_none() {
            params.insert(0, ("select".to_string(), "*".to_string()));
        }
        let response = self
            .request(Method::GET, table)
            .query(&params)
            .send()
            .await?;
        Self::rows(response).await
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, AppError> {
        tracing::debug!(table, count = rows.len(), "insert");
        let response = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(&rows)
            .send()
            .await?;
        Self::rows(response).await
    }

    async fn update(
        &self,
        table: &str,
        values: Row,
        filter: &Query,
    ) -> Result<Vec<Row>, AppError> {
        tracing::debug!(table, "update");
        let response = self
            .request(Method::PATCH, table)
            .header("Prefer", "return=representation")
            .query(&filter.to_params())
            .json(&values)
            .send()
            .await?;
        Self::rows(response).await
    }

    async fn upsert(
        &self,
        table: &str,
        rows: Vec<Row>,
        on_conflict: &str,
    ) -> Result<Vec<Row>, AppError> {
        tracing::debug!(table, on_conflict, "upsert");
        let response = self
            .request(Method::POST, table)
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .query(&[("on_conflict", on_conflict)])
            .json(&rows)
            .send()
            .await?;
        Self::rows(response).await
    }

    async fn delete(&self, table: &str, filter: &Query) -> Result<(), AppError> {
        tracing::debug!(table, "delete");
        let response = self
            .request(Method::DELETE, table)
            .query(&filter.to_params())
            .send()
            .await?;
        ApiClient::check(response).await?;
        Ok(())
    }

    async fn rpc(&self, function: &str, args: Value) -> Result<Value, AppError> {
        tracing::debug!(function, "rpc");
        let response = self
            .request(Method::POST, &format!("rpc/{function}"))
            .json(&args)
            .send()
            .await?;
        let response = ApiClient::check(response).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}
