use reqwest::header::ACCEPT;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::{KanbanError, RepoResult};

/// Error code the REST layer returns when a single-row read matched nothing.
pub const ROW_NOT_FOUND: &str = "PGRST116";

const OBJECT_MEDIA_TYPE: &str = "application/vnd.pgrst.object+json";

pub type Query<'a> = Vec<(&'a str, String)>;

/// `eq.` filter value for a query pair.
pub fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

#[derive(Debug, Default, Deserialize)]
struct RestErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

/// Thin client for the relational backend's REST interface.
#[derive(Clone, Debug)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestClient {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send(&self, req: RequestBuilder, what: String) -> RepoResult<Response> {
        let resp = self
            .authorized(req)
            .send()
            .await
            .map_err(|e| KanbanError::Connectivity(format!("{}: {}", what, e)))?;

        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let body: RestErrorBody = serde_json::from_str(&text).unwrap_or_default();
        let message = match (body.message, body.details) {
            (Some(message), Some(details)) => format!("{} ({})", message, details),
            (Some(message), None) => message,
            _ if text.is_empty() => format!("{} returned {}", what, status),
            _ => format!("{} returned {}: {}", what, status, text),
        };

        Err(KanbanError::Backend {
            code: body.code,
            message,
        })
    }

    pub async fn select<T: DeserializeOwned>(&self, table: &str, query: &Query<'_>) -> RepoResult<Vec<T>> {
        let req = self.http.get(self.table_url(table)).query(query);
        let resp = self.send(req, format!("GET {}", table)).await?;
        Ok(resp.json().await?)
    }

    /// Single-row read; a "row not found" response becomes `Ok(None)`.
    pub async fn select_single<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query<'_>,
    ) -> RepoResult<Option<T>> {
        let req = self
            .http
            .get(self.table_url(table))
            .query(query)
            .header(ACCEPT, OBJECT_MEDIA_TYPE);

        match self.send(req, format!("GET {}", table)).await {
            Ok(resp) => Ok(Some(resp.json().await?)),
            Err(KanbanError::Backend { code: Some(code), .. }) if code == ROW_NOT_FOUND => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn insert<B, T>(&self, table: &str, body: &B) -> RepoResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self
            .http
            .post(self.table_url(table))
            .header(ACCEPT, OBJECT_MEDIA_TYPE)
            .header("Prefer", "return=representation")
            .json(body);
        let resp = self.send(req, format!("POST {}", table)).await?;
        Ok(resp.json().await?)
    }

    pub async fn update<B, T>(&self, table: &str, query: &Query<'_>, body: &B) -> RepoResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self
            .http
            .patch(self.table_url(table))
            .query(query)
            .header(ACCEPT, OBJECT_MEDIA_TYPE)
            .header("Prefer", "return=representation")
            .json(body);
        let resp = self.send(req, format!("PATCH {}", table)).await?;
        Ok(resp.json().await?)
    }

    /// Insert-or-merge on `on_conflict`.
    pub async fn upsert<B>(&self, table: &str, on_conflict: &str, body: &B) -> RepoResult<()>
    where
        B: Serialize + ?Sized,
    {
        let req = self
            .http
            .post(self.table_url(table))
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(body);
        self.send(req, format!("UPSERT {}", table)).await?;
        Ok(())
    }

    pub async fn delete(&self, table: &str, query: &Query<'_>) -> RepoResult<()> {
        let req = self.http.delete(self.table_url(table)).query(query);
        self.send(req, format!("DELETE {}", table)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let client = RestClient::new(reqwest::Client::new(), "https://db.example.com/", "k");
        assert_eq!(client.table_url("tasks"), "https://db.example.com/rest/v1/tasks");
    }

    #[test]
    fn eq_builds_filter_values() {
        assert_eq!(eq("task-1"), "eq.task-1");
    }
}
