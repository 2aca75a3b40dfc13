use dayblock_core::{Task, TaskDraft, TaskPatch, TaskQuery};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::RequestBuilder;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::NotionError;
use crate::filter::encode_query;
use crate::page::{decode_page, encode_draft, encode_patch};
use crate::properties::PropertyNames;

pub const NOTION_VERSION: &str = "2022-06-28";
pub const DEFAULT_BASE_URL: &str = "https://api.notion.com";
/// Pagination stops once this many pages have been read.
pub const MAX_RESULTS: usize = 1000;

/// Async client for one Notion task database.
#[derive(Debug, Clone)]
pub struct NotionClient {
    http: reqwest::Client,
    token: String,
    database_id: String,
    names: PropertyNames,
    base_url: String,
    max_results: usize,
}

impl NotionClient {
    pub fn new(token: impl Into<String>, database_id: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.into(),
            database_id: database_id.into(),
            names: PropertyNames::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_results: MAX_RESULTS,
        }
    }

    pub fn with_names(mut self, names: PropertyNames) -> Self {
        self.names = names;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn names(&self) -> &PropertyNames {
        &self.names
    }

    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    fn headers(&self) -> Result<HeaderMap, NotionError> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", self.token))?);
        headers.insert("Notion-Version", HeaderValue::from_static(NOTION_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn send(&self, req: RequestBuilder) -> Result<Value, NotionError> {
        let resp = req.headers(self.headers()?).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotionError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json().await?)
    }

    /// Run a query, following `next_cursor` until exhausted or the result cap
    /// is reached. Pages that fail to decode are skipped.
    pub async fn query(&self, query: &TaskQuery) -> Result<Vec<Task>, NotionError> {
        let url = format!("{}/v1/databases/{}/query", self.base_url, self.database_id);
        let mut tasks = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let body = encode_query(query, &self.names, cursor.as_deref());
            let page = self.send(self.http.post(&url).json(&body)).await?;

            let results = page
                .get("results")
                .and_then(Value::as_array)
                .ok_or_else(|| NotionError::Decode("query response without results".into()))?;
            for raw in results {
                match decode_page(raw, &self.names) {
                    Ok(task) => tasks.push(task),
                    Err(e) => warn!(error = %e, "skipping undecodable page"),
                }
            }

            if tasks.len() >= self.max_results {
                tasks.truncate(self.max_results);
                warn!(cap = self.max_results, "query hit the result cap");
                break;
            }
            let has_more = page.get("has_more").and_then(Value::as_bool).unwrap_or(false);
            cursor = page.get("next_cursor").and_then(Value::as_str).map(str::to_string);
            if !has_more || cursor.is_none() {
                break;
            }
        }

        debug!(count = tasks.len(), "query complete");
        Ok(tasks)
    }

    pub async fn patch(&self, page_id: &str, patch: &TaskPatch) -> Result<(), NotionError> {
        let url = format!("{}/v1/pages/{}", self.base_url, page_id);
        let body = encode_patch(patch, &self.names);
        self.send(self.http.patch(&url).json(&body)).await?;
        Ok(())
    }

    /// Create a page in the database and return its id.
    pub async fn create(&self, draft: &TaskDraft) -> Result<String, NotionError> {
        let url = format!("{}/v1/pages", self.base_url);
        let body = encode_draft(draft, &self.names, &self.database_id);
        let page = self.send(self.http.post(&url).json(&body)).await?;
        page.get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| NotionError::Decode("created page without id".into()))
    }
}
