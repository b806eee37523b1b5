use crate::error::SyncError;
use crate::sync::config::NotionConfig;
use crate::sync::record::{PropertyPatch, Record};
use crate::sync::store::{DocumentStore, QueryPage, RelationPage};
use crate::sync::util::truncate_with_ellipsis;
use anyhow::{Context, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

const MAX_ERROR_BODY_CHARS: usize = 300;

/// Blocking client for the Notion REST API.
pub struct NotionClient {
    client: Client,
    base_url: String,
    token: String,
    version: String,
}

impl NotionClient {
    pub fn new(cfg: &NotionConfig, token: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            client,
            base_url: cfg.api_base.trim().trim_end_matches('/').to_string(),
            token: token.to_string(),
            version: cfg.api_version.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header("Notion-Version", &self.version)
    }

    fn send(&self, operation: &str, builder: RequestBuilder) -> Result<Value> {
        let response = self
            .authorized(builder)
            .send()
            .map_err(|err| SyncError::remote(operation, None, err.to_string()))?;
        read_success(operation, response)
    }
}

fn read_success(operation: &str, response: Response) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(SyncError::remote(
            operation,
            Some(status.as_u16()),
            truncate_with_ellipsis(body.trim(), MAX_ERROR_BODY_CHARS),
        )
        .into());
    }
    response
        .json::<Value>()
        .map_err(|err| SyncError::remote(operation, Some(status.as_u16()), err.to_string()).into())
}

/// `next_cursor` is authoritative; a null or empty cursor ends pagination.
fn next_cursor(body: &Value) -> Option<String> {
    body.get("next_cursor")
        .and_then(Value::as_str)
        .filter(|cursor| !cursor.is_empty())
        .map(ToOwned::to_owned)
}

fn parse_query_page(operation: &str, body: Value) -> Result<QueryPage> {
    let next_cursor = next_cursor(&body);
    let results = body
        .get("results")
        .cloned()
        .ok_or_else(|| SyncError::remote(operation, None, "response missing `results`"))?;
    let records: Vec<Record> = serde_json::from_value(results)
        .map_err(|err| SyncError::remote(operation, None, format!("invalid page record: {err}")))?;
    Ok(QueryPage {
        records,
        next_cursor,
    })
}

/// Property-item pages list one `{"relation": {"id": …}}` per result.
fn parse_relation_page(body: &Value) -> RelationPage {
    let ids = body
        .get("results")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("relation").and_then(|r| r.get("id")))
                .filter_map(Value::as_str)
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default();
    RelationPage {
        ids,
        next_cursor: next_cursor(body),
    }
}

impl DocumentStore for NotionClient {
    fn query_collection(&self, collection_id: &str, cursor: Option<&str>) -> Result<QueryPage> {
        let operation = format!("query database {collection_id}");
        let payload = match cursor {
            Some(cursor) => json!({ "start_cursor": cursor }),
            None => json!({}),
        };
        debug!(collection_id, cursor, "querying database page");
        let url = self.url(&format!("databases/{collection_id}/query"));
        let body = self.send(&operation, self.client.post(url).json(&payload))?;
        parse_query_page(&operation, body)
    }

    fn patch_record(&self, record_id: &str, patch: &PropertyPatch) -> Result<()> {
        let operation = format!("patch page {record_id}");
        let payload = json!({ "properties": patch });
        let url = self.url(&format!("pages/{record_id}"));
        self.send(&operation, self.client.patch(url).json(&payload))?;
        Ok(())
    }

    fn create_record(&self, collection_id: &str, properties: &PropertyPatch) -> Result<String> {
        let operation = format!("create page in {collection_id}");
        let payload = json!({
            "parent": { "database_id": collection_id },
            "properties": properties,
        });
        let body = self.send(&operation, self.client.post(self.url("pages")).json(&payload))?;
        body.get("id")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
            .ok_or_else(|| SyncError::remote(operation, None, "response missing page id").into())
    }

    fn list_relation(
        &self,
        record_id: &str,
        property_id: &str,
        cursor: Option<&str>,
    ) -> Result<RelationPage> {
        let operation = format!("list relation {property_id} of {record_id}");
        let url = self.url(&format!("pages/{record_id}/properties/{property_id}"));
        let mut request = self.client.get(url);
        if let Some(cursor) = cursor {
            request = request.query(&[("start_cursor", cursor)]);
        }
        let body = self.send(&operation, request)?;
        Ok(parse_relation_page(&body))
    }
}
