//! reqwest-backed [`EntityStore`]

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{ApiError, ApiResult, EntityStore, Query};
use crate::models::EntityKind;

const REST_PREFIX: &str = "/structr/rest";

/// Response envelope: `{ "result": …, "result_count": n }`
#[derive(Debug, Default, Deserialize)]
struct Envelope {
    #[serde(default)]
    result: Value,
}

#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    base: String,
}

impl RestClient {
    pub fn new(server_base: &str) -> Self {
        Self {
            client: Client::new(),
            base: format!("{}{}", server_base.trim_end_matches('/'), REST_PREFIX),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<Envelope> {
        let response = with_session(request).send().await?;
        read_envelope(response).await
    }
}

/// Browser requests carry the session cookie
fn with_session(request: RequestBuilder) -> RequestBuilder {
    #[cfg(target_arch = "wasm32")]
    {
        request.fetch_credentials_include()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        request
    }
}

async fn read_envelope(response: Response) -> ApiResult<Envelope> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(error_for(status, &body));
    }
    decode_envelope(&body)
}

fn decode_envelope(body: &str) -> ApiResult<Envelope> {
    if body.trim().is_empty() {
        return Ok(Envelope::default());
    }
    Ok(serde_json::from_str(body)?)
}

/// Map a failed response onto [`ApiError`]
pub(crate) fn error_for(status: StatusCode, body: &str) -> ApiError {
    let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let message = parsed
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

    match status {
        StatusCode::UNAUTHORIZED => ApiError::SessionInvalid,
        StatusCode::UNPROCESSABLE_ENTITY => {
            let errors = parsed.get("errors").and_then(Value::as_array).cloned().unwrap_or_default();
            let mut properties = Vec::new();
            let mut messages = Vec::new();
            for error in &errors {
                let property = error.get("property").and_then(Value::as_str).unwrap_or_default();
                let token = error.get("token").and_then(Value::as_str).unwrap_or("invalid");
                if !property.is_empty() && !properties.iter().any(|p| p == property) {
                    properties.push(property.to_string());
                }
                messages.push(if property.is_empty() { token.to_string() } else { format!("{} {}", property, token) });
            }
            if messages.is_empty() {
                messages.push(message);
            }
            ApiError::Validation { messages, properties }
        }
        _ => ApiError::Status { code: status.as_u16(), message },
    }
}

fn into_list(result: Value) -> Vec<Value> {
    match result {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// New ids come back as `result: [id]` (or a bare string)
fn created_id(result: &Value) -> ApiResult<String> {
    let id = match result {
        Value::Array(items) => items.first().and_then(Value::as_str),
        Value::String(id) => Some(id.as_str()),
        _ => None,
    };
    id.map(str::to_string)
        .ok_or_else(|| ApiError::Decode(format!("no id in create response: {}", result)))
}

#[async_trait(?Send)]
impl EntityStore for RestClient {
    async fn query(&self, query: &Query) -> ApiResult<Vec<Value>> {
        let url = format!("{}?{}", self.url(query.kind.rest_type()), query.to_query_string());
        debug!(%url, "query");
        let envelope = self.send(self.client.get(&url)).await?;
        Ok(into_list(envelope.result))
    }

    async fn get(&self, kind: EntityKind, id: &str) -> ApiResult<Option<Value>> {
        let url = self.url(&format!("{}/{}", kind.rest_type(), id));
        match self.send(self.client.get(&url)).await {
            Ok(envelope) => Ok(match envelope.result {
                Value::Null => None,
                Value::Array(items) => items.into_iter().next(),
                other => Some(other),
            }),
            Err(ApiError::Status { code: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create(&self, kind: EntityKind, body: Value) -> ApiResult<String> {
        let url = self.url(kind.rest_type());
        let envelope = self.send(self.client.post(&url).json(&body)).await?;
        created_id(&envelope.result)
    }

    async fn update(&self, kind: EntityKind, id: &str, body: Value) -> ApiResult<()> {
        let url = self.url(&format!("{}/{}", kind.rest_type(), id));
        self.send(self.client.put(&url).json(&body)).await?;
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> ApiResult<()> {
        let url = self.url(&format!("{}/{}", kind.rest_type(), id));
        self.send(self.client.delete(&url)).await?;
        Ok(())
    }

    async fn schema_info(&self, type_name: &str, view: &str) -> ApiResult<Vec<Value>> {
        let url = self.url(&format!("_schema/{}/{}", type_name, view));
        let envelope = self.send(self.client.get(&url)).await?;
        Ok(into_list(envelope.result))
    }

    async fn maintenance(&self, command: &str, body: Value) -> ApiResult<Value> {
        let url = self.url(&format!("maintenance/{}", command));
        let envelope = self.send(self.client.post(&url).json(&body)).await.inspect_err(|e| {
            warn!(command, error = %e, "maintenance command failed");
        })?;
        Ok(envelope.result)
    }
}
