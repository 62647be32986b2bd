use reqwest::Url;
use serde_json::Value;

use super::{ApiRequest, Body, Call, Payload};
use crate::error::{ApiError, GENERIC_FAILURE};

const JSON_CONTENT_TYPE: &str = "application/json";

/// Single choke point for outbound calls. It reads the credential it is given
/// and never touches the session or the screen.
#[derive(Debug, Clone)]
pub struct Gateway {
    base_url: String,
}

impl Gateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the request for `call`. The bearer header is attached only when
    /// a token is present; JSON content negotiation is skipped for multipart
    /// payloads so their parts pass through unmodified.
    pub fn prepare(&self, token: Option<&str>, call: Call) -> Result<ApiRequest, ApiError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, call.path)).map_err(|err| {
            tracing::error!(error = %err, path = %call.path, "invalid request url");
            ApiError::unreachable()
        })?;
        if !call.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &call.query {
                pairs.append_pair(key, value);
            }
        }

        let mut headers = Vec::new();
        if let Some(token) = token {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        let body = match call.payload {
            Payload::Multipart(parts) => Body::Multipart(parts),
            Payload::Json(value) => {
                headers.push(("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string()));
                let bytes = serde_json::to_vec(&value).map_err(|err| {
                    tracing::error!(error = %err, "failed to encode request body");
                    ApiError::malformed()
                })?;
                Body::Bytes(bytes)
            }
            Payload::None => {
                headers.push(("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string()));
                Body::Empty
            }
        };

        Ok(ApiRequest {
            method: call.method,
            url: url.to_string(),
            headers,
            body,
        })
    }
}

/// Turn a status and raw body into data or a uniform error. The body is
/// always parsed as JSON; an empty or unparseable body is treated as no data.
pub fn normalize_response(status: u16, body: &[u8]) -> Result<Option<Value>, ApiError> {
    let data = serde_json::from_slice::<Value>(body)
        .ok()
        .filter(|value| !value.is_null());

    if !(200..300).contains(&status) {
        let message = data
            .as_ref()
            .and_then(|value| value.get("message"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .unwrap_or(GENERIC_FAILURE);
        return Err(ApiError::from_status(status, message));
    }

    Ok(data)
}
