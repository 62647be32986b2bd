//! Everything that leaves the process goes through this module: endpoints
//! describe calls, the gateway turns them into requests and normalizes the
//! answers, the transport moves bytes, and the runner keeps calls off the
//! event loop.

mod endpoints;
mod gateway;
mod runner;
mod transport;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

pub use endpoints::{
    borrow_book, create_book, delete_book, get_book, list_books, login, register, return_book,
    update_book,
};
pub use gateway::{normalize_response, Gateway};
pub use runner::{Completion, Purpose, RequestRunner, ThreadedRunner, Ticket};
pub use transport::{HttpTransport, RawResponse, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PartValue {
    Text(String),
    File {
        file_name: String,
        mime: Option<String>,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub value: PartValue,
}

/// What the caller wants to send, before encoding.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    #[default]
    None,
    Json(Value),
    Multipart(Vec<FormPart>),
}

/// A call described in service terms: a path relative to the API base, query
/// terms, a method and a payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub path: String,
    pub query: Vec<(String, String)>,
    pub method: Method,
    pub payload: Payload,
}

impl Call {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
            method,
            payload: Payload::None,
        }
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }
}

/// Encoded request body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Bytes(Vec<u8>),
    /// Parts are handed to the transport untouched; it owns the boundary and
    /// the content type.
    Multipart(Vec<FormPart>),
}

/// A fully prepared request, ready for a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Body,
}

impl ApiRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.header("Authorization").is_some()
    }
}

/// Decode normalized response data into a typed value. Missing data or a
/// shape mismatch is a malformed response.
pub fn decode<T: DeserializeOwned>(data: Option<Value>) -> Result<T, ApiError> {
    let value = data.ok_or_else(ApiError::malformed)?;
    serde_json::from_value(value).map_err(|err| {
        tracing::warn!(error = %err, "response did not match the expected shape");
        ApiError::malformed()
    })
}
