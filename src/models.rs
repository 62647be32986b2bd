//! Wire-level domain models shared by the gateway, the session store and the
//! renderers. These types stay light-weight data holders: the remote catalog
//! service owns every book, and the client only keeps the last snapshot it was
//! handed.

use std::fmt;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
/// Identifier as issued by the service. Some deployments hand out integers,
/// others strings, so both are accepted and written back verbatim.
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(value) => write!(f, "{value}"),
            RecordId::Text(value) => write!(f, "{value}"),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Number(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    /// Anything the service sends that is not `admin` is treated as the least
    /// privileged role.
    #[serde(other)]
    Student,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Signed-in identity as returned by `/auth/login` and `/auth/register`.
pub struct User {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    #[default]
    Available,
    Borrowed,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "available",
            BookStatus::Borrowed => "borrowed",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            BookStatus::Available => BookStatus::Borrowed,
            BookStatus::Borrowed => BookStatus::Available,
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A catalog entry. Optional text fields may be missing or `null` on the wire.
pub struct Book {
    pub id: RecordId,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub status: BookStatus,
    #[serde(default, alias = "dueDate")]
    pub due_date: Option<String>,
    /// Due date of the loan currently holding the book, when the service
    /// joins it in.
    #[serde(default)]
    pub current_due_date: Option<String>,
}

impl Book {
    pub fn is_available(&self) -> bool {
        self.status == BookStatus::Available
    }

    /// Non-empty category, if any.
    pub fn category_label(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|category| !category.is_empty())
    }

    /// Human-readable due date. The active loan's date wins over the book's
    /// own field; text that is not a recognised date is shown as-is.
    pub fn due_label(&self) -> Option<String> {
        let raw = self
            .current_due_date
            .as_deref()
            .or(self.due_date.as_deref())
            .map(str::trim)
            .filter(|raw| !raw.is_empty())?;

        if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
            return Some(stamp.format("%b %-d, %Y").to_string());
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(date.format("%b %-d, %Y").to_string());
        }
        Some(raw.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookList {
    pub books: Vec<Book>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Body of `POST /books` and `PUT /books/{id}`. Optional fields travel as
/// empty strings, matching what the admin form holds.
pub struct BookPayload {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
    pub description: String,
    pub status: BookStatus,
}
