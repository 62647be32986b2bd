//! Typed descriptions of the catalog service's endpoints.

use serde::Serialize;
use serde_json::Value;

use super::{Call, Method, Payload};
use crate::catalog::FilterState;
use crate::models::{BookPayload, LoginRequest, RecordId, RegisterRequest};

fn json_payload<T: Serialize>(body: &T) -> Payload {
    // Plain structs of strings always serialize.
    Payload::Json(serde_json::to_value(body).unwrap_or(Value::Null))
}

pub fn login(request: &LoginRequest) -> Call {
    Call::new(Method::Post, "/auth/login").with_payload(json_payload(request))
}

pub fn register(request: &RegisterRequest) -> Call {
    Call::new(Method::Post, "/auth/register").with_payload(json_payload(request))
}

/// `GET /books` carrying only the non-empty filter terms.
pub fn list_books(filters: &FilterState) -> Call {
    Call::new(Method::Get, "/books").with_query(filters.query_pairs())
}

pub fn get_book(id: &RecordId) -> Call {
    Call::new(Method::Get, format!("/books/{id}"))
}

pub fn create_book(payload: &BookPayload) -> Call {
    Call::new(Method::Post, "/books").with_payload(json_payload(payload))
}

pub fn update_book(id: &RecordId, payload: &BookPayload) -> Call {
    Call::new(Method::Put, format!("/books/{id}")).with_payload(json_payload(payload))
}

pub fn delete_book(id: &RecordId) -> Call {
    Call::new(Method::Delete, format!("/books/{id}"))
}

pub fn borrow_book(id: &RecordId) -> Call {
    Call::new(Method::Post, format!("/books/{id}/borrow"))
}

pub fn return_book(id: &RecordId) -> Call {
    Call::new(Method::Post, format!("/books/{id}/return"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookStatus;

    #[test]
    fn book_paths_embed_the_id() {
        let id = RecordId::Number(12);
        assert_eq!(borrow_book(&id).path, "/books/12/borrow");
        assert_eq!(return_book(&id).path, "/books/12/return");
        assert_eq!(delete_book(&id).method, Method::Delete);
        assert_eq!(get_book(&RecordId::from("abc")).path, "/books/abc");
    }

    #[test]
    fn update_sends_every_form_field() {
        let payload = BookPayload {
            title: "Dune".into(),
            author: "Herbert".into(),
            isbn: String::new(),
            category: "SF".into(),
            description: String::new(),
            status: BookStatus::Borrowed,
        };
        let call = update_book(&RecordId::Number(4), &payload);
        assert_eq!(call.method, Method::Put);
        let Payload::Json(body) = call.payload else {
            panic!("expected json payload");
        };
        assert_eq!(body["status"], "borrowed");
        assert_eq!(body["isbn"], "");
        assert_eq!(body["category"], "SF");
    }
}
