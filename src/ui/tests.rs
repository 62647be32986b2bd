use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crossterm::event::KeyCode;
use serde_json::{json, Value};

use super::app::{App, Intent};
use crate::api::{ApiRequest, Completion, Gateway, Method, RequestRunner, Ticket};
use crate::error::ApiError;
use crate::models::{RecordId, Role, User};
use crate::notify::NoticeKind;
use crate::router::View;
use crate::session::{SessionStore, TOKEN_KEY};
use crate::storage::{get_item, open_in_memory};

type Sent = Rc<RefCell<Vec<(Ticket, ApiRequest)>>>;

/// Records submissions instead of running them; tests complete them by hand
/// in whatever order they like.
struct RecordingRunner {
    sent: Sent,
}

impl RequestRunner for RecordingRunner {
    fn submit(&mut self, ticket: Ticket, request: ApiRequest) {
        self.sent.borrow_mut().push((ticket, request));
    }

    fn drain(&mut self) -> Vec<Completion> {
        Vec::new()
    }
}

struct Harness {
    app: App,
    sent: Sent,
}

impl Harness {
    fn new(role: Option<Role>) -> Self {
        let mut sessions = SessionStore::restore(open_in_memory().unwrap());
        if let Some(role) = role {
            sessions.set("tok-1", user(role)).unwrap();
        }
        let sent: Sent = Rc::default();
        let runner = RecordingRunner {
            sent: Rc::clone(&sent),
        };
        let app = App::new(
            Gateway::new("http://svc/api/"),
            Box::new(runner),
            sessions,
            Duration::from_secs(60),
        );
        Self { app, sent }
    }

    fn take(&self) -> Vec<(Ticket, ApiRequest)> {
        self.sent.borrow_mut().drain(..).collect()
    }

    fn take_one(&self) -> (Ticket, ApiRequest) {
        let mut sent = self.take();
        assert_eq!(sent.len(), 1, "expected exactly one request");
        sent.remove(0)
    }

    fn succeed(&mut self, ticket: Ticket, data: Value) {
        self.app.complete(Completion {
            ticket,
            outcome: Ok(Some(data)),
        });
    }

    fn fail(&mut self, ticket: Ticket, status: u16, message: &str) {
        self.app.complete(Completion {
            ticket,
            outcome: Err(ApiError::from_status(status, message)),
        });
    }

    fn type_text(&mut self, text: &str) {
        for ch in text.chars() {
            self.app.handle_key(KeyCode::Char(ch));
        }
    }

    fn notice(&self) -> (String, NoticeKind) {
        let notice = self.app.notice().expect("a notice");
        (notice.text.clone(), notice.kind)
    }
}

fn user(role: Role) -> User {
    User {
        id: RecordId::Number(9),
        name: "Ann".into(),
        email: "ann@example.com".into(),
        role,
    }
}

fn books() -> Value {
    json!({
        "books": [
            {"id": 1, "title": "Dune", "author": "Herbert", "category": "SF", "status": "available"},
            {"id": 2, "title": "Emma", "author": "Austen", "category": "Classic", "status": "borrowed",
             "due_date": "2024-05-01"},
            {"id": 3, "title": "Solaris", "author": "Lem", "category": "SF", "status": "available"}
        ]
    })
}

fn assert_refresh(request: &ApiRequest) {
    assert_eq!(request.method, Method::Get);
    assert!(request.url.starts_with("http://svc/api/books"), "{}", request.url);
}

#[test]
fn signed_out_start_shows_login_without_fetching() {
    let harness = Harness::new(None);
    assert_eq!(harness.app.active_view(), View::Login);
    assert!(harness.take().is_empty());
    assert!(harness.app.chrome().login);
    assert!(!harness.app.chrome().logout);
}

#[test]
fn login_persists_session_and_refreshes_catalog_once() {
    let mut harness = Harness::new(None);
    harness.type_text("ann@example.com");
    harness.app.handle_key(KeyCode::Tab);
    harness.type_text("secret");
    harness.app.handle_key(KeyCode::Enter);

    let (ticket, request) = harness.take_one();
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.url, "http://svc/api/auth/login");
    assert!(!request.is_authenticated());

    harness.succeed(
        ticket,
        json!({
            "token": "tok-new",
            "user": {"id": 4, "name": "Ann", "email": "ann@example.com", "role": "student"}
        }),
    );

    assert!(harness.app.session().is_signed_in());
    assert_eq!(harness.app.active_view(), View::Catalog);
    assert!(harness.app.chrome().logout);
    assert!(!harness.app.chrome().login);
    assert!(!harness.app.chrome().admin);
    assert_eq!(
        harness.notice(),
        ("Logged in successfully.".to_string(), NoticeKind::Success)
    );
    assert_eq!(
        get_item(harness.app.sessions.connection(), TOKEN_KEY).unwrap(),
        Some("tok-new".to_string())
    );
    assert!(harness.app.login.password.is_empty());

    let (_, refresh) = harness.take_one();
    assert_refresh(&refresh);
    assert_eq!(refresh.header("Authorization"), Some("Bearer tok-new"));
}

#[test]
fn rejected_login_stays_on_login_with_service_message() {
    let mut harness = Harness::new(None);
    harness.app.dispatch(Intent::SubmitLogin);
    let (ticket, _) = harness.take_one();
    harness.fail(ticket, 401, "Invalid credentials");

    assert_eq!(harness.app.active_view(), View::Login);
    assert!(!harness.app.session().is_signed_in());
    assert_eq!(
        harness.notice(),
        ("Invalid credentials".to_string(), NoticeKind::Error)
    );
    assert!(harness.take().is_empty());
}

#[test]
fn student_is_refused_admin_view() {
    let mut harness = Harness::new(Some(Role::Student));
    harness.take();

    harness.app.handle_key(KeyCode::F(2));

    assert_eq!(harness.app.active_view(), View::Catalog);
    assert_eq!(
        harness.notice(),
        ("Admin access only.".to_string(), NoticeKind::Error)
    );
    assert!(harness.take().is_empty());
}

#[test]
fn entering_a_catalog_view_always_refreshes() {
    let mut harness = Harness::new(Some(Role::Admin));
    let (_, initial) = harness.take_one();
    assert_refresh(&initial);
    assert_eq!(initial.url, "http://svc/api/books");

    harness.app.dispatch(Intent::Navigate(View::Admin));
    assert_refresh(&harness.take_one().1);
    harness.app.dispatch(Intent::Navigate(View::Admin));
    assert_refresh(&harness.take_one().1);
}

#[test]
fn filter_terms_are_sent_only_when_set() {
    let mut harness = Harness::new(Some(Role::Student));
    let (ticket, _) = harness.take_one();
    harness.succeed(ticket, books());

    harness.app.handle_key(KeyCode::Char('/'));
    harness.type_text("  dune ");
    harness.app.handle_key(KeyCode::Enter);
    let (_, request) = harness.take_one();
    assert_eq!(request.url, "http://svc/api/books?search=dune");

    harness.app.handle_key(KeyCode::Char('c'));
    harness.app.handle_key(KeyCode::Char('s'));
    harness.app.handle_key(KeyCode::Char('r'));
    let (_, request) = harness.take_one();
    assert_eq!(
        request.url,
        "http://svc/api/books?search=dune&category=SF&status=available"
    );

    harness.app.handle_key(KeyCode::Char('x'));
    let (_, request) = harness.take_one();
    assert_eq!(request.url, "http://svc/api/books");
}

#[test]
fn each_mutation_triggers_exactly_one_refresh() {
    let mut harness = Harness::new(Some(Role::Admin));
    harness.take();

    harness.app.dispatch(Intent::Borrow(RecordId::Number(1)));
    let (ticket, request) = harness.take_one();
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.url, "http://svc/api/books/1/borrow");
    harness.succeed(ticket, json!({"message": "ok"}));
    assert_eq!(
        harness.notice(),
        ("Book borrowed successfully.".to_string(), NoticeKind::Success)
    );
    assert_refresh(&harness.take_one().1);

    harness.app.dispatch(Intent::MarkReturned(RecordId::Number(2)));
    let (ticket, request) = harness.take_one();
    assert_eq!(request.url, "http://svc/api/books/2/return");
    harness.succeed(ticket, json!({}));
    assert_refresh(&harness.take_one().1);
}

#[test]
fn failed_mutation_does_not_refresh() {
    let mut harness = Harness::new(Some(Role::Student));
    harness.take();

    harness.app.dispatch(Intent::Borrow(RecordId::Number(1)));
    let (ticket, _) = harness.take_one();
    harness.fail(ticket, 400, "Book is not available");

    assert_eq!(
        harness.notice(),
        ("Book is not available".to_string(), NoticeKind::Error)
    );
    assert!(harness.take().is_empty());
}

#[test]
fn borrow_requires_a_session() {
    let mut harness = Harness::new(None);
    harness.app.dispatch(Intent::Borrow(RecordId::Number(1)));
    assert!(harness.take().is_empty());
    assert_eq!(
        harness.notice(),
        (
            "You must be logged in to borrow books.".to_string(),
            NoticeKind::Error
        )
    );
}

#[test]
fn borrowed_book_offers_no_borrow_control() {
    let mut harness = Harness::new(Some(Role::Student));
    let (ticket, _) = harness.take_one();
    harness.succeed(ticket, books());

    harness.app.handle_key(KeyCode::Down);
    assert_eq!(harness.app.grid_selected, 1);
    harness.app.handle_key(KeyCode::Char('b'));
    harness.app.handle_key(KeyCode::Char('m'));
    assert!(harness.take().is_empty());

    harness.app.handle_key(KeyCode::Up);
    harness.app.handle_key(KeyCode::Char('b'));
    let (_, request) = harness.take_one();
    assert_eq!(request.url, "http://svc/api/books/1/borrow");
}

#[test]
fn failed_refresh_keeps_previous_grid_and_facet() {
    let mut harness = Harness::new(Some(Role::Student));
    let (ticket, _) = harness.take_one();
    harness.succeed(ticket, books());
    harness.app.handle_key(KeyCode::Char('c'));
    assert_eq!(harness.app.category_facet().selected(), "SF");

    harness.app.dispatch(Intent::RefreshCatalog);
    let (ticket, _) = harness.take_one();
    harness.fail(ticket, 500, "Database offline");

    assert_eq!(harness.app.catalog().render_count(), 1);
    assert_eq!(harness.app.catalog().grid().len(), 3);
    assert_eq!(harness.app.category_facet().selected(), "SF");
    assert_eq!(
        harness.app.category_facet().options().to_vec(),
        vec!["SF".to_string(), "Classic".to_string()]
    );
    assert_eq!(
        harness.notice(),
        ("Database offline".to_string(), NoticeKind::Error)
    );
}

#[test]
fn malformed_list_is_not_rendered() {
    let mut harness = Harness::new(Some(Role::Student));
    let (ticket, _) = harness.take_one();
    harness.succeed(ticket, json!({"books": [{"id": 1}]}));

    assert_eq!(harness.app.catalog().render_count(), 0);
    assert!(harness.app.catalog().grid().is_empty());
    assert_eq!(harness.notice().1, NoticeKind::Error);
}

#[test]
fn facet_drops_selection_no_longer_offered() {
    let mut harness = Harness::new(Some(Role::Student));
    let (ticket, _) = harness.take_one();
    harness.succeed(ticket, books());
    harness.app.handle_key(KeyCode::Char('C'));
    assert_eq!(harness.app.category_facet().selected(), "Classic");

    harness.app.dispatch(Intent::RefreshCatalog);
    let (ticket, _) = harness.take_one();
    harness.succeed(
        ticket,
        json!({"books": [{"id": 1, "title": "Dune", "author": "Herbert", "category": "SF", "status": "available"}]}),
    );
    assert_eq!(harness.app.category_facet().selected(), "");
    assert_eq!(
        harness.app.category_facet().options().to_vec(),
        vec!["SF".to_string()]
    );
}

#[test]
fn overlapping_refreshes_apply_in_arrival_order() {
    let mut harness = Harness::new(Some(Role::Student));
    harness.take();

    harness.app.dispatch(Intent::RefreshCatalog);
    harness.app.dispatch(Intent::RefreshCatalog);
    let mut sent = harness.take();
    assert_eq!(sent.len(), 2);
    assert_eq!(harness.app.in_flight(), 3);
    let (second, _) = sent.pop().unwrap();
    let (first, _) = sent.pop().unwrap();

    harness.succeed(second, books());
    harness.succeed(
        first,
        json!({"books": [{"id": 7, "title": "Ubik", "author": "Dick", "status": "available"}]}),
    );

    assert_eq!(harness.app.catalog().grid_ids(), vec![RecordId::Number(7)]);
    assert_eq!(harness.app.catalog().render_count(), 2);
}

#[test]
fn empty_author_blocks_create_without_a_call() {
    let mut harness = Harness::new(Some(Role::Admin));
    harness.take();
    harness.app.book_form.title = "Dune".into();
    harness.app.book_form.author = "   ".into();

    harness.app.dispatch(Intent::SubmitBook);

    assert!(harness.take().is_empty());
    assert_eq!(
        harness.notice(),
        (
            "Title and author are required.".to_string(),
            NoticeKind::Error
        )
    );
}

#[test]
fn create_resets_form_and_refreshes() {
    let mut harness = Harness::new(Some(Role::Admin));
    harness.take();
    harness.app.book_form.title = " Dune ".into();
    harness.app.book_form.author = "Herbert".into();

    harness.app.dispatch(Intent::SubmitBook);
    let (ticket, request) = harness.take_one();
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.url, "http://svc/api/books");
    assert_eq!(request.header("Content-Type"), Some("application/json"));

    harness.succeed(ticket, json!({"id": 10}));
    assert_eq!(harness.app.book_form.title, "");
    assert_eq!(harness.app.book_form_label(), "Add Book");
    assert_refresh(&harness.take_one().1);
}

#[test]
fn edit_loads_into_form_and_updates_with_put() {
    let mut harness = Harness::new(Some(Role::Admin));
    let (ticket, _) = harness.take_one();
    harness.succeed(ticket, books());

    harness.app.dispatch(Intent::EditBook(RecordId::Number(2)));
    let (ticket, request) = harness.take_one();
    assert_eq!(request.url, "http://svc/api/books/2");
    harness.succeed(
        ticket,
        json!({"id": 2, "title": "Emma", "author": "Austen", "status": "borrowed"}),
    );

    assert_eq!(harness.app.active_view(), View::Admin);
    assert_eq!(harness.app.book_form_label(), "Update Book");
    assert_eq!(harness.app.book_form.isbn, "");
    assert!(harness.take().is_empty());

    harness.app.dispatch(Intent::SubmitBook);
    let (ticket, request) = harness.take_one();
    assert_eq!(request.method, Method::Put);
    assert_eq!(request.url, "http://svc/api/books/2");
    harness.succeed(ticket, json!({}));

    assert_eq!(harness.app.book_form_label(), "Add Book");
    assert_refresh(&harness.take_one().1);
}

#[test]
fn cancel_edit_returns_to_create_mode() {
    let mut harness = Harness::new(Some(Role::Admin));
    harness.take();
    harness.app.book_form.id = Some(RecordId::Number(2));
    harness.app.book_form.title = "Emma".into();

    harness.app.dispatch(Intent::CancelEdit);

    assert_eq!(harness.app.book_form_label(), "Add Book");
    assert_eq!(harness.app.book_form.title, "");
    assert!(harness.take().is_empty());
}

#[test]
fn declined_delete_makes_no_call() {
    let mut harness = Harness::new(Some(Role::Admin));
    let (ticket, _) = harness.take_one();
    harness.succeed(ticket, books());
    harness.app.dispatch(Intent::Navigate(View::Admin));
    harness.take();

    harness.app.handle_key(KeyCode::Char('d'));
    assert_eq!(harness.app.pending_delete(), Some(&RecordId::Number(1)));
    harness.app.handle_key(KeyCode::Char('n'));

    assert_eq!(harness.app.pending_delete(), None);
    assert!(harness.take().is_empty());
}

#[test]
fn confirmed_delete_calls_then_refreshes() {
    let mut harness = Harness::new(Some(Role::Admin));
    let (ticket, _) = harness.take_one();
    harness.succeed(ticket, books());

    harness.app.dispatch(Intent::DeleteBook(RecordId::Number(3)));
    harness.app.handle_key(KeyCode::Char('y'));
    let (ticket, request) = harness.take_one();
    assert_eq!(request.method, Method::Delete);
    assert_eq!(request.url, "http://svc/api/books/3");

    harness.succeed(ticket, json!({"message": "deleted"}));
    assert_eq!(
        harness.notice(),
        ("Book deleted successfully.".to_string(), NoticeKind::Success)
    );
    assert_refresh(&harness.take_one().1);
}

#[test]
fn unauthorized_response_ends_the_session() {
    let mut harness = Harness::new(Some(Role::Student));
    let (ticket, request) = harness.take_one();
    assert!(request.is_authenticated());

    harness.fail(ticket, 401, "Token expired");

    assert!(!harness.app.session().is_signed_in());
    assert_eq!(harness.app.active_view(), View::Login);
    assert!(harness.app.chrome().login);
    assert_eq!(
        get_item(harness.app.sessions.connection(), TOKEN_KEY).unwrap(),
        None
    );
    assert_eq!(
        harness.notice(),
        ("Token expired".to_string(), NoticeKind::Error)
    );
}

#[test]
fn logout_clears_session_and_chrome() {
    let mut harness = Harness::new(Some(Role::Admin));
    harness.take();
    assert!(harness.app.chrome().admin);

    harness.app.handle_key(KeyCode::F(10));

    assert!(!harness.app.session().is_signed_in());
    assert_eq!(harness.app.active_view(), View::Login);
    assert!(!harness.app.chrome().admin);
    assert!(!harness.app.chrome().logout);
    assert!(harness.take().is_empty());

    // Logout is hidden once signed out.
    harness.app.handle_key(KeyCode::F(10));
    assert_eq!(harness.app.active_view(), View::Login);
}

#[test]
fn quit_keys_request_exit() {
    let mut harness = Harness::new(Some(Role::Student));
    assert!(harness.app.handle_key(KeyCode::Char('q')));
    assert!(harness.app.dispatch(Intent::Quit));
}

#[test]
fn registration_signs_in_and_refreshes_once() {
    let mut harness = Harness::new(None);
    harness.app.handle_key(KeyCode::F(4));
    assert_eq!(harness.app.active_view(), View::Register);
    harness.type_text("Bo");
    harness.app.handle_key(KeyCode::Tab);
    harness.type_text("bo@example.com");
    harness.app.handle_key(KeyCode::Tab);
    harness.type_text("pw");
    harness.app.handle_key(KeyCode::Enter);

    let (ticket, request) = harness.take_one();
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.url, "http://svc/api/auth/register");
    harness.succeed(
        ticket,
        json!({
            "token": "tok-bo",
            "user": {"id": 8, "name": "Bo", "email": "bo@example.com", "role": "student"}
        }),
    );

    assert_eq!(harness.app.session().token(), Some("tok-bo"));
    assert_eq!(harness.app.active_view(), View::Catalog);
    assert!(harness.app.register.password.is_empty());
    assert_eq!(
        harness.notice(),
        (
            "Account created. You are now logged in.".to_string(),
            NoticeKind::Success
        )
    );
    assert_refresh(&harness.take_one().1);
}

#[test]
fn return_requires_a_session() {
    let mut harness = Harness::new(None);
    harness.app.dispatch(Intent::MarkReturned(RecordId::Number(2)));
    assert!(harness.take().is_empty());
    assert_eq!(
        harness.notice(),
        ("You must be logged in.".to_string(), NoticeKind::Error)
    );
}

#[test]
fn students_cannot_save_books() {
    let mut harness = Harness::new(Some(Role::Student));
    harness.take();
    harness.app.book_form.title = "Dune".into();
    harness.app.book_form.author = "Herbert".into();

    harness.app.dispatch(Intent::SubmitBook);
    harness.app.book_form.id = Some(RecordId::Number(1));
    harness.app.dispatch(Intent::SubmitBook);

    assert!(harness.take().is_empty());
    assert_eq!(
        harness.notice(),
        (
            "Only admins can manage books.".to_string(),
            NoticeKind::Error
        )
    );
}

#[test]
fn edit_load_arriving_after_logout_is_dropped() {
    let mut harness = Harness::new(Some(Role::Admin));
    let (ticket, _) = harness.take_one();
    harness.succeed(ticket, books());

    harness.app.dispatch(Intent::EditBook(RecordId::Number(2)));
    let (ticket, _) = harness.take_one();
    harness.app.dispatch(Intent::Logout);
    assert!(harness.app.catalog().admin_rows().is_none());

    harness.succeed(
        ticket,
        json!({"id": 2, "title": "Emma", "author": "Austen", "status": "borrowed"}),
    );

    assert_eq!(harness.app.active_view(), View::Login);
    assert!(!harness.app.book_form.is_editing());
    assert_eq!(
        harness.notice(),
        ("Admin access only.".to_string(), NoticeKind::Error)
    );
}

#[test]
fn stale_unauthorized_leaves_newer_session_alone() {
    let mut harness = Harness::new(Some(Role::Student));
    let (stale, _) = harness.take_one();
    harness.app.dispatch(Intent::Logout);

    harness.app.dispatch(Intent::SubmitLogin);
    let (ticket, _) = harness.take_one();
    harness.succeed(
        ticket,
        json!({
            "token": "tok-b",
            "user": {"id": 5, "name": "Bea", "email": "bea@example.com", "role": "student"}
        }),
    );
    harness.take();

    harness.fail(stale, 401, "Token expired");

    assert_eq!(harness.app.session().token(), Some("tok-b"));
    assert_eq!(harness.app.active_view(), View::Catalog);
    assert_eq!(
        get_item(harness.app.sessions.connection(), TOKEN_KEY).unwrap(),
        Some("tok-b".to_string())
    );
}
