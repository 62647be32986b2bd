//! Dispatchers and their continuations. Every dispatcher validates locally,
//! submits one call through the gateway, and on success reports and
//! refreshes the catalog through the single refresh path.

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::api::{self, decode, Call, Completion, Purpose, Ticket};
use crate::error::{AccessDenied, ApiError};
use crate::models::{AuthResponse, Book, BookList, RecordId};
use crate::notify::NoticeKind;
use crate::router::{NavChrome, View};

use super::app::{AdminFocus, App, Mode};
use super::forms::{BookForm, ConfirmDelete};

impl App {
    /// Fetch the catalog with the terms currently in the filter form.
    pub(crate) fn refresh_catalog(&mut self) {
        let filters = self.filters.read();
        self.submit(Purpose::RefreshCatalog, api::list_books(&filters));
    }

    pub(crate) fn reset_filters(&mut self) {
        self.filters.reset();
        self.refresh_catalog();
    }

    pub(crate) fn navigate(&mut self, view: View) {
        match self.router.request(view, self.sessions.session()) {
            Ok(refresh) => {
                self.mode = Mode::Normal;
                if refresh {
                    self.refresh_catalog();
                }
            }
            Err(denied) => self.notify(denied.to_string(), NoticeKind::Error),
        }
    }

    pub(crate) fn logout(&mut self) {
        self.end_session();
        self.notify("Logged out.", NoticeKind::Success);
    }

    pub(crate) fn submit_login(&mut self) {
        let request = self.login.request();
        self.submit(Purpose::Login, api::login(&request));
    }

    pub(crate) fn submit_register(&mut self) {
        let request = self.register.request();
        self.submit(Purpose::Register, api::register(&request));
    }

    pub(crate) fn borrow(&mut self, id: RecordId) {
        if !self.session().is_signed_in() {
            self.notify("You must be logged in to borrow books.", NoticeKind::Error);
            return;
        }
        let call = api::borrow_book(&id);
        self.submit(Purpose::Borrow(id), call);
    }

    /// The grid only offers this to admins; the service decides whether the
    /// caller may actually do it.
    pub(crate) fn mark_returned(&mut self, id: RecordId) {
        if !self.session().is_signed_in() {
            self.notify("You must be logged in.", NoticeKind::Error);
            return;
        }
        let call = api::return_book(&id);
        self.submit(Purpose::Return(id), call);
    }

    pub(crate) fn submit_book(&mut self) {
        if !self.session().is_admin() {
            self.notify("Only admins can manage books.", NoticeKind::Error);
            return;
        }
        let payload = match self.book_form.payload() {
            Ok(payload) => payload,
            Err(message) => {
                self.notify(message, NoticeKind::Error);
                return;
            }
        };
        match self.book_form.id.clone() {
            Some(id) => {
                let call = api::update_book(&id, &payload);
                self.submit(Purpose::UpdateBook(id), call);
            }
            None => self.submit(Purpose::CreateBook, api::create_book(&payload)),
        }
    }

    pub(crate) fn cancel_edit(&mut self) {
        self.book_form.reset();
    }

    pub(crate) fn load_for_edit(&mut self, id: RecordId) {
        let call = api::get_book(&id);
        self.submit(Purpose::LoadForEdit(id), call);
    }

    /// Deleting always goes through the confirmation dialog first.
    pub(crate) fn request_delete(&mut self, id: RecordId) {
        let title = self
            .catalog
            .admin_rows()
            .and_then(|rows| rows.iter().find(|book| book.id == id))
            .map(|book| book.title.clone())
            .unwrap_or_else(|| format!("book {id}"));
        self.mode = Mode::ConfirmDelete(ConfirmDelete { id, title });
    }

    pub(crate) fn confirm_delete(&mut self) {
        if let Mode::ConfirmDelete(confirm) = self.take_mode() {
            let call = api::delete_book(&confirm.id);
            self.submit(Purpose::DeleteBook(confirm.id), call);
        }
    }

    pub(crate) fn cancel_delete(&mut self) {
        if let Mode::ConfirmDelete(_) = self.take_mode() {
            self.notify("Deletion cancelled.", NoticeKind::Success);
        }
    }

    /// Prepare `call` with the current credential and hand it to the runner.
    fn submit(&mut self, purpose: Purpose, call: Call) {
        let prepared = self.gateway.prepare(self.sessions.session().token(), call);
        match prepared {
            Ok(request) => {
                self.next_ticket += 1;
                let ticket = Ticket {
                    id: self.next_ticket,
                    purpose,
                    session: request
                        .is_authenticated()
                        .then(|| self.sessions.generation()),
                };
                debug!(ticket = ticket.id, purpose = ?ticket.purpose, "dispatching");
                self.in_flight += 1;
                self.runner.submit(ticket, request);
            }
            Err(err) => self.notify(err.message, NoticeKind::Error),
        }
    }

    /// Apply one finished call. Completions are applied in arrival order, so
    /// the last refresh to arrive is the one left on screen.
    pub fn complete(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let Completion { ticket, outcome } = completion;
        match outcome {
            Ok(data) => self.on_success(ticket.purpose, data),
            Err(err) => self.on_failure(&ticket, err),
        }
    }

    fn on_failure(&mut self, ticket: &Ticket, err: ApiError) {
        warn!(
            ticket = ticket.id,
            purpose = ?ticket.purpose,
            status = ?err.status,
            message = %err.message,
            "request failed"
        );
        let current = self.session().is_signed_in().then(|| self.sessions.generation());
        if err.is_unauthorized() && ticket.session.is_some() && ticket.session == current {
            self.end_session();
        }
        self.notify(err.message, NoticeKind::Error);
    }

    fn on_success(&mut self, purpose: Purpose, data: Option<Value>) {
        if purpose.is_mutation() {
            debug!(purpose = ?purpose, "mutation accepted");
        }
        match purpose {
            Purpose::Login => self.finish_sign_in(data, "Logged in successfully."),
            Purpose::Register => {
                self.finish_sign_in(data, "Account created. You are now logged in.")
            }
            Purpose::RefreshCatalog => self.apply_catalog(data),
            Purpose::LoadForEdit(_) => self.apply_edit_load(data),
            Purpose::Borrow(_) => self.finish_mutation("Book borrowed successfully."),
            Purpose::Return(_) => self.finish_mutation("Book returned successfully."),
            Purpose::CreateBook => {
                self.book_form.reset();
                self.finish_mutation("Book added successfully.");
            }
            Purpose::UpdateBook(_) => {
                self.book_form.reset();
                self.finish_mutation("Book updated successfully.");
            }
            Purpose::DeleteBook(_) => self.finish_mutation("Book deleted successfully."),
        }
    }

    fn finish_mutation(&mut self, message: &str) {
        self.notify(message, NoticeKind::Success);
        self.refresh_catalog();
    }

    fn finish_sign_in(&mut self, data: Option<Value>, message: &str) {
        let auth: AuthResponse = match decode(data) {
            Ok(auth) => auth,
            Err(err) => {
                self.notify(err.message, NoticeKind::Error);
                return;
            }
        };
        if let Err(err) = self.sessions.set(&auth.token, auth.user) {
            error!(error = %err, "failed to persist session");
        }
        self.on_session_changed();
        self.login.clear_secret();
        self.register.clear_secret();
        self.notify(message, NoticeKind::Success);
        self.router.force(View::Catalog);
        self.mode = Mode::Normal;
        self.refresh_catalog();
    }

    /// Render a fetched list. Nothing visible changes unless the whole body
    /// decodes.
    fn apply_catalog(&mut self, data: Option<Value>) {
        let list: BookList = match decode(data) {
            Ok(list) => list,
            Err(err) => {
                self.notify(err.message, NoticeKind::Error);
                return;
            }
        };
        debug!(books = list.books.len(), "rendering catalog");
        self.catalog.render(&list.books, self.sessions.session());
        self.filters.category.rebuild(&list.books);
        self.clamp_selections();
    }

    /// The session may have changed while the book was loading; only an admin
    /// still signed in gets the form.
    fn apply_edit_load(&mut self, data: Option<Value>) {
        if !self.session().is_admin() {
            self.notify(AccessDenied::AdminOnly.to_string(), NoticeKind::Error);
            return;
        }
        let book: Book = match decode(data) {
            Ok(book) => book,
            Err(err) => {
                self.notify(err.message, NoticeKind::Error);
                return;
            }
        };
        self.book_form = BookForm::from_book(&book);
        self.admin_focus = AdminFocus::Form;
        self.router.force(View::Admin);
    }

    fn end_session(&mut self) {
        if let Err(err) = self.sessions.clear() {
            error!(error = %err, "failed to clear stored session");
        }
        self.on_session_changed();
        self.catalog.clear_admin_rows();
        self.book_form.reset();
        self.router.force(View::Login);
        self.mode = Mode::Normal;
    }

    /// Navigation chrome follows every session change, not just navigation.
    fn on_session_changed(&mut self) {
        self.chrome = NavChrome::for_session(self.sessions.session());
    }
}
