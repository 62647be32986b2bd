use std::mem;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use crate::api::{Gateway, RequestRunner};
use crate::catalog::{CardAction, Catalog, CategoryFacet};
use crate::models::RecordId;
use crate::notify::{Notice, NoticeKind, Notifier};
use crate::router::{NavChrome, View, ViewRouter};
use crate::session::{Session, SessionStore};

use super::forms::{BookForm, ConfirmDelete, FilterForm, LoginForm, RegisterForm};

/// One user gesture. Every key press that does something maps to exactly one
/// of these, and every intent maps to exactly one dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Navigate(View),
    Logout,
    SubmitLogin,
    SubmitRegister,
    RefreshCatalog,
    ResetFilters,
    Borrow(RecordId),
    MarkReturned(RecordId),
    SubmitBook,
    CancelEdit,
    EditBook(RecordId),
    DeleteBook(RecordId),
    ConfirmDelete,
    CancelDelete,
    Quit,
}

/// Fine-grained input modes layered over the active view.
pub(crate) enum Mode {
    Normal,
    EditingSearch,
    ConfirmDelete(ConfirmDelete),
}

/// Which half of the admin view receives keys.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum AdminFocus {
    Table,
    Form,
}

/// Central controller state. The session store and the view router are the
/// only writers of session and view state; everything else reads them.
pub struct App {
    pub(crate) gateway: Gateway,
    pub(crate) runner: Box<dyn RequestRunner>,
    pub(crate) sessions: SessionStore,
    pub(crate) router: ViewRouter,
    pub(crate) chrome: NavChrome,
    pub(crate) notifier: Notifier,
    pub(crate) catalog: Catalog,
    pub(crate) filters: FilterForm,
    pub(crate) login: LoginForm,
    pub(crate) register: RegisterForm,
    pub(crate) book_form: BookForm,
    pub(crate) admin_focus: AdminFocus,
    pub(crate) mode: Mode,
    pub(crate) grid_selected: usize,
    pub(crate) table_selected: usize,
    pub(crate) next_ticket: u64,
    pub(crate) in_flight: usize,
}

impl App {
    /// Build the controller around a restored session. A signed-in start
    /// lands on the catalog and fetches it right away.
    pub fn new(
        gateway: Gateway,
        runner: Box<dyn RequestRunner>,
        sessions: SessionStore,
        notice_duration: Duration,
    ) -> Self {
        let router = ViewRouter::initial(sessions.session());
        let chrome = NavChrome::for_session(sessions.session());
        let mut app = Self {
            gateway,
            runner,
            sessions,
            router,
            chrome,
            notifier: Notifier::new(notice_duration),
            catalog: Catalog::default(),
            filters: FilterForm::default(),
            login: LoginForm::default(),
            register: RegisterForm::default(),
            book_form: BookForm::default(),
            admin_focus: AdminFocus::Table,
            mode: Mode::Normal,
            grid_selected: 0,
            table_selected: 0,
            next_ticket: 0,
            in_flight: 0,
        };
        if app.router.active().shows_catalog() {
            app.refresh_catalog();
        }
        app
    }

    pub fn session(&self) -> &Session {
        self.sessions.session()
    }

    pub fn active_view(&self) -> View {
        self.router.active()
    }

    pub fn chrome(&self) -> NavChrome {
        self.chrome
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn category_facet(&self) -> &CategoryFacet {
        &self.filters.category
    }

    /// Latest notice, ignoring whether it has expired yet.
    pub fn notice(&self) -> Option<&Notice> {
        self.notifier.latest()
    }

    /// Label of the admin form's submit action.
    pub fn book_form_label(&self) -> &'static str {
        self.book_form.submit_label()
    }

    pub fn pending_delete(&self) -> Option<&RecordId> {
        match &self.mode {
            Mode::ConfirmDelete(confirm) => Some(&confirm.id),
            _ => None,
        }
    }

    /// Requests submitted and not yet completed.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Apply finished requests and expire the notice. Returns `true` when
    /// something changed and a redraw is due.
    pub fn pump(&mut self) -> bool {
        let completions = self.runner.drain();
        let mut changed = !completions.is_empty();
        for completion in completions {
            self.complete(completion);
        }
        changed |= self.notifier.expire(Instant::now());
        changed
    }

    /// Route a gesture to its dispatcher. Returns `true` when the app should
    /// exit.
    pub fn dispatch(&mut self, intent: Intent) -> bool {
        match intent {
            Intent::Navigate(view) => self.navigate(view),
            Intent::Logout => self.logout(),
            Intent::SubmitLogin => self.submit_login(),
            Intent::SubmitRegister => self.submit_register(),
            Intent::RefreshCatalog => self.refresh_catalog(),
            Intent::ResetFilters => self.reset_filters(),
            Intent::Borrow(id) => self.borrow(id),
            Intent::MarkReturned(id) => self.mark_returned(id),
            Intent::SubmitBook => self.submit_book(),
            Intent::CancelEdit => self.cancel_edit(),
            Intent::EditBook(id) => self.load_for_edit(id),
            Intent::DeleteBook(id) => self.request_delete(id),
            Intent::ConfirmDelete => self.confirm_delete(),
            Intent::CancelDelete => self.cancel_delete(),
            Intent::Quit => return true,
        }
        false
    }

    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        if matches!(self.mode, Mode::ConfirmDelete(_)) {
            return match code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.dispatch(Intent::ConfirmDelete),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.dispatch(Intent::CancelDelete)
                }
                _ => false,
            };
        }

        if let Some(intent) = self.global_intent(code) {
            return self.dispatch(intent);
        }

        let intent = match self.router.active() {
            View::Login => self.handle_login_key(code),
            View::Register => self.handle_register_key(code),
            View::Catalog => self.handle_catalog_key(code),
            View::Admin => self.handle_admin_key(code),
        };
        match intent {
            Some(intent) => self.dispatch(intent),
            None => false,
        }
    }

    /// Function keys work from every view. Hidden navigation entries do not
    /// respond; the admin entry always asks so the router can refuse it.
    fn global_intent(&self, code: KeyCode) -> Option<Intent> {
        match code {
            KeyCode::F(1) => Some(Intent::Navigate(View::Catalog)),
            KeyCode::F(2) => Some(Intent::Navigate(View::Admin)),
            KeyCode::F(3) if self.chrome.login => Some(Intent::Navigate(View::Login)),
            KeyCode::F(4) if self.chrome.register => Some(Intent::Navigate(View::Register)),
            KeyCode::F(5) => Some(Intent::RefreshCatalog),
            KeyCode::F(10) if self.chrome.logout => Some(Intent::Logout),
            _ => None,
        }
    }

    fn handle_login_key(&mut self, code: KeyCode) -> Option<Intent> {
        match code {
            KeyCode::Enter => return Some(Intent::SubmitLogin),
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.login.toggle_field()
            }
            KeyCode::Backspace => self.login.backspace(),
            KeyCode::Char(ch) => {
                self.login.push_char(ch);
            }
            _ => {}
        }
        None
    }

    fn handle_register_key(&mut self, code: KeyCode) -> Option<Intent> {
        match code {
            KeyCode::Enter => return Some(Intent::SubmitRegister),
            KeyCode::Tab | KeyCode::Down => self.register.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.register.previous_field(),
            KeyCode::Backspace => self.register.backspace(),
            KeyCode::Char(ch) => {
                self.register.push_char(ch);
            }
            _ => {}
        }
        None
    }

    fn handle_catalog_key(&mut self, code: KeyCode) -> Option<Intent> {
        if matches!(self.mode, Mode::EditingSearch) {
            match code {
                KeyCode::Enter => {
                    self.mode = Mode::Normal;
                    return Some(Intent::RefreshCatalog);
                }
                KeyCode::Esc => self.mode = Mode::Normal,
                KeyCode::Backspace => {
                    self.filters.search.pop();
                }
                KeyCode::Char(ch) if !ch.is_control() => self.filters.search.push(ch),
                _ => {}
            }
            return None;
        }

        match code {
            KeyCode::Char('q') => return Some(Intent::Quit),
            KeyCode::Up => self.move_grid(-1),
            KeyCode::Down => self.move_grid(1),
            KeyCode::PageUp => self.move_grid(-5),
            KeyCode::PageDown => self.move_grid(5),
            KeyCode::Char('/') => self.mode = Mode::EditingSearch,
            KeyCode::Char('c') => self.filters.category.cycle(1),
            KeyCode::Char('C') => self.filters.category.cycle(-1),
            KeyCode::Char('s') => self.filters.status.cycle(),
            KeyCode::Char('x') => return Some(Intent::ResetFilters),
            KeyCode::Char('r') | KeyCode::Enter => return Some(Intent::RefreshCatalog),
            KeyCode::Char('b') => return self.selected_card_intent(CardAction::Borrow),
            KeyCode::Char('m') => return self.selected_card_intent(CardAction::MarkReturned),
            _ => {}
        }
        None
    }

    /// Only a control the selected card actually shows can be triggered.
    fn selected_card_intent(&self, action: CardAction) -> Option<Intent> {
        let card = self.catalog.card(self.grid_selected)?;
        if !card.offers(action) {
            return None;
        }
        let id = card.book.id.clone();
        Some(match action {
            CardAction::Borrow => Intent::Borrow(id),
            CardAction::MarkReturned => Intent::MarkReturned(id),
        })
    }

    fn handle_admin_key(&mut self, code: KeyCode) -> Option<Intent> {
        match self.admin_focus {
            AdminFocus::Table => match code {
                KeyCode::Char('q') => return Some(Intent::Quit),
                KeyCode::Up => self.move_table(-1),
                KeyCode::Down => self.move_table(1),
                KeyCode::PageUp => self.move_table(-5),
                KeyCode::PageDown => self.move_table(5),
                KeyCode::Tab | KeyCode::Char('a') => self.admin_focus = AdminFocus::Form,
                KeyCode::Char('c') => return Some(Intent::CancelEdit),
                KeyCode::Char('e') => {
                    return self
                        .catalog
                        .admin_row(self.table_selected)
                        .map(|book| Intent::EditBook(book.id.clone()))
                }
                KeyCode::Char('d') => {
                    return self
                        .catalog
                        .admin_row(self.table_selected)
                        .map(|book| Intent::DeleteBook(book.id.clone()))
                }
                _ => {}
            },
            AdminFocus::Form => match code {
                KeyCode::Esc => self.admin_focus = AdminFocus::Table,
                KeyCode::Enter => return Some(Intent::SubmitBook),
                KeyCode::Tab | KeyCode::Down => self.book_form.next_field(),
                KeyCode::BackTab | KeyCode::Up => self.book_form.previous_field(),
                KeyCode::Left | KeyCode::Right
                    if self.book_form.active == super::forms::BookField::Status =>
                {
                    self.book_form.toggle_status()
                }
                KeyCode::Backspace => self.book_form.backspace(),
                KeyCode::Char(ch) => {
                    self.book_form.push_char(ch);
                }
                _ => {}
            },
        }
        None
    }

    fn move_grid(&mut self, offset: isize) {
        self.grid_selected = step_index(self.grid_selected, offset, self.catalog.grid().len());
    }

    fn move_table(&mut self, offset: isize) {
        let len = self.catalog.admin_rows().map(<[_]>::len).unwrap_or(0);
        self.table_selected = step_index(self.table_selected, offset, len);
    }

    /// Keep selections inside the freshly rendered lists.
    pub(crate) fn clamp_selections(&mut self) {
        self.grid_selected = step_index(self.grid_selected, 0, self.catalog.grid().len());
        let rows = self.catalog.admin_rows().map(<[_]>::len).unwrap_or(0);
        self.table_selected = step_index(self.table_selected, 0, rows);
    }

    pub(crate) fn notify<S: Into<String>>(&mut self, text: S, kind: NoticeKind) {
        self.notifier.show(text, kind, Instant::now());
    }

    pub(crate) fn take_mode(&mut self) -> Mode {
        mem::replace(&mut self.mode, Mode::Normal)
    }
}

fn step_index(current: usize, offset: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let next = current as isize + offset;
    next.clamp(0, len as isize - 1) as usize
}
