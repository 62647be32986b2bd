use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::catalog::{CategoryFacet, FilterState};
use crate::models::{Book, BookPayload, BookStatus, LoginRequest, RecordId, RegisterRequest};

pub(crate) const ADD_BOOK_LABEL: &str = "Add Book";
pub(crate) const UPDATE_BOOK_LABEL: &str = "Update Book";

/// Render one `Label: value` line. Secret values are masked, empty values
/// show their placeholder, and the focused field is highlighted.
pub(crate) fn field_line(
    field_name: &str,
    value: &str,
    placeholder: &str,
    is_active: bool,
    secret: bool,
) -> Line<'static> {
    let display = if value.is_empty() {
        placeholder.to_string()
    } else if secret {
        "*".repeat(value.chars().count())
    } else {
        value.to_string()
    };

    let style = if is_active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{field_name}: ")),
        Span::styled(display, style),
    ])
}

fn push_visible(target: &mut String, ch: char) -> bool {
    if ch.is_control() {
        return false;
    }
    target.push(ch);
    true
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum LoginField {
    #[default]
    Email,
    Password,
}

#[derive(Default, Clone, Debug)]
pub(crate) struct LoginForm {
    pub(crate) email: String,
    pub(crate) password: String,
    pub(crate) active: LoginField,
}

impl LoginForm {
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            LoginField::Email => LoginField::Password,
            LoginField::Password => LoginField::Email,
        };
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        match self.active {
            LoginField::Email => push_visible(&mut self.email, ch),
            LoginField::Password => push_visible(&mut self.password, ch),
        }
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            LoginField::Email => self.email.pop(),
            LoginField::Password => self.password.pop(),
        };
    }

    /// Trimmed credentials as sent to `/auth/login`.
    pub(crate) fn request(&self) -> LoginRequest {
        LoginRequest {
            email: self.email.trim().to_string(),
            password: self.password.trim().to_string(),
        }
    }

    pub(crate) fn clear_secret(&mut self) {
        self.password.clear();
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum RegisterField {
    #[default]
    Name,
    Email,
    Password,
}

#[derive(Default, Clone, Debug)]
pub(crate) struct RegisterForm {
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) password: String,
    pub(crate) active: RegisterField,
}

impl RegisterForm {
    pub(crate) fn next_field(&mut self) {
        self.active = match self.active {
            RegisterField::Name => RegisterField::Email,
            RegisterField::Email => RegisterField::Password,
            RegisterField::Password => RegisterField::Name,
        };
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = match self.active {
            RegisterField::Name => RegisterField::Password,
            RegisterField::Email => RegisterField::Name,
            RegisterField::Password => RegisterField::Email,
        };
    }

    fn active_value(&mut self) -> &mut String {
        match self.active {
            RegisterField::Name => &mut self.name,
            RegisterField::Email => &mut self.email,
            RegisterField::Password => &mut self.password,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        push_visible(self.active_value(), ch)
    }

    pub(crate) fn backspace(&mut self) {
        self.active_value().pop();
    }

    pub(crate) fn request(&self) -> RegisterRequest {
        RegisterRequest {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.trim().to_string(),
        }
    }

    pub(crate) fn clear_secret(&mut self) {
        self.password.clear();
    }
}

/// Fields of the admin book form, in focus order.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum BookField {
    #[default]
    Title,
    Author,
    Isbn,
    Category,
    Description,
    Status,
}

impl BookField {
    pub(crate) const ORDER: [BookField; 6] = [
        BookField::Title,
        BookField::Author,
        BookField::Isbn,
        BookField::Category,
        BookField::Description,
        BookField::Status,
    ];

    pub(crate) fn label(&self) -> &'static str {
        match self {
            BookField::Title => "Title",
            BookField::Author => "Author",
            BookField::Isbn => "ISBN",
            BookField::Category => "Category",
            BookField::Description => "Description",
            BookField::Status => "Status",
        }
    }

    fn step(self, offset: isize) -> Self {
        let len = Self::ORDER.len() as isize;
        let index = Self::ORDER
            .iter()
            .position(|field| *field == self)
            .unwrap_or(0) as isize;
        Self::ORDER[(index + offset).rem_euclid(len) as usize]
    }
}

/// Create/edit form on the admin view. Holding an id means edit mode.
#[derive(Default, Clone, Debug)]
pub(crate) struct BookForm {
    pub(crate) id: Option<RecordId>,
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) isbn: String,
    pub(crate) category: String,
    pub(crate) description: String,
    pub(crate) status: BookStatus,
    pub(crate) active: BookField,
}

impl BookForm {
    /// Populate the form from a fetched book; missing optional fields become
    /// empty strings.
    pub(crate) fn from_book(book: &Book) -> Self {
        Self {
            id: Some(book.id.clone()),
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone().unwrap_or_default(),
            category: book.category.clone().unwrap_or_default(),
            description: book.description.clone().unwrap_or_default(),
            status: book.status,
            active: BookField::Title,
        }
    }

    pub(crate) fn is_editing(&self) -> bool {
        self.id.is_some()
    }

    pub(crate) fn submit_label(&self) -> &'static str {
        if self.is_editing() {
            UPDATE_BOOK_LABEL
        } else {
            ADD_BOOK_LABEL
        }
    }

    /// Back to the blank create state.
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn next_field(&mut self) {
        self.active = self.active.step(1);
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = self.active.step(-1);
    }

    fn active_text(&mut self) -> Option<&mut String> {
        match self.active {
            BookField::Title => Some(&mut self.title),
            BookField::Author => Some(&mut self.author),
            BookField::Isbn => Some(&mut self.isbn),
            BookField::Category => Some(&mut self.category),
            BookField::Description => Some(&mut self.description),
            BookField::Status => None,
        }
    }

    /// Type into the focused field. On the status field a space toggles the
    /// status instead.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if self.active == BookField::Status {
            if ch == ' ' {
                self.toggle_status();
                return true;
            }
            return false;
        }
        match self.active_text() {
            Some(value) => push_visible(value, ch),
            None => false,
        }
    }

    pub(crate) fn backspace(&mut self) {
        if let Some(value) = self.active_text() {
            value.pop();
        }
    }

    pub(crate) fn toggle_status(&mut self) {
        self.status = self.status.toggled();
    }

    /// Trimmed payload, or the validation message when title or author is
    /// blank.
    pub(crate) fn payload(&self) -> Result<BookPayload, &'static str> {
        let payload = BookPayload {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            isbn: self.isbn.trim().to_string(),
            category: self.category.trim().to_string(),
            description: self.description.trim().to_string(),
            status: self.status,
        };
        if payload.title.is_empty() || payload.author.is_empty() {
            return Err("Title and author are required.");
        }
        Ok(payload)
    }

    /// Characters typed into a text field; the status field has none.
    pub(crate) fn value_len(&self, field: BookField) -> usize {
        match field {
            BookField::Title => self.title.chars().count(),
            BookField::Author => self.author.chars().count(),
            BookField::Isbn => self.isbn.chars().count(),
            BookField::Category => self.category.chars().count(),
            BookField::Description => self.description.chars().count(),
            BookField::Status => 0,
        }
    }

    pub(crate) fn build_line(&self, field: BookField, focused: bool) -> Line<'static> {
        let is_active = focused && self.active == field;
        match field {
            BookField::Title => field_line("Title", &self.title, "<required>", is_active, false),
            BookField::Author => field_line("Author", &self.author, "<required>", is_active, false),
            BookField::Isbn => field_line("ISBN", &self.isbn, "<optional>", is_active, false),
            BookField::Category => {
                field_line("Category", &self.category, "<optional>", is_active, false)
            }
            BookField::Description => field_line(
                "Description",
                &self.description,
                "<optional>",
                is_active,
                false,
            ),
            BookField::Status => field_line(
                "Status",
                &format!("< {} >", self.status),
                "",
                is_active,
                false,
            ),
        }
    }
}

/// Status filter choices, `None` meaning any status.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) struct StatusFilter(pub(crate) Option<BookStatus>);

impl StatusFilter {
    pub(crate) fn cycle(&mut self) {
        self.0 = match self.0 {
            None => Some(BookStatus::Available),
            Some(BookStatus::Available) => Some(BookStatus::Borrowed),
            Some(BookStatus::Borrowed) => None,
        };
    }

    pub(crate) fn value(&self) -> &'static str {
        self.0.map(|status| status.as_str()).unwrap_or("")
    }

    pub(crate) fn label(&self) -> &'static str {
        match self.0 {
            None => "All statuses",
            Some(BookStatus::Available) => "Available",
            Some(BookStatus::Borrowed) => "Borrowed",
        }
    }
}

/// The filter bar on the catalog view. It is the source of truth for the
/// next refresh's terms.
#[derive(Default, Clone, Debug)]
pub(crate) struct FilterForm {
    pub(crate) search: String,
    pub(crate) category: CategoryFacet,
    pub(crate) status: StatusFilter,
}

impl FilterForm {
    pub(crate) fn read(&self) -> FilterState {
        FilterState {
            search: Some(self.search.clone()),
            category: Some(self.category.selected().to_string()),
            status: Some(self.status.value().to_string()),
        }
    }

    pub(crate) fn reset(&mut self) {
        self.search.clear();
        self.category.reset();
        self.status = StatusFilter::default();
    }
}

/// Pending deletion waiting for an explicit yes.
#[derive(Clone, Debug)]
pub(crate) struct ConfirmDelete {
    pub(crate) id: RecordId,
    pub(crate) title: String,
}
