//! Catalog state as last rendered: the student grid, the admin table and the
//! category facet, plus the filter terms that drive a refresh.

use crate::models::{Book, BookStatus, RecordId};
use crate::session::Session;

pub const NO_BOOKS_FOUND: &str = "No books found.";
pub const NO_BOOKS_IN_SYSTEM: &str = "No books in the system.";
pub const ALL_CATEGORIES: &str = "All categories";

/// Filter terms read from the live form at fetch time. `None` means the
/// control is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}

impl FilterState {
    /// Query pairs for the non-empty terms only. The search term is trimmed.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let search = self.search.as_deref().map(str::trim);
        [
            ("search", search),
            ("category", self.category.as_deref()),
            ("status", self.status.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| match value {
            Some(value) if !value.is_empty() => Some((key.to_string(), value.to_string())),
            _ => None,
        })
        .collect()
    }
}

/// The category select: distinct non-empty categories in first-seen order,
/// plus the current selection (`""` is "All categories").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFacet {
    options: Vec<String>,
    selected: String,
}

impl CategoryFacet {
    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    pub fn selected_label(&self) -> &str {
        if self.selected.is_empty() {
            ALL_CATEGORIES
        } else {
            &self.selected
        }
    }

    /// Rebuild the options from `books`, keeping the selection when it is
    /// still offered and falling back to "All categories" otherwise. Values
    /// are kept exactly as the service sent them.
    pub fn rebuild(&mut self, books: &[Book]) {
        let mut options: Vec<String> = Vec::new();
        let raw = books
            .iter()
            .filter_map(|book| book.category.as_deref())
            .filter(|category| !category.is_empty());
        for category in raw {
            if !options.iter().any(|existing| existing == category) {
                options.push(category.to_string());
            }
        }
        if !options.contains(&self.selected) {
            self.selected.clear();
        }
        self.options = options;
    }

    /// Step through "All categories" and then each option, wrapping around.
    pub fn cycle(&mut self, offset: isize) {
        let len = self.options.len() as isize + 1;
        let current = self
            .options
            .iter()
            .position(|option| option == &self.selected)
            .map(|idx| idx as isize + 1)
            .unwrap_or(0);
        let next = (current + offset).rem_euclid(len);
        self.selected = if next == 0 {
            String::new()
        } else {
            self.options[(next - 1) as usize].clone()
        };
    }

    pub fn reset(&mut self) {
        self.selected.clear();
    }
}

/// Per-card action offered by the student grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardAction {
    Borrow,
    MarkReturned,
}

impl CardAction {
    pub fn label(&self) -> &'static str {
        match self {
            CardAction::Borrow => "Borrow",
            CardAction::MarkReturned => "Mark Returned",
        }
    }
}

/// Actions a card exposes for the session it is rendered under. Controls that
/// do not apply are not rendered at all.
pub fn card_actions(book: &Book, session: &Session) -> Vec<CardAction> {
    let mut actions = Vec::new();
    if session.is_signed_in() && book.status == BookStatus::Available {
        actions.push(CardAction::Borrow);
    }
    if session.is_admin() && book.status == BookStatus::Borrowed {
        actions.push(CardAction::MarkReturned);
    }
    actions
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridCard {
    pub book: Book,
    pub actions: Vec<CardAction>,
}

impl GridCard {
    pub fn offers(&self, action: CardAction) -> bool {
        self.actions.contains(&action)
    }
}

/// The rendered catalog surfaces. Only `render` replaces them, and it does so
/// with a fully decoded book list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    grid: Vec<GridCard>,
    admin_rows: Option<Vec<Book>>,
    renders: u64,
}

impl Catalog {
    /// Render the grid for everyone and the admin table for admins. For other
    /// roles the admin table keeps whatever it last showed.
    pub fn render(&mut self, books: &[Book], session: &Session) {
        self.grid = books
            .iter()
            .map(|book| GridCard {
                book: book.clone(),
                actions: card_actions(book, session),
            })
            .collect();
        if session.is_admin() {
            self.admin_rows = Some(books.to_vec());
        }
        self.renders += 1;
    }

    /// Forget the admin table, e.g. when its session ends.
    pub fn clear_admin_rows(&mut self) {
        self.admin_rows = None;
    }

    pub fn grid(&self) -> &[GridCard] {
        &self.grid
    }

    /// Rows of the admin table; `None` until an admin refresh has rendered it.
    pub fn admin_rows(&self) -> Option<&[Book]> {
        self.admin_rows.as_deref()
    }

    pub fn card(&self, index: usize) -> Option<&GridCard> {
        self.grid.get(index)
    }

    pub fn admin_row(&self, index: usize) -> Option<&Book> {
        self.admin_rows.as_ref().and_then(|rows| rows.get(index))
    }

    pub fn grid_ids(&self) -> Vec<RecordId> {
        self.grid.iter().map(|card| card.book.id.clone()).collect()
    }

    /// Number of successful renders so far.
    pub fn render_count(&self) -> u64 {
        self.renders
    }
}
