use std::cmp::min;
use std::time::Instant;

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;

use crate::catalog::{CardAction, GridCard, NO_BOOKS_FOUND, NO_BOOKS_IN_SYSTEM};
use crate::models::BookStatus;
use crate::router::View;

use super::app::{AdminFocus, App, Mode};
use super::forms::{field_line, BookField, ConfirmDelete, LoginField, RegisterField};
use super::helpers::{centered_rect, key_hints};

/// Rows reserved for the navigation header.
const HEADER_HEIGHT: u16 = 3;
/// Footer space reserved for the notice and key instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Height allocation per book card in the grid.
const BOOK_CARD_HEIGHT: u16 = 8;

impl App {
    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT.min(area.height)),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_header(frame, chunks[0]);
        match self.router.active() {
            View::Login => self.draw_login(frame, chunks[1]),
            View::Register => self.draw_register(frame, chunks[1]),
            View::Catalog => self.draw_catalog(frame, chunks[1]),
            View::Admin => self.draw_admin(frame, chunks[1]),
        }
        self.draw_footer(frame, chunks[2]);

        if let Mode::ConfirmDelete(confirm) = &self.mode {
            self.draw_confirm_delete(frame, area, confirm);
        }
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let active = self.router.active();
        let mut spans = vec![Span::styled(
            " Library Catalog ",
            Style::default().add_modifier(Modifier::BOLD),
        )];
        for (key, view) in [
            ("F1", View::Catalog),
            ("F2", View::Admin),
            ("F3", View::Login),
            ("F4", View::Register),
        ] {
            if !self.chrome.offers(view) {
                continue;
            }
            let style = if view == active {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            spans.push(Span::raw("  "));
            spans.push(Span::styled(format!("[{key}] {}", view.title()), style));
        }
        if self.chrome.logout {
            spans.push(Span::raw("  "));
            spans.push(Span::styled("[F10] Logout", Style::default().fg(Color::Gray)));
        }

        let who = match self.session().user() {
            Some(user) => format!("{} ({:?})", user.name, user.role),
            None => "Not signed in".to_string(),
        };
        let title = if self.in_flight > 0 {
            format!(" {who} · loading… ")
        } else {
            format!(" {who} ")
        };

        let block = Block::default().borders(Borders::BOTTOM).title(title);
        let paragraph = Paragraph::new(Line::from(spans)).block(block);
        frame.render_widget(paragraph, area);
    }

    fn draw_login(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(60, 50, area);
        let block = Block::default().title("Login").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let form = &self.login;
        let lines = vec![
            field_line(
                "Email",
                &form.email,
                "<required>",
                form.active == LoginField::Email,
                false,
            ),
            field_line(
                "Password",
                &form.password,
                "<required>",
                form.active == LoginField::Password,
                true,
            ),
            Line::from(""),
            Line::from(Span::styled(
                "Enter to sign in • Tab to switch • F4 to register",
                Style::default().fg(Color::Gray),
            )),
        ];
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        let (prefix, len, row) = match form.active {
            LoginField::Email => ("Email: ", form.email.chars().count(), 0),
            LoginField::Password => ("Password: ", form.password.chars().count(), 1),
        };
        frame.set_cursor_position((inner.x + (prefix.len() + len) as u16, inner.y + row));
    }

    fn draw_register(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(60, 50, area);
        let block = Block::default().title("Register").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let form = &self.register;
        let lines = vec![
            field_line(
                "Name",
                &form.name,
                "<required>",
                form.active == RegisterField::Name,
                false,
            ),
            field_line(
                "Email",
                &form.email,
                "<required>",
                form.active == RegisterField::Email,
                false,
            ),
            field_line(
                "Password",
                &form.password,
                "<required>",
                form.active == RegisterField::Password,
                true,
            ),
            Line::from(""),
            Line::from(Span::styled(
                "Enter to create account • Tab to switch • F3 to log in",
                Style::default().fg(Color::Gray),
            )),
        ];
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        let (prefix, len, row) = match form.active {
            RegisterField::Name => ("Name: ", form.name.chars().count(), 0),
            RegisterField::Email => ("Email: ", form.email.chars().count(), 1),
            RegisterField::Password => ("Password: ", form.password.chars().count(), 2),
        };
        frame.set_cursor_position((inner.x + (prefix.len() + len) as u16, inner.y + row));
    }

    fn draw_catalog(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let searching = matches!(self.mode, Mode::EditingSearch);
        let search_style = if searching {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let filter_line = Line::from(vec![
            Span::raw("Search: "),
            Span::styled(self.filters.search.clone(), search_style),
            Span::raw("   Category: "),
            Span::styled(
                self.filters.category.selected_label().to_string(),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw("   Status: "),
            Span::styled(
                self.filters.status.label(),
                Style::default().fg(Color::Cyan),
            ),
        ]);
        let block = Block::default().borders(Borders::ALL).title("Filters");
        frame.render_widget(Paragraph::new(filter_line).block(block.clone()), chunks[0]);
        if searching {
            let inner = block.inner(chunks[0]);
            let cursor_x =
                inner.x + "Search: ".len() as u16 + self.filters.search.chars().count() as u16;
            frame.set_cursor_position((cursor_x, inner.y));
        }

        let grid = self.catalog.grid();
        if grid.is_empty() {
            let message = Paragraph::new(NO_BOOKS_FOUND)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::NONE));
            frame.render_widget(message, chunks[1]);
            return;
        }
        self.render_book_cards(frame, chunks[1], grid, self.grid_selected);
    }

    fn render_book_cards(&self, frame: &mut Frame, area: Rect, cards: &[GridCard], selected: usize) {
        if area.height == 0 {
            return;
        }

        let card_height = BOOK_CARD_HEIGHT as usize;
        let capacity = ((area.height as usize) / card_height).max(1);
        let len = cards.len();
        let mut start = if selected >= capacity {
            selected + 1 - capacity
        } else {
            0
        };
        if start + capacity > len {
            start = len.saturating_sub(capacity);
        }
        let end = min(start + capacity, len);
        let visible_len = end.saturating_sub(start);
        if visible_len == 0 {
            return;
        }

        let constraints: Vec<Constraint> = (0..visible_len)
            .map(|_| Constraint::Length(BOOK_CARD_HEIGHT))
            .collect();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        for (idx, chunk) in rows.iter().enumerate() {
            let card_index = start + idx;
            let Some(card) = cards.get(card_index) else {
                break;
            };
            let book = &card.book;
            let is_selected = card_index == selected;

            let mut block = Block::default().borders(Borders::ALL);
            if is_selected {
                block = block.border_style(Style::default().fg(Color::Yellow));
            }

            let title = if is_selected {
                format!("▶ {}", book.title)
            } else {
                book.title.clone()
            };
            let mut lines = vec![
                Line::from(Span::styled(
                    title,
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    format!("by {}", book.author),
                    Style::default().fg(Color::Gray),
                )),
            ];

            let mut meta = Vec::new();
            if let Some(category) = book.category_label() {
                meta.push(format!("Category: {category}"));
            }
            if let Some(isbn) = book.isbn.as_deref().filter(|isbn| !isbn.trim().is_empty()) {
                meta.push(format!("ISBN: {isbn}"));
            }
            if !meta.is_empty() {
                lines.push(Line::from(meta.join("   ")));
            }

            let mut status_spans = vec![
                Span::raw("Status: "),
                Span::styled(book.status.to_string(), status_style(book.status)),
            ];
            if let Some(due) = book.due_label() {
                status_spans.push(Span::raw(format!("   Due: {due}")));
            }
            lines.push(Line::from(status_spans));

            if let Some(description) = book
                .description
                .as_deref()
                .filter(|description| !description.trim().is_empty())
            {
                lines.push(Line::from(Span::styled(
                    description.to_string(),
                    Style::default().fg(Color::DarkGray),
                )));
            }

            if !card.actions.is_empty() {
                let pairs: Vec<(&str, &str)> = card
                    .actions
                    .iter()
                    .map(|action| match action {
                        CardAction::Borrow => ("b", action.label()),
                        CardAction::MarkReturned => ("m", action.label()),
                    })
                    .collect();
                lines.push(key_hints(&pairs));
            }

            let paragraph = Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: true })
                .alignment(Alignment::Left);
            frame.render_widget(paragraph, *chunk);
        }
    }

    fn draw_admin(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        self.draw_admin_table(frame, chunks[0]);
        self.draw_book_form(frame, chunks[1]);
    }

    fn draw_admin_table(&self, frame: &mut Frame, area: Rect) {
        let focused = self.admin_focus == AdminFocus::Table;
        let mut block = Block::default().borders(Borders::ALL).title("Books");
        if focused {
            block = block.border_style(Style::default().fg(Color::Yellow));
        }

        let rows = match self.catalog.admin_rows() {
            Some(rows) if !rows.is_empty() => rows,
            _ => {
                let message = Paragraph::new(NO_BOOKS_IN_SYSTEM)
                    .alignment(Alignment::Center)
                    .block(block);
                frame.render_widget(message, area);
                return;
            }
        };

        let header = Row::new(["ID", "Title", "Author", "Category", "Status"])
            .style(Style::default().add_modifier(Modifier::BOLD));
        let body: Vec<Row> = rows
            .iter()
            .map(|book| {
                Row::new(vec![
                    Cell::from(book.id.to_string()),
                    Cell::from(book.title.clone()),
                    Cell::from(book.author.clone()),
                    Cell::from(book.category_label().unwrap_or("-").to_string()),
                    Cell::from(Span::styled(
                        book.status.to_string(),
                        status_style(book.status),
                    )),
                ])
            })
            .collect();
        let widths = [
            Constraint::Length(6),
            Constraint::Percentage(35),
            Constraint::Percentage(25),
            Constraint::Percentage(20),
            Constraint::Length(10),
        ];
        let table = Table::new(body, widths)
            .header(header)
            .block(block)
            .row_highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("▶ ");

        let mut state = TableState::default();
        state.select(Some(self.table_selected));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_book_form(&self, frame: &mut Frame, area: Rect) {
        let focused = self.admin_focus == AdminFocus::Form;
        let form = &self.book_form;
        let title = match &form.id {
            Some(id) => format!("{} #{id}", form.submit_label()),
            None => form.submit_label().to_string(),
        };
        let mut block = Block::default().borders(Borders::ALL).title(title);
        if focused {
            block = block.border_style(Style::default().fg(Color::Yellow));
        }
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let mut lines: Vec<Line> = BookField::ORDER
            .iter()
            .map(|field| form.build_line(*field, focused))
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(
                "Enter to {} • Esc to leave form • c to cancel edit",
                form.submit_label().to_lowercase()
            ),
            Style::default().fg(Color::Gray),
        )));
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);

        if focused && form.active != BookField::Status {
            let row = BookField::ORDER
                .iter()
                .position(|field| *field == form.active)
                .unwrap_or(0) as u16;
            let prefix = format!("{}: ", form.active.label());
            let len = form.value_len(form.active);
            frame.set_cursor_position((inner.x + (prefix.len() + len) as u16, inner.y + row));
        }
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = match self.notifier.visible(Instant::now()) {
            Some(notice) => Line::from(Span::styled(notice.text.clone(), notice.kind.style())),
            None => Line::from(""),
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        match (self.router.active(), &self.mode) {
            (_, Mode::ConfirmDelete(_)) => key_hints(&[("y", "Delete"), ("n/Esc", "Keep")]),
            (View::Catalog, Mode::EditingSearch) => {
                key_hints(&[("Enter", "Search"), ("Esc", "Done")])
            }
            (View::Catalog, _) => key_hints(&[
                ("↑↓", "Select"),
                ("/", "Search"),
                ("c", "Category"),
                ("s", "Status"),
                ("r", "Refresh"),
                ("x", "Reset"),
                ("q", "Quit"),
            ]),
            (View::Admin, _) if self.admin_focus == AdminFocus::Form => key_hints(&[
                ("↑↓", "Field"),
                ("Space", "Toggle status"),
                ("Enter", "Save"),
                ("Esc", "Table"),
            ]),
            (View::Admin, _) => key_hints(&[
                ("↑↓", "Select"),
                ("e", "Edit"),
                ("d", "Delete"),
                ("a", "Form"),
                ("c", "Cancel edit"),
                ("q", "Quit"),
            ]),
            (View::Login, _) | (View::Register, _) => {
                key_hints(&[("Enter", "Submit"), ("Tab", "Next field"), ("Ctrl+C", "Quit")])
            }
        }
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Confirm Delete").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from("Are you sure you want to delete this book?"),
            Line::from(Span::styled(
                confirm.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }
}

fn status_style(status: BookStatus) -> Style {
    match status {
        BookStatus::Available => Style::default().fg(Color::Green),
        BookStatus::Borrowed => Style::default().fg(Color::Red),
    }
}
