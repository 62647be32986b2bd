//! Single-slot footer notice with auto-expiry.

use std::time::{Duration, Instant};

use ratatui::style::{Color, Style};

pub const DEFAULT_DISPLAY: Duration = Duration::from_millis(3500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

impl NoticeKind {
    pub fn style(&self) -> Style {
        match self {
            NoticeKind::Success => Style::default().fg(Color::Green),
            NoticeKind::Error => Style::default().fg(Color::Red),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
    expires_at: Instant,
}

/// Holds at most one notice. A new `show` replaces the text, the style and
/// the deadline; nothing is queued.
#[derive(Debug)]
pub struct Notifier {
    current: Option<Notice>,
    display_for: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_DISPLAY)
    }
}

impl Notifier {
    pub fn new(display_for: Duration) -> Self {
        Self {
            current: None,
            display_for,
        }
    }

    pub fn show(&mut self, text: impl Into<String>, kind: NoticeKind, now: Instant) {
        self.current = Some(Notice {
            text: text.into(),
            kind,
            expires_at: now + self.display_for,
        });
    }

    /// The notice still on screen at `now`, if any.
    pub fn visible(&self, now: Instant) -> Option<&Notice> {
        self.current
            .as_ref()
            .filter(|notice| now < notice.expires_at)
    }

    /// Drop an expired notice. Returns `true` when something was hidden so the
    /// caller knows a redraw is due.
    pub fn expire(&mut self, now: Instant) -> bool {
        match &self.current {
            Some(notice) if now >= notice.expires_at => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    /// Last notice shown, ignoring expiry.
    pub fn latest(&self) -> Option<&Notice> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_hides_after_display_window() {
        let start = Instant::now();
        let mut notifier = Notifier::default();
        notifier.show("Saved.", NoticeKind::Success, start);

        assert!(notifier.visible(start + Duration::from_millis(3499)).is_some());
        assert!(notifier.visible(start + DEFAULT_DISPLAY).is_none());
        assert!(notifier.expire(start + DEFAULT_DISPLAY));
        assert!(notifier.latest().is_none());
    }

    #[test]
    fn new_notice_replaces_text_and_restarts_timer() {
        let start = Instant::now();
        let mut notifier = Notifier::default();
        notifier.show("first", NoticeKind::Success, start);
        notifier.show("second", NoticeKind::Error, start + Duration::from_secs(3));

        let later = start + Duration::from_millis(4000);
        let notice = notifier.visible(later).unwrap();
        assert_eq!(notice.text, "second");
        assert_eq!(notice.kind, NoticeKind::Error);
        assert!(!notifier.expire(later));
    }
}
