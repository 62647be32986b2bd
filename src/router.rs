//! Single-active-view state machine and the role-sensitive navigation chrome.

use crate::error::AccessDenied;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Register,
    Catalog,
    Admin,
}

impl View {
    pub const ALL: [View; 4] = [View::Login, View::Register, View::Catalog, View::Admin];

    /// Views whose content comes from the catalog service.
    pub fn shows_catalog(self) -> bool {
        matches!(self, View::Catalog | View::Admin)
    }

    pub fn title(self) -> &'static str {
        match self {
            View::Login => "Login",
            View::Register => "Register",
            View::Catalog => "Books",
            View::Admin => "Admin",
        }
    }
}

/// Owns the active view. Nothing else writes it.
#[derive(Debug)]
pub struct ViewRouter {
    active: View,
}

impl ViewRouter {
    /// Signed-in users land on the catalog, everyone else on the login form.
    pub fn initial(session: &Session) -> Self {
        let active = if session.is_signed_in() {
            View::Catalog
        } else {
            View::Login
        };
        Self { active }
    }

    pub fn active(&self) -> View {
        self.active
    }

    /// Handle an explicit navigation request. On success the returned flag
    /// says whether the catalog must be refreshed, which is true on every
    /// entry into a catalog view, including re-entry.
    pub fn request(&mut self, view: View, session: &Session) -> Result<bool, AccessDenied> {
        if view == View::Admin && !session.is_admin() {
            return Err(AccessDenied::AdminOnly);
        }
        self.active = view;
        Ok(view.shows_catalog())
    }

    /// Transition driven by the controller itself (login, logout, edit-load).
    pub fn force(&mut self, view: View) {
        self.active = view;
    }
}

/// Which navigation entries are offered. Recomputed on every session change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavChrome {
    pub login: bool,
    pub register: bool,
    pub logout: bool,
    pub admin: bool,
}

impl NavChrome {
    pub fn for_session(session: &Session) -> Self {
        let signed_in = session.is_signed_in();
        Self {
            login: !signed_in,
            register: !signed_in,
            logout: signed_in,
            admin: session.is_admin(),
        }
    }

    pub fn offers(&self, view: View) -> bool {
        match view {
            View::Login => self.login,
            View::Register => self.register,
            View::Catalog => true,
            View::Admin => self.admin,
        }
    }
}
