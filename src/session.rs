//! Signed-in identity and its persistence.
//!
//! The credential token and the user profile are stored under two separate
//! keys so either can go missing on its own. A restore only yields a session
//! when both are present and the profile parses; anything else starts the
//! client signed out. `SessionStore` is the only writer of session state.

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::models::{Role, User};
use crate::storage::{get_item, remove_item, set_item};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub user: User,
}

/// Token and user travel together, so a half-populated session cannot be
/// represented.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    credentials: Option<Credentials>,
}

impl Session {
    pub fn signed_out() -> Self {
        Self { credentials: None }
    }

    pub fn signed_in(token: impl Into<String>, user: User) -> Self {
        Self {
            credentials: Some(Credentials {
                token: token.into(),
                user,
            }),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.credentials.as_ref().map(|creds| creds.token.as_str())
    }

    pub fn user(&self) -> Option<&User> {
        self.credentials.as_ref().map(|creds| &creds.user)
    }

    pub fn role(&self) -> Option<Role> {
        self.user().map(|user| user.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }
}

pub struct SessionStore {
    conn: Connection,
    session: Session,
    generation: u64,
}

impl SessionStore {
    /// Rebuild the session from storage. Read failures and unparseable
    /// profiles degrade to a signed-out session instead of blocking startup.
    pub fn restore(conn: Connection) -> Self {
        let session = match load_credentials(&conn) {
            Ok(Some(credentials)) => {
                info!(user = %credentials.user.email, "restored stored session");
                Session {
                    credentials: Some(credentials),
                }
            }
            Ok(None) => Session::signed_out(),
            Err(err) => {
                warn!(error = %err, "ignoring unreadable stored session");
                Session::signed_out()
            }
        };
        Self {
            conn,
            session,
            generation: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Bumped on every `set` and `clear`, so a caller can tell whether the
    /// session it saw earlier is still the current one.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Establish a new session and persist both entries. The in-memory session
    /// is replaced even when persisting fails; the error only means the
    /// session will not survive a restart.
    pub fn set(&mut self, token: &str, user: User) -> Result<()> {
        info!(user = %user.email, role = ?user.role, "session established");
        self.session = Session::signed_in(token, user);
        self.generation += 1;
        self.persist()
    }

    /// Drop the session and both stored entries.
    pub fn clear(&mut self) -> Result<()> {
        info!("session cleared");
        self.session = Session::signed_out();
        self.generation += 1;
        let tx = self
            .conn
            .unchecked_transaction()
            .context("failed to start storage transaction")?;
        remove_item(&tx, TOKEN_KEY)?;
        remove_item(&tx, USER_KEY)?;
        tx.commit().context("failed to commit session removal")
    }

    /// Both entries land together or not at all.
    fn persist(&self) -> Result<()> {
        let Some(credentials) = &self.session.credentials else {
            return Ok(());
        };
        let user_json =
            serde_json::to_string(&credentials.user).context("failed to encode user profile")?;
        let tx = self
            .conn
            .unchecked_transaction()
            .context("failed to start storage transaction")?;
        set_item(&tx, TOKEN_KEY, &credentials.token)?;
        set_item(&tx, USER_KEY, &user_json)?;
        tx.commit().context("failed to commit session")
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn load_credentials(conn: &Connection) -> Result<Option<Credentials>> {
    let token = get_item(conn, TOKEN_KEY)?.filter(|token| !token.is_empty());
    let user = get_item(conn, USER_KEY)?
        .and_then(|raw| serde_json::from_str::<User>(&raw).ok());

    Ok(match (token, user) {
        (Some(token), Some(user)) => Some(Credentials { token, user }),
        _ => None,
    })
}
