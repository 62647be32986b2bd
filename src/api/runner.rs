use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use serde_json::Value;
use tracing::{debug, warn};

use super::gateway::normalize_response;
use super::{ApiRequest, Transport};
use crate::error::ApiError;
use crate::models::RecordId;

/// What the controller does with a call's outcome once it arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Purpose {
    Login,
    Register,
    RefreshCatalog,
    Borrow(RecordId),
    Return(RecordId),
    CreateBook,
    UpdateBook(RecordId),
    DeleteBook(RecordId),
    LoadForEdit(RecordId),
}

impl Purpose {
    /// Calls that change server state and are followed by a catalog refresh.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Purpose::Borrow(_)
                | Purpose::Return(_)
                | Purpose::CreateBook
                | Purpose::UpdateBook(_)
                | Purpose::DeleteBook(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub id: u64,
    pub purpose: Purpose,
    /// Generation of the session whose credential the request carried, or
    /// `None` for anonymous requests. A 401 only ends that same session.
    pub session: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub ticket: Ticket,
    pub outcome: Result<Option<Value>, ApiError>,
}

/// Runs prepared requests without blocking the event loop and hands back
/// their completions in arrival order.
pub trait RequestRunner {
    fn submit(&mut self, ticket: Ticket, request: ApiRequest);
    fn drain(&mut self) -> Vec<Completion>;
}

/// One worker thread per request. Completions are posted over a channel and
/// collected by `drain`; nothing is cancelled or reordered.
pub struct ThreadedRunner {
    transport: Arc<dyn Transport>,
    sender: Sender<Completion>,
    receiver: Receiver<Completion>,
}

impl ThreadedRunner {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            transport,
            sender,
            receiver,
        }
    }
}

impl RequestRunner for ThreadedRunner {
    fn submit(&mut self, ticket: Ticket, request: ApiRequest) {
        let transport = Arc::clone(&self.transport);
        let sender = self.sender.clone();
        debug!(
            ticket = ticket.id,
            method = request.method.as_str(),
            url = %request.url,
            "submitting request"
        );

        thread::spawn(move || {
            let outcome = match transport.execute(&request) {
                Ok(raw) => normalize_response(raw.status, &raw.body),
                Err(err) => {
                    warn!(ticket = ticket.id, error = %err, "transport failure");
                    Err(ApiError::unreachable())
                }
            };
            debug!(ticket = ticket.id, ok = outcome.is_ok(), "request completed");
            // The receiver only disappears when the app is shutting down.
            let _ = sender.send(Completion { ticket, outcome });
        });
    }

    fn drain(&mut self) -> Vec<Completion> {
        self.receiver.try_iter().collect()
    }
}
