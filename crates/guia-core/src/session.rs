//! Chat session controller.
//!
//! Owns the conversation and the pending input, enforces that at most one
//! query is in flight, and publishes a [`SessionState`] snapshot on every
//! change so a UI can redraw without reaching into the controller.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::ServiceError;
use crate::query::{Answer, QueryService};
use crate::state::{Conversation, Message};

/// How long the "copied" acknowledgment stays up after a share
pub const COPIED_FLASH: Duration = Duration::from_millis(2500);

/// Write-only text clipboard used by the share action
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> anyhow::Result<()>;
}

/// Snapshot published to observers after every state change.
///
/// `messages` is shared with the controller and only rebuilt when the
/// conversation grows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub messages: Arc<[Message]>,
    pub pending_input: String,
    pub is_busy: bool,
    pub is_copied: bool,
}

pub struct SessionController {
    conversation: Conversation,
    messages: Arc<[Message]>,
    pending_input: String,
    busy: bool,
    copied_until: Option<Instant>,
    in_flight: Option<JoinHandle<Result<Answer, ServiceError>>>,
    service: QueryService,
    clipboard: Box<dyn Clipboard>,
    state_tx: watch::Sender<SessionState>,
}

impl SessionController {
    pub fn new(service: QueryService, clipboard: Box<dyn Clipboard>) -> Self {
        let conversation = Conversation::new();
        let messages: Arc<[Message]> = conversation.messages().into();
        let (state_tx, _) = watch::channel(SessionState {
            messages: messages.clone(),
            pending_input: String::new(),
            is_busy: false,
            is_copied: false,
        });

        Self {
            conversation,
            messages,
            pending_input: String::new(),
            busy: false,
            copied_until: None,
            in_flight: None,
            service,
            clipboard,
            state_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    pub fn set_pending_input(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.pending_input {
            self.pending_input = text;
            self.publish();
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_copied(&self) -> bool {
        self.copied_until.is_some()
    }

    /// Submitting is possible when idle and the input has visible text
    pub fn can_submit(&self) -> bool {
        !self.busy && !self.pending_input.trim().is_empty()
    }

    pub fn can_share(&self) -> bool {
        self.conversation.has_exchanges()
    }

    /// Start answering `text`.
    ///
    /// Returns false without touching any state when the text is blank or a
    /// query is already in flight. Must be called inside a tokio runtime.
    pub fn submit(&mut self, text: &str) -> bool {
        let query = text.trim();
        if query.is_empty() {
            return false;
        }
        if self.busy {
            debug!("submit dropped: a query is already in flight");
            return false;
        }

        self.append(Message::user(query));
        self.pending_input.clear();
        self.busy = true;

        let service = self.service.clone();
        let query = query.to_string();
        info!(chars = query.chars().count(), "submitting query");
        self.in_flight = Some(tokio::spawn(async move { service.run_query(&query).await }));

        self.publish();
        true
    }

    pub fn submit_pending(&mut self) -> bool {
        let text = self.pending_input.clone();
        self.submit(&text)
    }

    /// Settle the in-flight query if it has finished. Returns true if it did.
    pub async fn poll(&mut self) -> bool {
        let finished = self
            .in_flight
            .as_ref()
            .is_some_and(|handle| handle.is_finished());
        if finished {
            self.wait_idle().await;
        }
        finished
    }

    /// Wait for the in-flight query, if any, and settle it
    pub async fn wait_idle(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(error = %err, "query task did not complete");
                    Err(ServiceError::Unavailable)
                }
            };
            self.settle(outcome);
        }
    }

    fn append(&mut self, message: Message) {
        self.conversation.push(message);
        self.messages = self.conversation.messages().into();
    }

    fn settle(&mut self, outcome: Result<Answer, ServiceError>) {
        let message = match outcome {
            Ok(answer) => Message::bot(answer.text, answer.sources),
            Err(err) => Message::bot(err.to_string(), Vec::new()),
        };
        self.append(message);
        self.busy = false;
        self.publish();
    }

    /// Copy the transcript to the clipboard.
    ///
    /// Does nothing while only the greeting exists. A clipboard failure is
    /// logged and leaves the copied flag unset.
    pub fn share(&mut self) -> Option<String> {
        if !self.can_share() {
            return None;
        }

        let transcript = self.conversation.transcript();
        match self.clipboard.set_text(&transcript) {
            Ok(()) => {
                self.copied_until = Some(Instant::now() + COPIED_FLASH);
                self.publish();
            }
            Err(err) => warn!(error = %err, "failed to copy transcript to clipboard"),
        }
        Some(transcript)
    }

    /// Expire the copied flag once its delay has passed
    pub fn tick(&mut self) {
        if self.copied_until.is_some_and(|until| Instant::now() >= until) {
            self.copied_until = None;
            self.publish();
        }
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            messages: self.messages.clone(),
            pending_input: self.pending_input.clone(),
            is_busy: self.busy,
            is_copied: self.is_copied(),
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state());
    }
}
