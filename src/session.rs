//! Per-operator session: connection target plus a serialized dispatcher.
//!
//! [`Session::send`] holds the dispatcher lock for the whole request, so two
//! threads sharing a session never interleave. [`DispatchWorker`] runs sends on
//! a background thread and hands outcomes back in submission order.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use crate::dispatcher::{Dispatcher, HttpTransport, Outcome, Transport};
use crate::error::AppError;
use crate::settings::ClientSettings;

/// Where commands go and who they target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    pub server_address: String,
    pub auth_token: String,
    pub uid: String,
}

impl Target {
    pub fn from_settings(settings: &ClientSettings) -> Self {
        Self {
            server_address: settings.server_address.clone(),
            auth_token: settings.token().to_string(),
            uid: settings.uid.clone(),
        }
    }
}

pub struct Session<T: Transport = HttpTransport> {
    target: Mutex<Target>,
    dispatcher: Mutex<Dispatcher<T>>,
}

impl Session<HttpTransport> {
    /// HTTP session configured from saved settings.
    pub fn from_settings(settings: &ClientSettings) -> Result<Self, AppError> {
        Ok(Self::new(
            Target::from_settings(settings),
            Dispatcher::http(settings.timeouts())?,
        ))
    }
}

impl<T: Transport> Session<T> {
    pub fn new(target: Target, dispatcher: Dispatcher<T>) -> Self {
        Self {
            target: Mutex::new(target),
            dispatcher: Mutex::new(dispatcher),
        }
    }

    pub fn target(&self) -> Target {
        self.target.lock().clone()
    }

    /// Point the session at another server / credential. Later sends use it.
    pub fn update_connection(&self, server_address: &str, auth_token: &str) {
        let mut target = self.target.lock();
        target.server_address = server_address.to_string();
        target.auth_token = auth_token.to_string();
    }

    pub fn set_uid(&self, uid: &str) {
        self.target.lock().uid = uid.trim().to_string();
    }

    /// Send with the session's current target. Blocks until the request ends.
    pub fn send(&self, command_text: &str) -> Outcome {
        let target = self.target();
        let dispatcher = self.dispatcher.lock();
        dispatcher.send(
            &target.server_address,
            &target.auth_token,
            command_text,
            Some(&target.uid),
        )
    }
}

// ── Background worker ───────────────────────────────────────────

/// Identifies a queued send; tickets increase in submission order.
pub type Ticket = u64;

/// Runs sends on one background thread, strictly one after another.
pub struct DispatchWorker {
    requests: Option<Sender<(Ticket, String)>>,
    outcomes: Receiver<(Ticket, Outcome)>,
    next_ticket: Ticket,
    handle: Option<JoinHandle<()>>,
}

impl DispatchWorker {
    pub fn spawn<T: Transport + 'static>(session: Arc<Session<T>>) -> Self {
        let (request_tx, request_rx) = mpsc::channel::<(Ticket, String)>();
        let (outcome_tx, outcome_rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            for (ticket, command) in request_rx {
                let outcome = session.send(&command);
                if outcome_tx.send((ticket, outcome)).is_err() {
                    break;
                }
            }
        });
        Self {
            requests: Some(request_tx),
            outcomes: outcome_rx,
            next_ticket: 0,
            handle: Some(handle),
        }
    }

    /// Queue a command line. Returns its ticket, or `None` if the worker is gone.
    pub fn submit(&mut self, command_text: impl Into<String>) -> Option<Ticket> {
        let ticket = self.next_ticket;
        self.requests
            .as_ref()?
            .send((ticket, command_text.into()))
            .ok()?;
        self.next_ticket += 1;
        Some(ticket)
    }

    /// Outcomes that finished since the last call, oldest first. Never blocks.
    pub fn drain(&self) -> Vec<(Ticket, Outcome)> {
        self.outcomes.try_iter().collect()
    }

    /// Block for the next outcome. `None` once the worker has stopped.
    pub fn recv(&self) -> Option<(Ticket, Outcome)> {
        self.outcomes.recv().ok()
    }
}

impl Drop for DispatchWorker {
    fn drop(&mut self) {
        // closing the request channel ends the worker loop
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
