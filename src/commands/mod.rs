//! Command executor for bot operations.
//!
//! The protocol carries no request id: a response is matched to the command
//! that caused it only because it is the next notification after the write.
//! The executor therefore keeps at most one command in flight. Each
//! exchange holds the response mailbox for its whole duration; later callers
//! either queue behind it in FIFO order or are turned away with
//! [`Error::Busy`], depending on [`QueuePolicy`].

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{Mutex, MutexGuard, mpsc, watch};

use crate::error::{Error, Result};
use crate::event::{Event, EventDispatcher};
use crate::protocol::{Command, CommandKind, Response, decode, encode};
use crate::transport::{NotificationSink, Transport};

/// Default command timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of notifications buffered before new ones are dropped.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 16;

/// What `execute` does while another command is in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueuePolicy {
    /// Wait for the earlier commands, in call order.
    #[default]
    Queue,
    /// Fail immediately with [`Error::Busy`].
    Reject,
}

/// Configuration for the executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Longest wait for a response after the write.
    pub timeout: Duration,
    /// Handling of concurrent calls.
    pub policy: QueuePolicy,
    /// Notifications buffered between exchanges.
    pub mailbox_capacity: usize,
}

impl ExecutorConfig {
    /// Sets the response timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the concurrency policy.
    #[must_use]
    pub const fn policy(mut self, policy: QueuePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the mailbox capacity.
    #[must_use]
    pub const fn mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity;
        self
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            policy: QueuePolicy::Queue,
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
        }
    }
}

/// Exchange state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    /// No command in flight.
    Idle,
    /// A command was written and its response is pending.
    AwaitingResponse(CommandKind),
}

/// Resets the published state to idle however the exchange ends.
struct InFlight<'a> {
    state: &'a watch::Sender<ExecutorState>,
}

impl<'a> InFlight<'a> {
    fn enter(state: &'a watch::Sender<ExecutorState>, kind: CommandKind) -> Self {
        state.send_replace(ExecutorState::AwaitingResponse(kind));
        Self { state }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state.send_replace(ExecutorState::Idle);
    }
}

/// Serializes commands over one transport and correlates their responses.
pub struct Executor<T> {
    transport: Arc<Mutex<T>>,
    dispatcher: EventDispatcher,
    mailbox: Mutex<mpsc::Receiver<Bytes>>,
    link: watch::Receiver<bool>,
    state: watch::Sender<ExecutorState>,
    timeout: Duration,
    policy: QueuePolicy,
}

impl<T: Transport> Executor<T> {
    /// Creates an executor and registers its mailbox with the transport.
    #[must_use]
    pub fn new(mut transport: T, dispatcher: EventDispatcher, config: &ExecutorConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.mailbox_capacity.max(1));
        let sink = NotificationSink::new(tx, dispatcher.clone());
        let link = sink.watch_link();
        transport.set_notification_sink(sink);
        let (state, _) = watch::channel(ExecutorState::Idle);

        Self {
            transport: Arc::new(Mutex::new(transport)),
            dispatcher,
            mailbox: Mutex::new(rx),
            link,
            state,
            timeout: config.timeout,
            policy: config.policy,
        }
    }

    /// Returns the shared transport.
    #[must_use]
    pub fn transport(&self) -> Arc<Mutex<T>> {
        Arc::clone(&self.transport)
    }

    /// Sets the command timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Returns the current exchange state.
    #[must_use]
    pub fn state(&self) -> ExecutorState {
        *self.state.borrow()
    }

    /// Watches exchange state changes.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ExecutorState> {
        self.state.subscribe()
    }

    /// Sends a command and waits for its response.
    ///
    /// Parameters are validated before the command is queued. A
    /// non-success status comes back as [`Response::Failed`]; transport,
    /// decode and timeout failures come back as errors. Dropping the
    /// returned future abandons the exchange and frees the channel.
    pub async fn execute(&self, command: &Command) -> Result<Response> {
        let frame = encode(command)?;
        let kind = command.kind();

        let mut mailbox = self.acquire().await?;
        let _in_flight = InFlight::enter(&self.state, kind);

        // A response that arrived after its command timed out must not be
        // taken for the answer to this one.
        while let Ok(stale) = mailbox.try_recv() {
            tracing::warn!("discarding unsolicited notification {}", hex::encode(&stale));
        }

        let mut link = self.link.clone();
        link.mark_unchanged();

        tracing::debug!("sending {:?}", kind);
        {
            let mut transport = self.transport.lock().await;
            transport.send(frame).await?;
        }

        let wait = async {
            tokio::select! {
                biased;
                data = mailbox.recv() => data,
                () = link_lost(link) => None,
            }
        };

        let data = match tokio::time::timeout(self.timeout, wait).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::warn!("link lost while awaiting response to {:?}", kind);
                return Err(Error::Disconnected);
            }
            Err(_) => {
                tracing::warn!("no response to {:?} within {:?}", kind, self.timeout);
                return Err(Error::Timeout {
                    timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                });
            }
        };

        let response = decode(kind, &data)?;
        tracing::debug!("{:?} completed: {}", kind, response.status());
        self.dispatcher.dispatch(Event::Completed {
            kind,
            status: response.status(),
        });
        Ok(response)
    }

    async fn acquire(&self) -> Result<MutexGuard<'_, mpsc::Receiver<Bytes>>> {
        match self.policy {
            QueuePolicy::Queue => Ok(self.mailbox.lock().await),
            QueuePolicy::Reject => self.mailbox.try_lock().map_err(|_| Error::Busy),
        }
    }
}

/// Resolves once the link is reported down after `link` was last marked seen.
async fn link_lost(mut link: watch::Receiver<bool>) {
    loop {
        if link.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
        if !*link.borrow_and_update() {
            return;
        }
    }
}
