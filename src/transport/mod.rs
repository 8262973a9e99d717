//! Transport layer for bot communication.
//!
//! The executor depends on the narrow [`Transport`] interface: connect,
//! write a frame, and deliver inbound frames to a [`NotificationSink`].
//! [`GattSession`] implements it on top of a platform GATT stack exposed
//! through the [`Peripheral`] trait.

pub mod gatt;
pub mod mock;

use std::sync::Arc;

use futures::future::BoxFuture;

use bytes::Bytes;
use tokio::sync::{mpsc, watch};

use crate::error::Result;
use crate::event::{Event, EventDispatcher};

/// Trait for transport implementations.
pub trait Transport: Send + Sync {
    /// Connects to the device. Does nothing if already connected.
    fn connect(&mut self) -> BoxFuture<'_, Result<()>>;

    /// Disconnects from the device.
    fn disconnect(&mut self) -> BoxFuture<'_, Result<()>>;

    /// Writes one frame to the command channel.
    ///
    /// Resolves once the link acknowledged the write.
    fn send(&mut self, data: Bytes) -> BoxFuture<'_, Result<()>>;

    /// Returns true if connected.
    fn is_connected(&self) -> bool;

    /// Registers the sink every inbound frame is delivered to.
    fn set_notification_sink(&mut self, sink: NotificationSink);
}

/// Receiving end for frames arriving on the result channel.
///
/// Cloned into whatever callback the platform stack invokes on a
/// notification or a link state change. Delivery never blocks.
#[derive(Clone)]
pub struct NotificationSink {
    tx: mpsc::Sender<Bytes>,
    dispatcher: EventDispatcher,
    link: Arc<watch::Sender<bool>>,
}

impl NotificationSink {
    /// Creates a sink forwarding into `tx` and publishing on `dispatcher`.
    #[must_use]
    pub fn new(tx: mpsc::Sender<Bytes>, dispatcher: EventDispatcher) -> Self {
        let (link, _) = watch::channel(false);
        Self {
            tx,
            dispatcher,
            link: Arc::new(link),
        }
    }

    /// Reports the link going up or down.
    ///
    /// A pending exchange fails with [`Error::Disconnected`] as soon as the
    /// link is reported down.
    ///
    /// [`Error::Disconnected`]: crate::error::Error::Disconnected
    pub fn set_link_up(&self, up: bool) {
        let was_up = self.link.send_replace(up);
        if was_up && !up {
            tracing::info!("link lost");
        }
    }

    /// Returns true while the link is reported up.
    #[must_use]
    pub fn is_link_up(&self) -> bool {
        *self.link.borrow()
    }

    pub(crate) fn watch_link(&self) -> watch::Receiver<bool> {
        self.link.subscribe()
    }

    /// Delivers one inbound frame.
    pub fn deliver(&self, data: Bytes) {
        tracing::trace!("notification: {}", hex::encode(&data));
        self.dispatcher
            .dispatch(Event::Notification { data: data.clone() });

        match self.tx.try_send(data) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(data)) => {
                tracing::warn!(
                    "response mailbox full, dropping notification {}",
                    hex::encode(&data)
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("response mailbox closed");
            }
        }
    }
}

pub use gatt::{Characteristic, GattConfig, GattSession, Peripheral};
pub use mock::MockBot;
