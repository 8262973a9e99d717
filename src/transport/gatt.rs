//! GATT session adapter.
//!
//! The bot exposes one primary service with a write-only command
//! characteristic and a notify-only result characteristic. [`GattSession`]
//! owns the connection lifecycle on top of any BLE stack that implements
//! [`Peripheral`]: it connects on demand, resolves both characteristics and
//! arms notifications before the first command is written.

use bytes::Bytes;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::transport::{NotificationSink, Transport};

/// Bot communication service.
pub const SERVICE_UUID: Uuid = Uuid::from_u128(0xcba2_0d00_224d_11e6_9fb8_0002_a5d5_c51b);

/// Characteristic commands are written to.
pub const COMMAND_UUID: Uuid = Uuid::from_u128(0xcba2_0002_224d_11e6_9fb8_0002_a5d5_c51b);

/// Characteristic responses are notified on.
pub const RESULT_UUID: Uuid = Uuid::from_u128(0xcba2_0003_224d_11e6_9fb8_0002_a5d5_c51b);

/// A characteristic discovered on the peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Characteristic {
    /// Characteristic UUID.
    pub uuid: Uuid,
    /// Supports write requests.
    pub write: bool,
    /// Supports notifications.
    pub notify: bool,
}

/// A remote BLE peripheral as seen through the platform GATT stack.
pub trait Peripheral: Send + Sync {
    /// Returns true while the link is up.
    fn is_connected(&self) -> bool;

    /// Opens the link.
    fn connect(&mut self) -> BoxFuture<'_, Result<()>>;

    /// Closes the link.
    fn disconnect(&mut self) -> BoxFuture<'_, Result<()>>;

    /// Lists the characteristics of a primary service, or `None` if the
    /// peripheral does not expose it.
    fn discover(&mut self, service: Uuid) -> BoxFuture<'_, Result<Option<Vec<Characteristic>>>>;

    /// Writes a value and waits for the write response.
    fn write(&mut self, characteristic: Uuid, data: Bytes) -> BoxFuture<'_, Result<()>>;

    /// Enables notifications and routes every value to `sink`.
    ///
    /// Implementations report an unexpected link loss through
    /// [`NotificationSink::set_link_up`].
    fn subscribe(
        &mut self,
        characteristic: Uuid,
        sink: NotificationSink,
    ) -> BoxFuture<'_, Result<()>>;
}

/// UUIDs of the bot service and its characteristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GattConfig {
    /// Primary service.
    pub service: Uuid,
    /// Command characteristic (write).
    pub command: Uuid,
    /// Result characteristic (notify).
    pub result: Uuid,
}

impl GattConfig {
    /// Sets the service UUID.
    #[must_use]
    pub const fn service(mut self, uuid: Uuid) -> Self {
        self.service = uuid;
        self
    }

    /// Sets the command characteristic UUID.
    #[must_use]
    pub const fn command(mut self, uuid: Uuid) -> Self {
        self.command = uuid;
        self
    }

    /// Sets the result characteristic UUID.
    #[must_use]
    pub const fn result(mut self, uuid: Uuid) -> Self {
        self.result = uuid;
        self
    }
}

impl Default for GattConfig {
    fn default() -> Self {
        Self {
            service: SERVICE_UUID,
            command: COMMAND_UUID,
            result: RESULT_UUID,
        }
    }
}

/// Session over one bot peripheral.
pub struct GattSession<P> {
    peripheral: P,
    config: GattConfig,
    sink: Option<NotificationSink>,
    command: Option<Uuid>,
}

impl<P: Peripheral> GattSession<P> {
    /// Creates a session with the default bot UUIDs.
    #[must_use]
    pub fn new(peripheral: P) -> Self {
        Self::with_config(peripheral, GattConfig::default())
    }

    /// Creates a session with custom UUIDs.
    #[must_use]
    pub fn with_config(peripheral: P, config: GattConfig) -> Self {
        Self {
            peripheral,
            config,
            sink: None,
            command: None,
        }
    }

    /// Returns the underlying peripheral.
    pub const fn peripheral(&self) -> &P {
        &self.peripheral
    }

    /// Returns the session configuration.
    pub const fn config(&self) -> &GattConfig {
        &self.config
    }

    fn resolve(
        characteristics: &[Characteristic],
        uuid: Uuid,
        has_property: impl Fn(&Characteristic) -> bool,
    ) -> Result<Uuid> {
        characteristics
            .iter()
            .find(|c| c.uuid == uuid && has_property(c))
            .map(|c| c.uuid)
            .ok_or(Error::CharacteristicNotFound { uuid })
    }
}

impl<P: Peripheral> Transport for GattSession<P> {
    fn connect(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            if self.is_connected() {
                return Ok(());
            }

            let sink = self
                .sink
                .clone()
                .ok_or_else(|| Error::transport("no notification sink registered"))?;

            tracing::info!("connecting to bot service {}", self.config.service);
            self.command = None;
            if !self.peripheral.is_connected() {
                self.peripheral.connect().await?;
            }

            let characteristics = self
                .peripheral
                .discover(self.config.service)
                .await?
                .ok_or(Error::ServiceNotFound {
                    uuid: self.config.service,
                })?;

            let command = Self::resolve(&characteristics, self.config.command, |c| c.write)?;
            let result = Self::resolve(&characteristics, self.config.result, |c| c.notify)?;

            self.peripheral.subscribe(result, sink.clone()).await?;
            self.command = Some(command);
            sink.set_link_up(true);

            tracing::info!("connected, notifications armed on {}", result);
            Ok(())
        })
    }

    fn disconnect(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.command = None;
            if let Some(sink) = &self.sink {
                sink.set_link_up(false);
            }
            if self.peripheral.is_connected() {
                tracing::info!("disconnecting from bot");
                self.peripheral.disconnect().await?;
            }
            Ok(())
        })
    }

    fn send(&mut self, data: Bytes) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            if !self.is_connected() {
                return Err(Error::NotConnected);
            }
            let command = self.command.ok_or(Error::NotConnected)?;

            tracing::trace!("writing frame: {}", hex::encode(&data));
            self.peripheral.write(command, data).await
        })
    }

    fn is_connected(&self) -> bool {
        self.command.is_some() && self.peripheral.is_connected()
    }

    fn set_notification_sink(&mut self, sink: NotificationSink) {
        self.sink = Some(sink);
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::event::EventDispatcher;
    use crate::transport::MockBot;

    fn session(bot: &MockBot, config: GattConfig) -> (GattSession<MockBot>, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(4);
        let mut session = GattSession::with_config(bot.clone(), config);
        session.set_notification_sink(NotificationSink::new(tx, EventDispatcher::default()));
        (session, rx)
    }

    #[test]
    fn test_default_uuids() {
        let config = GattConfig::default();
        assert_eq!(
            config.service.to_string(),
            "cba20d00-224d-11e6-9fb8-0002a5d5c51b"
        );
        assert_eq!(
            config.command.to_string(),
            "cba20002-224d-11e6-9fb8-0002a5d5c51b"
        );
        assert_eq!(
            config.result.to_string(),
            "cba20003-224d-11e6-9fb8-0002a5d5c51b"
        );
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        let bot = MockBot::new();
        let (mut session, _rx) = session(&bot, GattConfig::default());

        session.connect().await.unwrap();
        session.connect().await.unwrap();

        assert!(session.is_connected());
        assert_eq!(session.peripheral().connect_count(), 1);
    }

    #[tokio::test]
    async fn test_send_routes_response_to_sink() {
        let bot = MockBot::new();
        let (mut session, mut rx) = session(&bot, GattConfig::default());

        session.connect().await.unwrap();
        session.send(Bytes::from_static(&[0x57, 0x01, 0x00])).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), Bytes::from_static(&[0x01]));
        assert_eq!(bot.writes(), vec![Bytes::from_static(&[0x57, 0x01, 0x00])]);
    }

    #[tokio::test]
    async fn test_send_requires_connection() {
        let bot = MockBot::new();
        let (mut session, _rx) = session(&bot, GattConfig::default());
        let result = session.send(Bytes::from_static(&[0x57, 0x02])).await;
        assert!(matches!(result, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn test_connect_without_sink() {
        let mut session = GattSession::new(MockBot::new());
        assert!(matches!(
            session.connect().await,
            Err(Error::Transport { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_service() {
        let bot = MockBot::new();
        let other = Uuid::from_u128(0x1234);
        let (mut session, _rx) = session(&bot, GattConfig::default().service(other));
        assert_eq!(session.config().service, other);
        assert!(matches!(
            session.connect().await,
            Err(Error::ServiceNotFound { uuid }) if uuid == other
        ));
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_characteristic_property_mismatch() {
        let bot = MockBot::new();
        // result characteristic is notify-only, so it cannot be the command channel
        let (mut session, _rx) = session(&bot, GattConfig::default().command(RESULT_UUID));
        assert!(matches!(
            session.connect().await,
            Err(Error::CharacteristicNotFound { uuid }) if uuid == RESULT_UUID
        ));
    }

    #[tokio::test]
    async fn test_reconnect_after_link_loss() {
        let bot = MockBot::new();
        let (mut session, _rx) = session(&bot, GattConfig::default());

        session.connect().await.unwrap();
        bot.drop_connection();
        assert!(!session.is_connected());

        session.connect().await.unwrap();
        assert!(session.is_connected());
        assert_eq!(bot.connect_count(), 2);
    }

    #[tokio::test]
    async fn test_disconnect() {
        let bot = MockBot::new();
        let (mut session, _rx) = session(&bot, GattConfig::default());

        session.connect().await.unwrap();
        session.disconnect().await.unwrap();
        assert!(!session.is_connected());
        assert!(!bot.is_connected());
    }
}
