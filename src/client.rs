//! Main [`SwitchBot`] client implementation.
//!
//! This module provides the high-level [`SwitchBot`] handle that combines
//! the session, the command executor and the event system. Each handle owns
//! one physical device; drive several bots with several handles.

use chrono::{DateTime, Local, TimeZone};

use crate::commands::{Executor, ExecutorConfig, ExecutorState};
use crate::error::{Error, Result};
use crate::event::{Event, EventDispatcher, Subscription};
use crate::protocol::{Command, CommandKind, Response};
use crate::transport::{GattSession, Peripheral, Transport};
use crate::types::{DeviceInfo, DeviceTime, MAX_TIMERS, TimerSetup};

/// Client for communicating with a bot.
pub struct SwitchBot<T> {
    executor: Executor<T>,
    dispatcher: EventDispatcher,
}

impl<P: Peripheral + 'static> SwitchBot<GattSession<P>> {
    /// Creates a client for a BLE peripheral (not yet connected).
    #[must_use]
    pub fn with_peripheral(peripheral: P) -> Self {
        Self::new(GattSession::new(peripheral), &ExecutorConfig::default())
    }

    /// Connects to a BLE peripheral and returns the ready handle.
    pub async fn open(peripheral: P, config: &ExecutorConfig) -> Result<Self> {
        let bot = Self::new(GattSession::new(peripheral), config);
        bot.connect().await?;
        Ok(bot)
    }
}

impl<T: Transport + 'static> SwitchBot<T> {
    /// Creates a new client with the given transport.
    #[must_use]
    pub fn new(transport: T, config: &ExecutorConfig) -> Self {
        let dispatcher = EventDispatcher::default();
        let executor = Executor::new(transport, dispatcher.clone(), config);
        Self {
            executor,
            dispatcher,
        }
    }

    /// Connects and arms notifications. Does nothing if already connected.
    ///
    /// Every command calls this first, so an explicit call is only needed to
    /// surface connection problems early.
    pub async fn connect(&self) -> Result<()> {
        let transport = self.executor.transport();
        let mut transport = transport.lock().await;
        if transport.is_connected() {
            return Ok(());
        }

        transport.connect().await?;
        self.dispatcher.dispatch(Event::Connected);
        Ok(())
    }

    /// Disconnects from the device.
    pub async fn disconnect(&self) -> Result<()> {
        {
            let transport = self.executor.transport();
            let mut transport = transport.lock().await;
            transport.disconnect().await?;
        }
        self.dispatcher.dispatch(Event::Disconnected);
        Ok(())
    }

    /// Returns true if connected.
    pub async fn is_connected(&self) -> bool {
        self.executor.transport().lock().await.is_connected()
    }

    /// Returns the executor for direct command access.
    #[must_use]
    pub const fn executor(&self) -> &Executor<T> {
        &self.executor
    }

    /// Returns the executor mutably, e.g. to change the timeout.
    pub const fn executor_mut(&mut self) -> &mut Executor<T> {
        &mut self.executor
    }

    /// Returns the current exchange state.
    #[must_use]
    pub fn state(&self) -> ExecutorState {
        self.executor.state()
    }

    /// Subscribes to events.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        self.dispatcher.subscribe()
    }

    /// Connects if needed, runs one command and turns a failure status into
    /// [`Error::Status`].
    async fn run(&self, command: Command) -> Result<Response> {
        self.connect().await?;
        match self.executor.execute(&command).await? {
            Response::Failed(status) => {
                tracing::debug!("{:?} failed: {}", command.kind(), status);
                Err(Error::Status(status))
            }
            response => Ok(response),
        }
    }

    async fn run_expect_done(&self, command: Command) -> Result<()> {
        let kind = command.kind();
        match self.run(command).await? {
            Response::Done => Ok(()),
            _ => Err(Error::UnexpectedResponse { kind }),
        }
    }

    // ==================== Device Methods ====================

    /// Gets battery level, firmware version and timer count.
    pub async fn get_basic_info(&self) -> Result<DeviceInfo> {
        match self.run(Command::GetBasicInfo).await? {
            Response::BasicInfo(info) => {
                tracing::debug!(
                    "battery {}%, firmware {:.1}, {} timers",
                    info.battery_percent,
                    info.firmware_version(),
                    info.timer_count
                );
                Ok(info)
            }
            _ => Err(Error::UnexpectedResponse {
                kind: CommandKind::GetBasicInfo,
            }),
        }
    }

    /// Presses and releases the arm.
    pub async fn press(&self) -> Result<()> {
        tracing::info!("press");
        self.run_expect_done(Command::Press).await
    }

    /// Switches on.
    pub async fn turn_on(&self) -> Result<()> {
        tracing::info!("turn on");
        self.run_expect_done(Command::TurnOn).await
    }

    /// Switches off.
    pub async fn turn_off(&self) -> Result<()> {
        tracing::info!("turn off");
        self.run_expect_done(Command::TurnOff).await
    }

    // ==================== Clock Methods ====================

    /// Reads the device clock.
    pub async fn get_device_time(&self) -> Result<DeviceTime> {
        match self.run(Command::GetDeviceTime).await? {
            Response::DeviceTime(time) => Ok(time),
            _ => Err(Error::UnexpectedResponse {
                kind: CommandKind::GetDeviceTime,
            }),
        }
    }

    /// Sets the device clock to the wall-clock time of `time`.
    ///
    /// Seconds are kept but the device schedules timers by hour and minute.
    pub async fn set_device_time<Tz: TimeZone>(&self, time: &DateTime<Tz>) -> Result<()> {
        let time = DeviceTime::from_wall_clock(time);
        tracing::info!("setting device time to {:?}", time.wall_clock());
        self.run_expect_done(Command::SetDeviceTime(time)).await
    }

    /// Sets the device clock to the host's local time.
    pub async fn sync_time(&self) -> Result<()> {
        self.set_device_time(&Local::now()).await
    }

    // ==================== Timer Methods ====================

    /// Sets the number of timer slots in use (0-5).
    pub async fn set_timer_count(&self, count: u8) -> Result<()> {
        tracing::info!("setting timer count to {}", count);
        self.run_expect_done(Command::SetTimerCount(count)).await
    }

    /// Reads one timer slot (0-4).
    ///
    /// A failure status means the slot could not be read, not that it is
    /// disabled.
    pub async fn get_timer_info(&self, index: u8) -> Result<TimerSetup> {
        match self.run(Command::GetTimerInfo(index)).await? {
            Response::TimerInfo(timer) => Ok(*timer),
            _ => Err(Error::UnexpectedResponse {
                kind: CommandKind::GetTimerInfo,
            }),
        }
    }

    /// Writes one timer slot.
    pub async fn set_timer(&self, timer: &TimerSetup) -> Result<()> {
        tracing::info!(
            "setting timer {} starting at {}",
            timer.index,
            timer.start_time
        );
        self.run_expect_done(Command::SetTimer(timer.clone())).await
    }

    /// Reads every timer slot in use.
    ///
    /// Slots that answer with a failure status or an undecodable record are
    /// skipped. Transport errors abort the listing.
    pub async fn get_timers(&self) -> Result<Vec<TimerSetup>> {
        let info = self.get_basic_info().await?;
        let count = info.timer_count.min(MAX_TIMERS);

        let mut timers = Vec::with_capacity(usize::from(count));
        for index in 0..count {
            match self.get_timer_info(index).await {
                Ok(timer) => timers.push(timer),
                Err(e @ (Error::Status(_) | Error::Decode(_))) => {
                    tracing::warn!("skipping timer slot {}: {}", index, e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(timers)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::FixedOffset;

    use super::*;
    use crate::protocol::StatusCode;
    use crate::transport::MockBot;
    use crate::types::{HhMm, HhMmSs, Repeat, TimerMode, WeekDays};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    async fn open(bot: &MockBot) -> SwitchBot<GattSession<MockBot>> {
        init_tracing();
        SwitchBot::open(bot.clone(), &ExecutorConfig::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_timer_end_to_end() {
        let bot = MockBot::new();
        let client = open(&bot).await;

        client.set_timer_count(1).await.unwrap();
        assert_eq!(bot.timer_count(), 1);

        let mut timer = TimerSetup::new(0, HhMm::new(12, 53));
        timer.mode = TimerMode::RepeatForever;
        timer.interval = HhMmSs::new(0, 15, 0);
        timer.repeat_sum = 0;
        client.set_timer(&timer).await.unwrap();

        let read = client.get_timer_info(0).await.unwrap();
        assert_eq!(read.start_time, HhMm::new(12, 53));
        assert_eq!(read.mode, TimerMode::RepeatForever);
        assert_eq!(read.interval, HhMmSs::new(0, 15, 0));
        assert_eq!(read.repeat, Repeat::Daily);
        assert_eq!(read.repeat_days, Some(WeekDays::ALL));
        assert!(read.is_enabled());

        let timers = client.get_timers().await.unwrap();
        assert_eq!(timers.len(), 1);
        assert_eq!(timers[0].start_time, HhMm::new(12, 53));
    }

    #[tokio::test]
    async fn test_basic_info() {
        let bot = MockBot::new();
        bot.set_battery(64);
        bot.set_firmware(63);
        let client = open(&bot).await;

        let info = client.get_basic_info().await.unwrap();
        assert_eq!(info.battery_percent, 64);
        assert!((info.firmware_version() - 6.3).abs() < 0.001);
        assert_eq!(info.timer_count, 0);
    }

    #[tokio::test]
    async fn test_actions() {
        let bot = MockBot::new();
        let client = open(&bot).await;

        client.press().await.unwrap();
        client.turn_on().await.unwrap();
        client.turn_off().await.unwrap();

        let actions: Vec<u8> = bot.writes().iter().map(|frame| frame[2]).collect();
        assert_eq!(actions, vec![0x00, 0x01, 0x02]);
    }

    #[tokio::test]
    async fn test_status_error_reaches_caller() {
        let bot = MockBot::new();
        let client = open(&bot).await;

        bot.force_status(Some(StatusCode::LowBattery));
        let err = client.press().await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::LowBattery));

        // the executor accepts new commands after a failure
        bot.force_status(None);
        client.press().await.unwrap();
    }

    #[tokio::test]
    async fn test_device_time_round_trip() {
        let bot = MockBot::new();
        let client = open(&bot).await;

        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let now = offset.with_ymd_and_hms(2025, 6, 15, 7, 45, 10).unwrap();
        client.set_device_time(&now).await.unwrap();
        assert_eq!(
            i64::try_from(bot.clock()).unwrap(),
            now.naive_local().and_utc().timestamp()
        );

        let time = client.get_device_time().await.unwrap();
        assert_eq!(time.at_offset(offset).unwrap(), now);
    }

    #[tokio::test]
    async fn test_sync_time() {
        let bot = MockBot::new();
        let client = open(&bot).await;

        client.sync_time().await.unwrap();
        assert!(bot.clock() > 0);
    }

    #[tokio::test]
    async fn test_reconnects_on_demand() {
        let bot = MockBot::new();
        let client = open(&bot).await;

        bot.drop_connection();
        assert!(!client.is_connected().await);

        client.press().await.unwrap();
        assert!(client.is_connected().await);
        assert_eq!(bot.connect_count(), 2);
    }

    #[tokio::test]
    async fn test_connect_failure() {
        init_tracing();
        let bot = MockBot::new();
        bot.set_reachable(false);

        let client = SwitchBot::with_peripheral(bot.clone());
        assert!(matches!(
            client.get_basic_info().await,
            Err(Error::Transport { .. })
        ));
        assert!(bot.writes().is_empty());
    }

    #[tokio::test]
    async fn test_connection_events() {
        let bot = MockBot::new();
        let client = SwitchBot::with_peripheral(bot.clone());
        let mut events = client.subscribe();

        client.connect().await.unwrap();
        client.connect().await.unwrap();
        client.disconnect().await.unwrap();

        assert!(matches!(events.recv().await, Some(Event::Connected)));
        assert!(matches!(events.recv().await, Some(Event::Disconnected)));
    }

    #[tokio::test]
    async fn test_get_timers_skips_unreadable_slots() {
        let bot = MockBot::new();
        let client = open(&bot).await;
        client.set_timer_count(2).await.unwrap();

        // slot 1 holds a mode byte the decoder rejects
        bot.set_timer_record(1, [0x7F, 6, 30, 0x09, 0x00, 0, 0, 0, 0]);

        let timers = client.get_timers().await.unwrap();
        assert_eq!(timers.len(), 1);
        assert_eq!(timers[0].index, 0);
    }

    #[tokio::test]
    async fn test_get_timers_reports_disabled_slots() {
        let bot = MockBot::new();
        let client = open(&bot).await;
        client.set_timer_count(1).await.unwrap();

        // disabled slot as written by the vendor app
        bot.set_timer_record(0, [0x00, 8, 0, 0x80, 0x00, 0, 0, 0, 0]);

        let timers = client.get_timers().await.unwrap();
        assert_eq!(timers.len(), 1);
        assert!(!timers[0].is_enabled());
        assert_eq!(timers[0].start_time, HhMm::new(8, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_adjustable_after_open() {
        let bot = MockBot::new();
        let mut client = open(&bot).await;
        client
            .executor_mut()
            .set_timeout(Duration::from_millis(250));

        bot.set_silent(true);
        assert!(matches!(
            client.press().await,
            Err(Error::Timeout { timeout_ms: 250 })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_fails_pending_command() {
        let bot = MockBot::new();
        bot.set_silent(true);
        let client = std::sync::Arc::new(open(&bot).await);
        let mut events = client.subscribe();

        let pending = {
            let client = std::sync::Arc::clone(&client);
            tokio::spawn(async move { client.turn_on().await })
        };
        tokio::task::yield_now().await;

        client.disconnect().await.unwrap();
        assert!(matches!(pending.await.unwrap(), Err(Error::Disconnected)));
        assert!(matches!(events.recv().await, Some(Event::Disconnected)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_surfaces() {
        let bot = MockBot::new();
        let config = ExecutorConfig::default().timeout(Duration::from_secs(1));
        let client = SwitchBot::open(bot.clone(), &config).await.unwrap();

        bot.set_silent(true);
        assert!(matches!(
            client.get_device_time().await,
            Err(Error::Timeout { timeout_ms: 1000 })
        ));
        assert_eq!(client.state(), ExecutorState::Idle);
    }
}
