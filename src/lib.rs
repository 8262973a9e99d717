//! # switchbot
//!
//! A Rust client library for `SwitchBot` Bot devices.
//!
//! This library drives the bot over Bluetooth LE: it encodes commands into
//! the device's byte frames, writes them to the command characteristic and
//! matches the notification that answers each one.
//!
//! ## Features
//!
//! - Async/await based API using Tokio
//! - One command in flight per device, later calls queue in FIFO order
//! - Timer programming with interval repetition
//! - Event-driven notifications for connection changes and completed commands
//! - A simulated peripheral for hardware-free testing
//!
//! ## Quick Start
//!
//! ```no_run
//! use switchbot::{ExecutorConfig, HhMm, HhMmSs, MockBot, SwitchBot, TimerMode, TimerSetup};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), switchbot::Error> {
//!     // Any BLE stack implementing `Peripheral` works here
//!     let bot = SwitchBot::open(MockBot::new(), &ExecutorConfig::default()).await?;
//!
//!     let info = bot.get_basic_info().await?;
//!     println!("Battery: {}%", info.battery_percent);
//!
//!     // Press every 15 minutes from 12:53 for the rest of the day
//!     bot.sync_time().await?;
//!     bot.set_timer_count(1).await?;
//!     let mut timer = TimerSetup::new(0, HhMm::new(12, 53));
//!     timer.mode = TimerMode::RepeatForever;
//!     timer.interval = HhMmSs::new(0, 15, 0);
//!     bot.set_timer(&timer).await?;
//!
//!     bot.disconnect().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`protocol`] - Frame encoding, response decoding and status codes
//! - [`types`] - Data structures (device info, clock, timers)
//! - [`transport`] - GATT session adapter and the simulated bot
//! - [`event`] - Async event system for handling notifications
//! - [`commands`] - Command executor with request/response correlation
//! - [`client`] - High-level [`SwitchBot`] client

pub mod client;
pub mod commands;
pub mod error;
pub mod event;
pub mod protocol;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use client::SwitchBot;
pub use commands::{Executor, ExecutorConfig, ExecutorState, QueuePolicy};
pub use error::{DecodeError, Error, Result};
pub use event::{Event, EventDispatcher, Subscription};
pub use protocol::{Command, CommandKind, Response, StatusCode};
pub use transport::{
    Characteristic, GattConfig, GattSession, MockBot, NotificationSink, Peripheral, Transport,
};
pub use types::{
    Action, DeviceInfo, DeviceTime, HhMm, HhMmSs, MAX_TIMERS, Repeat, TimerMode, TimerSetup,
    WeekDays, calc_sum_times, calc_sum_times_inclusive, to_end_time,
};
