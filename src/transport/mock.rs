//! Simulated bot peripheral for tests and hardware-free development.
//!
//! [`MockBot`] answers command frames the way the device does: it keeps a
//! clock, five timer slots and a timer count, and notifies responses on the
//! result characteristic. Clones share state, so a test can keep one handle
//! to steer the device while a session owns another.

use std::sync::Arc;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::protocol::{MAGIC, STATUS_OK, StatusCode};
use crate::transport::NotificationSink;
use crate::transport::gatt::{COMMAND_UUID, Characteristic, Peripheral, RESULT_UUID, SERVICE_UUID};
use crate::types::MAX_TIMERS;

/// Bytes stored per timer slot: mask, start h/m, mode, action, sum, interval h/m/s.
const TIMER_RECORD_LEN: usize = 9;

struct MockState {
    connected: bool,
    reachable: bool,
    battery: u8,
    firmware: u8,
    timer_count: u8,
    clock: u64,
    timers: [[u8; TIMER_RECORD_LEN]; MAX_TIMERS as usize],
    forced_status: Option<StatusCode>,
    silent: bool,
    latency: Duration,
    sink: Option<NotificationSink>,
    writes: Vec<Bytes>,
    connects: usize,
}

impl MockState {
    fn respond(&mut self, frame: &[u8]) -> Bytes {
        if let Some(status) = self.forced_status {
            return Bytes::copy_from_slice(&[status.to_byte()]);
        }

        let Some((&MAGIC, body)) = frame.split_first() else {
            return status_only(StatusCode::ProtocolMismatch);
        };

        let mut buf = BytesMut::with_capacity(12);
        match body {
            // basic info
            [0x02] => {
                buf.put_u8(STATUS_OK);
                buf.put_u8(self.battery);
                buf.put_u8(self.firmware);
                buf.put_bytes(0, 5);
                buf.put_u8(self.timer_count);
            }
            // press, on, off
            [0x01, action] if *action <= 0x02 => buf.put_u8(STATUS_OK),
            // get clock
            [0x08, 0x01] => {
                buf.put_u8(STATUS_OK);
                buf.put_u64(self.clock);
            }
            // set clock
            [0x09, 0x01, seconds @ ..] => match <[u8; 8]>::try_from(seconds) {
                Ok(seconds) => {
                    self.clock = u64::from_be_bytes(seconds);
                    buf.put_u8(STATUS_OK);
                }
                Err(_) => return status_only(StatusCode::ActionFailed),
            },
            // set timer count
            [0x09, 0x02, count] if *count <= MAX_TIMERS => {
                self.timer_count = *count;
                buf.put_u8(STATUS_OK);
            }
            // get timer, selector 0x03 + index * 0x10
            [0x08, selector] if selector & 0x0F == 0x03 && selector >> 4 < MAX_TIMERS => {
                let index = selector >> 4;
                buf.put_u8(STATUS_OK);
                buf.put_u8(self.timer_count);
                buf.put_u8(index);
                buf.put_slice(&self.timers[usize::from(index)]);
            }
            // set one timer
            [0x09, 0x03, 0x01, index, record @ ..]
                if *index < MAX_TIMERS && record.len() == TIMER_RECORD_LEN =>
            {
                self.timers[usize::from(*index)].copy_from_slice(record);
                buf.put_u8(STATUS_OK);
            }
            _ => return status_only(StatusCode::Unsupported),
        }
        buf.freeze()
    }
}

fn status_only(status: StatusCode) -> Bytes {
    Bytes::copy_from_slice(&[status.to_byte()])
}

/// Simulated bot peripheral.
#[derive(Clone)]
pub struct MockBot {
    state: Arc<Mutex<MockState>>,
}

impl MockBot {
    /// Creates a reachable, disconnected bot with a full battery.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                connected: false,
                reachable: true,
                battery: 100,
                firmware: 49,
                timer_count: 0,
                clock: 0,
                timers: [[0; TIMER_RECORD_LEN]; MAX_TIMERS as usize],
                forced_status: None,
                silent: false,
                latency: Duration::ZERO,
                sink: None,
                writes: Vec::new(),
                connects: 0,
            })),
        }
    }

    /// Sets the reported battery level.
    pub fn set_battery(&self, percent: u8) {
        self.state.lock().battery = percent;
    }

    /// Sets the raw firmware byte.
    pub fn set_firmware(&self, firmware: u8) {
        self.state.lock().firmware = firmware;
    }

    /// Answers every command with `status` instead of executing it.
    pub fn force_status(&self, status: Option<StatusCode>) {
        self.state.lock().forced_status = status;
    }

    /// Accepts writes without ever notifying a response.
    pub fn set_silent(&self, silent: bool) {
        self.state.lock().silent = silent;
    }

    /// Delays each response notification.
    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().latency = latency;
    }

    /// Makes subsequent connection attempts fail.
    pub fn set_reachable(&self, reachable: bool) {
        self.state.lock().reachable = reachable;
    }

    /// Simulates the device dropping the link.
    pub fn drop_connection(&self) {
        let sink = {
            let mut state = self.state.lock();
            state.connected = false;
            state.sink.take()
        };
        if let Some(sink) = sink {
            sink.set_link_up(false);
        }
    }

    /// Pushes a notification the host did not ask for.
    pub fn notify(&self, data: Bytes) {
        let sink = self.state.lock().sink.clone();
        if let Some(sink) = sink {
            sink.deliver(data);
        }
    }

    /// Frames written so far, oldest first.
    #[must_use]
    pub fn writes(&self) -> Vec<Bytes> {
        self.state.lock().writes.clone()
    }

    /// Number of successful connects.
    #[must_use]
    pub fn connect_count(&self) -> usize {
        self.state.lock().connects
    }

    /// Current timer count.
    #[must_use]
    pub fn timer_count(&self) -> u8 {
        self.state.lock().timer_count
    }

    /// Overwrites a stored timer record as the device would hold it.
    pub fn set_timer_record(&self, index: u8, record: [u8; TIMER_RECORD_LEN]) {
        if let Some(slot) = self.state.lock().timers.get_mut(usize::from(index)) {
            *slot = record;
        }
    }

    /// Current clock, raw wire seconds.
    #[must_use]
    pub fn clock(&self) -> u64 {
        self.state.lock().clock
    }
}

impl Default for MockBot {
    fn default() -> Self {
        Self::new()
    }
}

impl Peripheral for MockBot {
    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    fn connect(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let mut state = self.state.lock();
            if !state.reachable {
                return Err(Error::transport("peripheral unreachable"));
            }
            state.connected = true;
            state.connects += 1;
            Ok(())
        })
    }

    fn disconnect(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.drop_connection();
            Ok(())
        })
    }

    fn discover(&mut self, service: Uuid) -> BoxFuture<'_, Result<Option<Vec<Characteristic>>>> {
        Box::pin(async move {
            if !self.is_connected() {
                return Err(Error::NotConnected);
            }
            if service != SERVICE_UUID {
                return Ok(None);
            }
            Ok(Some(vec![
                Characteristic {
                    uuid: COMMAND_UUID,
                    write: true,
                    notify: false,
                },
                Characteristic {
                    uuid: RESULT_UUID,
                    write: false,
                    notify: true,
                },
            ]))
        })
    }

    fn write(&mut self, characteristic: Uuid, data: Bytes) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let (sink, response, latency) = {
                let mut state = self.state.lock();
                if !state.connected {
                    return Err(Error::NotConnected);
                }
                if characteristic != COMMAND_UUID {
                    return Err(Error::transport(format!(
                        "characteristic {characteristic} is not writable"
                    )));
                }
                state.writes.push(data.clone());
                if state.silent {
                    return Ok(());
                }
                let response = state.respond(&data);
                (state.sink.clone(), response, state.latency)
            };

            if let Some(sink) = sink {
                if latency.is_zero() {
                    sink.deliver(response);
                } else {
                    tokio::spawn(async move {
                        tokio::time::sleep(latency).await;
                        sink.deliver(response);
                    });
                }
            }
            Ok(())
        })
    }

    fn subscribe(
        &mut self,
        characteristic: Uuid,
        sink: NotificationSink,
    ) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            if characteristic != RESULT_UUID {
                return Err(Error::transport(format!(
                    "characteristic {characteristic} does not notify"
                )));
            }
            self.state.lock().sink = Some(sink);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn respond(bot: &MockBot, frame: &[u8]) -> Bytes {
        bot.state.lock().respond(frame)
    }

    #[test]
    fn test_basic_info_layout() {
        let bot = MockBot::new();
        bot.set_battery(55);
        let response = respond(&bot, &[0x57, 0x02]);
        assert_eq!(&response[..], &[0x01, 55, 49, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_timer_storage() {
        let bot = MockBot::new();
        let record = [0x7F, 12, 53, 0x02, 0x00, 0, 0, 15, 0];
        let mut frame = vec![0x57, 0x09, 0x03, 0x01, 2];
        frame.extend_from_slice(&record);

        assert_eq!(&respond(&bot, &frame)[..], &[0x01]);
        let response = respond(&bot, &[0x57, 0x08, 0x23]);
        assert_eq!(&response[..3], &[0x01, 0x00, 2]);
        assert_eq!(&response[3..], &record);
    }

    #[test]
    fn test_rejects_unknown_frames() {
        let bot = MockBot::new();
        assert_eq!(&respond(&bot, &[0x42, 0x02])[..], &[0x04]);
        assert_eq!(&respond(&bot, &[0x57, 0x7E])[..], &[0x05]);
        assert_eq!(&respond(&bot, &[0x57, 0x08, 0x53])[..], &[0x05]);
        assert_eq!(&respond(&bot, &[0x57, 0x09, 0x02, 6])[..], &[0x05]);
    }

    #[test]
    fn test_forced_status() {
        let bot = MockBot::new();
        bot.force_status(Some(StatusCode::LowBattery));
        assert_eq!(&respond(&bot, &[0x57, 0x02])[..], &[0x06]);
    }
}
