//! Protocol definitions for bot communication.
//!
//! This module contains the low-level protocol types including:
//! - Command opcodes and the [`Command`] enum
//! - Frame encoding
//! - Status codes
//! - Response decoding

pub mod command;
pub mod frame;
pub mod parser;
pub mod status;

pub use command::{Command, CommandKind, MAGIC, Opcode, TimeOp};
pub use frame::{MAX_FRAME_SIZE, encode};
pub use parser::{
    Response, decode, parse_basic_info, parse_device_time, parse_status, parse_timer_info,
};
pub use status::{STATUS_OK, StatusCode};
