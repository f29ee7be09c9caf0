//! # wavestream-protocol
//!
//! Wavestream wire formats.
//!
//! This crate defines the REST listing body, the streaming channel's
//! subscription command grammar, and the JSON/CSV sample encoders.

pub mod codec;
pub mod command;
pub mod messages;

pub use codec::{encode_error, encode_sample, encode_server_message, CodecError};
pub use command::{
    parse_command, OutputFormat, ParsedCommand, SubscribeCommand, DEFAULT_SAMPLE_RATE,
};
pub use messages::*;
