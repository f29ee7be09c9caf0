//! Per-connection streaming sessions.
//!
//! A session starts `Idle`. A valid subscription command makes it `Active`
//! with a periodic timer; a later valid command replaces the subscription
//! and its timer. Dropping the timer is the only cancellation mechanism, so
//! two timers can never run on one session.

use std::sync::Arc;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::debug;

use wavestream_core::{DeviceRegistry, SignalType};
use wavestream_protocol::{
    encode_error, encode_sample, parse_command, unix_seconds_now, CodecError, ErrorMessage,
    OutputFormat, ParsedCommand, SampleRow, SubscribeCommand,
};

/// Lifecycle of a streaming session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, no timer running.
    Idle,
    /// Timer running.
    Active,
    /// Terminal; the connection is gone.
    Closed,
}

/// What a client frame did to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// Blank frame, or the session is closed.
    Ignored,
    /// No known identifiers; carries the encoded error frame to send back.
    Rejected(String),
    /// A new subscription replaced any previous one.
    Subscribed {
        datastreams: Vec<String>,
        sample_rate: u32,
        output_format: OutputFormat,
    },
}

/// The subscription a session is currently emitting.
struct ActiveStream {
    datastreams: Vec<String>,
    signals: Vec<SignalType>,
    sample_rate: u32,
    output_format: OutputFormat,
    timer: Interval,
}

/// Streaming state owned by a single connection.
pub struct StreamingSession {
    registry: Arc<DeviceRegistry>,
    active: Option<ActiveStream>,
    closed: bool,
}

impl StreamingSession {
    pub fn new(registry: Arc<DeviceRegistry>) -> Self {
        Self {
            registry,
            active: None,
            closed: false,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.closed {
            SessionState::Closed
        } else if self.active.is_some() {
            SessionState::Active
        } else {
            SessionState::Idle
        }
    }

    /// Identifiers being emitted, in emission order.
    pub fn datastreams(&self) -> &[String] {
        self.active
            .as_ref()
            .map(|a| a.datastreams.as_slice())
            .unwrap_or(&[])
    }

    pub fn sample_rate(&self) -> Option<u32> {
        self.active.as_ref().map(|a| a.sample_rate)
    }

    pub fn output_format(&self) -> Option<&OutputFormat> {
        self.active.as_ref().map(|a| &a.output_format)
    }

    /// Apply one client frame.
    ///
    /// Must be called from within a tokio runtime: a successful subscription
    /// schedules a timer.
    pub fn handle_command(&mut self, text: &str) -> Result<CommandOutcome, CodecError> {
        if self.closed {
            return Ok(CommandOutcome::Ignored);
        }

        match parse_command(text, &self.registry) {
            ParsedCommand::Empty => Ok(CommandOutcome::Ignored),
            ParsedCommand::NoValidIdentifiers => {
                let error = encode_error(&ErrorMessage::no_valid_identifiers())?;
                Ok(CommandOutcome::Rejected(error))
            }
            ParsedCommand::Subscribe(cmd) => Ok(self.subscribe(cmd)),
        }
    }

    fn subscribe(&mut self, cmd: SubscribeCommand) -> CommandOutcome {
        let devices = self
            .registry
            .resolve(cmd.identifiers.iter().map(String::as_str));
        let datastreams: Vec<String> = devices.iter().map(|d| d.identifier.clone()).collect();
        let signals = devices.iter().map(|d| d.signal_type).collect();

        self.cancel();

        let period = cmd.tick_period();
        let mut timer = interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        debug!(
            "Streaming {:?} at {} Hz as {}",
            datastreams, cmd.sample_rate, cmd.output_format
        );

        self.active = Some(ActiveStream {
            datastreams: datastreams.clone(),
            signals,
            sample_rate: cmd.sample_rate,
            output_format: cmd.output_format.clone(),
            timer,
        });

        CommandOutcome::Subscribed {
            datastreams,
            sample_rate: cmd.sample_rate,
            output_format: cmd.output_format,
        }
    }

    /// Wait for the next tick of the active timer.
    ///
    /// Never resolves while the session is idle or closed. Cancel safe.
    pub async fn next_tick(&mut self) {
        match self.active.as_mut() {
            Some(active) => {
                active.timer.tick().await;
            }
            None => std::future::pending().await,
        }
    }

    /// Sample all selected devices now and encode the row.
    ///
    /// `Ok(None)` when idle or when the output format produces nothing.
    pub fn sample(&self) -> Result<Option<String>, CodecError> {
        self.sample_at(unix_seconds_now())
    }

    /// Like [`sample`](Self::sample), at a fixed timestamp.
    pub fn sample_at(&self, timestamp: f64) -> Result<Option<String>, CodecError> {
        match &self.active {
            Some(active) => encode_sample(
                &SampleRow::at(timestamp, &active.signals),
                &active.datastreams,
                &active.output_format,
            ),
            None => Ok(None),
        }
    }

    /// Stop the timer; the session goes back to idle.
    pub fn cancel(&mut self) {
        self.active = None;
    }

    /// Stop the timer and refuse further commands.
    pub fn close(&mut self) {
        self.cancel();
        self.closed = true;
    }
}
