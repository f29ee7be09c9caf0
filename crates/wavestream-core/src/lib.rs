//! # wavestream-core
//!
//! Core data model for the Wavestream demo server.
//!
//! This crate provides:
//! - Waveform generators (sine, square)
//! - The fixed device registry and its descriptors
//!
//! This crate is intentionally runtime-agnostic and contains no async code.

pub mod registry;
pub mod waveform;

pub use registry::{Color, DeviceDescriptor, DeviceRegistry, RegistryError};
pub use waveform::{round_millis, SignalType, WaveParams};
