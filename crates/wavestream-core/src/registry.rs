//! The fixed device registry.
//!
//! The registry is built once at startup and never mutated. Handlers share
//! it read-only through an `Arc`, so lookups need no locking.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::waveform::SignalType;

/// Errors raised while building a registry.
#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    /// Two descriptors share an identifier.
    #[error("Duplicate device identifier: {0}")]
    DuplicateIdentifier(String),
}

/// Display color of a datastream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A single synthetic device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDescriptor {
    /// Opaque token naming the datastream (e.g. "1002345").
    pub identifier: String,
    pub color: Color,
    pub signal_type: SignalType,
}

impl DeviceDescriptor {
    pub fn new(identifier: impl Into<String>, color: Color, signal_type: SignalType) -> Self {
        Self {
            identifier: identifier.into(),
            color,
            signal_type,
        }
    }
}

/// Ordered, immutable collection of device descriptors.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: Vec<DeviceDescriptor>,
}

impl DeviceRegistry {
    /// Build a registry, rejecting duplicate identifiers.
    pub fn new(devices: Vec<DeviceDescriptor>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::with_capacity(devices.len());
        for device in &devices {
            if !seen.insert(device.identifier.as_str()) {
                return Err(RegistryError::DuplicateIdentifier(device.identifier.clone()));
            }
        }
        Ok(Self { devices })
    }

    /// The built-in demo catalog: one sine source and one square source.
    pub fn demo() -> Self {
        Self {
            devices: vec![
                DeviceDescriptor::new("1002345", Color::new(0, 0, 255), SignalType::Sine),
                DeviceDescriptor::new("299345", Color::new(255, 0, 0), SignalType::Square),
            ],
        }
    }

    /// All descriptors in registry order.
    pub fn list(&self) -> &[DeviceDescriptor] {
        &self.devices
    }

    pub fn exists(&self, identifier: &str) -> bool {
        self.get(identifier).is_some()
    }

    pub fn get(&self, identifier: &str) -> Option<&DeviceDescriptor> {
        self.devices.iter().find(|d| d.identifier == identifier)
    }

    /// Select the descriptors named in `identifiers`, in registry order.
    ///
    /// Request order is ignored, duplicates collapse and unknown identifiers
    /// are dropped. Callers decide whether an empty result is an error.
    pub fn resolve<'a, I>(&self, identifiers: I) -> Vec<&DeviceDescriptor>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let wanted: HashSet<&str> = identifiers.into_iter().collect();
        self.devices
            .iter()
            .filter(|d| wanted.contains(d.identifier.as_str()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
