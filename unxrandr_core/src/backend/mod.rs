// src/backend/mod.rs
//! Read-only adapters over the platform display subsystems.
//!
//! Every adapter implements [`OutputSource`], whose methods only take
//! `&self`: a source can be asked about outputs but offers no way to change
//! them. Connections are owned by the adapter value and closed when it is
//! dropped.

pub mod memory;
pub mod sway;
pub mod x11;

use std::fmt;

use crate::error::Result;
use crate::model::{Position, Reflection, RefreshRate, Rotation, Scale, Size};

/// Platform identifier of an output (its name, e.g. `eDP-1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputId(pub String);

impl OutputId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the platform reports for the mode an output is currently driven with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentMode {
    pub size: Size,
    pub rate: Option<RefreshRate>,
    /// Mode name as the server knows it (X11 only).
    pub mode_name: Option<String>,
    pub position: Position,
    pub rotation: Rotation,
    pub reflection: Reflection,
    pub scale: Option<Scale>,
    pub power: Option<bool>,
}

impl CurrentMode {
    pub fn new(size: Size, rate: Option<RefreshRate>, position: Position) -> Self {
        Self {
            size,
            rate,
            mode_name: None,
            position,
            rotation: Rotation::Normal,
            reflection: Reflection::None,
            scale: None,
            power: None,
        }
    }
}

/// Raw per-output report, before it is turned into a model `Output`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputInfo {
    pub name: String,
    pub primary: bool,
    /// `None` when the output is not driven by any mode.
    pub current: Option<CurrentMode>,
}

impl OutputInfo {
    pub fn inactive(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary: false,
            current: None,
        }
    }
}

/// Capability interface over a display subsystem.
pub trait OutputSource {
    /// Outputs in the platform's enumeration order.
    fn list_output_ids(&self) -> Result<Vec<OutputId>>;

    fn get_output(&self, id: &OutputId) -> Result<OutputInfo>;

    /// Short backend name used in log lines.
    fn describe(&self) -> &'static str;
}
