// src/backend/sway/output_ops.rs
use std::path::Path;
use std::time::Duration;

use log::debug;
use serde::Deserialize;

use super::{ipc, parse_transform};
use crate::backend::{CurrentMode, OutputId, OutputInfo, OutputSource};
use crate::error::{LayoutError, Result};
use crate::model::{Position, RefreshRate, Scale, Size};

#[derive(Debug, Deserialize)]
struct SwayRect {
    #[serde(default)]
    x: i32,
    #[serde(default)]
    y: i32,
}

#[derive(Debug, Deserialize)]
struct SwayMode {
    width: u32,
    height: u32,
    /// millihertz
    #[serde(default)]
    refresh: u32,
}

#[derive(Debug, Deserialize)]
struct SwayOutput {
    name: String,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    primary: bool,
    rect: Option<SwayRect>,
    current_mode: Option<SwayMode>,
    transform: Option<String>,
    scale: Option<f64>,
    /// sway >= 1.8
    power: Option<bool>,
    /// older sway releases
    dpms: Option<bool>,
}

/// Output reader for sway.
///
/// The whole state comes from one `GET_OUTPUTS` reply, taken while
/// connecting; the socket is closed right after.
pub struct SwayOutputSource {
    outputs: Vec<OutputInfo>,
}

impl SwayOutputSource {
    pub fn connect(socket: &Path, timeout: Duration) -> Result<Self> {
        let payload = ipc::request(socket, ipc::GET_OUTPUTS, timeout)?;
        let outputs = decode_outputs(&payload)?;
        debug!("sway reported {} outputs", outputs.len());
        Ok(Self { outputs })
    }
}

impl OutputSource for SwayOutputSource {
    fn list_output_ids(&self) -> Result<Vec<OutputId>> {
        Ok(self
            .outputs
            .iter()
            .map(|o| OutputId::new(o.name.clone()))
            .collect())
    }

    fn get_output(&self, id: &OutputId) -> Result<OutputInfo> {
        self.outputs
            .iter()
            .find(|o| o.name == id.as_str())
            .cloned()
            .ok_or_else(|| LayoutError::platform_query(format!("Unknown output '{}'", id)))
    }

    fn describe(&self) -> &'static str {
        "sway"
    }
}

pub(crate) fn decode_outputs(payload: &[u8]) -> Result<Vec<OutputInfo>> {
    let raw: Vec<SwayOutput> = serde_json::from_slice(payload).map_err(|e| {
        LayoutError::platform_query(format!("Malformed GET_OUTPUTS reply: {}", e))
    })?;
    raw.into_iter().map(convert).collect()
}

fn convert(output: SwayOutput) -> Result<OutputInfo> {
    let current = match (output.active, output.current_mode) {
        (true, Some(mode)) => {
            let (rotation, reflection) = match output.transform.as_deref() {
                None => Default::default(),
                Some(t) => parse_transform(t).ok_or_else(|| {
                    LayoutError::platform_query(format!(
                        "Output {} reports unknown transform '{}'",
                        output.name, t
                    ))
                })?,
            };
            let position = output
                .rect
                .map(|r| Position::new(r.x, r.y))
                .unwrap_or_default();
            Some(CurrentMode {
                size: Size::new(mode.width, mode.height),
                rate: RefreshRate::from_millihertz(mode.refresh),
                mode_name: None,
                position,
                rotation,
                reflection,
                scale: output.scale.and_then(Scale::from_factor),
                power: output.power.or(output.dpms),
            })
        }
        _ => None,
    };

    Ok(OutputInfo {
        name: output.name,
        primary: output.primary,
        current,
    })
}
