// src/backend/memory.rs
use crate::backend::{CurrentMode, OutputId, OutputInfo, OutputSource};
use crate::error::{LayoutError, Result};
use crate::model::Snapshot;

/// Output source backed by a fixed list of reports.
///
/// Used to replay a captured state and as the platform stand-in in tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    outputs: Vec<OutputInfo>,
}

impl MemorySource {
    pub fn new(outputs: Vec<OutputInfo>) -> Self {
        Self { outputs }
    }

    /// The state a platform would report after applying `snapshot`.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let outputs = snapshot
            .iter()
            .map(|o| OutputInfo {
                name: o.name().to_string(),
                primary: o.is_primary(),
                current: o.active().map(|a| CurrentMode {
                    size: a.mode.size,
                    rate: a.mode.rate,
                    mode_name: a.mode.name.clone(),
                    position: a.position,
                    rotation: a.rotation,
                    reflection: a.reflection,
                    scale: a.scale,
                    power: a.power,
                }),
            })
            .collect();
        Self { outputs }
    }

    pub fn outputs(&self) -> &[OutputInfo] {
        &self.outputs
    }
}

impl OutputSource for MemorySource {
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
        "memory"
    }
}
