// src/reader.rs
//! State reader: turns a platform report into a validated [`Snapshot`].

use log::{debug, info};

use crate::backend::sway::SwayOutputSource;
use crate::backend::x11::X11OutputSource;
use crate::backend::{OutputInfo, OutputSource};
use crate::config::{OutputOrder, QueryConfig};
use crate::error::{LayoutError, Result};
use crate::model::{ActiveOutput, Mode, Output, Snapshot};

/// Concrete display subsystem a snapshot is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    X11,
    Sway,
}

/// Read the current layout from the backend selected by `config`.
pub fn read_snapshot(config: &QueryConfig) -> Result<Snapshot> {
    read_snapshot_from(config.resolve_backend(), config)
}

/// Read the current layout from `backend`.
///
/// The connection lives only inside this call and is closed on every path,
/// success or error.
pub fn read_snapshot_from(backend: Backend, config: &QueryConfig) -> Result<Snapshot> {
    match backend {
        Backend::X11 => {
            let source = X11OutputSource::connect(config.display.as_deref())?;
            read_from(&source, config.order)
        }
        Backend::Sway => {
            let socket = config.sway_socket().ok_or_else(|| {
                LayoutError::platform_query("No sway socket configured and $SWAYSOCK is not set")
            })?;
            let source = SwayOutputSource::connect(&socket, config.ipc_timeout())?;
            read_from(&source, config.order)
        }
    }
}

/// Build a snapshot from any output source.
pub fn read_from<S: OutputSource + ?Sized>(source: &S, order: OutputOrder) -> Result<Snapshot> {
    let ids = source.list_output_ids()?;
    debug!("{}: {} outputs listed", source.describe(), ids.len());

    let mut outputs = Vec::with_capacity(ids.len());
    for id in &ids {
        let info = source.get_output(id)?;
        if info.name != id.as_str() {
            return Err(LayoutError::platform_query(format!(
                "Output '{}' was reported as '{}'",
                id, info.name
            )));
        }
        outputs.push(to_output(info));
    }

    if order == OutputOrder::Name {
        outputs.sort_by(|a, b| a.name().cmp(b.name()));
    }

    let snapshot = Snapshot::new(outputs)?;
    info!(
        "{}: read {} outputs, {} enabled",
        source.describe(),
        snapshot.len(),
        snapshot.iter().filter(|o| o.is_enabled()).count()
    );
    Ok(snapshot)
}

fn to_output(info: OutputInfo) -> Output {
    let active = match info.current {
        Some(current) if !current.size.is_empty() => {
            let mut mode = Mode::new(current.size, current.rate);
            if let Some(name) = current.mode_name {
                mode = mode.with_name(name);
            }
            Some(
                ActiveOutput::new(mode, current.position)
                    .with_rotation(current.rotation)
                    .with_reflection(current.reflection)
                    .with_scale(current.scale)
                    .with_power(current.power),
            )
        }
        Some(_) => {
            debug!("{} reports an empty mode, treating it as disabled", info.name);
            None
        }
        None => None,
    };

    let output = match active {
        Some(active) => Output::enabled(info.name, active),
        None => Output::disabled(info.name),
    };
    output.with_primary(info.primary)
}
