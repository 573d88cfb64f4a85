// src/backend/x11/output_ops.rs
use log::{debug, warn};
use x11rb::connection::Connection;
use x11rb::protocol::randr::{self, ConnectionExt as RandrExt};
use x11rb::rust_connection::RustConnection;

use crate::backend::{CurrentMode, OutputId, OutputInfo, OutputSource};
use crate::error::{LayoutError, Result};
use crate::model::{Position, Reflection, RefreshRate, Rotation, Size};

// randr.xml: Rotation 掩码
const ROTATE_0: u16 = 1 << 0;
const ROTATE_90: u16 = 1 << 1;
const ROTATE_180: u16 = 1 << 2;
const ROTATE_270: u16 = 1 << 3;
const REFLECT_X: u16 = 1 << 4;
const REFLECT_Y: u16 = 1 << 5;
const ROTATION_MASK: u16 = ROTATE_0 | ROTATE_90 | ROTATE_180 | ROTATE_270;

// randr.xml: ModeFlag 掩码
const MODE_FLAG_INTERLACE: u32 = 1 << 4;
const MODE_FLAG_DOUBLE_SCAN: u32 = 1 << 5;

struct X11Mode {
    info: randr::ModeInfo,
    name: String,
}

struct X11Output {
    xid: randr::Output,
    name: String,
    info: randr::GetOutputInfoReply,
}

/// RandR output reader.
///
/// Every request below is a query. All of them carry the `config_timestamp`
/// of the screen resources, so a configuration change in the middle of the
/// read shows up as an `InvalidConfigTime` status instead of a mixed state.
pub struct X11OutputSource {
    conn: RustConnection,
    config_timestamp: u32,
    modes: Vec<X11Mode>,
    outputs: Vec<X11Output>,
    primary: randr::Output,
}

impl X11OutputSource {
    pub fn connect(display: Option<&str>) -> Result<Self> {
        let (conn, screen_num) = RustConnection::connect(display)?;
        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .map(|screen| screen.root)
            .ok_or_else(|| {
                LayoutError::platform_query(format!("X server has no screen {}", screen_num))
            })?;

        // GetScreenResourcesCurrent / GetOutputPrimary 需要 RandR 1.3
        let version = conn.randr_query_version(1, 5)?.reply()?;
        if (version.major_version, version.minor_version) < (1, 3) {
            return Err(LayoutError::platform_query(format!(
                "RandR 1.3 or newer required, server reports {}.{}",
                version.major_version, version.minor_version
            )));
        }
        debug!(
            "RandR {}.{} on screen {}",
            version.major_version, version.minor_version, screen_num
        );

        // 不使用 GetScreenResources：它会触发硬件重新探测
        let resources = conn.randr_get_screen_resources_current(root)?.reply()?;
        let primary = conn.randr_get_output_primary(root)?.reply()?.output;
        let names = split_mode_names(resources.modes.iter().map(|m| m.name_len), &resources.names)?;
        let modes = resources
            .modes
            .into_iter()
            .zip(names)
            .map(|(info, name)| X11Mode { info, name })
            .collect();

        let mut outputs = Vec::with_capacity(resources.outputs.len());
        for output in &resources.outputs {
            let info = conn
                .randr_get_output_info(*output, resources.config_timestamp)?
                .reply()?;
            check_status(info.status, "output")?;
            let name = String::from_utf8(info.name.clone()).map_err(|_| {
                LayoutError::platform_query(format!("Output {:#x} has a non-UTF-8 name", output))
            })?;
            outputs.push(X11Output {
                xid: *output,
                name,
                info,
            });
        }

        Ok(Self {
            conn,
            config_timestamp: resources.config_timestamp,
            modes,
            outputs,
            primary,
        })
    }

    fn current_mode(&self, name: &str, info: &randr::GetOutputInfoReply) -> Result<Option<CurrentMode>> {
        if info.crtc == x11rb::NONE {
            return Ok(None);
        }
        let crtc = self
            .conn
            .randr_get_crtc_info(info.crtc, self.config_timestamp)?
            .reply()?;
        check_status(crtc.status, "crtc")?;
        if crtc.mode == x11rb::NONE {
            return Ok(None);
        }

        let Some(X11Mode { info: mode, name: mode_name }) =
            self.modes.iter().find(|m| m.info.id == crtc.mode)
        else {
            warn!("Output {} uses mode {:#x} missing from the screen resources", name, crtc.mode);
            return Ok(None);
        };

        let (rotation, reflection) = decode_rotation(u16::from(crtc.rotation))?;
        Ok(Some(CurrentMode {
            size: Size::new(mode.width.into(), mode.height.into()),
            rate: refresh_rate(mode.dot_clock, mode.htotal, mode.vtotal, u32::from(mode.mode_flags)),
            mode_name: Some(mode_name.clone()),
            position: Position::new(crtc.x.into(), crtc.y.into()),
            rotation,
            reflection,
            scale: None,
            power: None,
        }))
    }
}

impl OutputSource for X11OutputSource {
    fn list_output_ids(&self) -> Result<Vec<OutputId>> {
        Ok(self
            .outputs
            .iter()
            .map(|o| OutputId::new(o.name.clone()))
            .collect())
    }

    fn get_output(&self, id: &OutputId) -> Result<OutputInfo> {
        let output = self
            .outputs
            .iter()
            .find(|o| o.name == id.as_str())
            .ok_or_else(|| LayoutError::platform_query(format!("Unknown output '{}'", id)))?;

        Ok(OutputInfo {
            name: output.name.clone(),
            primary: self.primary != x11rb::NONE && output.xid == self.primary,
            current: self.current_mode(&output.name, &output.info)?,
        })
    }

    fn describe(&self) -> &'static str {
        "x11"
    }
}

fn check_status(status: randr::SetConfig, what: &str) -> Result<()> {
    if status == randr::SetConfig::SUCCESS {
        return Ok(());
    }
    if status == randr::SetConfig::INVALID_CONFIG_TIME {
        return Err(LayoutError::platform_query(format!(
            "Output configuration changed while reading {} state",
            what
        )));
    }
    Err(LayoutError::platform_query(format!(
        "Server refused {} query (status {})",
        what,
        u8::from(status)
    )))
}

/// Cut the concatenated `names` blob of the screen resources into one name
/// per mode, in mode order.
pub(crate) fn split_mode_names(
    lengths: impl IntoIterator<Item = u16>,
    names: &[u8],
) -> Result<Vec<String>> {
    let mut rest = names;
    let mut out = Vec::new();
    for len in lengths {
        let len = usize::from(len);
        if len > rest.len() {
            return Err(LayoutError::platform_query(format!(
                "Mode name of {} bytes overruns the {} byte name table",
                len,
                names.len()
            )));
        }
        let (name, tail) = rest.split_at(len);
        out.push(String::from_utf8_lossy(name).into_owned());
        rest = tail;
    }
    Ok(out)
}

/// Refresh rate of a mode line, computed the way xrandr does.
pub(crate) fn refresh_rate(dot_clock: u32, htotal: u16, vtotal: u16, flags: u32) -> Option<RefreshRate> {
    let mut vtotal = f64::from(vtotal);
    if flags & MODE_FLAG_DOUBLE_SCAN != 0 {
        vtotal *= 2.0;
    }
    if flags & MODE_FLAG_INTERLACE != 0 {
        vtotal /= 2.0;
    }
    if htotal == 0 || vtotal == 0.0 {
        return None;
    }
    RefreshRate::from_hz(f64::from(dot_clock) / (f64::from(htotal) * vtotal))
}

pub(crate) fn decode_rotation(bits: u16) -> Result<(Rotation, Reflection)> {
    let rotation = match bits & ROTATION_MASK {
        ROTATE_0 => Rotation::Normal,
        ROTATE_90 => Rotation::Left,
        ROTATE_180 => Rotation::Inverted,
        ROTATE_270 => Rotation::Right,
        other => {
            return Err(LayoutError::platform_query(format!(
                "Malformed CRTC rotation bits {:#06b}",
                other
            )))
        }
    };
    let reflection = match (bits & REFLECT_X != 0, bits & REFLECT_Y != 0) {
        (false, false) => Reflection::None,
        (true, false) => Reflection::X,
        (false, true) => Reflection::Y,
        (true, true) => Reflection::XY,
    };
    Ok((rotation, reflection))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_of_cea_1080p() {
        let rate = refresh_rate(148_500_000, 2200, 1125, 0).unwrap();
        assert_eq!(rate.millihertz(), 60000);
    }

    #[test]
    fn rate_honours_interlace_and_doublescan() {
        let interlaced = refresh_rate(74_250_000, 2200, 1125, MODE_FLAG_INTERLACE).unwrap();
        assert_eq!(interlaced.millihertz(), 60000);
        let doubled = refresh_rate(148_500_000, 2200, 1125, MODE_FLAG_DOUBLE_SCAN).unwrap();
        assert_eq!(doubled.millihertz(), 30000);
    }

    #[test]
    fn rate_absent_for_zero_totals() {
        assert_eq!(refresh_rate(148_500_000, 0, 1125, 0), None);
        assert_eq!(refresh_rate(148_500_000, 2200, 0, 0), None);
        assert_eq!(refresh_rate(0, 2200, 1125, 0), None);
    }

    #[test]
    fn mode_names_are_cut_from_the_name_table() {
        let names = b"1920x10802560x1440_60.001920x1080i";
        let split = split_mode_names([9, 15, 10], names).unwrap();
        assert_eq!(split, ["1920x1080", "2560x1440_60.00", "1920x1080i"]);
    }

    #[test]
    fn short_name_table_is_malformed() {
        let err = split_mode_names([9, 20], b"1920x10802560x1440").unwrap_err();
        assert!(err.is_platform_query());
    }

    #[test]
    fn rotation_bits_decode() {
        assert_eq!(decode_rotation(ROTATE_0).unwrap(), (Rotation::Normal, Reflection::None));
        assert_eq!(decode_rotation(ROTATE_90).unwrap().0, Rotation::Left);
        assert_eq!(decode_rotation(ROTATE_270).unwrap().0, Rotation::Right);
        assert_eq!(
            decode_rotation(ROTATE_180 | REFLECT_X | REFLECT_Y).unwrap(),
            (Rotation::Inverted, Reflection::XY)
        );
        assert_eq!(decode_rotation(ROTATE_0 | REFLECT_Y).unwrap().1, Reflection::Y);
    }

    #[test]
    fn malformed_rotation_bits_are_rejected() {
        assert!(decode_rotation(0).unwrap_err().is_platform_query());
        assert!(decode_rotation(ROTATE_0 | ROTATE_90).is_err());
    }
}
