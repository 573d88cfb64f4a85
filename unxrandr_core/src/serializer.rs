// src/serializer.rs
//! Command serializer: snapshot in, command line out.
//!
//! What each target grammar can express is listed in a fixed capability
//! table. Anything outside it is dropped and recorded as an
//! [`UnsupportedFeatureLoss`], never turned into an error.

use std::fmt;

use log::info;

use crate::backend::sway::transform_name;
use crate::command::CommandLine;
use crate::model::{ActiveOutput, Output, Reflection, Rotation, Snapshot};

/// Output-control tool the command is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Xrandr,
    Swaymsg,
}

/// Attributes a target grammar can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Modes can be selected by their server-side name.
    pub mode_names: bool,
    pub rate: bool,
    pub rotation: bool,
    pub reflections: &'static [Reflection],
    pub scale: bool,
    pub power: bool,
    pub primary: bool,
    /// Whether "no output is primary" can be stated explicitly.
    pub no_primary: bool,
}

impl Capabilities {
    pub fn supports_reflection(&self, reflection: Reflection) -> bool {
        reflection.is_default() || self.reflections.contains(&reflection)
    }
}

const XRANDR_CAPABILITIES: Capabilities = Capabilities {
    mode_names: true,
    rate: true,
    rotation: true,
    reflections: &[Reflection::X, Reflection::Y, Reflection::XY],
    scale: false,
    power: false,
    primary: true,
    no_primary: true,
};

const SWAYMSG_CAPABILITIES: Capabilities = Capabilities {
    mode_names: false,
    rate: true,
    rotation: true,
    reflections: &[Reflection::X],
    scale: true,
    power: true,
    primary: false,
    no_primary: false,
};

impl Target {
    pub fn program(self) -> &'static str {
        match self {
            Target::Xrandr => "xrandr",
            Target::Swaymsg => "swaymsg",
        }
    }

    /// Recognises a program token, including a path to it.
    pub fn from_program(token: &str) -> Option<Self> {
        match token.rsplit('/').next().unwrap_or(token) {
            "xrandr" => Some(Target::Xrandr),
            "swaymsg" => Some(Target::Swaymsg),
            _ => None,
        }
    }

    pub fn capabilities(self) -> Capabilities {
        match self {
            Target::Xrandr => XRANDR_CAPABILITIES,
            Target::Swaymsg => SWAYMSG_CAPABILITIES,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// Output attribute that may be missing from a target grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    ModeName,
    Rate,
    Rotation,
    Reflection,
    Scale,
    Power,
    Primary,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Attribute::ModeName => "mode name",
            Attribute::Rate => "refresh rate",
            Attribute::Rotation => "rotation",
            Attribute::Reflection => "reflection",
            Attribute::Scale => "scale",
            Attribute::Power => "power state",
            Attribute::Primary => "primary flag",
        })
    }
}

/// An attribute left out of the command because the target cannot say it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedFeatureLoss {
    pub output: String,
    pub attribute: Attribute,
}

impl fmt::Display for UnsupportedFeatureLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} not representable, omitted", self.output, self.attribute)
    }
}

/// Serialize for xrandr.
pub fn serialize(snapshot: Snapshot) -> CommandLine {
    Serializer::new(Target::Xrandr).serialize(snapshot)
}

#[derive(Debug, Clone, Copy)]
pub struct Serializer {
    target: Target,
}

impl Serializer {
    pub fn new(target: Target) -> Self {
        Self { target }
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn serialize(&self, snapshot: Snapshot) -> CommandLine {
        let caps = self.target.capabilities();
        let mut args = Vec::new();
        let mut losses = Vec::new();

        if caps.no_primary && !snapshot.is_empty() && snapshot.primary().is_none() {
            args.push("--noprimary".to_string());
        }

        for (i, output) in snapshot.iter().enumerate() {
            let clause = Clause::resolve(output, &caps, &mut losses);
            match self.target {
                Target::Xrandr => xrandr_clause(&clause, &mut args),
                Target::Swaymsg => {
                    if i > 0 {
                        args.push(";".to_string());
                    }
                    swaymsg_clause(&clause, &mut args);
                }
            }
        }

        for loss in &losses {
            info!("{}", loss);
        }
        CommandLine::new(self.target.program(), args, losses)
    }
}

/// One output reduced to what the target can represent.
struct Clause<'a> {
    name: &'a str,
    active: Option<ActiveOutput>,
    primary: bool,
}

impl<'a> Clause<'a> {
    fn resolve(output: &'a Output, caps: &Capabilities, losses: &mut Vec<UnsupportedFeatureLoss>) -> Self {
        let mut lose = |attribute: Attribute| {
            losses.push(UnsupportedFeatureLoss {
                output: output.name().to_string(),
                attribute,
            })
        };

        let active = output.active().map(|a| {
            let mut a = a.clone();
            if a.mode.name.is_some() && !caps.mode_names {
                lose(Attribute::ModeName);
                a.mode.name = None;
            }
            if a.mode.rate.is_some() && !caps.rate {
                lose(Attribute::Rate);
                a.mode.rate = None;
            }
            if !a.rotation.is_default() && !caps.rotation {
                lose(Attribute::Rotation);
                a.rotation = Rotation::Normal;
            }
            if !caps.supports_reflection(a.reflection) {
                lose(Attribute::Reflection);
                a.reflection = Reflection::None;
            }
            if a.scale.is_some() && !caps.scale {
                lose(Attribute::Scale);
                a.scale = None;
            }
            if a.power.is_some() && !caps.power {
                lose(Attribute::Power);
                a.power = None;
            }
            a
        });

        // a disabled output only gets its off clause
        let primary = output.is_primary() && active.is_some() && caps.primary;
        if output.is_primary() && !primary {
            lose(Attribute::Primary);
        }

        Self {
            name: output.name(),
            active,
            primary,
        }
    }
}

fn xrandr_clause(clause: &Clause<'_>, args: &mut Vec<String>) {
    args.push("--output".to_string());
    args.push(clause.name.to_string());

    let Some(active) = &clause.active else {
        args.push("--off".to_string());
        return;
    };

    // xrandr looks modes up by name; unnamed modes are named `WxH`
    args.push("--mode".to_string());
    args.push(active.mode.selector());
    if let Some(rate) = active.mode.rate {
        args.push("--rate".to_string());
        args.push(rate.to_string());
    }
    args.push("--pos".to_string());
    args.push(format!("{}x{}", active.position.x, active.position.y));
    if !active.rotation.is_default() {
        args.push("--rotate".to_string());
        args.push(active.rotation.name().to_string());
    }
    if !active.reflection.is_default() {
        args.push("--reflect".to_string());
        args.push(active.reflection.name().to_string());
    }
    if clause.primary {
        args.push("--primary".to_string());
    }
}

fn swaymsg_clause(clause: &Clause<'_>, args: &mut Vec<String>) {
    args.push("output".to_string());
    args.push(clause.name.to_string());

    let Some(active) = &clause.active else {
        args.push("disable".to_string());
        return;
    };

    args.push("enable".to_string());
    args.push("mode".to_string());
    args.push(match active.mode.rate {
        Some(rate) => format!("{}@{}Hz", active.mode.size, rate),
        None => active.mode.size.to_string(),
    });
    args.push("pos".to_string());
    args.push(active.position.x.to_string());
    args.push(active.position.y.to_string());
    if !active.rotation.is_default() || !active.reflection.is_default() {
        // reflection was already reduced to what sway supports
        if let Some(transform) = transform_name(active.rotation, active.reflection) {
            args.push("transform".to_string());
            args.push(transform);
        }
    }
    if let Some(scale) = active.scale {
        args.push("scale".to_string());
        args.push(scale.to_string());
    }
    if let Some(power) = active.power {
        args.push("dpms".to_string());
        args.push(if power { "on" } else { "off" }.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Mode, Position, RefreshRate, Scale, Size};

    fn enabled(name: &str, w: u32, h: u32, x: i32, y: i32) -> Output {
        Output::enabled(
            name,
            ActiveOutput::new(Mode::new(Size::new(w, h), None), Position::new(x, y)),
        )
    }

    fn line(cmd: &CommandLine) -> String {
        cmd.to_string()
    }

    #[test]
    fn laptop_with_disabled_hdmi() {
        let snapshot = Snapshot::new(vec![
            enabled("eDP-1", 1920, 1080, 0, 0).with_primary(true),
            Output::disabled("HDMI-1"),
        ])
        .unwrap();
        let cmd = serialize(snapshot);
        assert_eq!(
            line(&cmd),
            "xrandr --output eDP-1 --mode 1920x1080 --pos 0x0 --primary --output HDMI-1 --off"
        );
        assert!(cmd.losses().is_empty());
    }

    #[test]
    fn empty_snapshot_is_bare_invocation() {
        let cmd = serialize(Snapshot::empty());
        assert!(cmd.is_bare());
        assert_eq!(line(&cmd), "xrandr");
        assert_eq!(line(&Serializer::new(Target::Swaymsg).serialize(Snapshot::empty())), "swaymsg");
    }

    #[test]
    fn no_primary_is_stated_explicitly() {
        let snapshot = Snapshot::new(vec![enabled("DP-1", 2560, 1440, 0, 0)]).unwrap();
        assert_eq!(
            line(&serialize(snapshot)),
            "xrandr --noprimary --output DP-1 --mode 2560x1440 --pos 0x0"
        );
    }

    #[test]
    fn rate_rotation_and_reflection_for_xrandr() {
        let active = ActiveOutput::new(
            Mode::new(Size::new(1920, 1200), RefreshRate::from_millihertz(59950)),
            Position::new(-1200, 0),
        )
        .with_rotation(Rotation::Left)
        .with_reflection(Reflection::Y);
        let snapshot = Snapshot::new(vec![Output::enabled("DP-2", active).with_primary(true)]).unwrap();
        assert_eq!(
            line(&serialize(snapshot)),
            "xrandr --output DP-2 --mode 1920x1200 --rate 59.950 --pos -1200x0 --rotate left --reflect y --primary"
        );
    }

    #[test]
    fn named_mode_is_selected_by_name() {
        let size = Size::new(2560, 1440);
        let mode = Mode::new(size, RefreshRate::from_millihertz(59951)).with_name("2560x1440_60.00");
        let snapshot = Snapshot::new(vec![
            Output::enabled("DP-1", ActiveOutput::new(mode, Position::new(0, 0))).with_primary(true),
        ])
        .unwrap();
        assert_eq!(
            line(&serialize(snapshot.clone())),
            "xrandr --output DP-1 --mode 2560x1440_60.00 --rate 59.951 --pos 0x0 --primary"
        );

        // sway selects modes by size and rate only
        let cmd = Serializer::new(Target::Swaymsg).serialize(snapshot);
        assert_eq!(
            line(&cmd),
            "swaymsg output DP-1 enable mode 2560x1440@59.951Hz pos 0 0"
        );
        let lost: Vec<Attribute> = cmd.losses().iter().map(|l| l.attribute).collect();
        assert_eq!(lost, [Attribute::ModeName, Attribute::Primary]);
    }

    #[test]
    fn scale_and_power_only_reach_swaymsg() {
        let active = ActiveOutput::new(
            Mode::new(Size::new(3840, 2160), RefreshRate::from_millihertz(60000)),
            Position::new(0, 0),
        )
        .with_scale(Scale::from_factor(1.5))
        .with_power(Some(false));
        let snapshot = Snapshot::new(vec![Output::enabled("DP-3", active)]).unwrap();

        let sway = Serializer::new(Target::Swaymsg).serialize(snapshot.clone());
        assert_eq!(
            line(&sway),
            "swaymsg output DP-3 enable mode 3840x2160@60.000Hz pos 0 0 scale 1.5 dpms off"
        );
        assert!(sway.losses().is_empty());

        let xrandr = serialize(snapshot);
        assert_eq!(
            line(&xrandr),
            "xrandr --noprimary --output DP-3 --mode 3840x2160 --rate 60.000 --pos 0x0"
        );
        let lost: Vec<Attribute> = xrandr.losses().iter().map(|l| l.attribute).collect();
        assert_eq!(lost, [Attribute::Scale, Attribute::Power]);
    }

    #[test]
    fn swaymsg_clauses_and_losses() {
        let rotated = ActiveOutput::new(
            Mode::new(Size::new(1920, 1080), RefreshRate::from_millihertz(59934)),
            Position::new(0, 0),
        )
        .with_rotation(Rotation::Right)
        .with_reflection(Reflection::Y);
        let snapshot = Snapshot::new(vec![
            Output::enabled("eDP-1", rotated).with_primary(true),
            Output::disabled("HDMI-A-1"),
        ])
        .unwrap();
        let cmd = Serializer::new(Target::Swaymsg).serialize(snapshot);
        assert_eq!(
            line(&cmd),
            "swaymsg output eDP-1 enable mode 1920x1080@59.934Hz pos 0 0 transform 90 ';' output HDMI-A-1 disable"
        );
        let lost: Vec<Attribute> = cmd.losses().iter().map(|l| l.attribute).collect();
        assert_eq!(lost, [Attribute::Reflection, Attribute::Primary]);
        assert!(cmd.losses().iter().all(|l| l.output == "eDP-1"));
    }

    #[test]
    fn primary_on_disabled_output_is_a_loss() {
        let snapshot = Snapshot::new(vec![
            Output::disabled("DP-1").with_primary(true),
            enabled("eDP-1", 1920, 1080, 0, 0),
        ])
        .unwrap();
        let cmd = serialize(snapshot);
        assert_eq!(
            line(&cmd),
            "xrandr --output DP-1 --off --output eDP-1 --mode 1920x1080 --pos 0x0"
        );
        assert_eq!(
            cmd.losses(),
            [UnsupportedFeatureLoss {
                output: "DP-1".into(),
                attribute: Attribute::Primary
            }]
        );
    }

    #[test]
    fn equal_snapshots_serialize_identically() {
        let build = || {
            Snapshot::new(vec![
                enabled("DP-1", 2560, 1440, 1920, 0),
                enabled("eDP-1", 1920, 1080, 0, 0).with_primary(true),
            ])
            .unwrap()
        };
        for target in [Target::Xrandr, Target::Swaymsg] {
            let a = Serializer::new(target).serialize(build()).to_string();
            let b = Serializer::new(target).serialize(build()).to_string();
            assert_eq!(a.as_bytes(), b.as_bytes());
        }
    }

    #[test]
    fn program_tokens_are_recognised() {
        assert_eq!(Target::from_program("xrandr"), Some(Target::Xrandr));
        assert_eq!(Target::from_program("/usr/bin/swaymsg"), Some(Target::Swaymsg));
        assert_eq!(Target::from_program("wlr-randr"), None);
    }
}
