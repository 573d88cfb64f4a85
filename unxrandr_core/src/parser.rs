// src/parser.rs
//! Reads a generated command (or script) back into a [`Snapshot`].
//!
//! Only the grammar the serializer writes is understood, plus a few sway
//! aliases and subcommands that carry no layout and are skipped.

use log::debug;

use crate::backend::sway::parse_transform;
use crate::command::split;
use crate::error::{LayoutError, Result};
use crate::model::{
    ActiveOutput, Mode, Output, Position, Reflection, RefreshRate, Rotation, Scale, Size, Snapshot,
};
use crate::serializer::Target;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub target: Target,
    pub snapshot: Snapshot,
}

/// Parse a command line or a shell script made of command lines.
///
/// Blank lines and `#` comments are skipped. Several lines for the same
/// program are read as one invocation.
pub fn parse_command(text: &str) -> Result<ParsedCommand> {
    let mut target = None;
    let mut args: Vec<String> = Vec::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut words = split(line)?.into_iter();
        let Some(program) = words.next() else {
            continue;
        };
        let line_target = Target::from_program(&program)
            .ok_or_else(|| LayoutError::syntax(format!("Unknown program '{}'", program)))?;
        match target {
            None => target = Some(line_target),
            Some(t) if t != line_target => {
                return Err(LayoutError::syntax(format!(
                    "Mixed programs in one script: {} and {}",
                    t, line_target
                )))
            }
            Some(_) => {}
        }
        if line_target == Target::Swaymsg && !args.is_empty() {
            args.push(";".to_string());
        }
        args.extend(words);
    }

    let target = target.ok_or_else(|| LayoutError::syntax("No command found"))?;
    let outputs = match target {
        Target::Xrandr => parse_xrandr(&args)?,
        Target::Swaymsg => parse_swaymsg(&args)?,
    };
    let snapshot = Snapshot::checked(outputs, LayoutError::syntax)?;
    debug!("parsed {} command with {} outputs", target, snapshot.len());

    Ok(ParsedCommand { target, snapshot })
}

/// Settings collected for one output before it becomes an [`Output`].
#[derive(Debug, Default)]
struct Pending {
    name: String,
    enable: Option<bool>,
    size: Option<Size>,
    mode_name: Option<String>,
    rate: Option<RefreshRate>,
    position: Option<Position>,
    rotation: Rotation,
    reflection: Reflection,
    scale: Option<Scale>,
    power: Option<bool>,
    primary: bool,
}

impl Pending {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    fn finish(self) -> Result<Output> {
        let size = match (self.enable, self.size) {
            (Some(false), _) => return Ok(Output::disabled(self.name).with_primary(self.primary)),
            (_, Some(size)) => size,
            (Some(true), None) => {
                return Err(LayoutError::syntax(format!(
                    "Output {} is enabled without a mode",
                    self.name
                )))
            }
            (None, None) => {
                return Err(LayoutError::syntax(format!(
                    "Output {} is neither configured nor turned off",
                    self.name
                )))
            }
        };
        let mut mode = Mode::new(size, self.rate);
        if let Some(name) = self.mode_name {
            mode = mode.with_name(name);
        }
        let active = ActiveOutput::new(mode, self.position.unwrap_or_default())
            .with_rotation(self.rotation)
            .with_reflection(self.reflection)
            .with_scale(self.scale)
            .with_power(self.power);
        Ok(Output::enabled(self.name, active).with_primary(self.primary))
    }
}

/// Collects pending outputs in first-mention order.
#[derive(Default)]
struct Outputs(Vec<Pending>);

impl Outputs {
    fn select(&mut self, name: &str) -> Result<usize> {
        if name.is_empty() {
            return Err(LayoutError::syntax("Empty output name"));
        }
        if let Some(i) = self.0.iter().position(|p| p.name == name) {
            return Ok(i);
        }
        self.0.push(Pending::new(name));
        Ok(self.0.len() - 1)
    }

    fn finish(self) -> Result<Vec<Output>> {
        self.0.into_iter().map(Pending::finish).collect()
    }
}

fn value<'a>(it: &mut impl Iterator<Item = &'a String>, option: &str) -> Result<&'a str> {
    it.next()
        .map(String::as_str)
        .ok_or_else(|| LayoutError::syntax(format!("{} requires an argument", option)))
}

fn parse_rate(s: &str) -> Result<RefreshRate> {
    s.parse::<f64>()
        .ok()
        .and_then(RefreshRate::from_hz)
        .ok_or_else(|| LayoutError::syntax(format!("Invalid refresh rate '{}'", s)))
}

/// Resolution at the start of a mode name: `1920x1080`, `2560x1440_60.00`,
/// `1920x1080i`.
fn mode_size(name: &str) -> Result<Size> {
    let (width, rest) = name
        .split_once('x')
        .ok_or_else(|| LayoutError::syntax(format!("Mode '{}' does not start with WIDTHxHEIGHT", name)))?;
    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    format!("{}x{}", width, &rest[..end]).parse()
}

fn parse_scale(s: &str) -> Result<Scale> {
    s.parse::<f64>()
        .ok()
        .and_then(Scale::from_factor)
        .ok_or_else(|| LayoutError::syntax(format!("Invalid scale '{}'", s)))
}

fn parse_switch(s: &str) -> Result<bool> {
    match s {
        "on" => Ok(true),
        "off" => Ok(false),
        other => Err(LayoutError::syntax(format!("Expected on or off, got '{}'", other))),
    }
}

fn parse_coord(s: &str) -> Result<i32> {
    s.parse()
        .map_err(|_| LayoutError::syntax(format!("Invalid coordinate '{}'", s)))
}

fn parse_xrandr(args: &[String]) -> Result<Vec<Output>> {
    let mut outputs = Outputs::default();
    let mut current: Option<usize> = None;
    let mut it = args.iter();

    while let Some(arg) = it.next() {
        let option = arg.as_str();
        match option {
            "--noprimary" => {
                for pending in &mut outputs.0 {
                    pending.primary = false;
                }
                continue;
            }
            "--output" => {
                let name = value(&mut it, option)?;
                current = Some(outputs.select(name)?);
                continue;
            }
            _ => {}
        }

        let index = current
            .ok_or_else(|| LayoutError::syntax(format!("{} given before --output", option)))?;
        let pending = &mut outputs.0[index];
        match option {
            "--off" => pending.enable = Some(false),
            "--auto" => {
                return Err(LayoutError::syntax("--auto does not name a mode"));
            }
            "--mode" => {
                let name = value(&mut it, option)?;
                pending.size = Some(mode_size(name)?);
                pending.mode_name = Some(name.to_string());
                pending.enable = Some(true);
            }
            "--rate" | "--refresh" => pending.rate = Some(parse_rate(value(&mut it, option)?)?),
            "--pos" => {
                let pos = value(&mut it, option)?;
                let (x, y) = pos
                    .split_once('x')
                    .ok_or_else(|| LayoutError::syntax(format!("Expected XxY, got '{}'", pos)))?;
                pending.position = Some(Position::new(parse_coord(x)?, parse_coord(y)?));
            }
            "--rotate" | "--orientation" => {
                let name = value(&mut it, option)?;
                pending.rotation = Rotation::from_name(name)
                    .ok_or_else(|| LayoutError::syntax(format!("Unknown rotation '{}'", name)))?;
            }
            "--reflect" => {
                let name = value(&mut it, option)?;
                pending.reflection = Reflection::from_name(name)
                    .ok_or_else(|| LayoutError::syntax(format!("Unknown reflection '{}'", name)))?;
            }
            "--primary" => {
                for other in &mut outputs.0 {
                    other.primary = false;
                }
                outputs.0[index].primary = true;
            }
            other => return Err(LayoutError::syntax(format!("Unknown xrandr option '{}'", other))),
        }
    }
    outputs.finish()
}

/// Split tokens into `;`-separated sway commands, including a `;` glued to
/// the end of a word.
fn sway_commands(args: &[String]) -> Vec<Vec<&str>> {
    let mut commands = vec![Vec::new()];
    for arg in args {
        let (word, ends) = match arg.strip_suffix(';') {
            Some(word) => (word, true),
            None => (arg.as_str(), false),
        };
        if !word.is_empty() {
            if let Some(last) = commands.last_mut() {
                last.push(word);
            }
        }
        if ends {
            commands.push(Vec::new());
        }
    }
    commands.retain(|c| !c.is_empty());
    commands
}

fn parse_sway_mode(spec: &str) -> Result<(Size, Option<RefreshRate>)> {
    match spec.split_once('@') {
        Some((size, rate)) => {
            let rate = rate.strip_suffix("Hz").unwrap_or(rate);
            Ok((size.parse()?, Some(parse_rate(rate)?)))
        }
        None => Ok((spec.parse()?, None)),
    }
}

fn parse_swaymsg(args: &[String]) -> Result<Vec<Output>> {
    let mut outputs = Outputs::default();

    for command in sway_commands(args) {
        let mut words = command.into_iter();
        match words.next() {
            Some("output") => {}
            Some(other) => return Err(LayoutError::syntax(format!("Unknown sway command '{}'", other))),
            None => continue,
        }
        let name = words
            .next()
            .ok_or_else(|| LayoutError::syntax("output requires a name"))?;
        let index = outputs.select(name)?;
        let pending = &mut outputs.0[index];

        while let Some(word) = words.next() {
            let missing = || LayoutError::syntax(format!("{} requires an argument", word));
            match word {
                "enable" => pending.enable = Some(true),
                "disable" => pending.enable = Some(false),
                "mode" | "res" | "resolution" => {
                    let mut spec = words.next().ok_or_else(missing)?;
                    if spec == "--custom" {
                        spec = words.next().ok_or_else(missing)?;
                    }
                    let (size, rate) = parse_sway_mode(spec)?;
                    pending.size = Some(size);
                    pending.rate = rate;
                }
                "pos" | "position" => {
                    let x = parse_coord(words.next().ok_or_else(missing)?)?;
                    let y = parse_coord(words.next().ok_or_else(missing)?)?;
                    pending.position = Some(Position::new(x, y));
                }
                "transform" => {
                    let value = words.next().ok_or_else(missing)?;
                    let (rotation, reflection) = parse_transform(value)
                        .ok_or_else(|| LayoutError::syntax(format!("Unknown transform '{}'", value)))?;
                    pending.rotation = rotation;
                    pending.reflection = reflection;
                }
                "scale" => {
                    pending.scale = Some(parse_scale(words.next().ok_or_else(missing)?)?);
                }
                "dpms" | "power" => {
                    pending.power = Some(parse_switch(words.next().ok_or_else(missing)?)?);
                }
                "scale_filter" | "subpixel" | "adaptive_sync" => {
                    words.next().ok_or_else(missing)?;
                    debug!("ignoring sway output setting '{}'", word);
                }
                other => {
                    return Err(LayoutError::syntax(format!(
                        "Unknown sway output setting '{}'",
                        other
                    )))
                }
            }
        }
    }
    outputs.finish()
}
