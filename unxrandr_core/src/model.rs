// src/model.rs
//! Output layout data model shared by the reader, serializer and parser.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{LayoutError, Result};

/// Output rotation, named after the xrandr vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    #[default]
    Normal,
    Left,
    Right,
    Inverted,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [
        Rotation::Normal,
        Rotation::Left,
        Rotation::Right,
        Rotation::Inverted,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Rotation::Normal => "normal",
            Rotation::Left => "left",
            Rotation::Right => "right",
            Rotation::Inverted => "inverted",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.name() == name)
    }

    /// Clockwise rotation in degrees.
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Normal => 0,
            Rotation::Right => 90,
            Rotation::Inverted => 180,
            Rotation::Left => 270,
        }
    }

    pub fn from_degrees(degrees: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.degrees() == degrees)
    }

    pub fn is_default(self) -> bool {
        self == Rotation::Normal
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reflection applied on top of the rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Reflection {
    #[default]
    None,
    X,
    Y,
    XY,
}

impl Reflection {
    pub const ALL: [Reflection; 4] = [Reflection::None, Reflection::X, Reflection::Y, Reflection::XY];

    pub fn name(self) -> &'static str {
        match self {
            Reflection::None => "normal",
            Reflection::X => "x",
            Reflection::Y => "y",
            Reflection::XY => "xy",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.name() == name)
    }

    pub fn is_default(self) -> bool {
        self == Reflection::None
    }
}

impl fmt::Display for Reflection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Size {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self> {
        let (w, h) = s
            .split_once('x')
            .ok_or_else(|| LayoutError::syntax(format!("Expected WIDTHxHEIGHT, got '{}'", s)))?;
        let width = w
            .parse::<u32>()
            .map_err(|_| LayoutError::syntax(format!("Invalid width in '{}'", s)))?;
        let height = h
            .parse::<u32>()
            .map_err(|_| LayoutError::syntax(format!("Invalid height in '{}'", s)))?;
        let size = Size::new(width, height);
        if size.is_empty() {
            return Err(LayoutError::syntax(format!("Empty resolution '{}'", s)));
        }
        Ok(size)
    }
}

/// Offset in the shared virtual screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Refresh rate with millihertz resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefreshRate(u32);

impl RefreshRate {
    pub fn from_millihertz(millihertz: u32) -> Option<Self> {
        (millihertz > 0).then_some(Self(millihertz))
    }

    pub fn from_hz(hz: f64) -> Option<Self> {
        if !hz.is_finite() {
            return None;
        }
        let millihertz = (hz * 1000.0).round();
        if millihertz < 1.0 || millihertz > u32::MAX as f64 {
            return None;
        }
        Some(Self(millihertz as u32))
    }

    pub fn millihertz(self) -> u32 {
        self.0
    }

    pub fn hz(self) -> f64 {
        self.0 as f64 / 1000.0
    }
}

/// Hertz with all three millihertz digits, so printing loses nothing.
impl fmt::Display for RefreshRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.0 / 1000, self.0 % 1000)
    }
}

/// Output scale factor in thousandths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Scale(u32);

impl Scale {
    pub fn from_thousandths(thousandths: u32) -> Option<Self> {
        (thousandths > 0).then_some(Self(thousandths))
    }

    pub fn from_factor(factor: f64) -> Option<Self> {
        if !factor.is_finite() {
            return None;
        }
        let thousandths = (factor * 1000.0).round();
        if thousandths < 1.0 || thousandths > u32::MAX as f64 {
            return None;
        }
        Some(Self(thousandths as u32))
    }

    pub fn thousandths(self) -> u32 {
        self.0
    }

    pub fn factor(self) -> f64 {
        self.0 as f64 / 1000.0
    }
}

/// Shortest decimal form: `1`, `1.5`, `1.25`.
impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frac = self.0 % 1000;
        if frac == 0 {
            return write!(f, "{}", self.0 / 1000);
        }
        let digits = format!("{:03}", frac);
        write!(f, "{}.{}", self.0 / 1000, digits.trim_end_matches('0'))
    }
}

/// How an enabled output is driven.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mode {
    pub size: Size,
    pub rate: Option<RefreshRate>,
    /// Server-side mode name when it is not plain `WxH`, e.g.
    /// `2560x1440_60.00` or `1920x1080i`.
    pub name: Option<String>,
}

impl Mode {
    pub fn new(size: Size, rate: Option<RefreshRate>) -> Self {
        Self {
            size,
            rate,
            name: None,
        }
    }

    /// Attach the mode name. A name equal to `WxH` is not stored.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = (name != self.size.to_string()).then_some(name);
        self
    }

    /// Token a mode is selected by: its name, or `WxH` for unnamed modes.
    pub fn selector(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.size.to_string())
    }
}

/// Geometry and orientation of an enabled output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActiveOutput {
    pub mode: Mode,
    pub position: Position,
    pub rotation: Rotation,
    pub reflection: Reflection,
    pub scale: Option<Scale>,
    /// Display power (DPMS) state, when the platform reports one.
    pub power: Option<bool>,
}

impl ActiveOutput {
    pub fn new(mode: Mode, position: Position) -> Self {
        Self {
            mode,
            position,
            rotation: Rotation::Normal,
            reflection: Reflection::None,
            scale: None,
            power: None,
        }
    }

    pub fn with_scale(mut self, scale: Option<Scale>) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_power(mut self, power: Option<bool>) -> Self {
        self.power = power;
        self
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_reflection(mut self, reflection: Reflection) -> Self {
        self.reflection = reflection;
        self
    }
}

/// One display output. A disabled output carries no geometry at all.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Output {
    name: String,
    active: Option<ActiveOutput>,
    primary: bool,
}

impl Output {
    pub fn disabled(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: None,
            primary: false,
        }
    }

    pub fn enabled(name: impl Into<String>, active: ActiveOutput) -> Self {
        Self {
            name: name.into(),
            active: Some(active),
            primary: false,
        }
    }

    pub fn with_primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn active(&self) -> Option<&ActiveOutput> {
        self.active.as_ref()
    }

    pub fn mode(&self) -> Option<&Mode> {
        self.active.as_ref().map(|a| &a.mode)
    }

    pub fn resolution(&self) -> Option<Size> {
        self.active.as_ref().map(|a| a.mode.size)
    }

    pub fn position(&self) -> Option<Position> {
        self.active.as_ref().map(|a| a.position)
    }

    pub fn rate(&self) -> Option<RefreshRate> {
        self.active.as_ref().and_then(|a| a.mode.rate)
    }

    pub fn scale(&self) -> Option<Scale> {
        self.active.as_ref().and_then(|a| a.scale)
    }

    pub fn power(&self) -> Option<bool> {
        self.active.as_ref().and_then(|a| a.power)
    }

    pub fn rotation(&self) -> Rotation {
        self.active.as_ref().map(|a| a.rotation).unwrap_or_default()
    }

    pub fn reflection(&self) -> Reflection {
        self.active.as_ref().map(|a| a.reflection).unwrap_or_default()
    }
}

/// Immutable capture of every output at one instant, in a fixed order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    outputs: Vec<Output>,
}

impl Snapshot {
    /// Build a snapshot from platform data, rejecting reports that break the
    /// snapshot invariants.
    pub fn new(outputs: Vec<Output>) -> Result<Self> {
        Self::checked(outputs, LayoutError::platform_query)
    }

    /// Validate `outputs`, reporting a broken invariant through `error`.
    pub(crate) fn checked<F>(outputs: Vec<Output>, error: F) -> Result<Self>
    where
        F: FnOnce(String) -> LayoutError,
    {
        check_invariants(&outputs).map_err(error)?;
        Ok(Self { outputs })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Output> {
        self.outputs.iter()
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Output> {
        self.outputs.iter().find(|o| o.name == name)
    }

    pub fn primary(&self) -> Option<&Output> {
        self.outputs.iter().find(|o| o.primary)
    }

    /// Equality of the output sets, ignoring enumeration order.
    pub fn same_outputs(&self, other: &Snapshot) -> bool {
        self.len() == other.len()
            && self
                .outputs
                .iter()
                .all(|o| other.get(&o.name).is_some_and(|p| p == o))
    }

    pub fn into_outputs(self) -> Vec<Output> {
        self.outputs
    }
}

impl IntoIterator for Snapshot {
    type Item = Output;
    type IntoIter = std::vec::IntoIter<Output>;

    fn into_iter(self) -> Self::IntoIter {
        self.outputs.into_iter()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Output;
    type IntoIter = std::slice::Iter<'a, Output>;

    fn into_iter(self) -> Self::IntoIter {
        self.outputs.iter()
    }
}

fn check_invariants(outputs: &[Output]) -> std::result::Result<(), String> {
    let mut seen = HashSet::new();
    for output in outputs {
        if output.name.is_empty() {
            return Err("output with an empty identifier".to_string());
        }
        if !seen.insert(output.name.as_str()) {
            return Err(format!("duplicate output identifier '{}'", output.name));
        }
    }

    let primaries: Vec<&str> = outputs
        .iter()
        .filter(|o| o.primary)
        .map(|o| o.name.as_str())
        .collect();
    if primaries.len() > 1 {
        return Err(format!(
            "more than one primary output: {}",
            primaries.join(", ")
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(w: u32, h: u32, x: i32, y: i32) -> ActiveOutput {
        ActiveOutput::new(Mode::new(Size::new(w, h), None), Position::new(x, y))
    }

    #[test]
    fn disabled_output_has_no_geometry() {
        let out = Output::disabled("HDMI-1");
        assert!(!out.is_enabled());
        assert_eq!(out.resolution(), None);
        assert_eq!(out.position(), None);
        assert_eq!(out.rate(), None);
        assert_eq!(out.rotation(), Rotation::Normal);
    }

    #[test]
    fn two_primaries_are_rejected() {
        let outputs = vec![
            Output::enabled("eDP-1", active(1920, 1080, 0, 0)).with_primary(true),
            Output::enabled("DP-1", active(2560, 1440, 1920, 0)).with_primary(true),
        ];
        let err = Snapshot::new(outputs).unwrap_err();
        assert!(err.is_platform_query());
        assert!(err.to_string().contains("eDP-1, DP-1"));
    }

    #[test]
    fn duplicate_identifiers_are_rejected() {
        let outputs = vec![Output::disabled("DP-1"), Output::disabled("DP-1")];
        assert!(Snapshot::new(outputs).unwrap_err().is_platform_query());
    }

    #[test]
    fn empty_identifier_is_rejected() {
        assert!(Snapshot::new(vec![Output::disabled("")]).is_err());
    }

    #[test]
    fn same_outputs_ignores_order() {
        let a = Snapshot::new(vec![
            Output::enabled("eDP-1", active(1920, 1080, 0, 0)),
            Output::disabled("HDMI-1"),
        ])
        .unwrap();
        let b = Snapshot::new(vec![
            Output::disabled("HDMI-1"),
            Output::enabled("eDP-1", active(1920, 1080, 0, 0)),
        ])
        .unwrap();
        assert_ne!(a, b);
        assert!(a.same_outputs(&b));
    }

    #[test]
    fn rate_formats_with_millihertz_digits() {
        assert_eq!(RefreshRate::from_millihertz(60000).unwrap().to_string(), "60.000");
        assert_eq!(RefreshRate::from_millihertz(59963).unwrap().to_string(), "59.963");
        assert_eq!(RefreshRate::from_millihertz(143996).unwrap().to_string(), "143.996");
        assert_eq!(RefreshRate::from_hz(59.934).unwrap().millihertz(), 59934);
        assert_eq!(RefreshRate::from_hz(0.0), None);
        assert_eq!(RefreshRate::from_hz(f64::NAN), None);
    }

    #[test]
    fn largest_rate_formats_without_overflow() {
        let rate = RefreshRate::from_millihertz(u32::MAX).unwrap();
        assert_eq!(rate.to_string(), "4294967.295");
        assert_eq!(RefreshRate::from_hz(u32::MAX as f64 / 1000.0), Some(rate));
    }

    #[test]
    fn scale_prints_shortest_form() {
        assert_eq!(Scale::from_factor(1.0).unwrap().to_string(), "1");
        assert_eq!(Scale::from_factor(1.5).unwrap().to_string(), "1.5");
        assert_eq!(Scale::from_factor(1.25).unwrap().to_string(), "1.25");
        assert_eq!(Scale::from_factor(1.333333).unwrap().to_string(), "1.333");
        assert_eq!(Scale::from_factor(0.0), None);
        assert_eq!(Scale::from_factor(-1.0), None);
    }

    #[test]
    fn mode_name_equal_to_size_is_dropped() {
        let size = Size::new(2560, 1440);
        assert_eq!(Mode::new(size, None).with_name("2560x1440").name, None);
        let named = Mode::new(size, None).with_name("2560x1440_60.00");
        assert_eq!(named.name.as_deref(), Some("2560x1440_60.00"));
        assert_eq!(named.selector(), "2560x1440_60.00");
        assert_eq!(Mode::new(size, None).selector(), "2560x1440");
    }

    #[test]
    fn checked_reports_through_the_given_error() {
        let outputs = vec![Output::disabled("DP-1"), Output::disabled("DP-1")];
        let err = Snapshot::checked(outputs, LayoutError::syntax).unwrap_err();
        assert!(matches!(err, LayoutError::Syntax { .. }));
    }

    #[test]
    fn size_parses_and_rejects_garbage() {
        assert_eq!("1920x1080".parse::<Size>().unwrap(), Size::new(1920, 1080));
        assert!("1920".parse::<Size>().is_err());
        assert!("0x1080".parse::<Size>().is_err());
        assert!("axb".parse::<Size>().is_err());
    }

    #[test]
    fn rotation_names_and_degrees_agree() {
        for r in Rotation::ALL {
            assert_eq!(Rotation::from_name(r.name()), Some(r));
            assert_eq!(Rotation::from_degrees(r.degrees()), Some(r));
        }
        assert_eq!(Rotation::from_name("sideways"), None);
    }
}
