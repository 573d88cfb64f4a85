// src/backend/sway/mod.rs
pub mod ipc;
pub mod output_ops;

pub use output_ops::SwayOutputSource;

use crate::model::{Reflection, Rotation};

/// sway `transform` value for a rotation/reflection pair.
///
/// sway can only flip horizontally, so `Y` and `XY` reflections have no
/// representation and yield `None`.
pub fn transform_name(rotation: Rotation, reflection: Reflection) -> Option<String> {
    let degrees = rotation.degrees();
    match reflection {
        Reflection::None if degrees == 0 => Some("normal".to_string()),
        Reflection::None => Some(degrees.to_string()),
        Reflection::X if degrees == 0 => Some("flipped".to_string()),
        Reflection::X => Some(format!("flipped-{}", degrees)),
        Reflection::Y | Reflection::XY => None,
    }
}

pub fn parse_transform(value: &str) -> Option<(Rotation, Reflection)> {
    let (reflection, degrees) = match value {
        "normal" => (Reflection::None, "0"),
        "flipped" => (Reflection::X, "0"),
        other => match other.strip_prefix("flipped-") {
            Some(rest) => (Reflection::X, rest),
            None => (Reflection::None, other),
        },
    };
    let rotation = Rotation::from_degrees(degrees.parse().ok()?)?;
    Some((rotation, reflection))
}
