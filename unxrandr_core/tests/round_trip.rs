// tests/round_trip.rs
use unxrandr_core::backend::memory::MemorySource;
use unxrandr_core::backend::{CurrentMode, OutputInfo};
use unxrandr_core::config::{OutputFormat, OutputOrder};
use unxrandr_core::model::{
    ActiveOutput, Mode, Position, Reflection, RefreshRate, Rotation, Scale, Size,
};
use unxrandr_core::serializer::Attribute;
use unxrandr_core::{parse_command, read_from, serialize, Output, Serializer, Snapshot, Target};

fn mode(w: u32, h: u32, mhz: u32, x: i32, y: i32) -> CurrentMode {
    CurrentMode::new(
        Size::new(w, h),
        RefreshRate::from_millihertz(mhz),
        Position::new(x, y),
    )
}

/// Laptop panel, a rotated external monitor and an unplugged port, in a
/// platform order that is not sorted.
fn desk_setup() -> MemorySource {
    let mut portrait = mode(2560, 1440, 59950, 1920, -400);
    portrait.rotation = Rotation::Left;
    portrait.reflection = Reflection::X;
    MemorySource::new(vec![
        OutputInfo {
            name: "eDP-1".into(),
            primary: true,
            current: Some(mode(1920, 1080, 60000, 0, 0)),
        },
        OutputInfo::inactive("HDMI-1"),
        OutputInfo {
            name: "DP-1".into(),
            primary: false,
            current: Some(portrait),
        },
    ])
}

#[test]
fn reading_twice_gives_the_same_snapshot() {
    let source = desk_setup();
    let before = source.outputs().to_vec();

    let first = read_from(&source, OutputOrder::Name).unwrap();
    let second = read_from(&source, OutputOrder::Name).unwrap();

    assert_eq!(first, second);
    assert_eq!(source.outputs(), before.as_slice());
}

#[test]
fn serialization_is_deterministic_across_platform_orders() {
    let source = desk_setup();
    let mut reversed = source.outputs().to_vec();
    reversed.reverse();
    let reversed = MemorySource::new(reversed);

    let a = serialize(read_from(&source, OutputOrder::Name).unwrap());
    let b = serialize(read_from(&reversed, OutputOrder::Name).unwrap());
    assert_eq!(a.to_string(), b.to_string());
    assert_eq!(
        a.to_string(),
        "xrandr --output DP-1 --mode 2560x1440 --rate 59.950 --pos 1920x-400 --rotate left --reflect x \
         --output HDMI-1 --off \
         --output eDP-1 --mode 1920x1080 --rate 60.000 --pos 0x0 --primary"
    );
}

#[test]
fn xrandr_command_round_trips() {
    let snapshot = read_from(&desk_setup(), OutputOrder::Name).unwrap();
    let command = serialize(snapshot.clone());

    let parsed = parse_command(&command.to_string()).unwrap();
    assert_eq!(parsed.target, Target::Xrandr);
    assert_eq!(parsed.snapshot, snapshot);

    // applying the parsed layout and reading it back gives the same state
    let replayed = read_from(&MemorySource::from_snapshot(&parsed.snapshot), OutputOrder::Name).unwrap();
    assert_eq!(replayed, snapshot);
}

#[test]
fn dot_clock_rates_and_named_modes_round_trip() {
    // 2560x1440 CVT mode line: 241.5 MHz over 2720x1481 totals, ~59.951 Hz
    let mut custom = mode(2560, 1440, 59951, 0, 0);
    custom.mode_name = Some("2560x1440_60.00".into());
    let mut interlaced = mode(1920, 1080, 59963, 2560, 0);
    interlaced.mode_name = Some("1920x1080i".into());
    let source = MemorySource::new(vec![
        OutputInfo {
            name: "DP-1".into(),
            primary: true,
            current: Some(custom),
        },
        OutputInfo {
            name: "DP-2".into(),
            primary: false,
            current: Some(interlaced),
        },
    ]);
    let snapshot = read_from(&source, OutputOrder::Name).unwrap();

    let command = serialize(snapshot.clone());
    assert_eq!(
        command.to_string(),
        "xrandr --output DP-1 --mode 2560x1440_60.00 --rate 59.951 --pos 0x0 --primary \
         --output DP-2 --mode 1920x1080i --rate 59.963 --pos 2560x0"
    );

    let parsed = parse_command(&command.to_string()).unwrap().snapshot;
    assert_eq!(parsed, snapshot);
    let replayed = read_from(&MemorySource::from_snapshot(&parsed), OutputOrder::Name).unwrap();
    assert_eq!(replayed, snapshot);
}

#[test]
fn script_round_trips() {
    let snapshot = read_from(&desk_setup(), OutputOrder::Name).unwrap();
    let script = serialize(snapshot.clone()).render(OutputFormat::Script);
    assert!(script.starts_with("#!/bin/sh\n"));
    assert_eq!(parse_command(&script).unwrap().snapshot, snapshot);
}

#[test]
fn swaymsg_command_round_trips_without_primary() {
    let mut outputs = desk_setup().outputs().to_vec();
    for output in &mut outputs {
        output.primary = false;
        if let Some(current) = output.current.as_mut() {
            current.scale = Scale::from_factor(1.25);
            current.power = Some(current.rotation == Rotation::Normal);
        }
    }
    let snapshot = read_from(&MemorySource::new(outputs), OutputOrder::Name).unwrap();
    assert_eq!(snapshot.get("DP-1").unwrap().power(), Some(false));

    let command = Serializer::new(Target::Swaymsg).serialize(snapshot.clone());
    assert!(command.losses().is_empty());
    assert!(command.to_string().contains("scale 1.25 dpms off"));

    let parsed = parse_command(&command.to_string()).unwrap();
    assert_eq!(parsed.target, Target::Swaymsg);
    assert_eq!(parsed.snapshot, snapshot);
}

#[test]
fn swaymsg_reports_what_it_drops() {
    let snapshot = read_from(&desk_setup(), OutputOrder::Name).unwrap();
    let command = Serializer::new(Target::Swaymsg).serialize(snapshot);
    let lost: Vec<(&str, Attribute)> = command
        .losses()
        .iter()
        .map(|l| (l.output.as_str(), l.attribute))
        .collect();
    assert_eq!(lost, [("eDP-1", Attribute::Primary)]);
}

#[test]
fn laptop_scenario() {
    let snapshot = Snapshot::new(vec![
        Output::enabled(
            "eDP-1",
            ActiveOutput::new(Mode::new(Size::new(1920, 1080), None), Position::new(0, 0)),
        )
        .with_primary(true),
        Output::disabled("HDMI-1"),
    ])
    .unwrap();

    let command = serialize(snapshot);
    let args = command.args();
    let hdmi = args.iter().position(|a| a == "HDMI-1").unwrap();
    assert_eq!(&args[hdmi + 1..], ["--off"]);

    let edp = &args[..hdmi - 1];
    assert_eq!(
        edp,
        ["--output", "eDP-1", "--mode", "1920x1080", "--pos", "0x0", "--primary"]
    );
}

#[test]
fn empty_scenario() {
    let snapshot = read_from(&MemorySource::default(), OutputOrder::Name).unwrap();
    assert!(snapshot.is_empty());
    let command = serialize(snapshot);
    assert!(command.is_bare());
    assert_eq!(command.to_string(), "xrandr");
    assert!(parse_command("xrandr").unwrap().snapshot.is_empty());
}

#[test]
fn two_primaries_are_a_platform_error() {
    let mut outputs = desk_setup().outputs().to_vec();
    for output in &mut outputs {
        output.primary = true;
    }
    let err = read_from(&MemorySource::new(outputs), OutputOrder::Platform).unwrap_err();
    assert!(err.is_platform_query());
}
