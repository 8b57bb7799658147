//! Named colors, ringtones and the rainbow cycle.

use busylight_hid_kuando_protocol::{Rgb, Ring};

/// Colors addressable by name from the command surface.
pub const NAMED_COLORS: [(&str, Rgb); 11] = [
    ("red", Rgb::new(255, 0, 0)),
    ("green", Rgb::new(0, 255, 0)),
    ("blue", Rgb::new(0, 0, 255)),
    ("yellow", Rgb::new(255, 255, 0)),
    ("cyan", Rgb::new(0, 255, 255)),
    ("magenta", Rgb::new(255, 0, 255)),
    ("white", Rgb::new(255, 255, 255)),
    ("orange", Rgb::new(255, 165, 0)),
    ("purple", Rgb::new(128, 0, 128)),
    ("pink", Rgb::new(255, 192, 203)),
    ("brown", Rgb::new(165, 42, 42)),
];

/// Rainbow cycle, shown in order.
pub const RAINBOW: [Rgb; 7] = [
    Rgb::new(255, 0, 0),
    Rgb::new(255, 127, 0),
    Rgb::new(255, 255, 0),
    Rgb::new(0, 255, 0),
    Rgb::new(0, 0, 255),
    Rgb::new(75, 0, 130),
    Rgb::new(148, 0, 211),
];

pub const SOLID_PREFIX: &str = "color_";
pub const BLINK_PREFIX: &str = "blink_color_";
pub const RING_PREFIX: &str = "ring_";

/// Look up a bare color name such as `"orange"`.
pub fn color_by_name(name: &str) -> Option<Rgb> {
    NAMED_COLORS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|&(_, rgb)| rgb)
}

/// Solid-color table: `color_<name>`.
pub fn solid_color(command: &str) -> Option<Rgb> {
    command.strip_prefix(SOLID_PREFIX).and_then(color_by_name)
}

/// Blink table: `blink_color_<name>`.
pub fn blink_color(command: &str) -> Option<Rgb> {
    command.strip_prefix(BLINK_PREFIX).and_then(color_by_name)
}

/// Ringtone table: `ring_<tone>`, including `ring_off`.
pub fn ringtone(command: &str) -> Option<Ring> {
    let name = command.strip_prefix(RING_PREFIX)?;
    Ring::ALL.into_iter().find(|ring| ring.name() == name)
}

/// Every command key of the solid, blink and ringtone tables.
pub fn table_commands() -> impl Iterator<Item = String> {
    let solid = NAMED_COLORS
        .iter()
        .map(|(name, _)| format!("{SOLID_PREFIX}{name}"));
    let blink = NAMED_COLORS
        .iter()
        .map(|(name, _)| format!("{BLINK_PREFIX}{name}"));
    let rings = Ring::ALL
        .into_iter()
        .map(|ring| format!("{RING_PREFIX}{}", ring.name()));
    solid.chain(blink).chain(rings)
}
