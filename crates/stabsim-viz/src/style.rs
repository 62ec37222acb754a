use plotters::style::RGBColor;
use stabsim_core::SignalKind;

/// Categorical palette for bus frequency charts.
pub const DEFAULT_PALETTE: [RGBColor; 9] = [
    RGBColor(0x1f, 0x77, 0xb4),
    RGBColor(0xff, 0x7f, 0x0e),
    RGBColor(0x2c, 0xa0, 0x2c),
    RGBColor(0xd6, 0x27, 0x28),
    RGBColor(0x94, 0x67, 0xbd),
    RGBColor(0x8c, 0x56, 0x4b),
    RGBColor(0xe3, 0x77, 0xc2),
    RGBColor(0x7f, 0x7f, 0x7f),
    RGBColor(0xbc, 0xbd, 0x22),
];

/// Bus voltage charts: blue, red, green, purple, orange, cyan, brown, light green, pink.
pub const BUS_PALETTE: [RGBColor; 9] = [
    RGBColor(0, 0, 255),
    RGBColor(255, 0, 0),
    RGBColor(0, 128, 0),
    RGBColor(128, 0, 128),
    RGBColor(255, 165, 0),
    RGBColor(0, 255, 255),
    RGBColor(165, 42, 42),
    RGBColor(144, 238, 144),
    RGBColor(255, 192, 203),
];

/// Machine charts: blue, green, red.
pub const GEN_PALETTE: [RGBColor; 3] = [
    RGBColor(0, 0, 255),
    RGBColor(0, 128, 0),
    RGBColor(255, 0, 0),
];

pub fn palette_for(kind: SignalKind) -> &'static [RGBColor] {
    match kind {
        SignalKind::Power | SignalKind::Speed => &GEN_PALETTE,
        SignalKind::Frequency => &DEFAULT_PALETTE,
        SignalKind::Voltage => &BUS_PALETTE,
    }
}

pub(crate) fn title_stem(kind: SignalKind) -> &'static str {
    match kind {
        SignalKind::Power => "Generator Power",
        SignalKind::Frequency => "Bus Frequency",
        SignalKind::Voltage => "Bus Voltage Magnitude",
        SignalKind::Speed => "Generator Speed",
    }
}

pub(crate) fn y_label(kind: SignalKind) -> &'static str {
    match kind {
        SignalKind::Power => "MW",
        SignalKind::Frequency => "Frequency (p.u.)",
        SignalKind::Voltage => "Voltage magnitude (p.u.)",
        SignalKind::Speed => "Speed (p.u.)",
    }
}
