use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::StabError;
use crate::units::Seconds;

/// Disturbance type requested for a run. The concrete parameters come from the
/// [`ContingencyRegistry`](crate::ContingencyRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisturbanceKind {
    LineFault,
    BusFault,
    GenChange,
}

impl DisturbanceKind {
    pub const ALL: [DisturbanceKind; 3] = [
        DisturbanceKind::LineFault,
        DisturbanceKind::BusFault,
        DisturbanceKind::GenChange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DisturbanceKind::LineFault => "line_fault",
            DisturbanceKind::BusFault => "bus_fault",
            DisturbanceKind::GenChange => "gen_change",
        }
    }
}

impl fmt::Display for DisturbanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisturbanceKind {
    type Err = StabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DisturbanceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                StabError::Configuration(format!(
                    "unknown disturbance type '{s}'; use line_fault, bus_fault or gen_change"
                ))
            })
    }
}

/// One group of output channels the engine can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelQuantity {
    /// Machine electrical power, one channel per machine
    MachinePower,
    /// Bus frequency deviation, one channel per bus
    BusFrequency,
    /// Bus voltage magnitude, one channel per bus
    BusVoltage,
    /// Machine speed deviation, one channel per machine
    MachineSpeed,
}

impl ChannelQuantity {
    /// Quantity index the engine's channel-setup call expects.
    pub fn engine_code(&self) -> i32 {
        match self {
            ChannelQuantity::MachinePower => 2,
            ChannelQuantity::MachineSpeed => 7,
            ChannelQuantity::BusFrequency => 12,
            ChannelQuantity::BusVoltage => 13,
        }
    }
}

/// Which channels a run records. `All` is what every shipped suite uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChannelMode {
    All,
    Power,
    Frequency,
    Voltage,
    Speed,
    None,
}

impl ChannelMode {
    pub fn label(&self) -> &'static str {
        match self {
            ChannelMode::All => "All",
            ChannelMode::Power => "POWR",
            ChannelMode::Frequency => "FREQ",
            ChannelMode::Voltage => "VOLT",
            ChannelMode::Speed => "SPD",
            ChannelMode::None => "None",
        }
    }

    /// Channel groups to configure, in the order the engine is asked for them.
    pub fn quantities(&self) -> Vec<ChannelQuantity> {
        match self {
            ChannelMode::All => vec![
                ChannelQuantity::MachinePower,
                ChannelQuantity::BusFrequency,
                ChannelQuantity::BusVoltage,
                ChannelQuantity::MachineSpeed,
            ],
            ChannelMode::Power => vec![ChannelQuantity::MachinePower],
            ChannelMode::Frequency => vec![ChannelQuantity::BusFrequency],
            ChannelMode::Voltage => vec![ChannelQuantity::BusVoltage],
            ChannelMode::Speed => vec![ChannelQuantity::MachineSpeed],
            ChannelMode::None => Vec::new(),
        }
    }
}

impl fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ChannelMode {
    type Err = StabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALL" => Ok(ChannelMode::All),
            "POWR" | "POWER" => Ok(ChannelMode::Power),
            "FREQ" | "FREQUENCY" => Ok(ChannelMode::Frequency),
            "VOLT" | "VOLTAGE" => Ok(ChannelMode::Voltage),
            "SPD" | "SPEED" => Ok(ChannelMode::Speed),
            "NONE" => Ok(ChannelMode::None),
            _ => Err(StabError::Configuration(format!(
                "unknown channel mode '{s}'; use All, POWR, FREQ, VOLT, SPD or None"
            ))),
        }
    }
}

impl TryFrom<String> for ChannelMode {
    type Error = StabError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChannelMode> for String {
    fn from(mode: ChannelMode) -> Self {
        mode.label().to_string()
    }
}

/// Network snapshot a run starts from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", content = "path", rename_all = "snake_case")]
pub enum BaseCase {
    /// Solved snapshot the engine loads directly (`*.sav`)
    Saved(PathBuf),
    /// Raw network description the engine has to read (`*.raw`)
    Raw(PathBuf),
}

impl BaseCase {
    pub fn path(&self) -> &Path {
        match self {
            BaseCase::Saved(path) | BaseCase::Raw(path) => path,
        }
    }
}

/// Everything one simulation attempt needs. Built per orchestration iteration and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationCase {
    pub name: String,
    pub directory: PathBuf,
    pub base_case: BaseCase,
    pub dynamics: Option<PathBuf>,
    pub disturbance: DisturbanceKind,
    pub channel_mode: ChannelMode,
    pub runtime: Seconds,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disturbance_kind_parses_case_insensitively() {
        assert_eq!(
            "LINE_FAULT".parse::<DisturbanceKind>().unwrap(),
            DisturbanceKind::LineFault
        );
        assert!("islanding".parse::<DisturbanceKind>().is_err());
    }

    #[test]
    fn all_mode_configures_four_groups_in_engine_order() {
        let codes: Vec<i32> = ChannelMode::All
            .quantities()
            .iter()
            .map(ChannelQuantity::engine_code)
            .collect();
        assert_eq!(codes, vec![2, 12, 13, 7]);
        assert!(ChannelMode::None.quantities().is_empty());
    }

    #[test]
    fn channel_mode_round_trips_through_its_label() {
        for mode in [
            ChannelMode::All,
            ChannelMode::Power,
            ChannelMode::Frequency,
            ChannelMode::Voltage,
            ChannelMode::Speed,
            ChannelMode::None,
        ] {
            assert_eq!(mode.label().parse::<ChannelMode>().unwrap(), mode);
        }
    }

    #[test]
    fn channel_mode_deserializes_from_label() {
        let mode: ChannelMode = serde_json::from_str("\"All\"").unwrap();
        assert_eq!(mode, ChannelMode::All);
        assert!(serde_json::from_str::<ChannelMode>("\"Everything\"").is_err());
    }
}
