use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{StabError, StabResult};

/// Raw channel output of one run as read back from the engine's output file.
///
/// `labels[i]` names `samples[i]`. Index 0 is always the time channel; every other entry is a
/// tagged channel aligned to that time vector. Channels are in whatever order the engine wrote
/// them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelDump {
    #[serde(default)]
    pub title: String,
    pub labels: Vec<String>,
    pub samples: Vec<Vec<f64>>,
}

/// One tagged channel borrowed from a [`ChannelDump`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelSample<'a> {
    pub label: &'a str,
    pub values: &'a [f64],
}

impl ChannelDump {
    /// Shared time vector, empty if the dump holds nothing.
    pub fn time(&self) -> &[f64] {
        self.samples.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Tagged channels, time channel excluded.
    pub fn channels(&self) -> impl Iterator<Item = ChannelSample<'_>> {
        self.labels
            .iter()
            .zip(self.samples.iter())
            .skip(1)
            .map(|(label, values)| ChannelSample {
                label: label.as_str(),
                values: values.as_slice(),
            })
    }

    pub fn channel_count(&self) -> usize {
        self.labels.len().saturating_sub(1)
    }

    /// Checks that every label has a sample vector.
    pub fn validate(&self) -> StabResult<()> {
        if self.labels.len() != self.samples.len() {
            return Err(StabError::Parse(format!(
                "channel dump has {} labels but {} sample vectors",
                self.labels.len(),
                self.samples.len()
            )));
        }
        Ok(())
    }
}

/// Signal type of a reduced table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Power,
    Frequency,
    Voltage,
    Speed,
}

impl SignalKind {
    pub const ALL: [SignalKind; 4] = [
        SignalKind::Power,
        SignalKind::Frequency,
        SignalKind::Voltage,
        SignalKind::Speed,
    ];

    /// Leading token of the engine's channel label.
    pub fn tag(&self) -> &'static str {
        match self {
            SignalKind::Power => "POWR",
            SignalKind::Frequency => "FREQ",
            SignalKind::Voltage => "VOLT",
            SignalKind::Speed => "SPD",
        }
    }

    pub fn from_tag(tag: &str) -> Option<SignalKind> {
        SignalKind::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Name used in artifact file names.
    pub fn artifact_name(&self) -> &'static str {
        match self {
            SignalKind::Speed => "SPEED",
            other => other.tag(),
        }
    }

    /// Column-key prefix: machine signals are keyed by generator bus, node signals by bus.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            SignalKind::Power | SignalKind::Speed => "GEN_BUS",
            SignalKind::Frequency | SignalKind::Voltage => "BUS",
        }
    }

    /// Offset added to every raw sample. Frequency and speed arrive as per-unit deviations from
    /// nominal and are stored as absolute per-unit values.
    pub fn sample_offset(&self) -> f64 {
        match self {
            SignalKind::Frequency | SignalKind::Speed => 1.0,
            SignalKind::Power | SignalKind::Voltage => 0.0,
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
