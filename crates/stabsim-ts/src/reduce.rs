//! Channel classification and pivoting.
//!
//! Engine channel labels look like `POWR 1[BUS1 16.500]1` or `VOLT 5 [BUS5 230.00]`. Splitting
//! on whitespace and square brackets gives the signal tag first and the bus (or generator bus)
//! number second; everything after that is ignored.
//!
//! | tag    | table     | key            | samples      |
//! |--------|-----------|----------------|--------------|
//! | `POWR` | power     | `GEN_BUS<id>`  | as recorded  |
//! | `FREQ` | frequency | `BUS<id>`      | value + 1.0  |
//! | `VOLT` | voltage   | `BUS<id>`      | as recorded  |
//! | `SPD`  | speed     | `GEN_BUS<id>`  | value + 1.0  |
//!
//! Channels with any other tag are dropped without complaint.

use stabsim_core::{ChannelDump, SignalKind};
use tracing::{debug, trace, warn};

use crate::table::SignalSet;

/// Splits a channel label into its signal kind and element identifier.
///
/// Returns `None` for unrecognised tags and for labels without an identifier.
pub fn parse_label(label: &str) -> Option<(SignalKind, &str)> {
    let mut tokens = label
        .split(|c: char| c.is_whitespace() || c == '[' || c == ']')
        .filter(|token| !token.is_empty());
    let kind = SignalKind::from_tag(tokens.next()?)?;
    let identifier = tokens.next()?;
    Some((kind, identifier))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelReducer;

impl ChannelReducer {
    pub fn new() -> Self {
        Self
    }

    /// Routes every tagged channel of `dump` into its signal table.
    ///
    /// The time channel (index 0) is never classified. A channel whose sample count differs
    /// from the time vector is skipped with a warning.
    pub fn reduce(&self, dump: &ChannelDump) -> SignalSet {
        let time = dump.time();
        let mut set = SignalSet::default();
        let mut dropped = 0usize;

        for channel in dump.channels() {
            let Some((kind, identifier)) = parse_label(channel.label) else {
                trace!(label = channel.label, "Channel not classified");
                dropped += 1;
                continue;
            };
            if channel.values.len() != time.len() {
                warn!(
                    label = channel.label,
                    samples = channel.values.len(),
                    expected = time.len(),
                    "Channel length does not match time vector; skipping"
                );
                dropped += 1;
                continue;
            }

            let offset = kind.sample_offset();
            let values = channel.values.iter().map(|value| value + offset).collect();
            let key = format!("{}{}", kind.key_prefix(), identifier);
            set.get_mut(kind).push_column(time, key, values);
        }

        for kind in SignalKind::ALL {
            set.get_mut(kind).sort_columns();
        }

        debug!(
            power = set.power.column_count(),
            frequency = set.frequency.column_count(),
            voltage = set.voltage.column_count(),
            speed = set.speed.column_count(),
            dropped,
            "Channels reduced"
        );
        set
    }
}

/// [`ChannelReducer::reduce`] with the default reducer.
pub fn reduce_channels(dump: &ChannelDump) -> SignalSet {
    ChannelReducer::new().reduce(dump)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dump(channels: &[(&str, Vec<f64>)]) -> ChannelDump {
        let mut labels = vec!["Time(s)".to_string()];
        let mut samples = vec![vec![0.0, 0.5, 1.0]];
        for (label, values) in channels {
            labels.push(label.to_string());
            samples.push(values.clone());
        }
        ChannelDump {
            title: String::new(),
            labels,
            samples,
        }
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-12, "{a} != {e}");
        }
    }

    #[test]
    fn parses_engine_labels() {
        assert_eq!(
            parse_label("POWR 1[BUS1 16.500]1"),
            Some((SignalKind::Power, "1"))
        );
        assert_eq!(
            parse_label("VOLT 5 [BUS5 230.00]"),
            Some((SignalKind::Voltage, "5"))
        );
        assert_eq!(
            parse_label("SPD 3[BUS3 13.800]1"),
            Some((SignalKind::Speed, "3"))
        );
        assert_eq!(
            parse_label("FREQ\t7\t[BUS7 230.00]"),
            Some((SignalKind::Frequency, "7"))
        );
        assert_eq!(
            parse_label("  VOLT  8[BUS8\t230.00]"),
            Some((SignalKind::Voltage, "8"))
        );
        assert_eq!(parse_label("ANGL 1[BUS1 16.500]1"), None);
        assert_eq!(parse_label("FREQ"), None);
        assert_eq!(parse_label(""), None);
    }

    #[test]
    fn routes_channels_with_keys_and_offsets() {
        let set = reduce_channels(&dump(&[
            ("FREQ 4[BUS4 230.00]", vec![0.0, -0.001, 0.002]),
            ("POWR 2[BUS2 18.000]1", vec![163.0, 163.0, 170.0]),
            ("VOLT 4[BUS4 230.00]", vec![1.02, 0.5, 1.01]),
            ("SPD 2[BUS2 18.000]1", vec![0.0, 0.003, -0.001]),
        ]));

        assert_eq!(set.power.column("GEN_BUS2"), Some(&[163.0, 163.0, 170.0][..]));
        assert_eq!(set.voltage.column("BUS4"), Some(&[1.02, 0.5, 1.01][..]));
        assert_close(set.frequency.column("BUS4").unwrap(), &[1.0, 0.999, 1.002]);
        assert_close(set.speed.column("GEN_BUS2").unwrap(), &[1.0, 1.003, 0.999]);
        assert_eq!(set.power.time(), &[0.0, 0.5, 1.0]);
    }

    #[test]
    fn columns_are_sorted_lexicographically() {
        let set = reduce_channels(&dump(&[
            ("VOLT 9[BUS9 230.00]", vec![1.0; 3]),
            ("VOLT 10[BUS10 230.00]", vec![1.0; 3]),
            ("VOLT 2[BUS2 230.00]", vec![1.0; 3]),
        ]));
        let keys: Vec<&str> = set.voltage.keys().collect();
        assert_eq!(keys, vec!["BUS10", "BUS2", "BUS9"]);
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn duplicate_channels_are_appended() {
        let set = reduce_channels(&dump(&[
            ("POWR 1[BUS1 16.500]1", vec![1.0; 3]),
            ("POWR 1[BUS1 16.500]1", vec![2.0; 3]),
        ]));
        assert_eq!(set.power.column_count(), 2);
        assert_eq!(set.power.columns()[1].values, vec![2.0; 3]);
    }

    #[test]
    fn unrecognised_and_misaligned_channels_are_dropped() {
        let set = reduce_channels(&dump(&[
            ("ANGL 1[BUS1 16.500]1", vec![0.0; 3]),
            ("VOLT 1[BUS1 16.500]", vec![1.0; 2]),
            ("VOLT 2[BUS2 16.500]", vec![1.0; 3]),
        ]));
        assert_eq!(set.voltage.column_count(), 1);
        assert!(set.power.is_empty());
    }

    #[test]
    fn missing_signal_types_yield_empty_tables() {
        let set = reduce_channels(&dump(&[("POWR 1[BUS1 16.500]1", vec![1.0; 3])]));
        assert!(!set.power.is_empty());
        assert!(set.frequency.is_empty());
        assert!(set.voltage.is_empty());
        assert!(set.speed.is_empty());
        assert_eq!(set.non_empty().count(), 1);
    }

    #[test]
    fn time_only_dump_reduces_to_nothing() {
        let set = reduce_channels(&dump(&[]));
        assert!(set.is_empty());
    }
}
