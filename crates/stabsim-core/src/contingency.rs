//! `(case, disturbance type)` lookup for contingency names and disturbance parameters.
//!
//! Only a handful of cases are known. Anything outside the table resolves to
//! [`UNKNOWN_CONTINGENCY`] and no disturbance, never to an error: the batch keeps going and the
//! run is recorded under `results/unknown_contingency/`.
//!
//! **Precedence:** suite-provided entries before built-ins; within each group an exact case
//! match before a wildcard. Names and disturbance parameters are looked up independently, so a
//! wildcard entry can name a contingency while per-case entries carry the parameters.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::case::DisturbanceKind;
use crate::disturbance::{DisturbanceSpec, FaultImpedance};
use crate::units::{Kilovolts, Megawatts};
use crate::BusId;

/// Sentinel name for pairs the registry does not cover.
pub const UNKNOWN_CONTINGENCY: &str = "unknown_contingency";

/// Which cases an entry applies to. Serialized as the case name, or `"*"` for any case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CaseMatch {
    Any,
    Exact(String),
}

impl CaseMatch {
    pub fn matches(&self, case: &str) -> bool {
        match self {
            CaseMatch::Any => true,
            CaseMatch::Exact(name) => name == case,
        }
    }

    fn is_exact(&self) -> bool {
        matches!(self, CaseMatch::Exact(_))
    }
}

impl From<String> for CaseMatch {
    fn from(value: String) -> Self {
        if value.trim() == "*" {
            CaseMatch::Any
        } else {
            CaseMatch::Exact(value)
        }
    }
}

impl From<CaseMatch> for String {
    fn from(value: CaseMatch) -> Self {
        match value {
            CaseMatch::Any => "*".to_string(),
            CaseMatch::Exact(name) => name,
        }
    }
}

impl fmt::Display for CaseMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseMatch::Any => f.write_str("*"),
            CaseMatch::Exact(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub case: CaseMatch,
    #[serde(rename = "type")]
    pub kind: DisturbanceKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub disturbance: Option<DisturbanceSpec>,
}

impl RegistryEntry {
    fn applies_to(&self, case: &str, kind: DisturbanceKind) -> bool {
        self.kind == kind && self.case.matches(case)
    }
}

/// Outcome of a registry lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedContingency {
    pub name: String,
    pub disturbance: Option<DisturbanceSpec>,
}

impl ResolvedContingency {
    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN_CONTINGENCY
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContingencyRegistry {
    overrides: Vec<RegistryEntry>,
    builtin: Vec<RegistryEntry>,
}

impl ContingencyRegistry {
    /// Registry holding only the built-in table.
    pub fn builtin() -> Self {
        Self {
            overrides: Vec::new(),
            builtin: builtin_entries(),
        }
    }

    /// Adds suite-provided entries that take precedence over the built-ins.
    pub fn with_overrides(mut self, entries: impl IntoIterator<Item = RegistryEntry>) -> Self {
        self.overrides.extend(entries);
        self
    }

    pub fn entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.overrides.iter().chain(self.builtin.iter())
    }

    pub fn contingency_name(&self, case: &str, kind: DisturbanceKind) -> String {
        self.lookup(case, kind, |entry| entry.name.clone())
            .unwrap_or_else(|| UNKNOWN_CONTINGENCY.to_string())
    }

    pub fn disturbance(&self, case: &str, kind: DisturbanceKind) -> Option<DisturbanceSpec> {
        self.lookup(case, kind, |entry| entry.disturbance.clone())
    }

    pub fn resolve(&self, case: &str, kind: DisturbanceKind) -> ResolvedContingency {
        ResolvedContingency {
            name: self.contingency_name(case, kind),
            disturbance: self.disturbance(case, kind),
        }
    }

    fn lookup<T>(
        &self,
        case: &str,
        kind: DisturbanceKind,
        pick: impl Fn(&RegistryEntry) -> Option<T>,
    ) -> Option<T> {
        for group in [&self.overrides, &self.builtin] {
            for exact in [true, false] {
                let found = group
                    .iter()
                    .filter(|entry| entry.case.is_exact() == exact)
                    .filter(|entry| entry.applies_to(case, kind))
                    .find_map(&pick);
                if found.is_some() {
                    return found;
                }
            }
        }
        None
    }
}

fn line_trip_5_7() -> DisturbanceSpec {
    DisturbanceSpec::BranchTrip {
        from_bus: BusId::new(5),
        to_bus: BusId::new(7),
        circuit: "1".to_string(),
    }
}

fn gen2_to_217mw() -> DisturbanceSpec {
    DisturbanceSpec::GeneratorSetpoint {
        bus: BusId::new(2),
        machine: "1".to_string(),
        active_power: Megawatts(217.0),
    }
}

fn builtin_entries() -> Vec<RegistryEntry> {
    let exact = |case: &str| CaseMatch::Exact(case.to_string());
    vec![
        RegistryEntry {
            case: exact("case_SAVNW"),
            kind: DisturbanceKind::LineFault,
            name: Some("line_fault_154-3008".to_string()),
            disturbance: Some(DisturbanceSpec::BranchFault {
                from_bus: BusId::new(154),
                to_bus: BusId::new(3008),
                circuit: "1".to_string(),
                base_kv: Kilovolts(230.0),
                impedance: FaultImpedance::bolted(),
            }),
        },
        RegistryEntry {
            case: exact("case_NRE"),
            kind: DisturbanceKind::LineFault,
            name: Some("line_trip_5-7".to_string()),
            disturbance: Some(line_trip_5_7()),
        },
        RegistryEntry {
            case: exact("case_RE"),
            kind: DisturbanceKind::LineFault,
            name: Some("line_trip_5-7".to_string()),
            disturbance: Some(line_trip_5_7()),
        },
        RegistryEntry {
            case: CaseMatch::Any,
            kind: DisturbanceKind::BusFault,
            name: Some("bus_fault_bus_fault".to_string()),
            disturbance: None,
        },
        RegistryEntry {
            case: CaseMatch::Any,
            kind: DisturbanceKind::GenChange,
            name: Some("gen2_power_change_187-217MW".to_string()),
            disturbance: None,
        },
        RegistryEntry {
            case: exact("case_NRE"),
            kind: DisturbanceKind::GenChange,
            name: None,
            disturbance: Some(gen2_to_217mw()),
        },
        RegistryEntry {
            case: exact("case_RE"),
            kind: DisturbanceKind::GenChange,
            name: None,
            disturbance: Some(gen2_to_217mw()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nre_line_fault_is_a_branch_trip() {
        let resolved = ContingencyRegistry::builtin().resolve("case_NRE", DisturbanceKind::LineFault);
        assert_eq!(resolved.name, "line_trip_5-7");
        assert_eq!(resolved.disturbance, Some(line_trip_5_7()));
    }

    #[test]
    fn savnw_line_fault_is_a_bolted_branch_fault() {
        let resolved =
            ContingencyRegistry::builtin().resolve("case_SAVNW", DisturbanceKind::LineFault);
        assert_eq!(resolved.name, "line_fault_154-3008");
        match resolved.disturbance {
            Some(DisturbanceSpec::BranchFault {
                from_bus,
                to_bus,
                base_kv,
                impedance,
                ..
            }) => {
                assert_eq!((from_bus.value(), to_bus.value()), (154, 3008));
                assert_eq!(base_kv, Kilovolts(230.0));
                assert_eq!(impedance.imaginary, -0.2e10);
            }
            other => panic!("expected branch fault, got {other:?}"),
        }
    }

    #[test]
    fn re_gen_change_sets_217_mw_on_bus_2() {
        let resolved = ContingencyRegistry::builtin().resolve("case_RE", DisturbanceKind::GenChange);
        assert_eq!(resolved.name, "gen2_power_change_187-217MW");
        assert_eq!(resolved.disturbance, Some(gen2_to_217mw()));
    }

    #[test]
    fn unknown_pair_resolves_to_sentinel() {
        let resolved =
            ContingencyRegistry::builtin().resolve("case_MISSING", DisturbanceKind::LineFault);
        assert!(resolved.is_unknown());
        assert_eq!(resolved.name, UNKNOWN_CONTINGENCY);
        assert!(resolved.disturbance.is_none());
    }

    #[test]
    fn wildcard_name_without_parameters() {
        let registry = ContingencyRegistry::builtin();
        let resolved = registry.resolve("case_SAVNW", DisturbanceKind::GenChange);
        assert_eq!(resolved.name, "gen2_power_change_187-217MW");
        assert!(resolved.disturbance.is_none());

        let bus = registry.resolve("case_NRE", DisturbanceKind::BusFault);
        assert_eq!(bus.name, "bus_fault_bus_fault");
        assert!(bus.disturbance.is_none());
    }

    #[test]
    fn overrides_take_precedence_over_builtins() {
        let registry = ContingencyRegistry::builtin().with_overrides([RegistryEntry {
            case: CaseMatch::Exact("case_NRE".into()),
            kind: DisturbanceKind::LineFault,
            name: Some("line_trip_4-5".into()),
            disturbance: Some(DisturbanceSpec::BranchTrip {
                from_bus: BusId::new(4),
                to_bus: BusId::new(5),
                circuit: "1".into(),
            }),
        }]);
        let resolved = registry.resolve("case_NRE", DisturbanceKind::LineFault);
        assert_eq!(resolved.name, "line_trip_4-5");
        // untouched pairs still fall through to the built-in table
        assert_eq!(
            registry.contingency_name("case_RE", DisturbanceKind::LineFault),
            "line_trip_5-7"
        );
    }

    #[test]
    fn entries_deserialize_from_suite_tables() {
        let yaml = r#"
case: "*"
type: bus_fault
name: bus_fault_7
disturbance:
  kind: branch_fault
  from_bus: 7
  to_bus: 8
  base_kv: 230.0
  impedance: { real: 0.0, imaginary: -2.0e9 }
"#;
        let entry: RegistryEntry = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(entry.case, CaseMatch::Any);
        assert_eq!(entry.kind, DisturbanceKind::BusFault);
        assert!(entry.disturbance.unwrap().is_fault_type());
    }
}
