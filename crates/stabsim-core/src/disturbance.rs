use serde::{Deserialize, Serialize};
use std::fmt;

use crate::units::{Kilovolts, Megawatts};
use crate::BusId;

/// Unit convention of a branch fault's impedance values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultUnits {
    /// Admittance in MVA at unity voltage
    #[default]
    Mva,
    /// Impedance in ohms at the fault's base voltage
    Ohms,
}

impl FaultUnits {
    /// Selector value the engine's branch-fault call expects.
    pub fn engine_code(&self) -> i32 {
        match self {
            FaultUnits::Mva => 1,
            FaultUnits::Ohms => 2,
        }
    }
}

/// Fault impedance (or admittance, depending on [`FaultUnits`]) as a real/imaginary pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaultImpedance {
    #[serde(default)]
    pub units: FaultUnits,
    pub real: f64,
    pub imaginary: f64,
}

impl FaultImpedance {
    /// Near-bolted fault: a very large negative susceptance in MVA.
    pub fn bolted() -> Self {
        Self {
            units: FaultUnits::Mva,
            real: 0.0,
            imaginary: -0.2e10,
        }
    }
}

/// Concrete disturbance to inject. One variant per kind; each kind has exactly one handler in
/// the disturbance controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisturbanceSpec {
    /// Shunt fault on a branch, cleared after the fault window
    BranchFault {
        from_bus: BusId,
        to_bus: BusId,
        #[serde(default = "default_circuit")]
        circuit: String,
        base_kv: Kilovolts,
        impedance: FaultImpedance,
    },
    /// Branch opened at both ends
    BranchTrip {
        from_bus: BusId,
        to_bus: BusId,
        #[serde(default = "default_circuit")]
        circuit: String,
    },
    /// Step change of one machine's active-power setpoint; every other machine field keeps the
    /// engine default
    GeneratorSetpoint {
        bus: BusId,
        #[serde(default = "default_circuit")]
        machine: String,
        active_power: Megawatts,
    },
}

fn default_circuit() -> String {
    "1".to_string()
}

impl DisturbanceSpec {
    /// Fault-type disturbances run through a fault window and finish with a fault-clear
    /// command; setpoint changes take effect immediately.
    pub fn is_fault_type(&self) -> bool {
        matches!(
            self,
            DisturbanceSpec::BranchFault { .. } | DisturbanceSpec::BranchTrip { .. }
        )
    }
}

impl fmt::Display for DisturbanceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisturbanceSpec::BranchFault {
                from_bus,
                to_bus,
                circuit,
                ..
            } => write!(f, "branch fault {from_bus}-{to_bus} ckt {circuit}"),
            DisturbanceSpec::BranchTrip {
                from_bus,
                to_bus,
                circuit,
            } => write!(f, "branch trip {from_bus}-{to_bus} ckt {circuit}"),
            DisturbanceSpec::GeneratorSetpoint {
                bus,
                machine,
                active_power,
            } => write!(f, "machine {machine} at bus {bus} to {active_power}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trips_and_faults_are_fault_type() {
        let trip = DisturbanceSpec::BranchTrip {
            from_bus: BusId::new(5),
            to_bus: BusId::new(7),
            circuit: "1".into(),
        };
        let setpoint = DisturbanceSpec::GeneratorSetpoint {
            bus: BusId::new(2),
            machine: "1".into(),
            active_power: Megawatts(217.0),
        };
        assert!(trip.is_fault_type());
        assert!(!setpoint.is_fault_type());
        assert_eq!(trip.to_string(), "branch trip 5-7 ckt 1");
    }

    #[test]
    fn tagged_representation_defaults_circuit() {
        let spec: DisturbanceSpec =
            serde_json::from_str(r#"{"kind":"branch_trip","from_bus":1,"to_bus":2}"#).unwrap();
        assert_eq!(
            spec,
            DisturbanceSpec::BranchTrip {
                from_bus: BusId::new(1),
                to_bus: BusId::new(2),
                circuit: "1".into(),
            }
        );
    }
}
