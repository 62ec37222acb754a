use serde::Serialize;
use stabsim_engine::{EngineFault, EngineResult, EngineStatus};
use tracing::debug;

/// Status code of one engine command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusRecord {
    pub command: &'static str,
    pub status: EngineStatus,
}

/// Every status code a run produced, in command order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusLog {
    records: Vec<StatusRecord>,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the status of `command` and passes host faults through.
    ///
    /// A non-zero status is kept and logged, and the caller carries on with the next command.
    pub fn record(&mut self, command: &'static str, result: EngineResult) -> Result<(), EngineFault> {
        let status = result?;
        if !status.is_ok() {
            debug!(command, status = status.code(), "Engine returned non-zero status");
        }
        self.records.push(StatusRecord { command, status });
        Ok(())
    }

    pub fn records(&self) -> &[StatusRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn non_zero(&self) -> impl Iterator<Item = &StatusRecord> {
        self.records.iter().filter(|record| !record.status.is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_zero_status_is_recorded_not_raised() {
        let mut log = StatusLog::new();
        log.record("load_case", Ok(EngineStatus(3))).unwrap();
        log.record("advance", Ok(EngineStatus::OK)).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.non_zero().count(), 1);
        assert_eq!(log.records()[0].command, "load_case");
    }

    #[test]
    fn host_fault_passes_through_unrecorded() {
        let mut log = StatusLog::new();
        let err = log.record("advance", Err(EngineFault::NotOpen)).unwrap_err();
        assert!(matches!(err, EngineFault::NotOpen));
        assert!(log.is_empty());
    }
}
