//! Case directory discovery and raw-to-saved conversion.
//!
//! A case directory holds one base case (`*.sav`, or a `*.raw` that is converted once and
//! cached as `*.sav`) and at most one dynamics file (`*.dyr`).

use stabsim_core::{BaseCase, StabError, StabResult};
use stabsim_engine::{EngineFault, EngineSession};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Input files found in one case directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseInventory {
    pub saved: Vec<PathBuf>,
    pub raw: Vec<PathBuf>,
    pub dynamics: Vec<PathBuf>,
}

impl CaseInventory {
    /// Lists `*.sav`, `*.raw` and `*.dyr` files in `dir`, each group sorted by path.
    pub fn scan(dir: &Path) -> StabResult<Self> {
        if !dir.is_dir() {
            return Err(StabError::Configuration(format!(
                "case directory '{}' does not exist",
                dir.display()
            )));
        }

        let mut inventory = CaseInventory::default();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let ext = path
                .extension()
                .and_then(|s| s.to_str())
                .map(|s| s.to_ascii_lowercase());
            match ext.as_deref() {
                Some("sav") => inventory.saved.push(path),
                Some("raw") => inventory.raw.push(path),
                Some("dyr") => inventory.dynamics.push(path),
                _ => {}
            }
        }
        inventory.saved.sort();
        inventory.raw.sort();
        inventory.dynamics.sort();
        Ok(inventory)
    }
}

/// Resolved inputs for one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseFiles {
    pub base_case: BaseCase,
    pub dynamics: Option<PathBuf>,
}

/// First file of a group, warning when the directory holds more than one.
fn pick_one(files: &[PathBuf], what: &str, dir: &Path) -> Option<PathBuf> {
    if files.len() > 1 {
        warn!(
            case_dir = %dir.display(),
            count = files.len(),
            chosen = %files[0].display(),
            "Multiple {what} files found; using the first"
        );
    }
    files.first().cloned()
}

/// Resolves the base case and dynamics file of the case in `dir`.
///
/// A raw-only case is converted through `engine` and the saved snapshot is written next to the
/// raw file, so later runs find it directly. If conversion does not produce the snapshot the raw
/// file is used as is.
pub fn resolve_case_files<E: EngineSession + ?Sized>(
    engine: &mut E,
    dir: &Path,
    capacity: u32,
) -> StabResult<CaseFiles> {
    let inventory = CaseInventory::scan(dir)?;
    let dynamics = pick_one(&inventory.dynamics, "dynamics", dir);
    if dynamics.is_none() {
        warn!(case_dir = %dir.display(), "No .dyr file found; running without dynamics data");
    }

    let base_case = if let Some(saved) = pick_one(&inventory.saved, "saved case", dir) {
        BaseCase::Saved(saved)
    } else if let Some(raw) = pick_one(&inventory.raw, "raw case", dir) {
        convert_raw(engine, &raw, capacity)?
    } else {
        return Err(StabError::Configuration(format!(
            "no .sav or .raw file found in '{}'",
            dir.display()
        )));
    };

    debug!(
        base_case = %base_case.path().display(),
        dynamics = ?dynamics,
        "Case files resolved"
    );
    Ok(CaseFiles {
        base_case,
        dynamics,
    })
}

/// Converts a raw network file to a saved snapshot next to it.
///
/// Returns the saved snapshot on success and the raw file otherwise. A host fault during
/// conversion resets the engine; only a failed reset is an error.
pub fn convert_raw<E: EngineSession + ?Sized>(
    engine: &mut E,
    raw: &Path,
    capacity: u32,
) -> StabResult<BaseCase> {
    let saved = raw.with_extension("sav");
    info!(raw = %raw.display(), saved = %saved.display(), "Converting raw case");

    match run_conversion(engine, raw, &saved, capacity) {
        Ok(()) if saved.is_file() => {
            info!(saved = %saved.display(), "Raw case converted");
            Ok(BaseCase::Saved(saved))
        }
        Ok(()) => {
            warn!(
                raw = %raw.display(),
                "Conversion produced no saved case; using the raw file directly"
            );
            Ok(BaseCase::Raw(raw.to_path_buf()))
        }
        Err(fault) => {
            warn!(
                raw = %raw.display(),
                error = %fault,
                "Conversion failed; using the raw file directly"
            );
            engine.reset().map_err(StabError::from)?;
            Ok(BaseCase::Raw(raw.to_path_buf()))
        }
    }
}

fn run_conversion<E: EngineSession + ?Sized>(
    engine: &mut E,
    raw: &Path,
    saved: &Path,
    capacity: u32,
) -> Result<(), EngineFault> {
    let steps = [
        ("initialize", engine.initialize(capacity)?),
        ("read_raw", engine.read_raw(raw)?),
        ("save_case", engine.save_case(saved)?),
    ];
    for (command, status) in steps {
        if !status.is_ok() {
            debug!(command, status = status.code(), "Conversion command returned non-zero status");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stabsim_engine::ScriptedEngine;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "0 / placeholder\n").unwrap();
        path
    }

    #[test]
    fn saved_case_is_used_directly() {
        let dir = tempdir().unwrap();
        let sav = touch(dir.path(), "ieee9.sav");
        let dyr = touch(dir.path(), "ieee9.dyr");
        touch(dir.path(), "notes.txt");

        let mut engine = ScriptedEngine::new();
        engine.open().unwrap();
        let files = resolve_case_files(&mut engine, dir.path(), 200_000).unwrap();
        assert_eq!(files.base_case, BaseCase::Saved(sav));
        assert_eq!(files.dynamics, Some(dyr));
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn raw_case_is_converted_and_cached() {
        let dir = tempdir().unwrap();
        let raw = touch(dir.path(), "ieee9.raw");
        let mut engine = ScriptedEngine::new();
        engine.open().unwrap();

        let files = resolve_case_files(&mut engine, dir.path(), 200_000).unwrap();
        let saved = raw.with_extension("sav");
        assert_eq!(files.base_case, BaseCase::Saved(saved.clone()));
        assert!(saved.is_file());
        assert_eq!(engine.ops(), vec!["initialize", "read_raw", "save_case"]);
        assert_eq!(files.dynamics, None);

        let again = resolve_case_files(&mut engine, dir.path(), 200_000).unwrap();
        assert_eq!(again.base_case, BaseCase::Saved(saved));
        assert_eq!(engine.calls().len(), 3);
    }

    #[test]
    fn failed_conversion_falls_back_to_raw() {
        let dir = tempdir().unwrap();
        let raw = touch(dir.path(), "ieee9.raw");
        let mut engine = ScriptedEngine::new().fail_on("save_case");
        engine.open().unwrap();

        let files = resolve_case_files(&mut engine, dir.path(), 200_000).unwrap();
        assert_eq!(files.base_case, BaseCase::Raw(raw));
        assert_eq!(engine.open_count(), 2);
        assert!(engine.is_open());
    }

    #[test]
    fn missing_inputs_are_configuration_errors() {
        let dir = tempdir().unwrap();
        let mut engine = ScriptedEngine::new();
        engine.open().unwrap();

        let err = resolve_case_files(&mut engine, &dir.path().join("case_X"), 200_000).unwrap_err();
        assert!(err.is_configuration());

        touch(dir.path(), "ieee9.dyr");
        let err = resolve_case_files(&mut engine, dir.path(), 200_000).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("no .sav or .raw"));
    }

    #[test]
    fn inventory_is_sorted_and_case_insensitive() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "b.SAV");
        touch(dir.path(), "a.sav");
        let inventory = CaseInventory::scan(dir.path()).unwrap();
        assert_eq!(inventory.saved.len(), 2);
        assert!(inventory.saved[0].ends_with("a.sav"));
    }
}
