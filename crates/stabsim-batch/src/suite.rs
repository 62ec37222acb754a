//! Suite configuration.
//!
//! A suite names the cases to run, the contingencies to apply to each of them and how to reach
//! the engine. TOML is the native format; YAML and JSON load the same structure.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use stabsim_core::{
    ChannelMode, ContingencyRegistry, DisturbanceKind, RegistryEntry, Seconds, StabError,
    StabResult,
};
use stabsim_engine::BridgeConfig;
use stabsim_sim::driver::DEFAULT_CAPACITY;
use stabsim_sim::{DisturbanceTiming, RunOptions};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// One entry of the contingency list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContingencyConfig {
    /// Disturbance type, e.g. `line_fault`. Kept as text so an unknown type surfaces as a
    /// validation error rather than a parse error.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
}

impl ContingencyConfig {
    pub fn new(kind: DisturbanceKind, description: impl Into<String>) -> Self {
        Self {
            kind: kind.as_str().to_string(),
            description: description.into(),
        }
    }

    pub fn disturbance_kind(&self) -> StabResult<DisturbanceKind> {
        self.kind.parse()
    }

    /// Human-readable event name for logs and chart titles.
    pub fn label(&self) -> &str {
        if self.description.is_empty() {
            &self.kind
        } else {
            &self.description
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineBackend {
    /// External bridge process hosting the vendor engine
    #[default]
    Bridge,
    /// In-process scripted engine (dry runs)
    Scripted,
}

impl EngineBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineBackend::Bridge => "bridge",
            EngineBackend::Scripted => "scripted",
        }
    }
}

impl fmt::Display for EngineBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineBackend {
    type Err = StabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bridge" => Ok(EngineBackend::Bridge),
            "scripted" => Ok(EngineBackend::Scripted),
            other => Err(StabError::Configuration(format!(
                "unknown engine backend '{other}'; use bridge or scripted"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub backend: EngineBackend,
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    /// Bus capacity passed to `initialize`
    pub capacity: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        let bridge = BridgeConfig::default();
        Self {
            backend: EngineBackend::default(),
            program: bridge.program,
            args: bridge.args,
            working_dir: bridge.working_dir,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl EngineSettings {
    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            program: self.program.clone(),
            args: self.args.clone(),
            working_dir: self.working_dir.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log file written next to the console output; `None` logs to the console only
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: Some(PathBuf::from("simulation.log")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Directory holding one sub-directory per case
    pub case_root: PathBuf,
    pub results_root: PathBuf,
    pub cases: Vec<String>,
    pub channel_mode: ChannelMode,
    pub runtime: Seconds,
    pub contingencies: Vec<ContingencyConfig>,
    pub engine: EngineSettings,
    pub timing: DisturbanceTiming,
    pub logging: LoggingSettings,
    /// Lookup entries consulted before the built-in ones
    pub registry: Vec<RegistryEntry>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            case_root: PathBuf::from("case_data"),
            results_root: PathBuf::from("results"),
            cases: vec!["case_NRE".to_string(), "case_RE".to_string()],
            channel_mode: ChannelMode::All,
            runtime: Seconds(20.0),
            contingencies: vec![
                ContingencyConfig::new(DisturbanceKind::LineFault, "Line trip contingency (5-7)"),
                ContingencyConfig::new(
                    DisturbanceKind::GenChange,
                    "Generator 2 power change (187.3 MW -> 217 MW)",
                ),
            ],
            engine: EngineSettings::default(),
            timing: DisturbanceTiming::default(),
            logging: LoggingSettings::default(),
            registry: Vec::new(),
        }
    }
}

impl SuiteConfig {
    /// Checks everything that can be checked before the engine is touched.
    pub fn validate(&self) -> StabResult<()> {
        if self.cases.is_empty() {
            return Err(StabError::Configuration(
                "suite lists no cases".to_string(),
            ));
        }
        if let Some(blank) = self.cases.iter().find(|case| case.trim().is_empty()) {
            return Err(StabError::Configuration(format!(
                "case names must not be blank, got '{blank}'"
            )));
        }
        if self.contingencies.is_empty() {
            return Err(StabError::Configuration(
                "suite lists no contingencies".to_string(),
            ));
        }
        for contingency in &self.contingencies {
            contingency.disturbance_kind()?;
        }
        if self.engine.capacity == 0 {
            return Err(StabError::Configuration(
                "engine capacity must be positive".to_string(),
            ));
        }
        self.timing.check(self.runtime)
    }

    /// Built-in lookup extended with the suite's own entries.
    pub fn registry(&self) -> ContingencyRegistry {
        ContingencyRegistry::builtin().with_overrides(self.registry.iter().cloned())
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            capacity: self.engine.capacity,
            timing: self.timing,
            ..RunOptions::default()
        }
    }

    /// Rebases relative roots onto `base`, the directory the suite file lives in.
    pub fn rebase(mut self, base: &Path) -> Self {
        if self.case_root.is_relative() {
            self.case_root = base.join(&self.case_root);
        }
        if self.results_root.is_relative() {
            self.results_root = base.join(&self.results_root);
        }
        self
    }
}

/// Loads a suite from TOML, YAML or JSON.
///
/// The extension picks the parser; an unrecognised extension tries TOML, then YAML, then JSON.
pub fn load_suite(path: &Path) -> Result<SuiteConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading suite config '{}'", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();
    let suite = match ext.as_str() {
        "toml" => toml::from_str(&contents)
            .with_context(|| format!("parsing TOML suite '{}'", path.display()))?,
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing YAML suite '{}'", path.display()))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("parsing JSON suite '{}'", path.display()))?,
        _ => toml::from_str(&contents)
            .map_err(anyhow::Error::from)
            .or_else(|_| serde_yaml::from_str(&contents).map_err(anyhow::Error::from))
            .or_else(|_| serde_json::from_str(&contents).map_err(anyhow::Error::from))
            .with_context(|| format!("parsing suite '{}'", path.display()))?,
    };
    Ok(suite)
}
