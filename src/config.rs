use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::trial::TrialKind;

/// File-level defaults for trial workloads, overridable from the CLI.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HarnessConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_increments")]
    pub increments: u64,
    #[serde(default = "default_repeats")]
    pub repeats: usize,
    #[serde(default = "default_payload")]
    pub payload: u64,
    #[serde(default = "default_spin_budget")]
    pub spin_budget: u32,
    #[serde(default = "default_enabled")]
    pub plain_enabled: bool,
    #[serde(default = "default_enabled")]
    pub flagged_enabled: bool,
    #[serde(default = "default_enabled")]
    pub atomic_enabled: bool,
    #[serde(default = "default_enabled")]
    pub mutex_enabled: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            increments: default_increments(),
            repeats: default_repeats(),
            payload: default_payload(),
            spin_budget: default_spin_budget(),
            plain_enabled: default_enabled(),
            flagged_enabled: default_enabled(),
            atomic_enabled: default_enabled(),
            mutex_enabled: default_enabled(),
        }
    }
}

impl HarnessConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::read_file(path)
    }

    /// Like [`load_from_file`](Self::load_from_file), but for a path the
    /// user named explicitly: a missing file is an error, not a silent
    /// fall-back to defaults.
    pub fn load_from_required_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            bail!("Config file not found: {:?}", path);
        }
        Self::read_file(path)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: HarnessConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Trial kinds left enabled by the file, in canonical order.
    pub fn enabled_kinds(&self) -> Vec<TrialKind> {
        TrialKind::ALL
            .into_iter()
            .filter(|kind| match kind {
                TrialKind::Plain => self.plain_enabled,
                TrialKind::Flagged => self.flagged_enabled,
                TrialKind::Atomic => self.atomic_enabled,
                TrialKind::Mutex => self.mutex_enabled,
            })
            .collect()
    }
}

fn default_workers() -> usize {
    4
}

fn default_increments() -> u64 {
    100_000
}

fn default_repeats() -> usize {
    20
}

fn default_payload() -> u64 {
    crate::trial::publish::DEFAULT_PAYLOAD
}

fn default_spin_budget() -> u32 {
    64
}

fn default_enabled() -> bool {
    true
}
