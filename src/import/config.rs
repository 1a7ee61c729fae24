use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const ENTRY_ORDER_NEWEST_FIRST: &str = "newest-first";
const ENTRY_ORDER_OLDEST_FIRST: &str = "oldest-first";
const CREATED_AT_EARLIEST_ONLY: &str = "earliest-only";
const CREATED_AT_ALWAYS: &str = "always";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum EntryOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CreatedAtPolicy {
    /// Move a goal's start back only when habit history predates it.
    #[default]
    EarliestOnly,
    /// Always set a goal's start to the earliest habit date.
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    pub entry_order: EntryOrder,
    pub created_at_policy: CreatedAtPolicy,
    pub success_weeks: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            entry_order: EntryOrder::default(),
            created_at_policy: CreatedAtPolicy::default(),
            success_weeks: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub entry_order: String,
    pub created_at_policy: String,
    pub success_weeks: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            entry_order: ENTRY_ORDER_NEWEST_FIRST.to_string(),
            created_at_policy: CREATED_AT_EARLIEST_ONLY.to_string(),
            success_weeks: true,
        }
    }
}

impl ImportConfig {
    pub fn options(&self) -> Result<ImportOptions> {
        let entry_order = match self.entry_order.as_str() {
            ENTRY_ORDER_NEWEST_FIRST => EntryOrder::NewestFirst,
            ENTRY_ORDER_OLDEST_FIRST => EntryOrder::OldestFirst,
            other => {
                return Err(anyhow!(
                    "invalid entry order {other:?}: use `{ENTRY_ORDER_NEWEST_FIRST}` or `{ENTRY_ORDER_OLDEST_FIRST}`"
                ));
            }
        };
        let created_at_policy = match self.created_at_policy.as_str() {
            CREATED_AT_EARLIEST_ONLY => CreatedAtPolicy::EarliestOnly,
            CREATED_AT_ALWAYS => CreatedAtPolicy::Always,
            other => {
                return Err(anyhow!(
                    "invalid created-at policy {other:?}: use `{CREATED_AT_EARLIEST_ONLY}` or `{CREATED_AT_ALWAYS}`"
                ));
            }
        };
        Ok(ImportOptions {
            entry_order,
            created_at_policy,
            success_weeks: self.success_weeks,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialFileConfig {
    import: Option<ImportConfig>,
}

fn env_or_bool(var: &str, fallback: bool) -> bool {
    match env::var(var) {
        Ok(v) => match v.trim() {
            "1" | "true" | "TRUE" | "yes" | "on" => true,
            "0" | "false" | "FALSE" | "no" | "off" => false,
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(custom) = env::var("DAYLIO_IMPORT_CONFIG") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let base = dirs::config_dir()?;
    Some(base.join("daylio-habit-import").join("config.toml"))
}

fn merge_toml(base: &mut ImportConfig, raw: &str, path: &Path) -> Result<()> {
    let parsed: PartialFileConfig = toml::from_str(raw)
        .map_err(|err| anyhow!("failed to parse import config {}: {err}", path.display()))?;
    if let Some(import) = parsed.import {
        *base = import;
    }
    Ok(())
}

fn merge_file_config(base: &mut ImportConfig) -> Result<()> {
    let Some(path) = resolve_config_path() else {
        return Ok(());
    };
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(&path)?;
    merge_toml(base, &raw, &path)
}

pub fn load_config() -> Result<ImportConfig> {
    let mut cfg = ImportConfig::default();
    merge_file_config(&mut cfg)?;

    cfg.entry_order = env_or_string("DAYLIO_ENTRY_ORDER", &cfg.entry_order);
    cfg.created_at_policy = env_or_string("DAYLIO_CREATED_AT_POLICY", &cfg.created_at_policy);
    cfg.success_weeks = env_or_bool("DAYLIO_SUCCESS_WEEKS", cfg.success_weeks);

    cfg.options()?;
    Ok(cfg)
}
