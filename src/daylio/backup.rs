use crate::daylio::archive::{ArchiveWorkspace, BACKUP_ENTRY_NAME};
use crate::daylio::model::{
    BackupData, KEY_DAY_ENTRIES, KEY_GOAL_ENTRIES, KEY_GOAL_SUCCESS_WEEKS, KEY_GOALS,
};
use anyhow::{Context, Result, anyhow};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::info;

/// A loaded Daylio backup.
///
/// `data` is the typed view callers mutate. `raw` holds every top-level key
/// of the original document; on save the typed collections are written over
/// it, so keys this tool does not model pass through unchanged.
#[derive(Debug)]
pub struct Backup {
    pub data: BackupData,
    raw: Map<String, Value>,
    workspace: ArchiveWorkspace,
}

impl Backup {
    pub fn load(path: &Path) -> Result<Self> {
        let workspace = ArchiveWorkspace::extract(path)?;
        let payload = workspace.read_entry(BACKUP_ENTRY_NAME)?;
        let json = decode_payload(&payload)?;
        info!(bytes = json.len(), "decoded backup payload");

        let (data, raw) =
            parse_document(&json).with_context(|| format!("invalid backup {}", path.display()))?;
        Ok(Self {
            data,
            raw,
            workspace,
        })
    }

    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    pub fn archive_entries(&self) -> &[String] {
        self.workspace.entries()
    }

    pub fn workspace_path(&self) -> &Path {
        self.workspace.path()
    }

    /// Write the backup to `dest`. Returns `false` without touching the
    /// filesystem when no destination is given.
    pub fn persist(&mut self, dest: Option<&Path>) -> Result<bool> {
        let Some(dest) = dest else {
            return Ok(false);
        };
        overlay_typed(&mut self.raw, &self.data)?;
        let json = serde_json::to_vec(&self.raw).context("failed to serialize backup JSON")?;
        let payload = STANDARD.encode(json);
        self.workspace
            .repack(dest, BACKUP_ENTRY_NAME, payload.as_bytes())?;
        info!(dest = %dest.display(), "wrote backup");
        Ok(true)
    }

    /// Remove the extraction workspace.
    pub fn close(self) -> Result<()> {
        self.workspace.close()
    }
}

fn decode_payload(payload: &[u8]) -> Result<Vec<u8>> {
    let compact: Vec<u8> = payload
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    STANDARD
        .decode(compact)
        .context("failed to decode base64-encoded backup payload")
}

fn parse_document(json: &[u8]) -> Result<(BackupData, Map<String, Value>)> {
    let value: Value = serde_json::from_slice(json).context("failed to parse backup JSON")?;
    let Value::Object(raw) = value else {
        return Err(anyhow!("backup JSON is not an object"));
    };
    let data: BackupData = serde_json::from_value(Value::Object(raw.clone()))
        .context("failed to read backup collections")?;
    Ok((data, raw))
}

fn overlay_typed(raw: &mut Map<String, Value>, data: &BackupData) -> Result<()> {
    let overlays = [
        (KEY_DAY_ENTRIES, serde_json::to_value(&data.day_entries)),
        (KEY_GOALS, serde_json::to_value(&data.goals)),
        (KEY_GOAL_ENTRIES, serde_json::to_value(&data.goal_entries)),
        (
            KEY_GOAL_SUCCESS_WEEKS,
            serde_json::to_value(&data.goal_success_weeks),
        ),
    ];
    for (key, value) in overlays {
        let value = value.with_context(|| format!("failed to serialize {key}"))?;
        raw.insert(key.to_string(), value);
    }
    Ok(())
}
