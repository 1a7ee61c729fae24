use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("habit CSV is missing required column(s): {0}")]
    MissingColumns(String),
    #[error("no goal matches habit {0:?} by name or tag")]
    UnresolvedHabit(String),
    #[error("archive has no `{0}` entry")]
    MissingBackupEntry(&'static str),
    #[error("archive entry name escapes the extraction dir: {0}")]
    UnsafeEntryName(String),
}
