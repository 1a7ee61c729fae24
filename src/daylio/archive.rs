use crate::error::ImportError;
use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};
use tracing::debug;
use zip::ZipArchive;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const BACKUP_ENTRY_NAME: &str = "backup.daylio";

/// Extracted copy of a backup container.
///
/// The directory is owned by this value and removed on drop. Call
/// [`ArchiveWorkspace::close`] to observe removal failures.
#[derive(Debug)]
pub struct ArchiveWorkspace {
    dir: TempDir,
    entries: Vec<String>,
}

impl ArchiveWorkspace {
    pub fn extract(archive_path: &Path) -> Result<Self> {
        let file = fs::File::open(archive_path)
            .with_context(|| format!("failed to open {}", archive_path.display()))?;
        let mut archive = ZipArchive::new(file).with_context(|| {
            format!("{} is not a valid daylio zip file", archive_path.display())
        })?;

        let dir = tempfile::Builder::new()
            .prefix("daylio-")
            .tempdir()
            .context("failed to create extraction dir")?;

        let mut entries = Vec::new();
        for index in 0..archive.len() {
            let mut file = archive.by_index(index).with_context(|| {
                format!(
                    "failed to read entry #{index} of {}",
                    archive_path.display()
                )
            })?;
            let name = file.name().to_string();
            let Some(relative) = file.enclosed_name() else {
                return Err(ImportError::UnsafeEntryName(name).into());
            };
            let target = dir.path().join(relative);

            if file.is_dir() {
                fs::create_dir_all(&target)
                    .with_context(|| format!("failed to create {}", target.display()))?;
                continue;
            }
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }

            debug!(entry = %name, target = %target.display(), "unzipping");
            let mut out = fs::File::create(&target)
                .with_context(|| format!("failed to create {}", target.display()))?;
            io::copy(&mut file, &mut out)
                .with_context(|| format!("failed to extract {name}"))?;
            entries.push(name);
        }

        // ZipArchive indexes entries by name, so a repeated name is already
        // collapsed to one entry here.
        if !entries.iter().any(|name| name == BACKUP_ENTRY_NAME) {
            return Err(ImportError::MissingBackupEntry(BACKUP_ENTRY_NAME).into());
        }

        Ok(Self { dir, entries })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// File entries in their original archive order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    fn entry_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn read_entry(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.entry_path(name);
        fs::read(&path).with_context(|| format!("failed to read {}", path.display()))
    }

    /// Write a new container at `dest` holding every extracted file, with
    /// `replaced` swapped for `contents`.
    ///
    /// The archive is assembled next to `dest` and renamed over it only once
    /// complete.
    pub fn repack(&self, dest: &Path, replaced: &str, contents: &[u8]) -> Result<()> {
        let parent = dest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut staged = NamedTempFile::new_in(parent)
            .with_context(|| format!("failed to create temp file in {}", parent.display()))?;

        {
            let mut writer = ZipWriter::new(staged.as_file_mut());
            let options = SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated);

            for name in &self.entries {
                debug!(entry = %name, "packing");
                writer
                    .start_file(name.as_str(), options)
                    .with_context(|| format!("failed to add {name} to archive"))?;
                if name == replaced {
                    writer.write_all(contents)?;
                } else {
                    writer.write_all(&self.read_entry(name)?)?;
                }
            }
            writer.finish().context("failed to finish archive")?;
        }

        // NamedTempFile is created 0600.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(staged.path(), fs::Permissions::from_mode(0o644))
                .with_context(|| format!("failed to set permissions on {}", dest.display()))?;
        }

        staged
            .persist(dest)
            .map_err(|err| err.error)
            .with_context(|| format!("failed to write {}", dest.display()))?;
        Ok(())
    }

    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir
            .close()
            .with_context(|| format!("failed to delete workspace {}", path.display()))
    }
}
