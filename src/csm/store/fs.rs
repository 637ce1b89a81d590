use super::StorageBackend;
use crate::error::{CsmError, Result, Status};
use crate::locator::SourceLocator;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;
use zeroize::Zeroizing;

pub const BACKUP_SUFFIX: &str = ".bak";

/// Local file medium. A source named `vault` with format `ct` lives in
/// `vault.ct`; relative names are resolved against `root` when one is set.
#[derive(Debug, Clone, Default)]
pub struct LocalFileBackend {
    root: Option<PathBuf>,
}

impl LocalFileBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    pub fn path_for(&self, locator: &SourceLocator) -> Result<PathBuf> {
        if locator.is_empty() {
            return Err(CsmError::Source("locator has no name".to_string()));
        }
        let file = PathBuf::from(format!("{}.{}", locator.name(), locator.format()));
        match &self.root {
            Some(root) if file.is_relative() => Ok(root.join(file)),
            _ => Ok(file),
        }
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path).map_err(CsmError::Io)?;
        }
        Ok(())
    }
}

pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Creates `path` readable by the owner only.
fn write_private(path: &Path, data: &[u8]) -> Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path).map_err(CsmError::Io)?;
    file.write_all(data).map_err(CsmError::Io)?;
    file.sync_all().map_err(CsmError::Io)?;
    Ok(())
}

impl StorageBackend for LocalFileBackend {
    fn medium(&self) -> &str {
        "file"
    }

    fn load(&self, locator: &SourceLocator) -> Result<Zeroizing<Vec<u8>>> {
        let path = self.path_for(locator)?;
        match fs::read(&path) {
            Ok(data) => {
                debug!(path = %path.display(), bytes = data.len(), "Loaded source file");
                Ok(Zeroizing::new(data))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CsmError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(CsmError::Io(e)),
        }
    }

    fn store(&self, locator: &SourceLocator, data: &[u8]) -> Result<Status> {
        let path = self.path_for(locator)?;
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        self.ensure_dir(&dir)?;

        let mut status = Status::Ok;
        if path.exists() {
            let backup = backup_path(&path);
            if let Err(e) = fs::copy(&path, &backup) {
                warn!(path = %backup.display(), error = %e, "Could not write backup copy");
                status = Status::Warning;
            }
        }

        // Atomic replace: write a sibling temp file, then rename over.
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = dir.join(format!(".{}-{}.tmp", file_name, Uuid::new_v4()));
        if let Err(e) = write_private(&tmp, data).and_then(|_| {
            fs::rename(&tmp, &path).map_err(CsmError::Io)
        }) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        debug!(path = %path.display(), bytes = data.len(), "Stored source file");
        Ok(status)
    }

    fn exists(&self, locator: &SourceLocator) -> Result<bool> {
        Ok(self.path_for(locator)?.exists())
    }
}
