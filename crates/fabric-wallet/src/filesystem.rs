//! Directory-backed wallet.
//!
//! Each identity lives in `<dir>/<label>.id`. A record is written to a
//! private temp file, flushed, and then hard-linked onto its final name.
//! `link(2)` refuses to replace an existing name, which gives an atomic
//! create-if-absent across threads and processes, and readers never see a
//! half-written record because the final name only appears once the data is
//! complete.

use async_trait::async_trait;
use fabric_enroll_core::{EnrollError, Identity, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::record;
use crate::store::{validate_label, IdentityStore};

/// File extension of identity records
pub const RECORD_EXTENSION: &str = "id";

/// Wallet storing one JSON record per identity in a directory
#[derive(Debug)]
pub struct FileSystemWallet {
    dir: PathBuf,
    temp_counter: AtomicU64,
}

impl FileSystemWallet {
    /// Open the wallet at `dir`, creating the directory if needed
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| EnrollError::store_io("*", e))?;

        debug!(path = %dir.display(), "opened wallet");
        Ok(Self {
            dir,
            temp_counter: AtomicU64::new(0),
        })
    }

    /// Directory holding the records
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for `label`
    #[must_use]
    pub fn record_path(&self, label: &str) -> PathBuf {
        self.dir.join(format!("{label}.{RECORD_EXTENSION}"))
    }

    /// Create a fresh temp file next to the records.
    ///
    /// Temp names start with '.', which labels may not, so they can never
    /// be mistaken for records.
    async fn create_temp(&self, label: &str) -> Result<(PathBuf, fs::File)> {
        loop {
            let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
            let path = self
                .dir
                .join(format!(".{label}.{}.{n}.tmp", std::process::id()));

            let mut options = fs::OpenOptions::new();
            options.write(true).create_new(true);
            #[cfg(unix)]
            options.mode(0o600);

            match options.open(&path).await {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(EnrollError::store_io(label, e)),
            }
        }
    }

    async fn write_temp(&self, label: &str, bytes: &[u8]) -> Result<PathBuf> {
        let (path, mut file) = self.create_temp(label).await?;

        let written = async {
            file.write_all(bytes).await?;
            file.flush().await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            discard(&path).await;
            return Err(EnrollError::store_io(label, e));
        }
        Ok(path)
    }

    async fn sync_dir(&self) {
        #[cfg(unix)]
        {
            let synced = async { fs::File::open(&self.dir).await?.sync_all().await }.await;
            if let Err(e) = synced {
                warn!(path = %self.dir.display(), error = %e, "failed to sync wallet directory");
            }
        }
    }
}

async fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to remove temp file");
        }
    }
}

#[async_trait]
impl IdentityStore for FileSystemWallet {
    async fn exists(&self, label: &str) -> Result<bool> {
        validate_label(label)?;
        fs::try_exists(self.record_path(label))
            .await
            .map_err(|e| EnrollError::store_io(label, e))
    }

    async fn get(&self, label: &str) -> Result<Option<Identity>> {
        validate_label(label)?;
        let bytes = match fs::read(self.record_path(label)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(EnrollError::store_io(label, e)),
        };
        record::decode(label, &bytes).map(Some)
    }

    async fn put(&self, label: &str, identity: &Identity) -> Result<()> {
        validate_label(label)?;
        let bytes = record::encode(label, identity)?;
        let target = self.record_path(label);

        if self.exists(label).await? {
            return Err(EnrollError::DuplicateIdentity {
                label: label.to_string(),
            });
        }

        let temp = self.write_temp(label, &bytes).await?;
        let linked = fs::hard_link(&temp, &target).await;
        discard(&temp).await;

        match linked {
            Ok(()) => {
                self.sync_dir().await;
                info!(label, path = %target.display(), "stored identity");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                warn!(label, "lost race to store identity; record already present");
                Err(EnrollError::DuplicateIdentity {
                    label: label.to_string(),
                })
            }
            Err(e) => Err(EnrollError::store_io(label, e)),
        }
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| EnrollError::store_io("*", e))?;

        let mut labels = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| EnrollError::store_io("*", e))?
        {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with('.') {
                continue;
            }
            if let Some(label) = name
                .strip_suffix(RECORD_EXTENSION)
                .and_then(|stem| stem.strip_suffix('.'))
            {
                labels.push(label.to_string());
            }
        }

        labels.sort();
        Ok(labels)
    }
}
