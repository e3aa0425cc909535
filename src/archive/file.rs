//! On-disk archive lifecycle.
//!
//! An [`ArchiveFile`] is opened once, filled in memory, and written out on
//! [`ArchiveFile::commit`]. In atomic mode the document goes to a temporary
//! file next to the destination and is renamed over it, so an aborted run
//! never replaces an existing archive.

use super::tree::{Archive, Group};
use crate::errors::ArchiveError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Format tag written at the top of every archive.
pub const ARCHIVE_FORMAT: &str = "zresults-archive";

/// Current archive document version.
pub const ARCHIVE_VERSION: u32 = 1;

#[derive(Serialize)]
struct DocumentRef<'a> {
    format: &'a str,
    version: u32,
    created_at: DateTime<Utc>,
    root: &'a Group,
}

#[derive(Deserialize)]
struct Document {
    format: String,
    version: u32,
    created_at: DateTime<Utc>,
    root: Group,
}

enum Sink {
    Atomic(NamedTempFile),
    Direct(File),
}

/// Write handle for an archive on disk.
pub struct ArchiveFile {
    path: PathBuf,
    sink: Sink,
    archive: Archive,
}

impl ArchiveFile {
    /// Open `path` for writing, replacing whatever is there on commit.
    pub fn create(path: &Path, atomic: bool) -> Result<Self, ArchiveError> {
        let sink = if atomic {
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            let temp = NamedTempFile::new_in(dir).map_err(|source| ArchiveError::Open {
                path: path.to_path_buf(),
                source,
            })?;
            debug!("Staging archive in {}", temp.path().display());
            Sink::Atomic(temp)
        } else {
            let file = File::create(path).map_err(|source| ArchiveError::Open {
                path: path.to_path_buf(),
                source,
            })?;
            Sink::Direct(file)
        };

        Ok(Self {
            path: path.to_path_buf(),
            sink,
            archive: Archive::new(),
        })
    }

    pub fn archive_mut(&mut self) -> &mut Archive {
        &mut self.archive
    }

    /// Serialize the archive and publish it at the destination path.
    pub fn commit(self) -> Result<Archive, ArchiveError> {
        let Self {
            path,
            sink,
            archive,
        } = self;

        let write_err = |source: std::io::Error| ArchiveError::Write {
            path: path.clone(),
            source,
        };

        match sink {
            Sink::Atomic(mut temp) => {
                write_document(&mut temp, &archive, &path)?;
                temp.as_file().sync_all().map_err(write_err)?;
                temp.persist(&path).map_err(|e| write_err(e.error))?;
            }
            Sink::Direct(mut file) => {
                write_document(&mut file, &archive, &path)?;
                file.sync_all().map_err(write_err)?;
            }
        }

        info!(
            "Wrote {} datasets to {}",
            archive.dataset_count(),
            path.display()
        );
        Ok(archive)
    }
}

fn write_document<W: Write>(writer: W, archive: &Archive, path: &Path) -> Result<(), ArchiveError> {
    let write_err = |source: std::io::Error| ArchiveError::Write {
        path: path.to_path_buf(),
        source,
    };
    let document = DocumentRef {
        format: ARCHIVE_FORMAT,
        version: ARCHIVE_VERSION,
        created_at: archive.created_at,
        root: &archive.root,
    };

    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, &document).map_err(|e| {
        if e.is_io() {
            write_err(e.into())
        } else {
            ArchiveError::Json(e)
        }
    })?;
    writer.write_all(b"\n").map_err(write_err)?;
    writer.flush().map_err(write_err)?;
    Ok(())
}

impl Archive {
    /// Read an archive written by [`ArchiveFile::commit`].
    pub fn load(path: &Path) -> Result<Self, ArchiveError> {
        let file = File::open(path).map_err(|source| ArchiveError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let document: Document = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            ArchiveError::Format {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        if document.format != ARCHIVE_FORMAT {
            return Err(ArchiveError::Format {
                path: path.to_path_buf(),
                reason: format!("unknown format tag '{}'", document.format),
            });
        }
        if document.version != ARCHIVE_VERSION {
            return Err(ArchiveError::Format {
                path: path.to_path_buf(),
                reason: format!("unsupported version {}", document.version),
            });
        }

        Ok(Self {
            root: document.root,
            created_at: document.created_at,
        })
    }
}
