//! Filesystem event store
//!
//! Loads every `*.jsonl` file under a directory (one JSON object per
//! line, files visited in name order for determinism) and serves the
//! records through the same segmented scan as the memory store. This is
//! the backend the CLI drives for local runs.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::error::SourceError;
use crate::memory::MemoryEventStore;
use crate::store::{EventStore, ScanPage, ScanRequest};

/// Errors opening a filesystem event store
#[derive(Debug, Error)]
pub enum FsSourceError {
    /// Directory or file could not be read
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A line was not valid JSON
    #[error("invalid record in '{path}' line {line}: {source}")]
    Parse {
        path: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// [`EventStore`] over a directory of jsonl files
#[derive(Debug)]
pub struct FsEventStore {
    inner: MemoryEventStore,
    records_loaded: usize,
}

impl FsEventStore {
    /// Load all records under `dir`
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, FsSourceError> {
        let dir = dir.as_ref();
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| FsSourceError::Io {
                path: dir.display().to_string(),
                source: e,
            })?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "jsonl"))
            .collect();
        files.sort();

        let mut records = Vec::new();
        for path in files {
            let contents = std::fs::read_to_string(&path).map_err(|e| FsSourceError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
            for (index, line) in contents.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let value: Value =
                    serde_json::from_str(line).map_err(|e| FsSourceError::Parse {
                        path: path.display().to_string(),
                        line: index + 1,
                        source: e,
                    })?;
                records.push(value);
            }
        }

        tracing::debug!(dir = %dir.display(), records = records.len(), "loaded event directory");

        let records_loaded = records.len();
        Ok(Self {
            inner: MemoryEventStore::new(records),
            records_loaded,
        })
    }

    /// Number of records loaded at open time
    pub fn len(&self) -> usize {
        self.records_loaded
    }

    /// Whether the directory held no records
    pub fn is_empty(&self) -> bool {
        self.records_loaded == 0
    }
}

#[async_trait]
impl EventStore for FsEventStore {
    async fn scan(&self, request: ScanRequest) -> Result<ScanPage, SourceError> {
        self.inner.scan(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    #[tokio::test]
    async fn loads_jsonl_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "b.jsonl", "{\"n\": 2}\n{\"n\": 3}\n");
        write_file(dir.path(), "a.jsonl", "{\"n\": 1}\n");
        write_file(dir.path(), "notes.txt", "ignored");

        let store = FsEventStore::open(dir.path()).unwrap();
        assert_eq!(store.len(), 3);

        let page = store
            .scan(ScanRequest {
                segment: 0,
                total_segments: 1,
                limit: 100,
                exclusive_start: None,
            })
            .await
            .unwrap();
        let ns: Vec<u64> = page
            .items
            .iter()
            .map(|v| v["n"].as_u64().unwrap())
            .collect();
        assert_eq!(ns, vec![1, 2, 3]);
    }

    #[test]
    fn skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "a.jsonl", "{\"n\": 1}\n\n{\"n\": 2}\n");
        let store = FsEventStore::open(dir.path()).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn bad_json_names_file_and_line() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "a.jsonl", "{\"n\": 1}\nnot json\n");
        let err = FsEventStore::open(dir.path()).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("a.jsonl"));
        assert!(text.contains("line 2"));
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let err = FsEventStore::open("/definitely/not/here").unwrap_err();
        assert!(matches!(err, FsSourceError::Io { .. }));
    }
}
