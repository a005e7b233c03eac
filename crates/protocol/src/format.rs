//! Output serialization formats

use serde::{Deserialize, Serialize};

/// Serialization format for per-client output objects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One top-level JSON array per object (default)
    #[default]
    Json,
    /// One compact JSON object per line
    Jsonl,
    /// RFC 4180 CSV with a derived header
    Csv,
}

impl OutputFormat {
    /// Object key extension
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Jsonl => "jsonl",
            Self::Csv => "csv",
        }
    }

    /// Content type forwarded to the sink
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Jsonl => "application/x-ndjson",
            Self::Csv => "text/csv",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}
