use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::constants::HIGH_SCORE_KEY;
use crate::types::HighScoreView;

const FILE_VERSION: u8 = 1;

#[derive(Debug, Error)]
pub enum HighScoreError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to serialize high scores: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredScore {
    score: i32,
    #[serde(rename = "updatedAt", alias = "updated_at")]
    updated_at: String,
}

#[derive(Serialize)]
struct HighScoreFile<'a> {
    version: u8,
    entries: &'a HashMap<String, StoredScore>,
}

#[derive(Deserialize)]
struct HighScoreFileRaw {
    version: u8,
    entries: HashMap<String, serde_json::Value>,
}

/// Single-scalar score persistence keyed by name, backed by a JSON file.
pub struct HighScoreStore {
    file_path: PathBuf,
    entries: HashMap<String, StoredScore>,
}

impl HighScoreStore {
    /// Opens the store, treating an unreadable file as empty.
    pub fn new(file_path: PathBuf) -> Self {
        match Self::open(file_path.clone()) {
            Ok(store) => store,
            Err(error) => {
                warn!(%error, "high-score store unreadable, starting empty");
                Self {
                    file_path,
                    entries: HashMap::new(),
                }
            }
        }
    }

    pub fn open(file_path: PathBuf) -> Result<Self, HighScoreError> {
        let entries = load_entries(&file_path)?;
        Ok(Self { file_path, entries })
    }

    pub fn high_score(&self) -> i32 {
        self.entries
            .get(HIGH_SCORE_KEY)
            .map(|entry| entry.score)
            .unwrap_or(0)
    }

    pub fn build_response(&self) -> HighScoreView {
        let entry = self.entries.get(HIGH_SCORE_KEY);
        HighScoreView {
            score: entry.map(|entry| entry.score).unwrap_or(0),
            updated_at: entry.map(|entry| entry.updated_at.clone()),
            generated_at: now_iso(),
        }
    }

    /// Keeps `score` if it beats the stored one. Write failures are logged.
    pub fn record(&mut self, score: i32) -> bool {
        if score <= self.high_score() {
            return false;
        }
        self.entries.insert(
            HIGH_SCORE_KEY.to_string(),
            StoredScore {
                score,
                updated_at: now_iso(),
            },
        );
        if let Err(error) = self.save() {
            warn!(%error, "failed to persist high score");
        }
        true
    }

    pub fn save(&self) -> Result<(), HighScoreError> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent).map_err(|source| HighScoreError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let payload = HighScoreFile {
            version: FILE_VERSION,
            entries: &self.entries,
        };
        let text = serde_json::to_string_pretty(&payload)?;
        fs::write(&self.file_path, text).map_err(|source| HighScoreError::Write {
            path: self.file_path.clone(),
            source,
        })
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn load_entries(path: &Path) -> Result<HashMap<String, StoredScore>, HighScoreError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(source) => {
            return Err(HighScoreError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let raw: HighScoreFileRaw =
        serde_json::from_str(&text).map_err(|source| HighScoreError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    if raw.version != FILE_VERSION {
        warn!(
            version = raw.version,
            path = %path.display(),
            "unsupported high-score file version"
        );
        return Ok(HashMap::new());
    }

    let mut entries = HashMap::new();
    for (key, value) in raw.entries {
        match serde_json::from_value::<StoredScore>(value) {
            Ok(entry) if entry.score >= 0 => {
                entries.insert(key, entry);
            }
            Ok(entry) => {
                warn!(key = %key, score = entry.score, "ignoring negative high score");
            }
            Err(error) => {
                warn!(key = %key, %error, "ignoring malformed high-score entry");
            }
        }
    }
    Ok(entries)
}
