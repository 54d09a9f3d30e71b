use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MinutesError {
    #[error("document id is empty")]
    EmptyId,

    #[error("document {0} has no text")]
    EmptyText(String),

    #[error("failed to read minutes from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type MinutesResult<T> = std::result::Result<T, MinutesError>;

/// One meeting's minutes, ready for extraction. The id is the source file's
/// stem and doubles as the basename for every artifact derived from the
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinutesDocument {
    pub id: String,
    pub text: String,
}

impl MinutesDocument {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> MinutesResult<Self> {
        let id = id.into();
        let text = text.into();
        if id.trim().is_empty() {
            return Err(MinutesError::EmptyId);
        }
        if text.trim().is_empty() {
            return Err(MinutesError::EmptyText(id));
        }
        Ok(Self { id, text })
    }
}

const MINUTES_EXTENSIONS: &[&str] = &["txt", "md"];

/// Reads every text-bearing file in `dir` as one document, in file-name
/// order. A missing directory yields an empty set; unusable files are
/// skipped with a warning.
pub fn read_minutes(dir: &Path) -> MinutesResult<Vec<MinutesDocument>> {
    if !dir.is_dir() {
        tracing::warn!(path = %dir.display(), "minutes directory does not exist, nothing to read");
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(dir).map_err(|source| MinutesError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|extension| extension.to_str())
                .is_some_and(|extension| MINUTES_EXTENSIONS.contains(&extension))
        })
        .collect();
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let text = fs::read_to_string(&path).map_err(|source| MinutesError::Io {
            path: path.clone(),
            source,
        })?;
        let id = path
            .file_stem()
            .map_or_else(String::new, |stem| stem.to_string_lossy().into_owned());
        match MinutesDocument::new(id, text) {
            Ok(document) => documents.push(document),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "skipping unusable minutes file");
            }
        }
    }
    tracing::info!(count = documents.len(), path = %dir.display(), "read minutes documents");
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn documents_come_back_in_file_name_order() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("2024-02-01.txt"), "February minutes").unwrap();
        fs::write(dir.path().join("2024-01-04.txt"), "January minutes").unwrap();
        fs::write(dir.path().join("agenda.pdf"), "not minutes").unwrap();

        let documents = read_minutes(dir.path()).unwrap();
        let ids: Vec<&str> = documents.iter().map(|document| document.id.as_str()).collect();
        assert_eq!(ids, ["2024-01-04", "2024-02-01"]);
        assert_eq!(documents[0].text, "January minutes");
    }

    #[test]
    fn empty_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("empty.txt"), "   \n").unwrap();
        fs::write(dir.path().join("real.txt"), "Motion passed 5-0").unwrap();

        let documents = read_minutes(dir.path()).unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].id, "real");
    }

    #[test]
    fn missing_directory_yields_no_documents() {
        let dir = TempDir::new().unwrap();
        let documents = read_minutes(&dir.path().join("nowhere")).unwrap();
        assert!(documents.is_empty());
    }

    #[test]
    fn construction_rejects_blank_fields() {
        assert!(matches!(MinutesDocument::new("", "text"), Err(MinutesError::EmptyId)));
        assert!(matches!(
            MinutesDocument::new("m1", "  "),
            Err(MinutesError::EmptyText(id)) if id == "m1"
        ));
    }
}
