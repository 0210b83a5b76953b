//! JSON fixture loading for the in-memory adapters.

use std::path::{Path, PathBuf};

use cap_std::{ambient_authority, fs::Dir};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors returned while loading a fixture file.
#[derive(Debug, Error)]
pub enum FixtureLoadError {
    /// The file could not be read.
    #[error("failed to read fixture at {path}: {source}")]
    Read {
        /// Path to the fixture file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid JSON for the expected shape.
    #[error("failed to parse fixture at {path}: {source}")]
    Parse {
        /// Path to the fixture file.
        path: PathBuf,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
}

/// Read a JSON array of `T` from `path`.
///
/// # Errors
/// Returns [`FixtureLoadError::Read`] when the file cannot be opened and
/// [`FixtureLoadError::Parse`] when it does not decode.
pub fn load_json_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, FixtureLoadError> {
    let read_error = |source| FixtureLoadError::Read {
        path: path.to_path_buf(),
        source,
    };
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path.file_name().ok_or_else(|| {
        read_error(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "fixture path must be a file",
        ))
    })?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(read_error)?;
    let contents = dir.read_to_string(Path::new(file_name)).map_err(read_error)?;
    serde_json::from_str(&contents).map_err(|source| FixtureLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ActivityEvent;
    use crate::test_support::cap_fs::write_file;
    use rstest::rstest;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("discovery-fixture-{}-{name}", uuid::Uuid::new_v4()))
    }

    #[rstest]
    fn reads_event_arrays() {
        let path = scratch("events.json");
        write_file(
            &path,
            br#"[{"kind":"search","categoryId":"bikes","location":{"lat":53.9,"lng":27.56},"occurredAt":"2026-03-01T10:00:00Z"}]"#,
        )
        .expect("write fixture");

        let events: Vec<ActivityEvent> = load_json_array(&path).expect("load");
        assert_eq!(events.len(), 1);
        assert_eq!(
            events.first().and_then(|e| e.category_id.as_deref()),
            Some("bikes")
        );
    }

    #[rstest]
    fn missing_files_report_the_path() {
        let path = scratch("absent.json");
        let err = load_json_array::<ActivityEvent>(&path).expect_err("missing file");
        assert!(matches!(err, FixtureLoadError::Read { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[rstest]
    fn malformed_json_is_a_parse_error() {
        let path = scratch("broken.json");
        write_file(&path, b"{not json").expect("write fixture");
        let err = load_json_array::<ActivityEvent>(&path).expect_err("bad json");
        assert!(matches!(err, FixtureLoadError::Parse { .. }));
    }
}
