//! Character file loading.
//!
//! Loads [`CharacterSpec`] definitions from RON files and validates them
//! against the engine before any iteration runs, so a typo in a talent name
//! fails at load time instead of halfway through a batch.

use std::fs;
use std::path::{Path, PathBuf};

use sim_core::character::{CharacterSpec, Simulator};
use sim_core::error::SimError;
use thiserror::Error;

/// Errors from loading a character file.
#[derive(Debug, Error)]
pub enum CharacterFileError {
    /// File could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// File is not valid RON for a character.
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// RON error with position.
        #[source]
        source: ron::error::SpannedError,
    },

    /// File parsed but the character is not simulatable.
    #[error("Invalid character in {path}: {source}")]
    Invalid {
        /// File that failed.
        path: PathBuf,
        /// Engine configuration error.
        #[source]
        source: SimError,
    },

    /// Directory does not exist.
    #[error("Character directory not found: {0}")]
    DirectoryNotFound(PathBuf),
}

/// Parse a character from RON text without validating it.
///
/// # Errors
///
/// Returns [`CharacterFileError::Parse`] if the text is not a character.
pub fn parse_character(text: &str, path: &Path) -> Result<CharacterSpec, CharacterFileError> {
    ron::from_str(text).map_err(|source| CharacterFileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load and validate a character file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or configured.
pub fn load_character(path: &Path) -> Result<CharacterSpec, CharacterFileError> {
    let text = fs::read_to_string(path).map_err(|source| CharacterFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let spec = parse_character(&text, path)?;

    Simulator::from_spec(&spec).map_err(|source| CharacterFileError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(
        path = %path.display(),
        character = %spec.name,
        class = %spec.class,
        "Loaded character"
    );
    Ok(spec)
}

/// Load every `.ron` character in a directory, sorted by file name.
///
/// Files that fail to load are logged and skipped.
///
/// # Errors
///
/// Returns an error if the directory is missing or unreadable.
pub fn load_characters_from_dir(dir: &Path) -> Result<Vec<CharacterSpec>, CharacterFileError> {
    if !dir.is_dir() {
        return Err(CharacterFileError::DirectoryNotFound(dir.to_path_buf()));
    }

    let io_err = |source: std::io::Error| CharacterFileError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.extension().is_some_and(|e| e == "ron") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut loaded = Vec::with_capacity(paths.len());
    for path in paths {
        match load_character(&path) {
            Ok(spec) => loaded.push(spec),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping character"),
        }
    }
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::character::Class;

    const MAGE: &str = r#"(
        name: "Test Mage",
        class: mage,
        talents: { "ice_shards": 5, "elemental_precision": 3 },
        stats: (spell_power: 500.0, max_resource: 6000.0),
        fight_duration_secs: 90.0,
        iterations: 200,
    )"#;

    #[test]
    fn test_load_character() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mage.ron");
        fs::write(&path, MAGE).unwrap();

        let spec = load_character(&path).unwrap();
        assert_eq!(spec.class, Class::Mage);
        assert_eq!(spec.iterations, 200);
        assert_eq!(spec.talents.get("ice_shards"), Some(&5));
        assert_eq!(spec.duration_ms().unwrap(), 90_000);
    }

    #[test]
    fn test_missing_file() {
        let err = load_character(Path::new("/definitely/not/here.ron")).unwrap_err();
        assert!(matches!(err, CharacterFileError::Io { .. }));
    }

    #[test]
    fn test_parse_error_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ron");
        fs::write(&path, "(name: \"Broken\", class: warlock)").unwrap();

        let err = load_character(&path).unwrap_err();
        assert!(matches!(err, CharacterFileError::Parse { .. }));
        assert!(err.to_string().contains("broken.ron"));
    }

    #[test]
    fn test_unknown_talent_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rogue.ron");
        let text = r#"(name: "Odd Rogue", class: rogue, talents: { "ice_shards": 1 })"#;
        fs::write(&path, text).unwrap();

        let err = load_character(&path).unwrap_err();
        assert!(matches!(
            err,
            CharacterFileError::Invalid {
                source: SimError::UnknownTalent { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_load_directory_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a_mage.ron"), MAGE).unwrap();
        fs::write(dir.path().join("b_broken.ron"), "not ron").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let loaded = load_characters_from_dir(dir.path()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Test Mage");
    }

    #[test]
    fn test_missing_directory() {
        let err = load_characters_from_dir(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, CharacterFileError::DirectoryNotFound(_)));
    }
}
