use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use cipherbox_core::{Alphabet, CheckerboardKey, KeyCube, KeyMatrix, KeySquare};
use serde::{Deserialize, Serialize};

/// Key material as persisted by `cipherbox keygen --out`.
///
/// Every key type re-runs its validating constructor on deserialisation,
/// so a hand-edited file is rejected with the same error as an inline key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cipher", rename_all = "snake_case")]
pub enum KeyFile {
    Playfair { square: KeySquare },
    Bifid { square: KeySquare },
    Trifid { cube: KeyCube },
    Hill { alphabet: Alphabet, matrix: KeyMatrix },
    Checkerboard { key: CheckerboardKey },
}

#[derive(Debug, thiserror::Error)]
pub enum KeyFileError {
    #[error("cannot access key file: {0}")]
    Io(#[from] io::Error),
    #[error("malformed key file: {0}")]
    Format(#[from] serde_json::Error),
    #[error("key file holds a {found} key, expected {expected}")]
    WrongCipher {
        found: &'static str,
        expected: &'static str,
    },
}

impl KeyFile {
    pub fn cipher(&self) -> &'static str {
        match self {
            KeyFile::Playfair { .. } => "playfair",
            KeyFile::Bifid { .. } => "bifid",
            KeyFile::Trifid { .. } => "trifid",
            KeyFile::Hill { .. } => "hill",
            KeyFile::Checkerboard { .. } => "checkerboard",
        }
    }

    /// Printable form of the key, in the syntax the inline `--key` and
    /// `--matrix` flags accept.
    pub fn display_key(&self) -> String {
        match self {
            KeyFile::Playfair { square } | KeyFile::Bifid { square } => square.to_string(),
            KeyFile::Trifid { cube } => cube.to_string(),
            KeyFile::Hill { matrix, .. } => format_matrix(matrix),
            KeyFile::Checkerboard { key } => key.to_string(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, KeyFileError> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Write pretty JSON to `path`, creating parent directories.
    pub fn store(&self, path: &Path) -> Result<(), KeyFileError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(self)?;
        let mut f = fs::File::create(path)?;
        f.write_all(&json)?;
        f.write_all(b"\n")?;
        Ok(())
    }

    pub fn wrong_cipher(&self, expected: &'static str) -> KeyFileError {
        KeyFileError::WrongCipher {
            found: self.cipher(),
            expected,
        }
    }
}

/// `6,24,1;13,16,10;20,17,15` style rendering of a matrix.
pub fn format_matrix(matrix: &KeyMatrix) -> String {
    matrix
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Parse rows separated by `;` with comma-separated entries.
pub fn parse_matrix(text: &str) -> Result<Vec<Vec<i64>>, String> {
    text.split(';')
        .map(|row| {
            row.split(',')
                .map(|v| {
                    v.trim()
                        .parse::<i64>()
                        .map_err(|e| format!("invalid matrix entry {v:?}: {e}"))
                })
                .collect()
        })
        .collect()
}
