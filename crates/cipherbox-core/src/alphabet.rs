use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CipherError, Result};

/// The 26-letter Latin alphabet every grid and checkerboard key is built on.
pub const LATIN: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// The Polish alphabet extended with Q, V and X (35 letters).
pub const POLISH: &str = "AĄBCĆDEĘFGHIJKLŁMNŃOÓPQRSŚTUVWXYZŹŻ";

/// Ordered, duplicate-free symbol sequence with constant-time position lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Alphabet {
    symbols: Vec<char>,
    index: HashMap<char, usize>,
}

impl Alphabet {
    /// Build an alphabet from `symbols`, upper-cased.
    pub fn new(symbols: &str) -> Result<Self> {
        let symbols: Vec<char> = symbols.chars().flat_map(char::to_uppercase).collect();
        if symbols.is_empty() {
            return Err(CipherError::InvalidAlphabet("alphabet is empty"));
        }
        if symbols.iter().any(|c| c.is_whitespace()) {
            return Err(CipherError::InvalidAlphabet(
                "alphabet must not contain whitespace",
            ));
        }
        let mut index = HashMap::with_capacity(symbols.len());
        for (pos, &symbol) in symbols.iter().enumerate() {
            if index.insert(symbol, pos).is_some() {
                return Err(CipherError::InvalidAlphabet(
                    "alphabet contains duplicate symbols",
                ));
            }
        }
        Ok(Self { symbols, index })
    }

    pub fn latin() -> Self {
        Self::from_trusted(LATIN)
    }

    pub fn polish() -> Self {
        Self::from_trusted(POLISH)
    }

    fn from_trusted(symbols: &str) -> Self {
        let symbols: Vec<char> = symbols.chars().collect();
        let index = symbols.iter().enumerate().map(|(i, &c)| (c, i)).collect();
        Self { symbols, index }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    pub fn contains(&self, symbol: char) -> bool {
        self.index.contains_key(&symbol)
    }

    pub fn index_of(&self, symbol: char) -> Option<usize> {
        self.index.get(&symbol).copied()
    }

    /// Symbol at `index`, wrapping modulo the alphabet length.
    pub fn symbol_at(&self, index: usize) -> char {
        self.symbols[index % self.symbols.len()]
    }

    /// Map every symbol of normalised `text` to its index, reporting the
    /// first symbol the alphabet does not know.
    pub fn indices(&self, text: &[char]) -> Result<Vec<usize>> {
        text.iter()
            .enumerate()
            .map(|(position, &symbol)| {
                self.index_of(symbol)
                    .ok_or(CipherError::UnsupportedCharacter { symbol, position })
            })
            .collect()
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.symbols.iter().try_for_each(|c| write!(f, "{c}"))
    }
}

impl TryFrom<String> for Alphabet {
    type Error = CipherError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<Alphabet> for String {
    fn from(value: Alphabet) -> Self {
        value.to_string()
    }
}

/// Upper-case `text` and drop all whitespace.
pub fn normalize(text: &str) -> Vec<char> {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

pub(crate) fn is_latin_letter(symbol: char) -> bool {
    symbol.is_ascii_uppercase()
}

/// Upper-case a single symbol, rejecting case mappings that expand to
/// several characters.
pub(crate) fn upper(symbol: char) -> Option<char> {
    let mut mapped = symbol.to_uppercase();
    match (mapped.next(), mapped.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
