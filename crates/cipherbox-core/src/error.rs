use thiserror::Error;

/// Canonical error type exposed by every cipher in the crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    /// Duplicate, blank or too few symbols for the chosen cipher.
    #[error("invalid alphabet: {0}")]
    InvalidAlphabet(&'static str),

    /// Wrong length, non-bijective or out-of-range key material.
    #[error("invalid key structure: {0}")]
    InvalidKeyStructure(&'static str),

    /// Input text contains a symbol outside the declared alphabet or key.
    #[error("unsupported character {symbol:?} at position {position}")]
    UnsupportedCharacter { symbol: char, position: usize },

    /// Hill matrix determinant (reduced modulo the alphabet length) shares a
    /// factor with the alphabet length.
    #[error("key matrix determinant {determinant} is not invertible modulo {modulus}")]
    NonInvertibleKey { determinant: usize, modulus: usize },

    /// The parameters cannot produce an unambiguous encoding of this text.
    #[error("ambiguous encoding at position {position}: {detail}")]
    AmbiguousEncoding {
        position: usize,
        detail: &'static str,
    },

    /// Parameter with the wrong shape (period, pad symbol, text length, ...).
    #[error("malformed input: {0}")]
    MalformedInput(&'static str),
}

pub type Result<T> = std::result::Result<T, CipherError>;
