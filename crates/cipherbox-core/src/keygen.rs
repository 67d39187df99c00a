//! Random key material for every cipher.
//!
//! Generators never touch global state: the caller passes the random
//! source, so a seeded `StdRng` gives reproducible keys.

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::alphabet::{is_latin_letter, normalize, upper, Alphabet, LATIN};
use crate::checkerboard::CheckerboardKey;
use crate::error::{CipherError, Result};
use crate::hill::KeyMatrix;
use crate::square::KeySquare;
use crate::trifid::KeyCube;

/// Upper bound on random matrices drawn before giving up.
const MAX_MATRIX_ATTEMPTS: usize = 1_000;

/// Playfair square: `keyword` first, then the remaining letters (without
/// `removed`) in random order.
pub fn playfair_key_square<R: Rng>(keyword: &str, removed: char, rng: &mut R) -> Result<KeySquare> {
    let removed = removed_letter(removed)?;
    let keyword = normalize(keyword);
    if keyword.len() > 25 {
        return Err(CipherError::InvalidKeyStructure(
            "keyword must be at most 25 letters long",
        ));
    }
    if !keyword.iter().all(|&c| is_latin_letter(c)) {
        return Err(CipherError::InvalidKeyStructure(
            "keyword may only hold Latin letters",
        ));
    }
    if keyword.contains(&removed) {
        return Err(CipherError::InvalidKeyStructure(
            "keyword must not contain the removed letter",
        ));
    }
    let mut seen = Vec::with_capacity(keyword.len());
    for &letter in &keyword {
        if seen.contains(&letter) {
            return Err(CipherError::InvalidKeyStructure(
                "keyword must not repeat letters",
            ));
        }
        seen.push(letter);
    }

    let mut rest: Vec<char> = LATIN
        .chars()
        .filter(|c| *c != removed && !keyword.contains(c))
        .collect();
    rest.shuffle(rng);
    let square: String = keyword.into_iter().chain(rest).collect();
    debug!("generated playfair key square without {removed}");
    KeySquare::new(&square)
}

/// Bifid square: the Latin alphabet without `removed`, shuffled.
pub fn bifid_key_square<R: Rng>(removed: char, rng: &mut R) -> Result<KeySquare> {
    let removed = removed_letter(removed)?;
    let mut letters: Vec<char> = LATIN.chars().filter(|&c| c != removed).collect();
    letters.shuffle(rng);
    debug!("generated bifid key square without {removed}");
    KeySquare::new(&letters.into_iter().collect::<String>())
}

/// Trifid cube: shuffled Latin alphabet plus `filler`.
pub fn trifid_key_cube<R: Rng>(filler: char, rng: &mut R) -> Result<KeyCube> {
    let filler = match upper(filler) {
        Some(c) if !c.is_whitespace() && !is_latin_letter(c) => c,
        _ => {
            return Err(CipherError::InvalidKeyStructure(
                "filler must be a single symbol outside the Latin alphabet",
            ))
        }
    };
    let mut symbols: Vec<char> = LATIN.chars().chain([filler]).collect();
    symbols.shuffle(rng);
    debug!("generated trifid key cube with filler {filler:?}");
    KeyCube::new(&symbols.into_iter().collect::<String>())
}

/// Hill matrix of `size`×`size` with entries in `[0, N)` whose determinant
/// is a unit modulo the alphabet length.
pub fn hill_matrix<R: Rng>(size: usize, alphabet: &Alphabet, rng: &mut R) -> Result<KeyMatrix> {
    if alphabet.len() < 2 {
        return Err(CipherError::InvalidAlphabet(
            "hill cipher needs an alphabet of at least two symbols",
        ));
    }
    let modulus = alphabet.len() as i64;
    for attempt in 1..=MAX_MATRIX_ATTEMPTS {
        let rows = (0..size)
            .map(|_| (0..size).map(|_| rng.gen_range(0..modulus)).collect())
            .collect();
        let matrix = KeyMatrix::new(rows)?;
        if matrix.validate(alphabet).is_ok() {
            debug!("generated {size}x{size} hill matrix after {attempt} draws");
            return Ok(matrix);
        }
    }
    Err(CipherError::InvalidKeyStructure(
        "no invertible matrix found for this alphabet",
    ))
}

/// Checkerboard key: a shuffled Latin alphabet.
pub fn checkerboard_key<R: Rng>(rng: &mut R) -> Result<CheckerboardKey> {
    let mut letters: Vec<char> = LATIN.chars().collect();
    letters.shuffle(rng);
    CheckerboardKey::new(&letters.into_iter().collect::<String>())
}

fn removed_letter(removed: char) -> Result<char> {
    match upper(removed) {
        Some(c) if is_latin_letter(c) => Ok(c),
        _ => Err(CipherError::MalformedInput(
            "removed letter must be a single Latin letter",
        )),
    }
}
