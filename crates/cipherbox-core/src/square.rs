use std::collections::HashMap;
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::alphabet::{is_latin_letter, normalize, upper};
use crate::error::{CipherError, Result};

pub const SIDE: usize = 5;
const CELLS: usize = SIDE * SIDE;

/// Letter folded into another so the Latin alphabet fits 25 cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merge {
    pub from: char,
    pub to: char,
}

impl Merge {
    pub fn new(from: char, to: char) -> Result<Self> {
        let (from, to) = match (upper(from), upper(to)) {
            (Some(from), Some(to)) => (from, to),
            _ => return Err(CipherError::MalformedInput("merge letters must be Latin letters")),
        };
        if !is_latin_letter(from) || !is_latin_letter(to) {
            return Err(CipherError::MalformedInput("merge letters must be Latin letters"));
        }
        if from == to {
            return Err(CipherError::MalformedInput("merge letters must differ"));
        }
        Ok(Self { from, to })
    }

    pub(crate) fn apply(&self, symbol: char) -> char {
        if symbol == self.from {
            self.to
        } else {
            symbol
        }
    }

    /// Write `symbol` the way a decoder has to report it: the merge target
    /// could stand for either letter.
    pub(crate) fn annotate(&self, symbol: char, out: &mut String) {
        if symbol == self.to {
            out.push('(');
            out.push(self.to);
            out.push('/');
            out.push(self.from);
            out.push(')');
        } else {
            out.push(symbol);
        }
    }
}

impl Default for Merge {
    fn default() -> Self {
        Self { from: 'J', to: 'I' }
    }
}

/// 5×5 Polybius square over 25 distinct Latin letters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeySquare {
    cells: [[char; SIDE]; SIDE],
    coords: HashMap<char, (usize, usize)>,
}

impl KeySquare {
    /// Parse a square written row by row.
    pub fn new(square: &str) -> Result<Self> {
        let letters = normalize(square);
        if letters.len() != CELLS {
            return Err(CipherError::InvalidKeyStructure(
                "key square must hold exactly 25 letters",
            ));
        }
        let mut cells = [[' '; SIDE]; SIDE];
        let mut coords = HashMap::with_capacity(CELLS);
        for (i, &letter) in letters.iter().enumerate() {
            if !is_latin_letter(letter) {
                return Err(CipherError::InvalidKeyStructure(
                    "key square may only hold Latin letters",
                ));
            }
            let (row, col) = (i / SIDE, i % SIDE);
            if coords.insert(letter, (row, col)).is_some() {
                return Err(CipherError::InvalidKeyStructure(
                    "key square contains repeated letters",
                ));
            }
            cells[row][col] = letter;
        }
        debug!("built 5x5 key square starting with {:?}", cells[0]);
        Ok(Self { cells, coords })
    }

    pub fn coords(&self, letter: char) -> Option<(usize, usize)> {
        self.coords.get(&letter).copied()
    }

    pub fn at(&self, row: usize, col: usize) -> char {
        self.cells[row % SIDE][col % SIDE]
    }

    pub fn contains(&self, letter: char) -> bool {
        self.coords.contains_key(&letter)
    }

    /// The square must leave out the merged letter.
    pub(crate) fn check_merge(&self, merge: &Merge) -> Result<()> {
        if self.contains(merge.from) {
            return Err(CipherError::InvalidKeyStructure(
                "key square must not contain the merged letter",
            ));
        }
        Ok(())
    }

    /// Coordinates for every letter of normalised `text`.
    pub(crate) fn locate(&self, text: &[char]) -> Result<Vec<(usize, usize)>> {
        text.iter()
            .enumerate()
            .map(|(position, &symbol)| {
                self.coords(symbol)
                    .ok_or(CipherError::UnsupportedCharacter { symbol, position })
            })
            .collect()
    }
}

impl fmt::Display for KeySquare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.cells
            .iter()
            .flatten()
            .try_for_each(|c| write!(f, "{c}"))
    }
}

impl TryFrom<String> for KeySquare {
    type Error = CipherError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<KeySquare> for String {
    fn from(value: KeySquare) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn places_letters_row_major() {
        let square = KeySquare::new("monarchybdefgiklpqstuvwxz").expect("square");
        assert_eq!(square.coords('M'), Some((0, 0)));
        assert_eq!(square.coords('H'), Some((1, 1)));
        assert_eq!(square.coords('Z'), Some((4, 4)));
        assert_eq!(square.at(2, 3), 'P');
        assert_eq!(square.to_string(), "MONARCHYBDEFGIKLPQSTUVWXZ");
    }

    #[test]
    fn rejects_malformed_squares() {
        for bad in [
            "monarchy",
            "abbarchybdefgiklpqstuvwxz",
            "ążnarchybdefgiklpqstuvwxz",
            "monarchybdefgiklpqstuvwx5",
        ] {
            assert!(
                matches!(KeySquare::new(bad), Err(CipherError::InvalidKeyStructure(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn merge_validation() {
        assert_eq!(Merge::new('d', 't').expect("merge"), Merge { from: 'D', to: 'T' });
        assert!(Merge::new('J', 'J').is_err());
        assert!(Merge::new('Ą', 'I').is_err());
        assert!(Merge::new(' ', 'I').is_err());

        let square = KeySquare::new("MONARCHYIBDEFGKLPQSTUVWXZ").expect("square");
        assert!(square.check_merge(&Merge::default()).is_ok());
        assert!(square.check_merge(&Merge::new('I', 'J').expect("merge")).is_err());
    }

    #[test]
    fn annotate_marks_merge_target() {
        let mut out = String::new();
        for c in "CIJ".chars() {
            Merge::default().annotate(c, &mut out);
        }
        assert_eq!(out, "C(I/J)J");
    }
}
