use std::collections::HashMap;
use std::fmt;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::alphabet::{is_latin_letter, normalize};
use crate::error::{CipherError, Result};

const CELLS: usize = 27;

/// Separator written between ciphertext groups.
pub const GROUP_SEPARATOR: &str = " ";

/// 3×3×3 cube over the 26 Latin letters plus one filler symbol.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyCube {
    cells: [char; CELLS],
    coords: HashMap<char, [usize; 3]>,
    filler: char,
}

impl KeyCube {
    pub fn new(key: &str) -> Result<Self> {
        let symbols = normalize(key);
        if symbols.len() != CELLS {
            return Err(CipherError::InvalidKeyStructure(
                "trifid key must hold 26 Latin letters and one filler symbol",
            ));
        }
        let mut cells = [' '; CELLS];
        let mut coords = HashMap::with_capacity(CELLS);
        let mut filler = None;
        for (i, &symbol) in symbols.iter().enumerate() {
            if !is_latin_letter(symbol) && filler.replace(symbol).is_some() {
                return Err(CipherError::InvalidKeyStructure(
                    "trifid key must hold exactly one filler symbol",
                ));
            }
            if coords.insert(symbol, [i / 9, (i % 9) / 3, i % 3]).is_some() {
                return Err(CipherError::InvalidKeyStructure(
                    "trifid key contains repeated symbols",
                ));
            }
            cells[i] = symbol;
        }
        // 27 distinct symbols with at most one filler cover the whole alphabet.
        let filler = filler.ok_or(CipherError::InvalidKeyStructure(
            "trifid key must hold exactly one filler symbol",
        ))?;
        debug!("built trifid cube with filler {filler:?}");
        Ok(Self {
            cells,
            coords,
            filler,
        })
    }

    pub fn filler(&self) -> char {
        self.filler
    }

    /// `[layer, row, column]` of `symbol`.
    pub fn coords(&self, symbol: char) -> Option<[usize; 3]> {
        self.coords.get(&symbol).copied()
    }

    pub fn at(&self, [layer, row, col]: [usize; 3]) -> char {
        self.cells[9 * layer + 3 * row + col]
    }

    fn locate(&self, text: &[char]) -> Result<Vec<[usize; 3]>> {
        text.iter()
            .enumerate()
            .map(|(position, &symbol)| {
                self.coords(symbol)
                    .ok_or(CipherError::UnsupportedCharacter { symbol, position })
            })
            .collect()
    }
}

impl fmt::Display for KeyCube {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.cells.iter().try_for_each(|c| write!(f, "{c}"))
    }
}

impl TryFrom<String> for KeyCube {
    type Error = CipherError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<KeyCube> for String {
    fn from(value: KeyCube) -> Self {
        value.to_string()
    }
}

/// Encipher `text`, emitting one space-separated group per period.
pub fn encode(text: &str, cube: &KeyCube, period: usize) -> Result<String> {
    check_period(period)?;
    let coords = cube.locate(&normalize(text))?;
    trace!("trifid: enciphering {} symbols, period {period}", coords.len());

    let groups: Vec<String> = coords
        .chunks(period)
        .map(|block| {
            let stream: Vec<usize> = (0..3)
                .flat_map(|axis| block.iter().map(move |c| c[axis]))
                .collect();
            stream
                .chunks_exact(3)
                .map(|t| cube.at([t[0], t[1], t[2]]))
                .collect()
        })
        .collect();
    Ok(groups.join(GROUP_SEPARATOR))
}

/// Decipher `text`; group separators are ignored and blocks are rebuilt
/// from `period`.
pub fn decode(text: &str, cube: &KeyCube, period: usize) -> Result<String> {
    check_period(period)?;
    let coords = cube.locate(&normalize(text))?;
    trace!("trifid: deciphering {} symbols, period {period}", coords.len());

    let mut out = String::with_capacity(coords.len());
    for block in coords.chunks(period) {
        let stream: Vec<usize> = block.iter().flatten().copied().collect();
        let n = block.len();
        out.extend((0..n).map(|i| cube.at([stream[i], stream[n + i], stream[2 * n + i]])));
    }
    Ok(out)
}

fn check_period(period: usize) -> Result<()> {
    if period < 2 {
        return Err(CipherError::MalformedInput(
            "trifid period must be at least 2",
        ));
    }
    Ok(())
}
