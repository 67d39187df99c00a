use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::alphabet::{normalize, upper, Alphabet};
use crate::error::{CipherError, Result};
use crate::Mode;

/// Square key matrix for the Hill cipher, stored row-major.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<i64>>", into = "Vec<Vec<i64>>")]
pub struct KeyMatrix {
    size: usize,
    entries: Vec<i64>,
}

impl KeyMatrix {
    /// Build a matrix from its rows, checking only the shape.
    pub fn new(rows: Vec<Vec<i64>>) -> Result<Self> {
        let size = rows.len();
        if size == 0 || rows.iter().any(|row| row.len() != size) {
            return Err(CipherError::InvalidKeyStructure(
                "key matrix must be a non-empty square matrix",
            ));
        }
        Ok(Self {
            size,
            entries: rows.into_iter().flatten().collect(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn rows(&self) -> Vec<Vec<i64>> {
        self.entries.chunks(self.size).map(<[i64]>::to_vec).collect()
    }

    /// Determinant reduced into `[0, modulus)`.
    pub fn determinant_mod(&self, modulus: usize) -> usize {
        let modulus = modulus as i128;
        let mut rows = self.reduced_rows(modulus, false);
        let sign = triangularize(&mut rows, self.size, modulus);
        let det = (0..self.size).fold(sign.rem_euclid(modulus), |acc, i| {
            (acc * rows[i][i]).rem_euclid(modulus)
        });
        det as usize
    }

    /// Check that every entry lies in `[0, N)` and that the determinant is a
    /// unit modulo `N`, so the matrix can be used for both directions.
    pub fn validate(&self, alphabet: &Alphabet) -> Result<()> {
        let modulus = alphabet.len();
        if self
            .entries
            .iter()
            .any(|&v| v < 0 || v as u64 >= modulus as u64)
        {
            return Err(CipherError::InvalidKeyStructure(
                "key matrix entries must lie in [0, alphabet length)",
            ));
        }
        let determinant = self.determinant_mod(modulus);
        if gcd(determinant as i128, modulus as i128) != 1 {
            return Err(CipherError::NonInvertibleKey {
                determinant,
                modulus,
            });
        }
        debug!(
            "validated {0}x{0} key matrix, determinant {determinant} mod {modulus}",
            self.size
        );
        Ok(())
    }

    /// Matrix `M⁻¹` with `M·M⁻¹ ≡ I (mod N)`, by row reduction of `[M | I]`.
    pub fn inverse(&self, alphabet: &Alphabet) -> Result<KeyMatrix> {
        self.validate(alphabet)?;
        let n = self.size;
        let modulus = alphabet.len() as i128;
        let mut rows = self.reduced_rows(modulus, true);
        triangularize(&mut rows, n, modulus);

        // The diagonal multiplies to a unit, so every pivot is a unit.
        for col in (0..n).rev() {
            let unit = mod_inverse(rows[col][col], modulus).ok_or(
                CipherError::NonInvertibleKey {
                    determinant: self.determinant_mod(alphabet.len()),
                    modulus: alphabet.len(),
                },
            )?;
            for c in 0..2 * n {
                rows[col][c] = rows[col][c] * unit % modulus;
            }
            for r in 0..col {
                let factor = rows[r][col];
                if factor != 0 {
                    for c in 0..2 * n {
                        rows[r][c] = (rows[r][c] - factor * rows[col][c]).rem_euclid(modulus);
                    }
                }
            }
        }
        let entries = rows
            .iter()
            .flat_map(|row| row[n..].iter().map(|&v| v as i64))
            .collect();
        Ok(KeyMatrix { size: n, entries })
    }

    /// Rows reduced into `[0, modulus)`, optionally followed by the
    /// identity matrix.
    fn reduced_rows(&self, modulus: i128, augment: bool) -> Vec<Vec<i128>> {
        let n = self.size;
        self.entries
            .chunks(n)
            .enumerate()
            .map(|(i, row)| {
                let mut out: Vec<i128> = row
                    .iter()
                    .map(|&v| i128::from(v).rem_euclid(modulus))
                    .collect();
                if augment {
                    out.extend((0..n).map(|j| i128::from(i == j)));
                }
                out
            })
            .collect()
    }

    fn apply(&self, block: &[usize], modulus: usize) -> impl Iterator<Item = usize> + '_ {
        let modulus = modulus as i64;
        let block: Vec<i64> = block.iter().map(|&v| v as i64).collect();
        self.entries.chunks(self.size).map(move |row| {
            let dot: i64 = row.iter().zip(&block).map(|(a, b)| a * b).sum();
            dot.rem_euclid(modulus) as usize
        })
    }
}

impl TryFrom<Vec<Vec<i64>>> for KeyMatrix {
    type Error = CipherError;

    fn try_from(rows: Vec<Vec<i64>>) -> Result<Self> {
        Self::new(rows)
    }
}

impl From<KeyMatrix> for Vec<Vec<i64>> {
    fn from(value: KeyMatrix) -> Self {
        value.rows()
    }
}

/// Encipher or decipher `text` block by block.
///
/// Plaintext is padded with `pad` up to a multiple of the matrix size; after
/// deciphering, up to `size` trailing pad symbols are removed again.
pub fn transform(
    text: &str,
    alphabet: &Alphabet,
    matrix: &KeyMatrix,
    mode: Mode,
    pad: char,
) -> Result<String> {
    matrix.validate(alphabet)?;
    let pad = match upper(pad) {
        Some(pad) if !pad.is_whitespace() => pad,
        _ => {
            return Err(CipherError::MalformedInput(
                "pad symbol must be a single non-blank character",
            ))
        }
    };
    let pad_index = alphabet.index_of(pad).ok_or(CipherError::MalformedInput(
        "pad symbol must belong to the alphabet",
    ))?;
    let mut indices = alphabet.indices(&normalize(text))?;

    let key = match mode {
        Mode::Encipher => matrix.clone(),
        Mode::Decipher => matrix.inverse(alphabet)?,
    };
    let size = key.size();
    let padding = (size - indices.len() % size) % size;
    indices.resize(indices.len() + padding, pad_index);
    trace!(
        "hill: {mode:?} {} blocks of {size}, {padding} pad symbols",
        indices.len() / size
    );

    let mut out: String = indices
        .chunks(size)
        .flat_map(|block| key.apply(block, alphabet.len()))
        .map(|i| alphabet.symbol_at(i))
        .collect();
    if mode == Mode::Decipher {
        for _ in 0..size {
            if !out.ends_with(pad) {
                break;
            }
            out.pop();
        }
    }
    Ok(out)
}

pub fn encode(text: &str, alphabet: &Alphabet, matrix: &KeyMatrix, pad: char) -> Result<String> {
    transform(text, alphabet, matrix, Mode::Encipher, pad)
}

pub fn decode(text: &str, alphabet: &Alphabet, matrix: &KeyMatrix, pad: char) -> Result<String> {
    transform(text, alphabet, matrix, Mode::Decipher, pad)
}

/// Bring the first `size` columns of `rows` into upper triangular form
/// modulo `modulus` and return the sign of the row permutation.
///
/// Pivots are found with Euclidean row steps (subtract the quotient of the
/// smallest non-zero entry), so no entry ever has to be divided and
/// composite moduli work. All values stay below `modulus²`.
fn triangularize(rows: &mut [Vec<i128>], size: usize, modulus: i128) -> i128 {
    let mut sign = 1;
    for col in 0..size {
        loop {
            let pivot = (col..size)
                .filter(|&r| rows[r][col] != 0)
                .min_by_key(|&r| rows[r][col]);
            let Some(pivot) = pivot else { break };
            if pivot != col {
                rows.swap(pivot, col);
                sign = -sign;
            }
            let mut cleared = true;
            for r in col + 1..size {
                let factor = rows[r][col] / rows[col][col];
                if factor != 0 {
                    for c in col..rows[r].len() {
                        rows[r][c] = (rows[r][c] - factor * rows[col][c]).rem_euclid(modulus);
                    }
                }
                cleared &= rows[r][col] == 0;
            }
            if cleared {
                break;
            }
        }
    }
    sign
}

fn gcd(a: i128, b: i128) -> i128 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn mod_inverse(value: i128, modulus: i128) -> Option<i128> {
    let (mut old_r, mut r) = (value, modulus);
    let (mut old_s, mut s) = (1i128, 0i128);
    while r != 0 {
        let q = old_r / r;
        (old_r, r) = (r, old_r - q * r);
        (old_s, s) = (s, old_s - q * s);
    }
    (old_r == 1).then(|| old_s.rem_euclid(modulus))
}
