use std::collections::HashMap;
use std::fmt;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::alphabet::{is_latin_letter, normalize};
use crate::error::{CipherError, Result};

const LETTERS: usize = 26;

/// Permutation of the 26 Latin letters laid out across the board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CheckerboardKey {
    letters: [char; LETTERS],
}

impl CheckerboardKey {
    pub fn new(key: &str) -> Result<Self> {
        let symbols = normalize(key);
        let mut letters = [' '; LETTERS];
        let mut seen = [false; LETTERS];
        if symbols.len() != LETTERS {
            return Err(CipherError::InvalidKeyStructure(
                "checkerboard key must be a permutation of the 26 Latin letters",
            ));
        }
        for (slot, &symbol) in symbols.iter().enumerate() {
            if !is_latin_letter(symbol) || std::mem::replace(&mut seen[latin_index(symbol)], true)
            {
                return Err(CipherError::InvalidKeyStructure(
                    "checkerboard key must be a permutation of the 26 Latin letters",
                ));
            }
            letters[slot] = symbol;
        }
        Ok(Self { letters })
    }

    pub fn letters(&self) -> &[char] {
        &self.letters
    }
}

impl fmt::Display for CheckerboardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.letters.iter().try_for_each(|c| write!(f, "{c}"))
    }
}

impl TryFrom<String> for CheckerboardKey {
    type Error = CipherError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<CheckerboardKey> for String {
    fn from(value: CheckerboardKey) -> Self {
        value.to_string()
    }
}

/// The two top-row digits left blank; each one prefixes a row of
/// two-digit codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[u8; 2]", into = "[u8; 2]")]
pub struct SparePositions([u8; 2]);

impl SparePositions {
    pub fn new(first: u8, second: u8) -> Result<Self> {
        if first > 9 || second > 9 {
            return Err(CipherError::MalformedInput(
                "spare positions must be digits between 0 and 9",
            ));
        }
        if first == second {
            return Err(CipherError::MalformedInput(
                "spare positions must be two different digits",
            ));
        }
        Ok(Self([first, second]))
    }

    pub fn digits(&self) -> [u8; 2] {
        self.0
    }

    fn row(&self, digit: u8) -> Option<usize> {
        self.0.iter().position(|&d| d == digit)
    }
}

impl Default for SparePositions {
    fn default() -> Self {
        Self([3, 7])
    }
}

impl TryFrom<[u8; 2]> for SparePositions {
    type Error = CipherError;

    fn try_from([first, second]: [u8; 2]) -> Result<Self> {
        Self::new(first, second)
    }
}

impl From<SparePositions> for [u8; 2] {
    fn from(value: SparePositions) -> Self {
        value.0
    }
}

/// Shape of the ciphertext produced by [`encode`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Output {
    /// The digit stream after key-number addition.
    Digits,
    /// The digit stream read back into letters through the code table.
    /// Ignored when the key number is zero: the raw codes are returned.
    #[default]
    Letters,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerboardOptions {
    /// Added digit-wise without carry, its decimal digits repeating.
    pub key_number: u64,
    pub spare: SparePositions,
    pub output: Output,
}

/// Digit code of a single letter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Code {
    Single(u8),
    Double(u8, u8),
}

/// Letter ↔ digit-code bijection of one board, both directions prebuilt.
#[derive(Clone, Debug)]
pub struct CodeTable {
    codes: HashMap<char, Code>,
    singles: [Option<char>; 10],
    doubles: [[Option<char>; 10]; 2],
    spare: SparePositions,
}

impl CodeTable {
    pub fn new(key: &CheckerboardKey, spare: SparePositions) -> Self {
        let mut codes = HashMap::with_capacity(LETTERS);
        let mut singles = [None; 10];
        let mut doubles = [[None; 10]; 2];
        let mut slot = 0usize;
        for &letter in key.letters() {
            while slot < 10 && spare.row(slot as u8).is_some() {
                slot += 1;
            }
            let code = if slot < 10 {
                singles[slot] = Some(letter);
                Code::Single(slot as u8)
            } else {
                let (row, col) = (slot / 10 - 1, slot % 10);
                doubles[row][col] = Some(letter);
                Code::Double(spare.0[row], col as u8)
            };
            codes.insert(letter, code);
            slot += 1;
        }
        debug!("built checkerboard code table, spare digits {:?}", spare.0);
        Self {
            codes,
            singles,
            doubles,
            spare,
        }
    }

    pub fn code(&self, letter: char) -> Option<Code> {
        self.codes.get(&letter).copied()
    }

    /// Number of letters with a code.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Concatenated codes of `letters`.
    pub fn digits(&self, letters: &[char]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(letters.len() * 2);
        for (position, &symbol) in letters.iter().enumerate() {
            match self.code(symbol) {
                Some(Code::Single(d)) => out.push(d),
                Some(Code::Double(prefix, d)) => out.extend([prefix, d]),
                None => return Err(CipherError::UnsupportedCharacter { symbol, position }),
            }
        }
        Ok(out)
    }

    /// Read a digit stream back into letters. A spare digit always opens a
    /// two-digit code; a continuation with no letter behind it is reported
    /// rather than guessed.
    pub fn read(&self, digits: &[u8]) -> Result<String> {
        let mut out = String::with_capacity(digits.len());
        let mut i = 0;
        while i < digits.len() {
            let (start, digit) = (i, digits[i]);
            let letter = match self.spare.row(digit) {
                Some(row) => {
                    let next = digits.get(i + 1).ok_or(CipherError::AmbiguousEncoding {
                        position: start,
                        detail: "digit stream ends inside a two-digit code",
                    })?;
                    i += 2;
                    self.doubles[row][usize::from(*next)]
                }
                None => {
                    i += 1;
                    self.singles[usize::from(digit)]
                }
            };
            out.push(letter.ok_or(CipherError::AmbiguousEncoding {
                position: start,
                detail: "digit sequence has no letter in the code table; choose another key number",
            })?);
        }
        Ok(out)
    }
}

pub fn encode(text: &str, key: &CheckerboardKey, options: &CheckerboardOptions) -> Result<String> {
    let letters = normalize(text);
    if let Some((position, &symbol)) = letters
        .iter()
        .enumerate()
        .find(|(_, c)| !is_latin_letter(**c))
    {
        return Err(CipherError::UnsupportedCharacter { symbol, position });
    }
    let table = CodeTable::new(key, options.spare);
    let digits = add_key_number(&table.digits(&letters)?, options.key_number, 1);
    trace!(
        "checkerboard: {} letters -> {} digits",
        letters.len(),
        digits.len()
    );
    // Reading unshifted codes back through the table would return the plaintext.
    if options.output == Output::Digits || options.key_number == 0 {
        return Ok(digits.iter().map(|&d| char::from(b'0' + d)).collect());
    }
    table.read(&digits)
}

/// Decipher either a digit stream or a letter ciphertext.
pub fn decode(
    text: &str,
    key: &CheckerboardKey,
    key_number: u64,
    spare: SparePositions,
) -> Result<String> {
    let symbols = normalize(text);
    let table = CodeTable::new(key, spare);
    let digits: Vec<u8> = if symbols.iter().all(char::is_ascii_digit) {
        symbols.iter().map(|&c| c as u8 - b'0').collect()
    } else if symbols.iter().all(|&c| is_latin_letter(c)) {
        table.digits(&symbols)?
    } else {
        if let Some((position, &symbol)) = symbols
            .iter()
            .enumerate()
            .find(|(_, c)| !c.is_ascii_digit() && !is_latin_letter(**c))
        {
            return Err(CipherError::UnsupportedCharacter { symbol, position });
        }
        return Err(CipherError::MalformedInput(
            "ciphertext must be all digits or all letters",
        ));
    };
    trace!("checkerboard: reading {} digits", digits.len());
    table.read(&add_key_number(&digits, key_number, 9))
}

/// Non-carrying digit-wise addition of `key_number` (repeated), each key
/// digit multiplied by `factor` (1 adds, 9 subtracts modulo 10).
fn add_key_number(digits: &[u8], key_number: u64, factor: u8) -> Vec<u8> {
    let key: Vec<u8> = key_number.to_string().bytes().map(|b| b - b'0').collect();
    digits
        .iter()
        .zip(key.iter().cycle())
        .map(|(&d, &k)| (d + factor * k) % 10)
        .collect()
}

fn latin_index(letter: char) -> usize {
    (letter as u8 - b'A') as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    const CASTLE: &str = "DEFEND THE EAST WALL OF THE CASTLE";

    fn key(letters: &str) -> CheckerboardKey {
        CheckerboardKey::new(letters).expect("key")
    }

    fn options(key_number: u64, spare: (u8, u8), output: Output) -> CheckerboardOptions {
        CheckerboardOptions {
            key_number,
            spare: SparePositions::new(spare.0, spare.1).expect("spare"),
            output,
        }
    }

    #[test]
    fn code_table_skips_spare_digits() {
        let table = CodeTable::new(&key("fkmcpdyehbigqrosazlutjnwvx"), SparePositions::default());
        assert_eq!(table.len(), 26);
        assert_eq!(table.code('F'), Some(Code::Single(0)));
        assert_eq!(table.code('C'), Some(Code::Single(4)));
        assert_eq!(table.code('E'), Some(Code::Single(9)));
        assert_eq!(table.code('H'), Some(Code::Double(3, 0)));
        assert_eq!(table.code('L'), Some(Code::Double(7, 0)));
        assert_eq!(table.code('X'), Some(Code::Double(7, 7)));
    }

    #[test]
    fn zero_key_number_yields_raw_codes() {
        let out = encode(
            CASTLE,
            &key("fkmcpdyehbigqrosazlutjnwvx"),
            &options(0, (3, 7), Output::Digits),
        )
        .expect("encode");
        assert_eq!(out, "690974672309938377275387070360723094383772709");
    }

    #[test]
    fn default_options_yield_digits() {
        let board = key("fkmcpdyehbigqrosazlutjnwvx");
        let out = encode("ATTACK AT DAWN", &board, &CheckerboardOptions::default()).expect("encode");
        let raw = encode(
            "ATTACK AT DAWN",
            &board,
            &options(0, (3, 7), Output::Digits),
        )
        .expect("encode");
        assert_eq!(out, raw);
        assert!(out.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(
            decode(&out, &board, 0, SparePositions::default()).expect("decode"),
            "ATTACKATDAWN"
        );
    }

    #[test]
    fn encodes_known_vectors() {
        let board = key("fkmcpdyehbigqrosazlutjnwvx");
        let out = encode(CASTLE, &board, &options(83729, (3, 7), Output::Digits)).expect("encode");
        assert_eq!(out, "427162944282657104463659953089550282655655428");
        let out = encode(CASTLE, &board, &options(83729, (3, 7), Output::Letters)).expect("encode");
        assert_eq!(out, "CMUDMECCMYMDPUFCCDOPEEPHYEPPFMYMDPPDPPCMY");
    }

    #[test]
    fn decodes_digits_and_letters() {
        let board = key("ANUMYBQXOZERKISLFWDGHPVTJC");
        let spare = SparePositions::new(0, 8).expect("spare");
        let expected = CASTLE.replace(' ', "");
        assert_eq!(
            decode("0139293949357957415827122047910721157957490827122839", &board, 2137, spare)
                .expect("decode"),
            expected
        );
        assert_eq!(
            decode("ZUXNXUXMXUYQXYQMAYHQANNKQXALNAAYQXYQMXFNQANNPX", &board, 2137, spare)
                .expect("decode"),
            expected
        );
        assert_eq!(decode(&expected, &board, 0, spare).expect("decode"), expected);
    }

    #[test]
    fn unreadable_stream_is_ambiguous() {
        let err = encode(
            "THE QUICK BROWN FOX JUMPS OVER THE LAZY DOG",
            &key("fkmcpdyehbigqrosazlutjnwvx"),
            &options(83729, (3, 7), Output::Letters),
        )
        .unwrap_err();
        assert!(matches!(err, CipherError::AmbiguousEncoding { .. }));
    }

    #[test]
    fn stream_ending_on_spare_digit_is_ambiguous() {
        let board = key("fkmcpdyehbigqrosazlutjnwvx");
        let spare = SparePositions::default();
        assert!(matches!(
            decode("3", &board, 0, spare),
            Err(CipherError::AmbiguousEncoding { position: 0, .. })
        ));
        // F is the single code 0, so the dangling 7 sits at index 3.
        assert!(matches!(
            decode("0007", &board, 0, spare),
            Err(CipherError::AmbiguousEncoding { position: 3, .. })
        ));
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(CheckerboardKey::new("ĄNUMYBQXOZERKISLFWDGHPVTJC").is_err());
        assert!(CheckerboardKey::new("NUMYBQXOZERKISLFWDGHPVTJC").is_err());
        assert!(CheckerboardKey::new("AANUMYBQXOZERKISLFWDGHPVTJC").is_err());
        assert!(CheckerboardKey::new("AAUMYBQXOZERKISLFWDGHPVTJC").is_err());
        assert!(SparePositions::new(7, 7).is_err());
        assert!(SparePositions::new(2, 10).is_err());

        let board = key("ANUMYBQXOZERKISLFWDGHPVTJC");
        let spare = SparePositions::default();
        assert!(matches!(
            decode("1A", &board, 83729, spare),
            Err(CipherError::MalformedInput(_))
        ));
        assert!(matches!(
            decode("Ą", &board, 83729, spare),
            Err(CipherError::UnsupportedCharacter { symbol: 'Ą', position: 0 })
        ));
        assert!(matches!(
            encode("MĘŻNY", &board, &CheckerboardOptions::default()),
            Err(CipherError::UnsupportedCharacter { symbol: 'Ę', position: 1 })
        ));
    }
}
