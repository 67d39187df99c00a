use log::trace;
use serde::{Deserialize, Serialize};

use crate::alphabet::{normalize, upper};
use crate::error::{CipherError, Result};
use crate::square::{KeySquare, Merge, SIDE};

/// Parameters shared by Playfair encoding and decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayfairOptions {
    pub merge: Merge,
    /// Letter that breaks up doubled pairs and pads odd-length messages.
    pub pad: char,
}

impl Default for PlayfairOptions {
    fn default() -> Self {
        Self {
            merge: Merge::default(),
            pad: 'X',
        }
    }
}

/// Normalise `text` into the letter sequence Playfair actually enciphers:
/// merged letter folded, odd length padded and every aligned double pair
/// split with the pad letter.
pub fn prepare(text: &str, options: &PlayfairOptions) -> Result<String> {
    let pad = pad_letter(options)?;
    let pairs = digraphs(text, &options.merge, pad)?;
    Ok(pairs.into_iter().flatten().collect())
}

pub fn encode(text: &str, square: &KeySquare, options: &PlayfairOptions) -> Result<String> {
    let pad = check_options(square, options)?;
    let pairs = digraphs(text, &options.merge, pad)?;
    trace!("playfair: enciphering {} digraphs", pairs.len());

    let mut out = String::with_capacity(pairs.len() * 2);
    for (i, [a, b]) in pairs.into_iter().enumerate() {
        let first = square.coords(a).ok_or(CipherError::UnsupportedCharacter {
            symbol: a,
            position: 2 * i,
        })?;
        let second = square.coords(b).ok_or(CipherError::UnsupportedCharacter {
            symbol: b,
            position: 2 * i + 1,
        })?;
        let (a, b) = substitute(square, first, second, 1);
        out.push(a);
        out.push(b);
    }
    Ok(out)
}

/// Decipher `text`. Letters the decoder cannot pin down are written as
/// bracketed alternatives: `(I/J)` for the merge target, `(X/E)` for a pad
/// letter that may have split a double `EE`, and `(X/G/_)` when the last pad
/// may also be trailing padding.
pub fn decode(text: &str, square: &KeySquare, options: &PlayfairOptions) -> Result<String> {
    let pad = check_options(square, options)?;
    let letters = normalize(text);
    if letters.len() % 2 != 0 {
        return Err(CipherError::MalformedInput(
            "playfair ciphertext must hold an even number of letters",
        ));
    }
    let coords = square.locate(&letters)?;
    let last = coords.len() / 2;
    trace!("playfair: deciphering {last} digraphs");

    let mut out = String::with_capacity(letters.len() * 2);
    for (i, pair) in coords.chunks_exact(2).enumerate() {
        let (a, b) = substitute(square, pair[0], pair[1], SIDE - 1);
        options.merge.annotate(a, &mut out);
        if b == pad {
            out.push('(');
            out.push(pad);
            out.push('/');
            out.push(a);
            if i + 1 == last {
                out.push_str("/_");
            }
            out.push(')');
        } else {
            options.merge.annotate(b, &mut out);
        }
    }
    Ok(out)
}

fn pad_letter(options: &PlayfairOptions) -> Result<char> {
    let pad = match upper(options.pad) {
        Some(pad) if !pad.is_whitespace() => pad,
        _ => {
            return Err(CipherError::MalformedInput(
                "pad letter must be a single non-blank symbol",
            ))
        }
    };
    // Decoded merge targets are annotated and decoded pads are not.
    if pad == options.merge.to {
        return Err(CipherError::MalformedInput(
            "pad letter must differ from the merge target",
        ));
    }
    Ok(pad)
}

fn check_options(square: &KeySquare, options: &PlayfairOptions) -> Result<char> {
    square.check_merge(&options.merge)?;
    let pad = pad_letter(options)?;
    if !square.contains(pad) {
        return Err(CipherError::MalformedInput(
            "pad letter must appear in the key square",
        ));
    }
    Ok(pad)
}

fn digraphs(text: &str, merge: &Merge, pad: char) -> Result<Vec<[char; 2]>> {
    let mut letters: Vec<char> = normalize(text).into_iter().map(|c| merge.apply(c)).collect();
    if letters.len() % 2 == 1 {
        letters.push(pad);
    }
    letters
        .chunks_exact(2)
        .enumerate()
        .map(|(i, pair)| match (pair[0], pair[1]) {
            (a, b) if a != b => Ok([a, b]),
            (a, _) if a == pad => Err(CipherError::AmbiguousEncoding {
                position: 2 * i,
                detail: "text holds a doubled pad letter; choose another pad letter",
            }),
            (a, _) => Ok([a, pad]),
        })
        .collect()
}

/// Apply the Playfair rules to one digraph. `shift` is 1 to encipher and
/// `SIDE - 1` to decipher.
fn substitute(
    square: &KeySquare,
    (r1, c1): (usize, usize),
    (r2, c2): (usize, usize),
    shift: usize,
) -> (char, char) {
    if r1 == r2 {
        (square.at(r1, c1 + shift), square.at(r2, c2 + shift))
    } else if c1 == c2 {
        (square.at(r1 + shift, c1), square.at(r2 + shift, c2))
    } else {
        (square.at(r1, c2), square.at(r2, c1))
    }
}
