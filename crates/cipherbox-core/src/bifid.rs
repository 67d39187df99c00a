use log::trace;

use crate::alphabet::{is_latin_letter, normalize};
use crate::error::{CipherError, Result};
use crate::square::{KeySquare, Merge};

/// Encipher `text` with the Bifid cipher.
///
/// Each block of `period` letters is written as its row coordinates followed
/// by its column coordinates; consecutive coordinate pairs of that stream are
/// read back through the square.
pub fn encode(text: &str, square: &KeySquare, period: usize, merge: &Merge) -> Result<String> {
    check(square, period, merge)?;
    let letters = normalize(text);
    if let Some((position, &symbol)) = letters
        .iter()
        .enumerate()
        .find(|(_, c)| !is_latin_letter(**c))
    {
        return Err(CipherError::UnsupportedCharacter { symbol, position });
    }
    let letters: Vec<char> = letters.into_iter().map(|c| merge.apply(c)).collect();
    let coords = square.locate(&letters)?;
    trace!("bifid: enciphering {} letters, period {period}", coords.len());

    let mut out = String::with_capacity(coords.len());
    for block in coords.chunks(period) {
        let stream: Vec<usize> = block
            .iter()
            .map(|&(row, _)| row)
            .chain(block.iter().map(|&(_, col)| col))
            .collect();
        out.extend(stream.chunks_exact(2).map(|rc| square.at(rc[0], rc[1])));
    }
    Ok(out)
}

/// Decipher `text`, writing every occurrence of the merge target as
/// `(TO/FROM)` since the plaintext may have held either letter.
pub fn decode(text: &str, square: &KeySquare, period: usize, merge: &Merge) -> Result<String> {
    check(square, period, merge)?;
    let coords = square.locate(&normalize(text))?;
    trace!("bifid: deciphering {} letters, period {period}", coords.len());

    let mut out = String::with_capacity(coords.len());
    for block in coords.chunks(period) {
        let stream: Vec<usize> = block.iter().flat_map(|&(row, col)| [row, col]).collect();
        let (rows, cols) = stream.split_at(block.len());
        for (&row, &col) in rows.iter().zip(cols) {
            merge.annotate(square.at(row, col), &mut out);
        }
    }
    Ok(out)
}

fn check(square: &KeySquare, period: usize, merge: &Merge) -> Result<()> {
    if period == 0 {
        return Err(CipherError::MalformedInput("bifid period must be positive"));
    }
    square.check_merge(merge)
}
