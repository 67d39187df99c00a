//! Classical cipher primitives for the cipherbox toolchain.
//!
//! The crate groups the ciphers by the structure their keys share:
//!
//! * [`playfair`], [`bifid`] and [`trifid`]: grid ciphers keyed by a 5×5
//!   [`square::KeySquare`] or a 3×3×3 [`trifid::KeyCube`].
//! * [`hill`]: block substitution with an invertible matrix over any
//!   [`Alphabet`].
//! * [`checkerboard`]: the straddling checkerboard with non-carrying key
//!   number addition.
//! * [`keygen`]: random key material for each of the above.
//!
//! Every operation is a pure function of its inputs and returns a
//! [`CipherError`] instead of panicking on malformed text or keys.

pub mod alphabet;
pub mod bifid;
pub mod checkerboard;
pub mod hill;
pub mod keygen;
pub mod playfair;
pub mod square;
pub mod trifid;

mod error;

use serde::{Deserialize, Serialize};

pub use alphabet::{normalize, Alphabet};
pub use checkerboard::{CheckerboardKey, CheckerboardOptions, SparePositions};
pub use error::{CipherError, Result};
pub use hill::KeyMatrix;
pub use playfair::PlayfairOptions;
pub use square::{KeySquare, Merge};
pub use trifid::KeyCube;

/// Direction of a cipher transformation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Encipher,
    Decipher,
}
