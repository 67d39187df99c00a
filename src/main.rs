//! cipherbox: command-line driver for the classical ciphers in
//! `cipherbox-core`.

mod keyfile;

use std::path::{Path, PathBuf};

use cipherbox_core::{
    bifid,
    checkerboard::{self, Output},
    hill, keygen, playfair, trifid, Alphabet, CheckerboardKey, CheckerboardOptions, CipherError,
    KeyCube, KeyMatrix, KeySquare, Merge, PlayfairOptions, SparePositions,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{debug, info, LevelFilter};
use rand::{rngs::StdRng, SeedableRng};

use keyfile::{parse_matrix, KeyFile, KeyFileError};

/// Classical ciphers: Playfair, Bifid, Trifid, Hill and the straddling
/// checkerboard
#[derive(Parser)]
#[command(name = "cipherbox")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log key construction details (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate random key material
    Keygen(KeygenArgs),

    /// Playfair digraph substitution over a 5x5 square
    Playfair {
        #[command(flatten)]
        common: CommonArgs,

        /// Key square written row by row (25 letters)
        #[arg(long, required_unless_present = "key_file")]
        key: Option<String>,

        #[command(flatten)]
        merge: MergeArgs,

        /// Letter that splits doubled pairs and pads odd-length text
        #[arg(long, default_value_t = 'X')]
        pad: char,
    },

    /// Bifid fractionation over a 5x5 square
    Bifid {
        #[command(flatten)]
        common: CommonArgs,

        /// Key square written row by row (25 letters)
        #[arg(long, required_unless_present = "key_file")]
        key: Option<String>,

        #[command(flatten)]
        merge: MergeArgs,

        /// Block length
        #[arg(long, default_value_t = 5)]
        period: usize,
    },

    /// Trifid fractionation over a 3x3x3 cube
    Trifid {
        #[command(flatten)]
        common: CommonArgs,

        /// Key cube: 26 Latin letters and one filler symbol
        #[arg(long, required_unless_present = "key_file")]
        key: Option<String>,

        /// Block length
        #[arg(long, default_value_t = 5)]
        period: usize,
    },

    /// Hill block substitution with an invertible matrix
    Hill {
        #[command(flatten)]
        common: CommonArgs,

        /// Key matrix, rows separated by ';' and entries by ','
        #[arg(long, required_unless_present = "key_file")]
        matrix: Option<String>,

        /// Alphabet: "latin", "polish" or the symbols themselves (key files
        /// carry their own)
        #[arg(long, default_value = "latin", conflicts_with = "key_file")]
        alphabet: String,

        /// Symbol appended to fill the last block
        #[arg(long, default_value_t = 'X')]
        pad: char,
    },

    /// Straddling checkerboard with key number addition
    Checkerboard {
        #[command(flatten)]
        common: CommonArgs,

        /// Permutation of the 26 Latin letters
        #[arg(long, required_unless_present = "key_file")]
        key: Option<String>,

        /// Added digit-wise without carry
        #[arg(long, default_value_t = 0)]
        key_number: u64,

        /// The two blank top-row positions
        #[arg(long, num_args = 2, value_names = ["FIRST", "SECOND"], default_values_t = [3u8, 7])]
        spare: Vec<u8>,

        /// Emit the digit stream instead of letters (always digits when the
        /// key number is 0)
        #[arg(long)]
        digits: bool,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Decipher instead of encipher
    #[arg(short, long)]
    decode: bool,

    /// JSON key file written by `cipherbox keygen --out`
    #[arg(long)]
    key_file: Option<PathBuf>,

    /// Message text
    text: String,
}

#[derive(Args)]
struct MergeArgs {
    /// Letter left out of the square
    #[arg(long, default_value_t = 'J')]
    merge_from: char,

    /// Letter that stands in for the left-out one
    #[arg(long, default_value_t = 'I')]
    merge_to: char,
}

#[derive(Args)]
struct KeygenArgs {
    #[arg(value_enum)]
    cipher: Cipher,

    /// Seed for a reproducible key (OS entropy otherwise)
    #[arg(long)]
    seed: Option<u64>,

    /// Write the key as JSON to this path
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Playfair keyword placed at the start of the square
    #[arg(long, default_value = "")]
    keyword: String,

    /// Letter left out of a Playfair or Bifid square
    #[arg(long, default_value_t = 'J')]
    removed: char,

    /// Trifid filler symbol
    #[arg(long, default_value_t = '.')]
    filler: char,

    /// Hill matrix size
    #[arg(long, default_value_t = 3)]
    size: usize,

    /// Hill alphabet: "latin", "polish" or the symbols themselves
    #[arg(long, default_value = "latin")]
    alphabet: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum Cipher {
    Playfair,
    Bifid,
    Trifid,
    Hill,
    Checkerboard,
}

enum Failure {
    Cipher(CipherError),
    Key(KeyFileError),
    Usage(String),
}

impl From<CipherError> for Failure {
    fn from(err: CipherError) -> Self {
        Failure::Cipher(err)
    }
}

impl From<KeyFileError> for Failure {
    fn from(err: KeyFileError) -> Self {
        Failure::Key(err)
    }
}

fn alphabet_arg(name: &str) -> Result<Alphabet, CipherError> {
    match name.to_ascii_lowercase().as_str() {
        "latin" => Ok(Alphabet::latin()),
        "polish" => Ok(Alphabet::polish()),
        _ => Alphabet::new(name),
    }
}

fn key_square(
    inline: Option<&str>,
    file: Option<&Path>,
    cipher: &'static str,
) -> Result<KeySquare, Failure> {
    match (inline, file) {
        (Some(key), _) => Ok(KeySquare::new(key)?),
        (None, Some(path)) => match KeyFile::load(path)? {
            KeyFile::Playfair { square } | KeyFile::Bifid { square } => Ok(square),
            other => Err(other.wrong_cipher(cipher).into()),
        },
        (None, None) => Err(Failure::Usage("missing --key or --key-file".into())),
    }
}

fn key_cube(inline: Option<&str>, file: Option<&Path>) -> Result<KeyCube, Failure> {
    match (inline, file) {
        (Some(key), _) => Ok(KeyCube::new(key)?),
        (None, Some(path)) => match KeyFile::load(path)? {
            KeyFile::Trifid { cube } => Ok(cube),
            other => Err(other.wrong_cipher("trifid").into()),
        },
        (None, None) => Err(Failure::Usage("missing --key or --key-file".into())),
    }
}

fn hill_key(
    inline: Option<&str>,
    file: Option<&Path>,
    alphabet: &str,
) -> Result<(Alphabet, KeyMatrix), Failure> {
    match (inline, file) {
        (Some(matrix), _) => {
            let rows = parse_matrix(matrix).map_err(Failure::Usage)?;
            Ok((alphabet_arg(alphabet)?, KeyMatrix::new(rows)?))
        }
        (None, Some(path)) => match KeyFile::load(path)? {
            KeyFile::Hill { alphabet, matrix } => Ok((alphabet, matrix)),
            other => Err(other.wrong_cipher("hill").into()),
        },
        (None, None) => Err(Failure::Usage("missing --matrix or --key-file".into())),
    }
}

fn checkerboard_key(inline: Option<&str>, file: Option<&Path>) -> Result<CheckerboardKey, Failure> {
    match (inline, file) {
        (Some(key), _) => Ok(CheckerboardKey::new(key)?),
        (None, Some(path)) => match KeyFile::load(path)? {
            KeyFile::Checkerboard { key } => Ok(key),
            other => Err(other.wrong_cipher("checkerboard").into()),
        },
        (None, None) => Err(Failure::Usage("missing --key or --key-file".into())),
    }
}

//==================== keygen ====================//

fn keygen_cmd(args: &KeygenArgs) -> Result<String, Failure> {
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let key = match args.cipher {
        Cipher::Playfair => KeyFile::Playfair {
            square: keygen::playfair_key_square(&args.keyword, args.removed, &mut rng)?,
        },
        Cipher::Bifid => KeyFile::Bifid {
            square: keygen::bifid_key_square(args.removed, &mut rng)?,
        },
        Cipher::Trifid => KeyFile::Trifid {
            cube: keygen::trifid_key_cube(args.filler, &mut rng)?,
        },
        Cipher::Hill => {
            let alphabet = alphabet_arg(&args.alphabet)?;
            let matrix = keygen::hill_matrix(args.size, &alphabet, &mut rng)?;
            KeyFile::Hill { alphabet, matrix }
        }
        Cipher::Checkerboard => KeyFile::Checkerboard {
            key: keygen::checkerboard_key(&mut rng)?,
        },
    };
    if let Some(path) = &args.out {
        key.store(path)?;
        info!("wrote {} key to {}", key.cipher(), path.display());
    }
    Ok(key.display_key())
}

//==================== ciphers ====================//

fn run(command: &Commands) -> Result<String, Failure> {
    match command {
        Commands::Keygen(args) => keygen_cmd(args),
        Commands::Playfair {
            common,
            key,
            merge,
            pad,
        } => {
            let square = key_square(key.as_deref(), common.key_file.as_deref(), "playfair")?;
            let options = PlayfairOptions {
                merge: Merge::new(merge.merge_from, merge.merge_to)?,
                pad: *pad,
            };
            Ok(if common.decode {
                playfair::decode(&common.text, &square, &options)?
            } else {
                playfair::encode(&common.text, &square, &options)?
            })
        }
        Commands::Bifid {
            common,
            key,
            merge,
            period,
        } => {
            let square = key_square(key.as_deref(), common.key_file.as_deref(), "bifid")?;
            let merge = Merge::new(merge.merge_from, merge.merge_to)?;
            Ok(if common.decode {
                bifid::decode(&common.text, &square, *period, &merge)?
            } else {
                bifid::encode(&common.text, &square, *period, &merge)?
            })
        }
        Commands::Trifid {
            common,
            key,
            period,
        } => {
            let cube = key_cube(key.as_deref(), common.key_file.as_deref())?;
            Ok(if common.decode {
                trifid::decode(&common.text, &cube, *period)?
            } else {
                trifid::encode(&common.text, &cube, *period)?
            })
        }
        Commands::Hill {
            common,
            matrix,
            alphabet,
            pad,
        } => {
            let (alphabet, matrix) =
                hill_key(matrix.as_deref(), common.key_file.as_deref(), alphabet)?;
            Ok(if common.decode {
                hill::decode(&common.text, &alphabet, &matrix, *pad)?
            } else {
                hill::encode(&common.text, &alphabet, &matrix, *pad)?
            })
        }
        Commands::Checkerboard {
            common,
            key,
            key_number,
            spare,
            digits,
        } => {
            let key = checkerboard_key(key.as_deref(), common.key_file.as_deref())?;
            let spare = match spare.as_slice() {
                [first, second] => SparePositions::new(*first, *second)?,
                _ => return Err(Failure::Usage("--spare takes exactly two digits".into())),
            };
            if common.decode {
                Ok(checkerboard::decode(&common.text, &key, *key_number, spare)?)
            } else {
                let options = CheckerboardOptions {
                    key_number: *key_number,
                    spare,
                    output: if *digits { Output::Digits } else { Output::Letters },
                };
                Ok(checkerboard::encode(&common.text, &key, &options)?)
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let default_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();
    debug!("cipherbox {}", env!("CARGO_PKG_VERSION"));

    match run(&cli.command) {
        Ok(out) => println!("{out}"),
        Err(Failure::Cipher(err)) => {
            eprintln!("error: {err}");
            std::process::exit(2);
        }
        Err(Failure::Key(err @ KeyFileError::Io(_))) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
        Err(Failure::Key(err)) => {
            eprintln!("error: {err}");
            std::process::exit(2);
        }
        Err(Failure::Usage(msg)) => {
            eprintln!("error: {msg}");
            std::process::exit(2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn hill_alphabet_conflicts_with_key_file() {
        let err = Cli::try_parse_from([
            "cipherbox",
            "hill",
            "--key-file",
            "hill.json",
            "--alphabet",
            "polish",
            "TEXT",
        ])
        .err()
        .expect("conflict");
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);

        let plain = Cli::try_parse_from(["cipherbox", "hill", "--key-file", "hill.json", "TEXT"]);
        assert!(plain.is_ok());
        assert!(Cli::try_parse_from([
            "cipherbox",
            "hill",
            "--matrix",
            "1,3;3,4",
            "--alphabet",
            "polish",
            "TEXT",
        ])
        .is_ok());
    }
}
