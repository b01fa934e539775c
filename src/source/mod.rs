//! Transcript input sources.
//!
//! A transcript is JSONL: one [`ReplayRecord`] per line. It is read from a
//! file or from piped stdin and replayed on a worker thread.

use crate::model::error::InputError;
use std::fs::File;
use std::io::{BufRead, BufReader, IsTerminal};
use std::path::PathBuf;

pub mod replay;

pub use replay::{parse_record, spawn_replay, ReplayHandle, ReplayRecord};

/// Where transcript lines come from.
///
/// Sum type enforces exactly one variant.
#[derive(Debug)]
pub enum InputSource {
    /// A transcript file.
    File(PathBuf),
    /// Piped stdin.
    Stdin,
}

impl InputSource {
    /// Open the source as a buffered reader that can move to a worker thread.
    ///
    /// # Errors
    ///
    /// `InputError::FileNotFound` if the file is missing, `InputError::Io`
    /// if it cannot be opened.
    pub fn open(self) -> Result<Box<dyn BufRead + Send>, InputError> {
        match self {
            InputSource::File(path) => {
                if !path.exists() {
                    return Err(InputError::FileNotFound { path });
                }
                Ok(Box::new(BufReader::new(File::open(path)?)))
            }
            InputSource::Stdin => Ok(Box::new(BufReader::new(std::io::stdin()))),
        }
    }
}

/// Detect the input source.
///
/// # Logic:
/// 1. If file path is provided: read the file
/// 2. If stdin is piped: read stdin
/// 3. Else: return InputError::NoInput
///
/// # Errors
///
/// Returns `InputError::NoInput` if no file is provided and stdin is an
/// interactive terminal.
pub fn detect_input_source(file: Option<PathBuf>) -> Result<InputSource, InputError> {
    match file {
        Some(path) => Ok(InputSource::File(path)),
        None if std::io::stdin().is_terminal() => Err(InputError::NoInput),
        None => Ok(InputSource::Stdin),
    }
}
