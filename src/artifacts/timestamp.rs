//! Reader for the optional preprocessing timestamp file.
//!
//! Plain text, first line only, capped at 25 bytes. A missing, unreadable
//! or empty file yields the sentinel `"n/a"` instead of an error.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::warn;

/// Maximum stored timestamp length in bytes
pub const MAX_TIMESTAMP_LEN: usize = 25;

/// Sentinel stored when no usable timestamp exists
pub const TIMESTAMP_FALLBACK: &str = "n/a";

/// Read the timestamp, falling back to [`TIMESTAMP_FALLBACK`].
pub fn read(path: Option<&Path>) -> String {
    let mut timestamp = String::new();

    if let Some(path) = path {
        match File::open(path) {
            Ok(file) => {
                let mut reader = BufReader::new(file);
                if reader.read_line(&mut timestamp).is_err() {
                    timestamp.clear();
                }
                while timestamp.ends_with('\n') || timestamp.ends_with('\r') {
                    timestamp.pop();
                }
            }
            Err(_) => {
                warn!("timestamp file {} not found", path.display());
            }
        }
    }

    if timestamp.is_empty() {
        timestamp = TIMESTAMP_FALLBACK.to_string();
    }
    if timestamp.len() > MAX_TIMESTAMP_LEN {
        let mut cut = MAX_TIMESTAMP_LEN;
        while !timestamp.is_char_boundary(cut) {
            cut -= 1;
        }
        timestamp.truncate(cut);
    }
    timestamp
}
