//! Filesystem helpers: content hashes and portable file names

use md5::{Digest, Md5};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

const HASH_BLOCK_SIZE: usize = 64 * 1024;

// Letters, digits and underscore; combining marks left by NFKD are dropped
static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}_\s-]").expect("valid unsafe-char regex"));

static SEPARATOR_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-\s]+").expect("valid separator regex"));

/// Lowercase hex MD5 of a byte slice
pub fn md5_bytes(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Lowercase hex MD5 of a file, read in 64 KiB blocks
pub fn md5_hex(path: &Path) -> io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Md5::new();
    let mut block = vec![0u8; HASH_BLOCK_SIZE];
    loop {
        let n = reader.read(&mut block)?;
        if n == 0 {
            break;
        }
        hasher.update(&block[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Turn an arbitrary string into a portable file name
///
/// Applies NFKD normalisation, drops everything but letters, digits,
/// `_`, whitespace and `-`, trims, and collapses whitespace/dash runs to a
/// single `-`. With `add_hash`, appends `.` and the MD5 of the original
/// string so distinct names never collide after slugging.
pub fn safe_filename(name: &str, add_hash: bool) -> String {
    let normalized: String = name.nfkd().collect();
    let stripped = UNSAFE_CHARS.replace_all(&normalized, "");
    let safe = SEPARATOR_RUNS
        .replace_all(stripped.trim(), "-")
        .into_owned();

    if add_hash {
        format!("{}.{}", safe, md5_bytes(name.as_bytes()))
    } else {
        safe
    }
}
