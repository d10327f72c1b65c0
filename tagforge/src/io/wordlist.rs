//! Line-oriented wordlist files.

use std::fs;
use std::io;
use std::path::Path;

/// Read a wordlist: one entry per line, trimmed, blank lines dropped.
pub fn read_wordlist(path: &Path) -> io::Result<Vec<String>> {
    let contents = fs::read_to_string(path)?;
    Ok(parse_wordlist(&contents))
}

pub fn parse_wordlist(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
