//! Purpose: Map typed words to the ordered per-letter DST resources they need.
//! Exports: `Letter`, `LETTER_FILES`, `parse_word`, `output_file_name`.
//! Role: Static resource locator shared by the CLI, the server, and fetchers.
//! Invariants: The letter table is fixed at compile time; only `A..=Z` resolve.
//! Invariants: Word filtering keeps order and duplicates; it never reorders letters.
use std::fmt;

use serde::Serialize;

use crate::core::error::{Error, ErrorKind};
use crate::core::format::FILE_EXTENSION;

pub const LETTER_DIR: &str = "letters";

pub const LETTER_FILES: [&str; 26] = [
    "A.dst", "B.dst", "C.dst", "D.dst", "E.dst", "F.dst", "G.dst", "H.dst", "I.dst", "J.dst",
    "K.dst", "L.dst", "M.dst", "N.dst", "O.dst", "P.dst", "Q.dst", "R.dst", "S.dst", "T.dst",
    "U.dst", "V.dst", "W.dst", "X.dst", "Y.dst", "Z.dst",
];

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(into = "char")]
pub struct Letter(u8);

impl Letter {
    /// Accepts only ASCII uppercase `A..=Z`.
    pub fn from_char(ch: char) -> Option<Self> {
        if ch.is_ascii_uppercase() {
            Some(Self(ch as u8))
        } else {
            None
        }
    }

    pub fn all() -> impl Iterator<Item = Letter> {
        (b'A'..=b'Z').map(Letter)
    }

    pub fn as_char(self) -> char {
        self.0 as char
    }

    pub fn file_name(self) -> &'static str {
        LETTER_FILES[usize::from(self.0 - b'A')]
    }

    /// Relative resource identifier, e.g. `letters/A.dst`.
    pub fn resource_path(self) -> String {
        format!("{LETTER_DIR}/{}", self.file_name())
    }
}

impl From<Letter> for char {
    fn from(letter: Letter) -> Self {
        letter.as_char()
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

pub fn parse_word(word: &str) -> Result<Vec<Letter>, Error> {
    let letters: Vec<Letter> = word
        .trim()
        .chars()
        .flat_map(char::to_uppercase)
        .filter_map(Letter::from_char)
        .collect();
    if letters.is_empty() {
        return Err(Error::new(ErrorKind::InvalidInput)
            .with_message("enter at least one valid letter (A-Z)")
            .with_hint("Letters are case-insensitive; digits and punctuation are ignored."));
    }
    Ok(letters)
}

pub fn letters_string(letters: &[Letter]) -> String {
    letters.iter().map(|letter| letter.as_char()).collect()
}

pub fn output_file_name(letters: &[Letter]) -> String {
    format!("{}.{FILE_EXTENSION}", letters_string(letters))
}
