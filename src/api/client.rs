//! Purpose: Read per-letter DST files from a local directory.
//! Exports: `DirSource`.
//! Role: Default `LetterSource` for the CLI and server; mirrors `letter_paths` rules.
//! Invariants: A missing or unreadable letter file is `ResourceUnavailable` for that letter.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;

use super::source::{LetterSource, MAX_SOURCE_BYTES};
use crate::core::error::{Error, ErrorKind};
use crate::letter_paths::{default_letters_dir, resolve_letter_path};
use crate::letters::Letter;

#[derive(Clone, Debug)]
pub struct DirSource {
    letters_dir: PathBuf,
    max_bytes: u64,
}

impl DirSource {
    pub fn new() -> Self {
        Self {
            letters_dir: default_letters_dir(),
            max_bytes: MAX_SOURCE_BYTES,
        }
    }

    pub fn with_letters_dir(mut self, letters_dir: impl Into<PathBuf>) -> Self {
        self.letters_dir = letters_dir.into();
        self
    }

    /// Caps a single letter file; larger files are refused before reading.
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn letters_dir(&self) -> &Path {
        &self.letters_dir
    }
}

impl Default for DirSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LetterSource for DirSource {
    fn describe(&self) -> String {
        self.letters_dir().display().to_string()
    }

    fn fetch(&self, letter: Letter) -> Result<Bytes, Error> {
        let path = resolve_letter_path(letter, self.letters_dir());
        let unavailable = |message: String| {
            Error::new(ErrorKind::ResourceUnavailable)
                .with_message(message)
                .with_letter(letter.as_char())
                .with_path(&path)
        };

        let metadata = fs::metadata(&path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => unavailable(format!("file not found: {}", letter.file_name()))
                .with_hint("Check --letters-dir or DSTMERGE_LETTERS_DIR."),
            _ => unavailable(format!("failed to stat {}", letter.file_name())).with_source(err),
        })?;
        if !metadata.is_file() {
            return Err(unavailable(format!("not a file: {}", letter.file_name())));
        }
        if metadata.len() > self.max_bytes {
            return Err(unavailable(format!(
                "{} exceeds {} bytes",
                letter.file_name(),
                self.max_bytes
            )));
        }

        let raw = fs::read(&path).map_err(|err| {
            unavailable(format!("failed to read {}", letter.file_name())).with_source(err)
        })?;
        Ok(Bytes::from(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::DirSource;
    use crate::api::source::LetterSource;
    use crate::core::error::ErrorKind;
    use crate::letters::Letter;

    #[test]
    fn reads_letter_file_from_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(temp.path().join("A.dst"), [1u8, 2, 3]).expect("write");
        let source = DirSource::new().with_letters_dir(temp.path());
        let bytes = source.fetch(Letter::from_char('A').expect("A")).expect("fetch");
        assert_eq!(bytes.as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn missing_letter_is_resource_unavailable() {
        let temp = tempfile::tempdir().expect("tempdir");
        let source = DirSource::new().with_letters_dir(temp.path());
        let err = source
            .fetch(Letter::from_char('X').expect("X"))
            .expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::ResourceUnavailable);
        assert_eq!(err.letter(), Some('X'));
        assert_eq!(err.path(), Some(temp.path().join("X.dst").as_path()));
        assert_eq!(err.message(), Some("file not found: X.dst"));
    }

    #[test]
    fn oversize_letter_file_is_refused() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(temp.path().join("W.dst"), [0u8; 64]).expect("write");
        let source = DirSource::new()
            .with_letters_dir(temp.path())
            .with_max_bytes(16);
        let err = source
            .fetch(Letter::from_char('W').expect("W"))
            .expect_err("oversize");
        assert_eq!(err.kind(), ErrorKind::ResourceUnavailable);
        assert_eq!(err.letter(), Some('W'));
        assert_eq!(err.message(), Some("W.dst exceeds 16 bytes"));

        let source = source.with_max_bytes(64);
        let bytes = source
            .fetch(Letter::from_char('W').expect("W"))
            .expect("at cap");
        assert_eq!(bytes.len(), 64);
    }

    #[test]
    fn describe_names_the_letters_dir() {
        let temp = tempfile::tempdir().expect("tempdir");
        let source = DirSource::new().with_letters_dir(temp.path());
        assert_eq!(source.letters_dir(), temp.path());
        assert_eq!(source.describe(), temp.path().display().to_string());
    }

    #[test]
    fn directory_in_place_of_file_is_unavailable() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(temp.path().join("B.dst")).expect("mkdir");
        let source = DirSource::new().with_letters_dir(temp.path());
        let err = source
            .fetch(Letter::from_char('B').expect("B"))
            .expect_err("dir");
        assert_eq!(err.kind(), ErrorKind::ResourceUnavailable);
    }
}
