//! Purpose: Shared local letter-directory resolution helpers.
//! Exports: `default_letters_dir`, `resolve_letter_path`, `LETTERS_DIR_ENV`.
//! Role: Keep CLI, server, and `DirSource` path semantics aligned from one source.
//! Invariants: Default directory is `$DSTMERGE_LETTERS_DIR`, else `./letters`.
//! Invariants: Letter files are always `<dir>/<L>.dst`.

use std::path::{Path, PathBuf};

use crate::letters::{LETTER_DIR, Letter};

pub const LETTERS_DIR_ENV: &str = "DSTMERGE_LETTERS_DIR";

pub fn default_letters_dir() -> PathBuf {
    match std::env::var_os(LETTERS_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(LETTER_DIR),
    }
}

pub fn resolve_letter_path(letter: Letter, letters_dir: &Path) -> PathBuf {
    letters_dir.join(letter.file_name())
}
