//! Purpose: Define the public Rust API for turning a word into one merged DST file.
//! Exports: Core merge operations, letter sources, and `compose_word`.
//! Role: Boundary used by the CLI and the HTTP server; hides fetch/merge sequencing.
//! Invariants: Input filtering fails before any retrieval is attempted.
//! Invariants: Merging starts only after every letter buffer has been retrieved.

mod client;
mod remote;
mod source;

use std::sync::Arc;

use bytes::Bytes;
use tracing::info;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::merge::{InputSummary, MergeOutcome, MergeReport, merge, merge_with_report};
pub use crate::letters::{Letter, letters_string, output_file_name, parse_word};
pub use client::DirSource;
pub use remote::HttpSource;
pub use source::{LetterSource, MAX_SOURCE_BYTES, fetch_all};

#[derive(Clone, Debug)]
pub struct ComposedWord {
    /// The word as typed, before filtering.
    pub word: String,
    pub letters: Vec<Letter>,
    pub file_name: String,
    pub bytes: Bytes,
    pub report: MergeReport,
}

pub async fn compose_word(
    word: &str,
    source: Arc<dyn LetterSource>,
) -> Result<ComposedWord, Error> {
    let letters = parse_word(word)?;
    let buffers = fetch_all(source, &letters).await?;
    let outcome = merge_with_report(&buffers)?;
    let file_name = output_file_name(&letters);
    info!(
        word = %word,
        letters = %letters_string(&letters),
        bytes = outcome.bytes.len(),
        "composed word"
    );
    Ok(ComposedWord {
        word: word.to_string(),
        letters,
        file_name,
        bytes: outcome.bytes,
        report: outcome.report,
    })
}
