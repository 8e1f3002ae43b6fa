//! Purpose: Retrieve per-letter DST buffers concurrently ahead of a merge.
//! Exports: `LetterSource`, `fetch_all`, `MAX_SOURCE_BYTES`.
//! Role: I/O-bound gather phase; the pure merge only starts once this returns.
//! Invariants: One retrieval task per distinct letter; results come back in request order.
//! Invariants: The first failed retrieval aborts the remaining tasks and the whole request.
use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::core::error::{Error, ErrorKind};
use crate::letters::Letter;

/// Upper bound on a single letter file; real DST letters are a few KiB.
pub const MAX_SOURCE_BYTES: u64 = 16 * 1024 * 1024;

/// Blocking retrieval of one letter's raw DST buffer.
///
/// Implementations report missing letters as `ErrorKind::ResourceUnavailable`
/// tagged with the letter.
pub trait LetterSource: Send + Sync {
    fn describe(&self) -> String;

    fn fetch(&self, letter: Letter) -> Result<Bytes, Error>;
}

pub async fn fetch_all(
    source: Arc<dyn LetterSource>,
    letters: &[Letter],
) -> Result<Vec<Bytes>, Error> {
    let mut distinct = letters.to_vec();
    distinct.sort_unstable();
    distinct.dedup();

    debug!(
        source = %source.describe(),
        letters = letters.len(),
        distinct = distinct.len(),
        "fetching letter sources"
    );

    let mut tasks = JoinSet::new();
    for letter in distinct {
        let source = Arc::clone(&source);
        tasks.spawn_blocking(move || (letter, source.fetch(letter)));
    }

    let mut fetched: HashMap<Letter, Bytes> = HashMap::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        let (letter, result) = joined.map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("letter fetch task failed")
                .with_source(err)
        })?;
        match result {
            Ok(bytes) => {
                debug!(%letter, bytes = bytes.len(), "fetched letter");
                fetched.insert(letter, bytes);
            }
            Err(err) => {
                warn!(%letter, error = %err, "letter fetch failed; aborting request");
                tasks.abort_all();
                return Err(err);
            }
        }
    }

    letters
        .iter()
        .map(|letter| {
            fetched.get(letter).cloned().ok_or_else(|| {
                Error::new(ErrorKind::Internal)
                    .with_message("fetched letter missing from results")
                    .with_letter(letter.as_char())
            })
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{LetterSource, fetch_all};
    use crate::core::error::{Error, ErrorKind};
    use crate::letters::{Letter, parse_word};
    use bytes::Bytes;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory source keyed by letter; counts fetch calls.
    pub(crate) struct MapSource {
        pub(crate) files: HashMap<Letter, Bytes>,
        pub(crate) calls: AtomicUsize,
    }

    impl MapSource {
        pub(crate) fn new(files: impl IntoIterator<Item = (char, Vec<u8>)>) -> Self {
            let files = files
                .into_iter()
                .filter_map(|(ch, raw)| {
                    Letter::from_char(ch).map(|letter| (letter, Bytes::from(raw)))
                })
                .collect();
            Self {
                files,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl LetterSource for MapSource {
        fn describe(&self) -> String {
            "memory".to_string()
        }

        fn fetch(&self, letter: Letter) -> Result<Bytes, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.files.get(&letter).cloned().ok_or_else(|| {
                Error::new(ErrorKind::ResourceUnavailable)
                    .with_message(format!("file not found: {}", letter.file_name()))
                    .with_letter(letter.as_char())
            })
        }
    }

    #[tokio::test]
    async fn results_follow_request_order() {
        let source = Arc::new(MapSource::new([
            ('A', vec![1]),
            ('B', vec![2]),
            ('C', vec![3]),
        ]));
        let letters = parse_word("cab").expect("letters");
        let buffers = fetch_all(source, &letters).await.expect("fetch");
        let firsts: Vec<u8> = buffers.iter().map(|buf| buf[0]).collect();
        assert_eq!(firsts, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn repeated_letters_are_fetched_once() {
        let source = Arc::new(MapSource::new([('L', vec![7]), ('O', vec![8])]));
        let letters = parse_word("LOLL").expect("letters");
        let buffers = fetch_all(source.clone(), &letters).await.expect("fetch");
        assert_eq!(buffers.len(), 4);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(buffers[2], buffers[3]);
    }

    #[tokio::test]
    async fn missing_letter_fails_the_whole_gather() {
        let source = Arc::new(MapSource::new([('A', vec![1])]));
        let letters = parse_word("AZ").expect("letters");
        let err = fetch_all(source, &letters).await.expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::ResourceUnavailable);
        assert_eq!(err.letter(), Some('Z'));
    }
}
