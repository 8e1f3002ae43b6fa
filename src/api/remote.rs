//! Purpose: Fetch per-letter DST files over HTTP(S) from a static file host.
//! Exports: `HttpSource`.
//! Role: `LetterSource` for letter sets published next to a web page (`<base>/<L>.dst`).
//! Invariants: Base URL is normalized to a directory (trailing `/`, no query or fragment).
//! Invariants: Non-2xx responses and transport failures are `ResourceUnavailable` for the letter.
use std::io::Read;

use bytes::Bytes;
use url::Url;

use super::source::{LetterSource, MAX_SOURCE_BYTES};
use crate::core::error::{Error, ErrorKind};
use crate::letters::Letter;

type ApiResult<T> = Result<T, Error>;

#[derive(Clone, Debug)]
pub struct HttpSource {
    base_url: Url,
    agent: ureq::Agent,
    max_bytes: u64,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        let agent = ureq::AgentBuilder::new().build();
        Ok(Self {
            base_url,
            agent,
            max_bytes: MAX_SOURCE_BYTES,
        })
    }

    /// Caps a single response body; longer bodies are refused.
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn letter_url(&self, letter: Letter) -> ApiResult<Url> {
        self.base_url().join(letter.file_name()).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to build letter url")
                .with_letter(letter.as_char())
                .with_source(err)
        })
    }
}

impl LetterSource for HttpSource {
    fn describe(&self) -> String {
        self.base_url().to_string()
    }

    fn fetch(&self, letter: Letter) -> Result<Bytes, Error> {
        let url = self.letter_url(letter)?;
        let response = self.agent.get(url.as_str()).call();
        let response = match response {
            Ok(resp) => resp,
            Err(ureq::Error::Status(code, _)) => {
                return Err(Error::new(ErrorKind::ResourceUnavailable)
                    .with_message(format!("file not found: {} (http {code})", letter.file_name()))
                    .with_letter(letter.as_char()));
            }
            Err(ureq::Error::Transport(err)) => {
                return Err(Error::new(ErrorKind::ResourceUnavailable)
                    .with_message(format!("request for {} failed", letter.file_name()))
                    .with_letter(letter.as_char())
                    .with_source(err));
            }
        };

        let mut raw = Vec::new();
        response
            .into_reader()
            .take(self.max_bytes.saturating_add(1))
            .read_to_end(&mut raw)
            .map_err(|err| {
                Error::new(ErrorKind::ResourceUnavailable)
                    .with_message(format!("failed to read {}", letter.file_name()))
                    .with_letter(letter.as_char())
                    .with_source(err)
            })?;
        if raw.len() as u64 > self.max_bytes {
            return Err(Error::new(ErrorKind::ResourceUnavailable)
                .with_message(format!(
                    "{} exceeds {} bytes",
                    letter.file_name(),
                    self.max_bytes
                ))
                .with_letter(letter.as_char()));
        }
        Ok(Bytes::from(raw))
    }
}

fn normalize_base_url(raw: String) -> ApiResult<Url> {
    let mut url = Url::parse(&raw).map_err(|err| {
        Error::new(ErrorKind::InvalidInput)
            .with_message("invalid letters base url")
            .with_source(err)
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(Error::new(ErrorKind::InvalidInput)
            .with_message("letters base url must use http or https scheme"));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}
