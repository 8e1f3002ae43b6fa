// Fixed-capacity output buffer with a write cursor for segment-wise assembly.
use bytes::Bytes;

use crate::core::error::{Error, ErrorKind};

/// Single-allocation builder: the final length is known before any byte is written.
#[derive(Debug)]
pub struct MergeBuffer {
    buf: Vec<u8>,
    cursor: usize,
}

impl MergeBuffer {
    pub fn with_len(len: usize) -> Self {
        Self {
            buf: vec![0u8; len],
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn written(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.len() - self.cursor
    }

    pub fn append(&mut self, segment: &[u8]) -> Result<(), Error> {
        if segment.len() > self.remaining() {
            return Err(Error::new(ErrorKind::Internal).with_message(format!(
                "segment of {} bytes overruns buffer ({} of {} bytes written)",
                segment.len(),
                self.cursor,
                self.len()
            )));
        }
        let end = self.cursor + segment.len();
        self.buf[self.cursor..end].copy_from_slice(segment);
        self.cursor = end;
        Ok(())
    }

    pub fn finish(self) -> Result<Bytes, Error> {
        if self.remaining() != 0 {
            return Err(Error::new(ErrorKind::Internal).with_message(format!(
                "buffer sealed with {} of {} bytes written",
                self.cursor,
                self.len()
            )));
        }
        Ok(Bytes::from(self.buf))
    }
}
