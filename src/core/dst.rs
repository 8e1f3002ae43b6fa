// Header/stitch splitting and trailing terminator detection for DST buffers.
use crate::core::error::{Error, ErrorKind};
use crate::core::format::{HEADER_LEN, TERMINATOR, TERMINATOR_LEN};

/// Borrowed views into one raw DST buffer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DstParts<'a> {
    pub header: &'a [u8],
    pub stitches: &'a [u8],
}

/// Splits `raw` at the header boundary without copying.
///
/// `index` is the buffer's position in the merge set and is reported on failure.
pub fn split(raw: &[u8], index: usize) -> Result<DstParts<'_>, Error> {
    if raw.len() < HEADER_LEN {
        return Err(Error::new(ErrorKind::TruncatedHeader)
            .with_message(format!(
                "buffer is {} bytes, shorter than the {HEADER_LEN}-byte header",
                raw.len()
            ))
            .with_index(index));
    }
    let (header, stitches) = raw.split_at(HEADER_LEN);
    Ok(DstParts { header, stitches })
}

pub fn has_terminator(stitches: &[u8]) -> bool {
    stitches.ends_with(&TERMINATOR)
}

/// Drops one trailing terminator, if present. Anything else passes through.
pub fn strip_terminator(stitches: &[u8]) -> &[u8] {
    if has_terminator(stitches) {
        &stitches[..stitches.len() - TERMINATOR_LEN]
    } else {
        stitches
    }
}
