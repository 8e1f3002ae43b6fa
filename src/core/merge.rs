//! Purpose: Combine N raw DST buffers into one file with a single trailing terminator.
//! Exports: `merge`, `merge_with_report`, `concat_stitches`, `append_terminator`, `assemble`.
//! Role: Pure, synchronous transform run after every source buffer has been retrieved.
//! Invariants: Output header is a verbatim copy of the first input's header.
//! Invariants: Stitch bytes keep input order; each input loses at most one trailing terminator.
//! Invariants: Output always ends with exactly one appended terminator.
//! Invariants: Any failure aborts the whole merge; no partial output is produced.
use bytes::Bytes;
use serde::Serialize;
use tracing::debug;

use crate::core::buffer::MergeBuffer;
use crate::core::dst::{DstParts, has_terminator, split, strip_terminator};
use crate::core::error::{Error, ErrorKind};
use crate::core::format::{HEADER_LEN, TERMINATOR, TERMINATOR_LEN};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct InputSummary {
    pub index: usize,
    /// Stitch bytes contributed after stripping.
    pub stitch_len: usize,
    pub had_terminator: bool,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct MergeReport {
    pub inputs: Vec<InputSummary>,
}

impl MergeReport {
    pub fn unterminated(&self) -> impl Iterator<Item = &InputSummary> {
        self.inputs.iter().filter(|input| !input.had_terminator)
    }
}

#[derive(Clone, Debug)]
pub struct MergeOutcome {
    pub bytes: Bytes,
    pub report: MergeReport,
}

pub fn merge<B: AsRef<[u8]>>(buffers: &[B]) -> Result<Bytes, Error> {
    merge_with_report(buffers).map(|outcome| outcome.bytes)
}

pub fn merge_with_report<B: AsRef<[u8]>>(buffers: &[B]) -> Result<MergeOutcome, Error> {
    if buffers.is_empty() {
        return Err(empty_merge_set());
    }

    let parts = buffers
        .iter()
        .enumerate()
        .map(|(index, raw)| split(raw.as_ref(), index))
        .collect::<Result<Vec<DstParts<'_>>, Error>>()?;

    let mut report = MergeReport::default();
    let mut stripped = Vec::with_capacity(parts.len());
    for (index, part) in parts.iter().enumerate() {
        let stitches = strip_terminator(part.stitches);
        report.inputs.push(InputSummary {
            index,
            stitch_len: stitches.len(),
            had_terminator: has_terminator(part.stitches),
        });
        stripped.push(stitches);
    }

    let stitches = append_terminator(concat_stitches(&stripped)?)?;
    let bytes = assemble(parts[0].header, &stitches)?;
    debug!(
        inputs = buffers.len(),
        stitch_bytes = stitches.len(),
        total_bytes = bytes.len(),
        "merged dst buffers"
    );
    Ok(MergeOutcome { bytes, report })
}

/// Joins stripped payloads in order, leaving room for the terminator.
pub fn concat_stitches(payloads: &[&[u8]]) -> Result<MergeBuffer, Error> {
    if payloads.is_empty() {
        return Err(empty_merge_set());
    }
    let total: usize = payloads.iter().map(|payload| payload.len()).sum();
    let mut buffer = MergeBuffer::with_len(total + TERMINATOR_LEN);
    for payload in payloads {
        buffer.append(payload)?;
    }
    Ok(buffer)
}

pub fn append_terminator(mut stitches: MergeBuffer) -> Result<Bytes, Error> {
    stitches.append(&TERMINATOR)?;
    stitches.finish()
}

pub fn assemble(header: &[u8], stitches: &[u8]) -> Result<Bytes, Error> {
    if header.len() != HEADER_LEN {
        return Err(Error::new(ErrorKind::Internal).with_message(format!(
            "header must be {HEADER_LEN} bytes, got {}",
            header.len()
        )));
    }
    let mut file = MergeBuffer::with_len(HEADER_LEN + stitches.len());
    file.append(header)?;
    file.append(stitches)?;
    file.finish()
}

fn empty_merge_set() -> Error {
    Error::new(ErrorKind::EmptyMergeSet).with_message("no dst buffers to merge")
}
