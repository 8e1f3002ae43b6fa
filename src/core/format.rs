//! Purpose: Centralize the DST byte layout shared by split, strip, and assemble.
//! Exports: `HEADER_LEN`, `TERMINATOR`, `TERMINATOR_LEN`, `FILE_EXTENSION`.
//! Role: Single source for layout constants; no parsing lives here.
//! Invariants: Layout is `[512-byte header][stitch records][00 00 F3]`.
//! Invariants: The header is opaque; only the trailing terminator is structural.

pub const HEADER_LEN: usize = 512;
pub const TERMINATOR: [u8; 3] = [0x00, 0x00, 0xF3];
pub const TERMINATOR_LEN: usize = TERMINATOR.len();
pub const FILE_EXTENSION: &str = "dst";
