// Core modules implementing the DST layout, merge pipeline, and error modeling.
pub mod buffer;
pub mod dst;
pub mod error;
pub mod format;
pub mod merge;
