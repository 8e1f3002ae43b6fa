//! Purpose: Library crate backing the `dstmerge` CLI, server, and tests.
//! Exports: `core` (DST layout, merge pipeline, errors), `api` (sources + compose), `letters`.
//! Role: Keeps the pure merge engine separate from retrieval and delivery glue.
//! Invariants: `core` performs no I/O; retrieval lives in `api`.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
pub mod core;
pub mod letter_paths;
pub mod letters;
pub mod notice;
