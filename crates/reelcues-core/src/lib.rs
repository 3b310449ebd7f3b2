//! ReelCues Core Library
//!
//! Turns a narration transcript and its word-level forced alignment into
//! screen-ready caption cues for burn-in rendering.
//!
//! The library performs no I/O during segmentation. Loading alignments,
//! persisting settings and writing caption files are thin helpers around the
//! pure pipeline in [`core::captions`].

pub mod core;
