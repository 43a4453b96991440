//! `voicegate` — a small, focused voice activity detection library.
//!
//! This crate classifies short frames of 16-bit PCM audio as speech or
//! non-speech using entirely fixed-point arithmetic:
//!
//! - Resampling of 8/16/32/48 kHz input to an internal 8 kHz rate
//! - A six-band filterbank extracting log-energy features
//! - An adaptive two-class Gaussian mixture classifier
//! - Hangover smoothing of the per-frame decisions
//! - A streaming segmenter turning decisions into utterance boundaries
//!
//! The library is designed for real-time capture pipelines: every call is
//! synchronous, allocation-light, and bounded by the frame length, and
//! detectors own all of their state so one instance per stream is always
//! thread-safe.

// High-level API (most consumers should start here).
pub mod detector;
pub mod stream;

// Configuration and error types.
pub mod config;
pub mod error;

// Audio conditioning and decoding.
pub mod resample;
pub mod wav;

// Fixed-point analysis internals.
mod classifier;
mod decision;
mod filterbank;
mod fixed;
mod gmm;
mod minimum;
mod model;

// Logging configuration and control.
#[cfg(feature = "logging")]
pub mod logging;
