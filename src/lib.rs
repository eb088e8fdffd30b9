//! Photo cartoonizer - turns a photograph into a cartoon-style portrait
//!
//! The crate encodes an uploaded image for transport, asks a remote image
//! generation service (Gemini) to restyle it, and tracks the request through a
//! small state machine that a presenter can observe.

pub mod ai;
pub mod codec;
pub mod controller;
pub mod error;
pub mod models;
pub mod output;
pub mod prompts;

pub use error::{Error, Result};
