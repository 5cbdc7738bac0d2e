//! Sample generation from text prompts
//!
//! Either asks a remote generation service for a WAV file or renders a
//! simple keyword-driven synth tone locally.

mod client;
mod local;

pub use client::{GenerationClient, GenerationRequest};
pub use local::{synthesize, PromptTraits, LOCAL_SAMPLE_RATE};

use crate::sample::DecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("prompt is required")]
    EmptyPrompt,

    #[error("request to generation service failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generation service returned {status}: {message}")]
    Service { status: u16, message: String },

    #[error("generation service returned no audio")]
    EmptyResponse,

    #[error("generated audio could not be decoded: {0}")]
    Decode(#[from] DecodeError),
}
