//! Upstream AI service clients.
//!
//! Two opaque network collaborators: a generative-text API supporting
//! streamed single-prompt and streamed multi-turn calls, and an image
//! generation API returning a hosted URL. Authentication and transport
//! live here; callers see the traits in [`model`].

pub mod gemini;
pub mod model;
pub mod openai_image;

pub use {
    gemini::GeminiProvider,
    model::{ImageProvider, StreamEvent, TextProvider},
    openai_image::OpenAiImageProvider,
};
