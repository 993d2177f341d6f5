//! Embedder implementations

mod factory;
#[cfg(feature = "fastembed")]
mod minilm;
mod openai;

pub use factory::create_embedder;
#[cfg(feature = "fastembed")]
pub use minilm::{FastEmbedEmbedder, MINILM_DIMENSIONS};
pub use openai::{OpenAiEmbedder, DEFAULT_OPENAI_BASE_URL};
