//! Language model adapters

mod chat_completion;
mod factory;

pub use chat_completion::{ChatCompletionAnswerer, DEFAULT_GROQ_BASE_URL};
pub use factory::create_answerer;
