//! Infrastructure layer - External service implementations

pub mod embedding;
pub mod http;
pub mod llm;
pub mod observability;
pub mod services;
pub mod vector_index;
