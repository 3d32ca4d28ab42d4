//! Embedding provider implementations.

pub mod gemini;
pub mod ollama;
pub mod trigram;

pub use gemini::GeminiEmbeddings;
pub use ollama::OllamaEmbeddings;
pub use trigram::TrigramEmbeddings;
