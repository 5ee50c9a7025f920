pub mod anthropic;
pub mod common;
pub mod google;
pub mod ollama;
pub mod openai;
