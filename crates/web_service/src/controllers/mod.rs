pub mod chat_controller;
pub mod key_controller;
pub mod ollama_proxy_controller;
