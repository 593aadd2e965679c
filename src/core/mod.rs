pub mod actions;
pub mod chat_stream;
pub mod config;
pub mod credentials;
pub mod events;
pub mod keyring;
pub mod message;
pub mod prompt;
pub mod providers;
pub mod session;
pub mod transcript;
