//! Parley is a line-oriented terminal chat client for hosted language-model
//! providers (OpenAI, Google Gemini and xAI Grok).
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the transcript, provider registry, credential storage and
//!   the streaming session controller.
//! - [`ui`] reads typed lines, renders session events and runs the event loop.
//! - [`auth`] and [`cli`] implement the non-interactive subcommands.
//! - [`api`] defines the request and response payloads for each endpoint family.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which dispatches into [`ui::chat_loop`] for
//! interactive sessions.

pub mod api;
pub mod auth;
pub mod cli;
pub mod core;
pub mod logging;
pub mod ui;
pub mod utils;
