pub mod auth;
pub mod sse;
