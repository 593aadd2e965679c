//! Terminal front end for interactive chat sessions.
//!
//! - [`chat_loop`]: the event loop that routes stdin lines, stream messages and
//!   delayed actions into the session controller.
//! - [`input`]: interpretation of typed lines and in-chat commands.
//! - [`renderer`]: line-oriented output of session events.
//!
//! Ownership boundary: this layer presents and captures interaction state, while
//! [`crate::core`] owns domain logic and backend coordination.

pub mod chat_loop;
pub mod input;
pub mod renderer;
