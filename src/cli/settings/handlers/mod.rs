//! Setting handlers for different configuration patterns.

pub mod boolean;
pub mod provider_keyed;
pub mod simple;

pub use boolean::*;
pub use provider_keyed::*;
pub use simple::*;
