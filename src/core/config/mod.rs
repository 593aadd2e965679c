pub mod data;
pub mod io;
pub mod printing;

pub use data::{Config, CredentialStoreKind};
pub use io::ConfigError;
