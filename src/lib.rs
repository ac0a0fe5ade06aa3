pub mod compression;
pub mod config;
pub mod error;
pub mod fallback;
pub mod loader;
pub mod request;
pub mod response;
pub mod transport;
pub mod types;

pub use config::{Config, LoaderConfig};
pub use error::{Error, Result};
pub use loader::ResourceLoader;
