pub mod config;
pub mod error;
pub mod signal;

pub use config::Config;
pub use error::*;
pub use signal::*;
