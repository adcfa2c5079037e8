mod config;
mod service;

pub use config::*;
pub use service::*;
