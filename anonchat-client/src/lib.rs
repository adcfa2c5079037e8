mod config;
mod error;
mod matchmaking;
mod media;
mod moderation;
mod session;
mod signaling;
mod transport;

pub use config::*;
pub use error::*;
pub use matchmaking::*;
pub use media::*;
pub use moderation::*;
pub use session::*;
pub use signaling::*;
pub use transport::*;
