mod error;
mod remote;
mod store;

pub use error::*;
pub use remote::*;
pub use store::*;
