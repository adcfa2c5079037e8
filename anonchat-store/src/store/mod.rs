mod memory_store;
mod room_store;
mod subscription;

pub use memory_store::*;
pub use room_store::*;
pub use subscription::*;
