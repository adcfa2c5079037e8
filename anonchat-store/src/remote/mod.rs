mod ws_store;

pub use ws_store::*;
