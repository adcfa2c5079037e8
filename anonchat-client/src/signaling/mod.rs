mod signaling_link;

pub use signaling_link::*;
