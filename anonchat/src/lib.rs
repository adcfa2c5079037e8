pub use anonchat_core::model::{Phase, Role, RoomId};

pub mod model {
    pub use anonchat_core::model::*;
}

pub mod store {
    pub use anonchat_store::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use anonchat_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use anonchat_client::*;
}
