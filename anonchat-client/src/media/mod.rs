mod local_media;
mod media_source;
mod remote_stream;
mod track;

pub use local_media::*;
pub use media_source::*;
pub use remote_stream::*;
pub use track::*;
