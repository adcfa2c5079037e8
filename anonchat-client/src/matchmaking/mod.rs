mod matchmaker;

pub use matchmaker::*;
