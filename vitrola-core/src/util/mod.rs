mod id;

pub use id::*;
