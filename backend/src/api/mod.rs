pub mod health;
pub mod videos;

pub use health::*;
pub use videos::*;
