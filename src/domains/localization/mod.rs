pub mod ports;
pub mod sample;
pub mod scene;

pub use ports::*;
pub use sample::*;
pub use scene::*;
