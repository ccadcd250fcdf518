pub mod candidate;
pub mod selector;

pub use candidate::*;
pub use selector::*;
