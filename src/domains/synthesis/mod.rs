pub mod mode;
pub mod protocol;
pub mod records;

pub use mode::*;
pub use protocol::*;
pub use records::*;
