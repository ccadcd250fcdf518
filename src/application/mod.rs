pub mod control_cycle;
pub mod control_loop;

pub use control_cycle::*;
pub use control_loop::*;
