pub mod hyperrectangle;
pub mod theta;

pub use hyperrectangle::*;
pub use theta::*;
