pub mod actuation;
pub mod geometry;
pub mod localization;
pub mod logger;
pub mod selection;
pub mod synthesis;
pub mod transport;

pub use actuation::*;
pub use geometry::*;
pub use localization::*;
pub use logger::*;
pub use selection::*;
pub use synthesis::*;
pub use transport::*;
