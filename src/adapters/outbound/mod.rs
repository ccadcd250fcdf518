pub mod buffered_logger;
pub mod file_logger;
pub mod http_endpoint;
pub mod localization_client;
pub mod logging_actuator;
pub mod multi_logger;
pub mod retrying_transport;
pub mod stream_logger;

pub use buffered_logger::*;
pub use file_logger::*;
pub use http_endpoint::*;
pub use localization_client::*;
pub use logging_actuator::*;
pub use multi_logger::*;
pub use retrying_transport::*;
pub use stream_logger::*;
