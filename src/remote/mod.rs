pub mod error;
pub mod gateway;
pub mod http;

pub use error::*;
pub use gateway::*;
pub use http::*;
