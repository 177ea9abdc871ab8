pub mod provider;
pub mod session;

pub use provider::*;
pub use session::*;
