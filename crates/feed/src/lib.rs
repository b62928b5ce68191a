pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod transport;

pub use config::*;
pub use error::*;
pub use http::*;
pub use session::*;
pub use transport::*;
