pub mod protocol;
pub mod record;
pub mod state;
pub mod store;
pub mod visibility;

// Spots crate: the live spot state core. No I/O.
pub use protocol::*;
pub use record::*;
pub use state::*;
pub use store::*;
pub use visibility::*;
