pub mod map;
pub mod marker;
pub mod popup;
pub mod preferences;
pub mod theme;

pub use map::*;
pub use marker::*;
pub use popup::*;
pub use preferences::*;
pub use theme::*;
