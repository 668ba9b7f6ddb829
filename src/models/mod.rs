// Relaydeck Models
// Data structures for the application

mod platform;
mod preset;
mod session;
mod preferences;

pub use platform::*;
pub use preset::*;
pub use session::*;
pub use preferences::*;
