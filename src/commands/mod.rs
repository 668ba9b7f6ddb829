// Relaydeck Commands
// Entry points invoked by the server's command dispatcher

mod platforms;
mod presets;
mod sessions;
mod system;

pub use platforms::*;
pub use presets::*;
pub use sessions::*;
pub use system::*;
