// Relaydeck Services
// Business logic layer

mod platform_registry;
mod field_validator;
mod preset_parser;
mod session_store;
mod session_store_client;
mod quick_start;
mod settings_manager;
mod session_health;
mod title_generator;
mod drive_links;
mod events;

pub use platform_registry::*;
pub use field_validator::*;
pub use preset_parser::*;
pub use session_store::*;
pub use session_store_client::*;
pub use quick_start::*;
pub use settings_manager::*;
pub use session_health::*;
pub use title_generator::*;
pub use drive_links::*;
pub use events::*;
