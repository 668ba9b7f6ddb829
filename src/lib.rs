// Relaydeck
// Multi-destination broadcast configuration: platform adapters, field
// validation, preset import and the quick start flow

pub mod commands;
pub mod models;
pub mod services;
