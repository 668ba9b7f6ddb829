// Platform Commands
// Adapter listing and field validation

use crate::models::{FieldValueMap, PlatformAdapter, ValidationErrors};
use crate::services::{validate_fields, PlatformRegistry};

/// All registered adapters, in registration order
pub fn get_platforms(registry: &PlatformRegistry) -> Vec<PlatformAdapter> {
    registry.get_all_platforms().into_iter().cloned().collect()
}

pub fn get_platform(registry: &PlatformRegistry, platform_id: &str) -> Result<PlatformAdapter, String> {
    registry
        .get_platform(platform_id)
        .cloned()
        .ok_or_else(|| format!("Unknown platform: {platform_id}"))
}

/// Validate form values for one adapter. An empty map means valid.
pub fn validate_platform_fields(
    registry: &PlatformRegistry,
    platform_id: &str,
    values: &FieldValueMap,
) -> Result<ValidationErrors, String> {
    let adapter = registry
        .get_platform(platform_id)
        .ok_or_else(|| format!("Unknown platform: {platform_id}"))?;
    Ok(validate_fields(adapter, values))
}

/// Defaults to prefill a new form with
pub fn get_initial_values(registry: &PlatformRegistry, platform_id: &str) -> Result<FieldValueMap, String> {
    get_platform(registry, platform_id).map(|adapter| adapter.initial_values())
}
