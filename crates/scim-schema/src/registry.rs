use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::attribute::Attribute;
use crate::schemas::{self, Schema};
use crate::urn;

static REGISTRY: LazyLock<BTreeMap<&'static str, Schema>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert(urn::USER, schemas::core_user());
    map.insert(urn::GROUP, schemas::core_group());
    map.insert(urn::ENTERPRISE_USER, schemas::enterprise_user());
    map.insert(urn::AGENT, schemas::core_agent());
    map.insert(urn::AGENTIC_APPLICATION, schemas::core_agentic_application());
    map.insert(urn::PATCH_OP, schemas::patch_op());
    map.insert(urn::LIST_RESPONSE, schemas::list_response());
    map.insert(urn::ERROR, schemas::error());
    map.insert(
        urn::SERVICE_PROVIDER_CONFIG,
        schemas::service_provider_config(),
    );
    map.insert(urn::RESOURCE_TYPE, schemas::resource_type());
    map
});

/// Look up a schema by URN.
pub fn get_schema(schema_urn: &str) -> Option<&'static Schema> {
    REGISTRY.get(schema_urn)
}

/// All URNs currently published by the registry, in a stable order.
pub fn schema_urns() -> impl Iterator<Item = &'static str> {
    REGISTRY.keys().copied()
}

/// Resolve a dot-separated attribute path against a schema's attribute
/// tree, descending through `subAttributes` one segment at a time.
/// Returns `None` on any miss: unknown schema, unknown top-level attribute,
/// or a path segment that does not exist as a sub-attribute.
pub fn get_attribute(schema_urn: &str, dotted_path: &str) -> Option<&'static Attribute> {
    let schema = get_schema(schema_urn)?;
    let mut segments = dotted_path.split('.');
    let first = segments.next()?;
    let mut current = schema.attributes.iter().find(|a| a.name() == first)?;
    for segment in segments {
        current = current.sub_attribute(segment)?;
    }
    Some(current)
}
