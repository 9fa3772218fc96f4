//! Static SCIM 2.0 schema registry.
//!
//! Schemas are compiled into the binary as a read-only lookup table keyed by
//! URN. Nothing here mutates at runtime; the registry exists to answer two
//! questions for the validators in `scim-validate`: "what does this URN
//! look like" ([`get_schema`]) and "what does this dotted path resolve to"
//! ([`get_attribute`]).

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod attribute;
mod registry;
mod schemas;
mod urn;

pub use attribute::{Attribute, AttributeMeta, LeafType, Mutability, Returned, Uniqueness};
pub use registry::{get_attribute, get_schema, schema_urns};
pub use schemas::Schema;
pub use urn::{
    AGENT, AGENTIC_APPLICATION, ENTERPRISE_USER, ERROR, GROUP, LIST_RESPONSE, PATCH_OP,
    RESOURCE_TYPE, SERVICE_PROVIDER_CONFIG, USER,
};
