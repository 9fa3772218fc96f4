use crate::attribute::{Attribute, LeafType, Mutability, Returned, Uniqueness};
use crate::urn;

/// A complete schema: URN, display name, description, and its attribute
/// tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// The schema's URN, also its registry key.
    pub urn: String,
    /// Short human-readable name (e.g. `"User"`).
    pub name: String,
    /// Longer description.
    pub description: String,
    /// Top-level attribute definitions.
    pub attributes: Vec<Attribute>,
}

/// The `meta` complex attribute every core resource carries.
fn meta_attribute() -> Attribute {
    Attribute::complex(
        "meta",
        vec![
            Attribute::leaf("resourceType", LeafType::String).mutability(Mutability::ReadOnly),
            Attribute::leaf("created", LeafType::DateTime).mutability(Mutability::ReadOnly),
            Attribute::leaf("lastModified", LeafType::DateTime).mutability(Mutability::ReadOnly),
            Attribute::leaf("location", LeafType::Reference).mutability(Mutability::ReadOnly),
            Attribute::leaf("version", LeafType::String).mutability(Mutability::ReadOnly),
        ],
    )
    .mutability(Mutability::ReadOnly)
}

fn id_attribute() -> Attribute {
    Attribute::leaf("id", LeafType::String)
        .mutability(Mutability::ReadOnly)
        .returned(Returned::Always)
}

fn external_id_attribute() -> Attribute {
    Attribute::leaf("externalId", LeafType::String).uniqueness(Uniqueness::None)
}

/// Core User schema (RFC 7643 §4.1).
pub fn core_user() -> Schema {
    Schema {
        urn: urn::USER.to_string(),
        name: "User".to_string(),
        description: "User Account".to_string(),
        attributes: vec![
            Attribute::leaf("userName", LeafType::String)
                .required()
                .uniqueness(Uniqueness::Server),
            Attribute::complex(
                "name",
                vec![
                    Attribute::leaf("formatted", LeafType::String),
                    Attribute::leaf("familyName", LeafType::String),
                    Attribute::leaf("givenName", LeafType::String),
                    Attribute::leaf("middleName", LeafType::String),
                    Attribute::leaf("honorificPrefix", LeafType::String),
                    Attribute::leaf("honorificSuffix", LeafType::String),
                ],
            ),
            Attribute::leaf("displayName", LeafType::String),
            Attribute::leaf("nickName", LeafType::String),
            Attribute::leaf("profileUrl", LeafType::Reference),
            Attribute::leaf("title", LeafType::String),
            Attribute::leaf("userType", LeafType::String),
            Attribute::leaf("preferredLanguage", LeafType::String),
            Attribute::leaf("locale", LeafType::String),
            Attribute::leaf("timezone", LeafType::String),
            Attribute::leaf("active", LeafType::Boolean),
            Attribute::leaf("password", LeafType::String)
                .mutability(Mutability::WriteOnly)
                .returned(Returned::Never),
            Attribute::complex(
                "emails",
                vec![
                    Attribute::leaf("value", LeafType::String),
                    Attribute::leaf("display", LeafType::String),
                    Attribute::leaf("type", LeafType::String),
                    Attribute::leaf("primary", LeafType::Boolean),
                ],
            )
            .multi_valued(),
            Attribute::complex(
                "phoneNumbers",
                vec![
                    Attribute::leaf("value", LeafType::String),
                    Attribute::leaf("display", LeafType::String),
                    Attribute::leaf("type", LeafType::String),
                    Attribute::leaf("primary", LeafType::Boolean),
                ],
            )
            .multi_valued(),
            Attribute::complex("ims", vec![]).multi_valued(),
            Attribute::complex("photos", vec![]).multi_valued(),
            Attribute::complex(
                "addresses",
                vec![
                    Attribute::leaf("formatted", LeafType::String),
                    Attribute::leaf("streetAddress", LeafType::String),
                    Attribute::leaf("locality", LeafType::String),
                    Attribute::leaf("region", LeafType::String),
                    Attribute::leaf("postalCode", LeafType::String),
                    Attribute::leaf("country", LeafType::String),
                    Attribute::leaf("type", LeafType::String),
                    Attribute::leaf("primary", LeafType::Boolean),
                ],
            )
            .multi_valued(),
            Attribute::complex("groups", vec![])
                .multi_valued()
                .mutability(Mutability::ReadOnly),
            Attribute::complex("entitlements", vec![]).multi_valued(),
            Attribute::complex("roles", vec![]).multi_valued(),
            Attribute::complex("x509Certificates", vec![]).multi_valued(),
            id_attribute(),
            external_id_attribute(),
            meta_attribute(),
        ],
    }
}

/// Core Group schema (RFC 7643 §4.2).
pub fn core_group() -> Schema {
    Schema {
        urn: urn::GROUP.to_string(),
        name: "Group".to_string(),
        description: "Group".to_string(),
        attributes: vec![
            Attribute::leaf("displayName", LeafType::String).required(),
            Attribute::complex(
                "members",
                vec![
                    Attribute::leaf("value", LeafType::String),
                    Attribute::leaf("$ref", LeafType::Reference).mutability(Mutability::ReadOnly),
                    Attribute::leaf("type", LeafType::String),
                    Attribute::leaf("display", LeafType::String),
                ],
            )
            .multi_valued(),
            id_attribute(),
            external_id_attribute(),
            meta_attribute(),
        ],
    }
}

/// Enterprise User extension schema (RFC 7643 §4.3).
pub fn enterprise_user() -> Schema {
    Schema {
        urn: urn::ENTERPRISE_USER.to_string(),
        name: "EnterpriseUser".to_string(),
        description: "Enterprise User".to_string(),
        attributes: vec![
            Attribute::leaf("employeeNumber", LeafType::String),
            Attribute::leaf("costCenter", LeafType::String),
            Attribute::leaf("organization", LeafType::String),
            Attribute::leaf("division", LeafType::String),
            Attribute::leaf("department", LeafType::String),
            Attribute::complex(
                "manager",
                vec![
                    Attribute::leaf("value", LeafType::String),
                    Attribute::leaf("$ref", LeafType::Reference).mutability(Mutability::ReadOnly),
                    Attribute::leaf("displayName", LeafType::String),
                ],
            ),
        ],
    }
}

/// Core Agent schema (agent extension draft). Models an AI agent identity.
///
/// Retains the draft's `specifiationUrl` misspelling rather than correcting
/// it, matching the draft text until it is amended upstream.
pub fn core_agent() -> Schema {
    Schema {
        urn: urn::AGENT.to_string(),
        name: "Agent".to_string(),
        description: "Agent Identity".to_string(),
        attributes: vec![
            Attribute::leaf("name", LeafType::String).required(),
            Attribute::leaf("description", LeafType::String),
            Attribute::leaf("specifiationUrl", LeafType::Reference),
            Attribute::leaf("active", LeafType::Boolean),
            id_attribute(),
            external_id_attribute(),
            meta_attribute(),
        ],
    }
}

/// Core AgenticApplication schema (agent extension draft). Models the
/// hosting application for a set of [`core_agent`] resources.
pub fn core_agentic_application() -> Schema {
    Schema {
        urn: urn::AGENTIC_APPLICATION.to_string(),
        name: "AgenticApplication".to_string(),
        description: "Agentic Application".to_string(),
        attributes: vec![
            Attribute::leaf("name", LeafType::String).required(),
            Attribute::leaf("description", LeafType::String),
            Attribute::complex(
                "agents",
                vec![
                    Attribute::leaf("value", LeafType::String),
                    Attribute::leaf("$ref", LeafType::Reference).mutability(Mutability::ReadOnly),
                    Attribute::leaf("display", LeafType::String),
                ],
            )
            .multi_valued(),
            id_attribute(),
            external_id_attribute(),
            meta_attribute(),
        ],
    }
}

/// PatchOp message schema (RFC 7644 §3.5.2).
pub fn patch_op() -> Schema {
    Schema {
        urn: urn::PATCH_OP.to_string(),
        name: "PatchOp".to_string(),
        description: "SCIM PATCH Operation".to_string(),
        attributes: vec![
            Attribute::complex(
                "Operations",
                vec![
                    Attribute::leaf("op", LeafType::String).required(),
                    Attribute::leaf("path", LeafType::String),
                    Attribute::leaf("value", LeafType::String),
                ],
            )
            .required()
            .multi_valued(),
        ],
    }
}

/// ListResponse message schema (RFC 7644 §3.4.2).
pub fn list_response() -> Schema {
    Schema {
        urn: urn::LIST_RESPONSE.to_string(),
        name: "ListResponse".to_string(),
        description: "SCIM List Response".to_string(),
        attributes: vec![
            Attribute::leaf("totalResults", LeafType::Integer).required(),
            Attribute::complex("Resources", vec![]).multi_valued(),
            Attribute::leaf("startIndex", LeafType::Integer),
            Attribute::leaf("itemsPerPage", LeafType::Integer),
        ],
    }
}

/// Error message schema (RFC 7644 §3.12).
pub fn error() -> Schema {
    Schema {
        urn: urn::ERROR.to_string(),
        name: "Error".to_string(),
        description: "SCIM Error Response".to_string(),
        attributes: vec![
            Attribute::leaf("status", LeafType::String).required(),
            Attribute::leaf("scimType", LeafType::String),
            Attribute::leaf("detail", LeafType::String),
        ],
    }
}

/// ServiceProviderConfig message schema (RFC 7643 §5).
pub fn service_provider_config() -> Schema {
    Schema {
        urn: urn::SERVICE_PROVIDER_CONFIG.to_string(),
        name: "ServiceProviderConfig".to_string(),
        description: "Service Provider Configuration".to_string(),
        attributes: vec![
            Attribute::leaf("documentationUri", LeafType::Reference),
            Attribute::leaf("patch", LeafType::Boolean),
            Attribute::leaf("bulk", LeafType::Boolean),
            Attribute::leaf("filter", LeafType::Boolean),
        ],
    }
}

/// ResourceType message schema (RFC 7643 §6).
pub fn resource_type() -> Schema {
    Schema {
        urn: urn::RESOURCE_TYPE.to_string(),
        name: "ResourceType".to_string(),
        description: "Resource Type Discovery".to_string(),
        attributes: vec![
            Attribute::leaf("id", LeafType::String).required(),
            Attribute::leaf("name", LeafType::String).required(),
            Attribute::leaf("endpoint", LeafType::Reference).required(),
            Attribute::leaf("schema", LeafType::Reference),
        ],
    }
}
