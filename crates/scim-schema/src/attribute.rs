use serde::{Deserialize, Serialize};

/// Mutability contract for an attribute, per RFC 7643 §2.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mutability {
    /// Server sets the value; clients must not supply it.
    ReadOnly,
    /// Clients may read and write the value.
    ReadWrite,
    /// Clients may set the value once, at creation, but never change it.
    Immutable,
    /// Clients may set the value but it is never echoed back.
    WriteOnly,
}

impl Default for Mutability {
    fn default() -> Self {
        Self::ReadWrite
    }
}

/// Disclosure policy: whether the server includes the attribute in
/// responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Returned {
    /// Always included.
    Always,
    /// Never included, regardless of request.
    Never,
    /// Included unless the client asks for it to be excluded.
    Default,
    /// Included only when explicitly requested.
    Request,
}

impl Default for Returned {
    fn default() -> Self {
        Self::Default
    }
}

/// Uniqueness scope asserted by the server for an attribute's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Uniqueness {
    /// No uniqueness constraint.
    None,
    /// Unique within the scope of the server.
    Server,
    /// Unique across all servers (e.g. a federated identifier).
    Global,
}

impl Default for Uniqueness {
    fn default() -> Self {
        Self::None
    }
}

/// Primitive (non-complex) attribute value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LeafType {
    /// UTF-8 string.
    String,
    /// `true`/`false`.
    Boolean,
    /// Whole number.
    Integer,
    /// Floating point number.
    Decimal,
    /// Base64-encoded binary.
    Binary,
    /// ISO 8601 timestamp.
    DateTime,
    /// URI reference to another resource or external resource.
    Reference,
}

/// Metadata shared by every attribute, leaf or complex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMeta {
    /// Attribute name as it appears in a SCIM document.
    pub name: String,
    /// Whether the attribute must be present.
    pub required: bool,
    /// Whether the value is an ordered sequence of values of this shape.
    pub multi_valued: bool,
    /// Mutability contract.
    pub mutability: Mutability,
    /// Disclosure policy.
    pub returned: Returned,
    /// Whether string comparisons against this attribute are case-sensitive.
    pub case_exact: bool,
    /// Uniqueness scope.
    pub uniqueness: Uniqueness,
}

impl AttributeMeta {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            multi_valued: false,
            mutability: Mutability::default(),
            returned: Returned::default(),
            case_exact: false,
            uniqueness: Uniqueness::default(),
        }
    }
}

/// A single attribute definition.
///
/// Represented as a tagged sum rather than an open-ended inheritance
/// hierarchy: a [`Attribute::Leaf`] carries a primitive [`LeafType`]; a
/// [`Attribute::Complex`] carries its own `sub_attributes`. Both variants
/// share an [`AttributeMeta`] record.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    /// A primitive-valued attribute.
    Leaf {
        /// Shared metadata.
        meta: AttributeMeta,
        /// The primitive type of the value.
        leaf_type: LeafType,
    },
    /// An attribute whose value is itself a record of sub-attributes.
    Complex {
        /// Shared metadata.
        meta: AttributeMeta,
        /// Nested attribute definitions.
        sub_attributes: Vec<Attribute>,
    },
}

impl Attribute {
    /// Start building a leaf attribute with default metadata.
    pub fn leaf(name: impl Into<String>, leaf_type: LeafType) -> Self {
        Self::Leaf {
            meta: AttributeMeta::new(name),
            leaf_type,
        }
    }

    /// Start building a complex attribute with default metadata.
    pub fn complex(name: impl Into<String>, sub_attributes: Vec<Attribute>) -> Self {
        Self::Complex {
            meta: AttributeMeta::new(name),
            sub_attributes,
        }
    }

    fn meta_mut(&mut self) -> &mut AttributeMeta {
        match self {
            Self::Leaf { meta, .. } | Self::Complex { meta, .. } => meta,
        }
    }

    /// Mark this attribute as required.
    pub fn required(mut self) -> Self {
        self.meta_mut().required = true;
        self
    }

    /// Mark this attribute as multi-valued.
    pub fn multi_valued(mut self) -> Self {
        self.meta_mut().multi_valued = true;
        self
    }

    /// Override the default `readWrite` mutability.
    pub fn mutability(mut self, mutability: Mutability) -> Self {
        self.meta_mut().mutability = mutability;
        self
    }

    /// Override the default `default` return policy.
    pub fn returned(mut self, returned: Returned) -> Self {
        self.meta_mut().returned = returned;
        self
    }

    /// Override the default `none` uniqueness.
    pub fn uniqueness(mut self, uniqueness: Uniqueness) -> Self {
        self.meta_mut().uniqueness = uniqueness;
        self
    }

    /// Mark this attribute as case-sensitive.
    pub fn case_exact(mut self) -> Self {
        self.meta_mut().case_exact = true;
        self
    }

    /// Shared metadata for either variant.
    pub fn meta(&self) -> &AttributeMeta {
        match self {
            Self::Leaf { meta, .. } | Self::Complex { meta, .. } => meta,
        }
    }

    /// Attribute name, shorthand for `self.meta().name`.
    pub fn name(&self) -> &str {
        &self.meta().name
    }

    /// `true` for [`Attribute::Complex`].
    pub fn is_complex(&self) -> bool {
        matches!(self, Self::Complex { .. })
    }

    /// Sub-attributes, if this is a [`Attribute::Complex`].
    pub fn sub_attributes(&self) -> Option<&[Attribute]> {
        match self {
            Self::Complex { sub_attributes, .. } => Some(sub_attributes),
            Self::Leaf { .. } => None,
        }
    }

    /// Look up a direct sub-attribute by name. Returns `None` for leaves.
    pub fn sub_attribute(&self, name: &str) -> Option<&Attribute> {
        self.sub_attributes()?.iter().find(|a| a.name() == name)
    }
}
