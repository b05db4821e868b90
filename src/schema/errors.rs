//! Schema configuration error types
//!
//! Error codes:
//! - SITE_SCHEMA_DUPLICATE (FATAL)
//! - SITE_SCHEMA_INVALID_FIELD (FATAL)
//! - SITE_SCHEMA_INVALID_DEFAULT (FATAL)
//! - SITE_SCHEMA_UNKNOWN_TARGET (FATAL)
//! - SITE_SCHEMA_MALFORMED (FATAL)
//! - SITE_UNKNOWN_SCHEMA (REJECT)
//! - SITE_SCHEMA_WRONG_KIND (REJECT)
//!
//! Configuration errors abort startup. Lookups of names the registry does
//! not know are rejected at the call site instead.

use std::fmt;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller request rejected
    Reject,
    /// Process startup must abort
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Same collection or singleton name registered twice
    SiteSchemaDuplicate,
    /// Field declaration is structurally invalid
    SiteSchemaInvalidField,
    /// Declared default is not a legal value for its field
    SiteSchemaInvalidDefault,
    /// Relationship points at a collection that is not registered
    SiteSchemaUnknownTarget,
    /// Declaration file could not be read or parsed
    SiteSchemaMalformed,
    /// Name not present in the registry
    SiteUnknownSchema,
    /// Name registered, but as a singleton instead of a collection or vice versa
    SiteSchemaWrongKind,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::SiteSchemaDuplicate => "SITE_SCHEMA_DUPLICATE",
            SchemaErrorCode::SiteSchemaInvalidField => "SITE_SCHEMA_INVALID_FIELD",
            SchemaErrorCode::SiteSchemaInvalidDefault => "SITE_SCHEMA_INVALID_DEFAULT",
            SchemaErrorCode::SiteSchemaUnknownTarget => "SITE_SCHEMA_UNKNOWN_TARGET",
            SchemaErrorCode::SiteSchemaMalformed => "SITE_SCHEMA_MALFORMED",
            SchemaErrorCode::SiteUnknownSchema => "SITE_UNKNOWN_SCHEMA",
            SchemaErrorCode::SiteSchemaWrongKind => "SITE_SCHEMA_WRONG_KIND",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            SchemaErrorCode::SiteUnknownSchema | SchemaErrorCode::SiteSchemaWrongKind => {
                Severity::Reject
            }
            _ => Severity::Fatal,
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error type with full context
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    /// Collection or singleton name if applicable
    schema: Option<String>,
    /// Dotted field path inside the definition if applicable
    field: Option<String>,
}

impl SchemaError {
    /// A definition name was registered twice
    pub fn duplicate(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            code: SchemaErrorCode::SiteSchemaDuplicate,
            message: format!("Schema '{}' is already registered", name),
            schema: Some(name),
            field: None,
        }
    }

    /// A field declaration is structurally invalid
    pub fn invalid_field(
        schema: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let schema = schema.into();
        let field = field.into();
        Self {
            code: SchemaErrorCode::SiteSchemaInvalidField,
            message: format!("Schema '{}' field '{}': {}", schema, field, reason.into()),
            schema: Some(schema),
            field: Some(field),
        }
    }

    /// A declared default is not legal for its field
    pub fn invalid_default(
        schema: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let schema = schema.into();
        let field = field.into();
        Self {
            code: SchemaErrorCode::SiteSchemaInvalidDefault,
            message: format!(
                "Schema '{}' field '{}' has an invalid default: {}",
                schema,
                field,
                reason.into()
            ),
            schema: Some(schema),
            field: Some(field),
        }
    }

    /// A relationship targets a collection absent from the registry
    pub fn unknown_target(
        schema: impl Into<String>,
        field: impl Into<String>,
        target: impl AsRef<str>,
    ) -> Self {
        let schema = schema.into();
        let field = field.into();
        Self {
            code: SchemaErrorCode::SiteSchemaUnknownTarget,
            message: format!(
                "Schema '{}' field '{}' references unknown collection '{}'",
                schema,
                field,
                target.as_ref()
            ),
            schema: Some(schema),
            field: Some(field),
        }
    }

    /// A declaration source could not be read or parsed
    pub fn malformed(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::SiteSchemaMalformed,
            message: format!("Malformed schema declaration '{}': {}", source.into(), reason.into()),
            schema: None,
            field: None,
        }
    }

    /// Lookup of a name the registry does not know
    pub fn unknown_schema(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            code: SchemaErrorCode::SiteUnknownSchema,
            message: format!("Schema '{}' not found", name),
            schema: Some(name),
            field: None,
        }
    }

    /// Lookup of a name registered as the other kind of definition
    pub fn wrong_kind(name: impl Into<String>, expected: &str) -> Self {
        let name = name.into();
        Self {
            code: SchemaErrorCode::SiteSchemaWrongKind,
            message: format!("Schema '{}' is not a {}", name, expected),
            schema: Some(name),
            field: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the definition name if applicable
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Returns the field path if applicable
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns whether this error must abort startup
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
