//! Error types for schema compilation.
//!
//! Every error in this module is raised while the schema is being compiled
//! at startup. None of them is recoverable: the caller is expected to abort
//! instead of serving a partially built API. Errors raised by resolvers at
//! request time live in [`restql_api::ResolverError`].

use thiserror::Error;

/// Misuse of the schema detected while building the type graph or the REST tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A declared field has no entry in the resolver table.
    #[error("no resolver found for {type_name}/{field_name}")]
    MissingResolver {
        type_name: String,
        field_name: String,
    },

    /// A type reference names neither a built-in scalar nor a declared type.
    #[error("unknown type '{type_name}' referenced by {referenced_by}")]
    UnknownType {
        type_name: String,
        referenced_by: String,
    },

    /// `@restBase` points at a field that is not declared on the referenced type.
    #[error(
        "could not follow @restBase on type '{owner}': field '{field_name}' does not exist on type '{type_name}'"
    )]
    ParentFieldMissing {
        owner: String,
        type_name: String,
        field_name: String,
    },

    /// `@restBase` points at a field that is not itself exposed with `@rest`.
    #[error(
        "could not follow @restBase on type '{owner}': field '{field_name}' on type '{type_name}' lacks REST exposure (@rest)"
    )]
    ParentFieldNotRest {
        owner: String,
        type_name: String,
        field_name: String,
    },

    /// A directive is present but its arguments are unusable.
    #[error("invalid @{directive} on {location}: {reason}")]
    InvalidDirective {
        directive: String,
        location: String,
        reason: String,
    },

    /// Following `@restBase` links leads back to a field already on the chain.
    #[error("@restBase links form a cycle: {}", cycle.join(" -> "))]
    CycleDetected { cycle: Vec<String> },

    /// The schema declares no query root, so no executable schema can be built.
    #[error("schema does not declare a query root type")]
    MissingQueryRoot,

    /// The GraphQL engine rejected the generated executable schema.
    #[error("failed to build executable schema: {0}")]
    ExecutableSchema(String),
}

/// Any failure of [`crate::compile`].
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema text is not valid SDL.
    #[error("failed to parse schema document: {0}")]
    Parse(#[from] async_graphql_parser::Error),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_type_and_field() {
        let err = ConfigurationError::MissingResolver {
            type_name: "Person".into(),
            field_name: "users".into(),
        };
        assert_eq!(err.to_string(), "no resolver found for Person/users");

        let err = ConfigurationError::ParentFieldMissing {
            owner: "Person".into(),
            type_name: "Query".into(),
            field_name: "people".into(),
        };
        assert!(err.to_string().contains("field 'people' does not exist on type 'Query'"));

        let err = ConfigurationError::ParentFieldNotRest {
            owner: "Person".into(),
            type_name: "Query".into(),
            field_name: "person".into(),
        };
        assert!(err.to_string().contains("field 'person' on type 'Query' lacks REST exposure"));
    }

    #[test]
    fn test_cycle_message_lists_chain() {
        let err = ConfigurationError::CycleDetected {
            cycle: vec!["A.b".into(), "B.a".into(), "A.b".into()],
        };
        assert_eq!(err.to_string(), "@restBase links form a cycle: A.b -> B.a -> A.b");
    }

    #[test]
    fn test_configuration_error_converts_into_schema_error() {
        let err: SchemaError = ConfigurationError::MissingQueryRoot.into();
        assert!(matches!(
            err,
            SchemaError::Configuration(ConfigurationError::MissingQueryRoot)
        ));
        assert_eq!(err.to_string(), "schema does not declare a query root type");
    }
}
