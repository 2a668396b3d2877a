//! RestQL schema directives.
//!
//! The REST surface is described entirely with three directives:
//! - `@rest` on a field - the field gets its own GET route
//! - `@restBase(type: String!, query: String!)` on an object type - the
//!   type's `@rest` fields are nested under the route of `type.query`
//! - `@path` on an argument - the argument is read from the URL path
//!   instead of the query string

use async_graphql_parser::types::ConstDirective;
use async_graphql_value::ConstValue;

use crate::error::ConfigurationError;

/// Directive name constants.
pub mod names {
    pub const REST: &str = "rest";
    pub const REST_BASE: &str = "restBase";
    pub const PATH: &str = "path";

    pub const REST_BASE_TYPE: &str = "type";
    pub const REST_BASE_QUERY: &str = "query";
}

/// Read access to the directives attached to a declaration.
pub trait Directives {
    fn directives(&self) -> &[ConstDirective];

    /// Returns the first directive with the given name.
    fn directive(&self, name: &str) -> Option<&ConstDirective> {
        self.directives()
            .iter()
            .find(|directive| directive.name.node.as_str() == name)
    }

    fn has_directive(&self, name: &str) -> bool {
        self.directive(name).is_some()
    }
}

/// Returns the value of a directive argument.
pub fn directive_argument<'a>(directive: &'a ConstDirective, name: &str) -> Option<&'a ConstValue> {
    directive.get_argument(name).map(|value| &value.node)
}

/// Returns a directive argument as a string.
///
/// Bare enum-style values (`@restBase(type: Query, ...)`) are accepted as well.
pub fn string_argument<'a>(directive: &'a ConstDirective, name: &str) -> Option<&'a str> {
    match directive_argument(directive, name)? {
        ConstValue::String(value) => Some(value.as_str()),
        ConstValue::Enum(value) => Some(value.as_str()),
        _ => None,
    }
}

/// Target of a `@restBase` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentLink {
    pub type_name: String,
    pub field_name: String,
}

impl ParentLink {
    /// Reads the `@restBase` directive of the object type `owner`.
    ///
    /// Returns `Ok(None)` when the type carries no parent link.
    pub fn from_directives(
        owner: &str,
        declaration: &impl Directives,
    ) -> Result<Option<Self>, ConfigurationError> {
        let Some(directive) = declaration.directive(names::REST_BASE) else {
            return Ok(None);
        };

        let argument = |name: &str| {
            string_argument(directive, name).ok_or_else(|| ConfigurationError::InvalidDirective {
                directive: names::REST_BASE.to_string(),
                location: format!("type '{owner}'"),
                reason: format!("missing string argument '{name}'"),
            })
        };

        Ok(Some(Self {
            type_name: argument(names::REST_BASE_TYPE)?.to_string(),
            field_name: argument(names::REST_BASE_QUERY)?.to_string(),
        }))
    }
}
