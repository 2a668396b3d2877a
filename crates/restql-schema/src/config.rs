//! GraphQL endpoint configuration.
//!
//! Read from the `[graphql]` section of `restql.toml`:
//!
//! ```toml
//! [graphql]
//! enabled = true
//! path = "/graphql"
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! ```

use serde::{Deserialize, Serialize};

use crate::schema::ExecutableSchemaConfig;

/// GraphQL endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLConfig {
    /// Serve the GraphQL endpoint next to the REST routes.
    /// Default: true
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Mount path of the endpoint.
    /// Default: "/graphql"
    #[serde(default = "default_path")]
    pub path: String,

    /// Maximum query depth allowed.
    /// Default: 15
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum query complexity allowed.
    /// Default: 500
    #[serde(default = "default_max_complexity")]
    pub max_complexity: usize,

    /// Answer introspection queries.
    /// Default: true
    #[serde(default = "default_introspection")]
    pub introspection: bool,
}

fn default_enabled() -> bool {
    true
}

fn default_path() -> String {
    "/graphql".to_string()
}

fn default_max_depth() -> usize {
    15
}

fn default_max_complexity() -> usize {
    500
}

fn default_introspection() -> bool {
    true
}

impl Default for GraphQLConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            path: default_path(),
            max_depth: default_max_depth(),
            max_complexity: default_max_complexity(),
            introspection: default_introspection(),
        }
    }
}

impl GraphQLConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration values are invalid.
    pub fn validate(&self) -> Result<(), String> {
        if !self.path.starts_with('/') {
            return Err(format!("graphql.path must start with '/', got '{}'", self.path));
        }
        if self.max_depth == 0 {
            return Err("graphql.max_depth must be > 0".into());
        }
        if self.max_complexity == 0 {
            return Err("graphql.max_complexity must be > 0".into());
        }
        Ok(())
    }

    #[must_use]
    pub fn to_executable_config(&self) -> ExecutableSchemaConfig {
        ExecutableSchemaConfig {
            max_depth: self.max_depth,
            max_complexity: self.max_complexity,
            introspection_enabled: self.introspection,
        }
    }
}
