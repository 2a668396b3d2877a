//! The REST exposure tree.
//!
//! Every field marked `@rest` becomes one [`RestNode`]. A node hangs under
//! the root when its field is declared on the query root type, and under the
//! node of `T.f` when its owning type carries `@restBase(type: "T", query: "f")`.
//! Nodes live in an arena indexed by [`NodeId`]; the root is always id 0.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::directives::{Directives, ParentLink, names};
use crate::error::ConfigurationError;
use crate::model::{FieldDecl, SchemaModel};
use crate::resolvers::Resolver;
use crate::schema::TypeGraph;

/// Identity of a REST-exposed field: `(owning type, field name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeKey {
    pub type_name: String,
    pub field_name: String,
}

impl NodeKey {
    pub fn new(type_name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            field_name: field_name.into(),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.type_name, self.field_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// Where a route reads an argument from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentSource {
    /// A `/:name` segment of the URL path (`@path`).
    Path,
    /// A query-string parameter.
    Query,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestArgument {
    pub name: String,
    pub source: ArgumentSource,
}

/// One REST-exposed field occurrence, or the field-less root.
#[derive(Debug, Clone)]
pub struct RestNode {
    /// `None` only for the root.
    pub key: Option<NodeKey>,
    pub arguments: Vec<RestArgument>,
    pub resolver: Option<Resolver>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl RestNode {
    fn root() -> Self {
        Self {
            key: None,
            arguments: Vec::new(),
            resolver: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.key.is_none()
    }

    pub fn field_name(&self) -> Option<&str> {
        self.key.as_ref().map(|key| key.field_name.as_str())
    }

    /// Path-sourced arguments, in declaration order.
    pub fn path_arguments(&self) -> impl Iterator<Item = &RestArgument> {
        self.arguments
            .iter()
            .filter(|argument| argument.source == ArgumentSource::Path)
    }
}

#[derive(Debug, Clone)]
pub struct RestTree {
    nodes: Vec<RestNode>,
    index: IndexMap<NodeKey, NodeId>,
}

impl RestTree {
    /// Builds the tree from the schema model and its resolver-bound graph.
    ///
    /// # Errors
    ///
    /// Fails when a `@restBase` target does not exist or is not `@rest`,
    /// when parent links form a cycle, or when the query root itself
    /// declares `@restBase`.
    pub fn build(model: &SchemaModel, graph: &TypeGraph) -> Result<Self, ConfigurationError> {
        let mut nodes = vec![RestNode::root()];
        let mut index = IndexMap::new();

        for object in model.objects.values() {
            for field in object.fields.values() {
                if !field.has_directive(names::REST) {
                    continue;
                }
                let key = NodeKey::new(&object.name, &field.name);
                let resolver = graph
                    .field(&object.name, &field.name)
                    .map(|graph_field| graph_field.resolver.clone())
                    .ok_or_else(|| ConfigurationError::MissingResolver {
                        type_name: key.type_name.clone(),
                        field_name: key.field_name.clone(),
                    })?;

                let id = NodeId(nodes.len());
                nodes.push(RestNode {
                    key: Some(key.clone()),
                    arguments: rest_arguments(field),
                    resolver: Some(resolver),
                    parent: None,
                    children: Vec::new(),
                });
                index.insert(key, id);
            }
        }

        let query_root = model.root.query.as_deref();
        for (key, &id) in &index {
            nodes[id.0].parent = parent_of(model, &index, key, query_root)?;
        }

        check_acyclic(&nodes)?;

        for id in 1..nodes.len() {
            if let Some(parent) = nodes[id].parent {
                nodes[parent.0].children.push(NodeId(id));
            }
        }

        let tree = Self { nodes, index };
        for (key, &id) in &tree.index {
            if !tree.is_reachable(id) {
                warn!(field = %key, "REST field is not reachable from the query root; no route is generated");
            }
        }
        debug!(
            nodes = tree.len(),
            root_children = tree.root_children().len(),
            "REST tree built"
        );

        Ok(tree)
    }

    pub fn root(&self) -> &RestNode {
        &self.nodes[NodeId::ROOT.0]
    }

    pub fn node(&self, id: NodeId) -> &RestNode {
        &self.nodes[id.0]
    }

    pub fn find(&self, type_name: &str, field_name: &str) -> Option<NodeId> {
        self.index
            .get(&NodeKey::new(type_name, field_name))
            .copied()
    }

    pub fn root_children(&self) -> &[NodeId] {
        &self.root().children
    }

    /// Ancestors of `id` from the root's first child down to `id` itself.
    ///
    /// The root is not part of the chain.
    pub fn chain(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == NodeId::ROOT {
                break;
            }
            chain.push(node_id);
            current = self.nodes[node_id.0].parent;
        }
        chain.reverse();
        chain
    }

    /// Whether following parents from `id` ends at the root.
    pub fn is_reachable(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == NodeId::ROOT {
                return true;
            }
            current = self.nodes[node_id.0].parent;
        }
        false
    }

    /// Number of REST-exposed fields (the root excluded).
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn rest_arguments(field: &FieldDecl) -> Vec<RestArgument> {
    field
        .arguments
        .iter()
        .map(|argument| RestArgument {
            name: argument.name.clone(),
            source: if argument.has_directive(names::PATH) {
                ArgumentSource::Path
            } else {
                ArgumentSource::Query
            },
        })
        .collect()
}

fn parent_of(
    model: &SchemaModel,
    index: &IndexMap<NodeKey, NodeId>,
    key: &NodeKey,
    query_root: Option<&str>,
) -> Result<Option<NodeId>, ConfigurationError> {
    let Some(owner) = model.object(&key.type_name) else {
        return Ok(None);
    };
    let link = ParentLink::from_directives(&owner.name, owner)?;

    if query_root == Some(owner.name.as_str()) {
        if link.is_some() {
            return Err(ConfigurationError::InvalidDirective {
                directive: names::REST_BASE.to_string(),
                location: format!("type '{}'", owner.name),
                reason: "the query root type cannot be nested under another field".to_string(),
            });
        }
        return Ok(Some(NodeId::ROOT));
    }

    let Some(link) = link else {
        return Ok(None);
    };

    let Some(target) = model.field(&link.type_name, &link.field_name) else {
        return Err(ConfigurationError::ParentFieldMissing {
            owner: owner.name.clone(),
            type_name: link.type_name,
            field_name: link.field_name,
        });
    };
    if !target.has_directive(names::REST) {
        return Err(ConfigurationError::ParentFieldNotRest {
            owner: owner.name.clone(),
            type_name: link.type_name,
            field_name: link.field_name,
        });
    }

    Ok(index
        .get(&NodeKey::new(link.type_name, link.field_name))
        .copied())
}

fn check_acyclic(nodes: &[RestNode]) -> Result<(), ConfigurationError> {
    let label = |id: NodeId| {
        nodes[id.0]
            .key
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    };

    for start in 1..nodes.len() {
        let mut path = vec![NodeId(start)];
        let mut seen = HashSet::from([NodeId(start)]);
        let mut current = nodes[start].parent;

        while let Some(id) = current {
            if id == NodeId::ROOT {
                break;
            }
            if !seen.insert(id) {
                let first = path.iter().position(|&p| p == id).unwrap_or(0);
                let mut cycle: Vec<String> = path[first..].iter().map(|&p| label(p)).collect();
                cycle.push(label(id));
                return Err(ConfigurationError::CycleDetected { cycle });
            }
            path.push(id);
            current = nodes[id.0].parent;
        }
    }
    Ok(())
}
