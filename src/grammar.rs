//! Grammar files and the rules they define.
//!
//! A grammar file is JSON:
//!
//! ```json
//! { "rules": [ { "name": "make_robot",
//!                "lhs": { "nodes": [ { "name": "robot", "label": "robot" } ] },
//!                "rhs": { "nodes": [ { "name": "body", "label": "body",
//!                                      "shape": "capsule", "length": 0.15 } ] } } ] }
//! ```
//!
//! Nodes that appear by name on both sides of a rule are *common* nodes: the host
//! node they match survives the rewrite and takes the right-hand-side attributes.

use crate::error::LoadError;
use crate::graph::{EdgeAttrs, Graph, NodeAttrs, NodeId};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// A graph production rule.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    pub name: String,
    /// Pattern matched against the host graph.
    pub lhs: Graph,
    /// Replacement inserted at the match.
    pub rhs: Graph,
    /// `(lhs node, rhs node)` pairs sharing a name.
    pub common: Vec<(NodeId, NodeId)>,
}

impl Rule {
    pub fn new(name: impl Into<String>, lhs: Graph, rhs: Graph) -> Self {
        let common = lhs
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(l, node)| rhs.find_node(&node.name).map(|r| (l, r)))
            .collect();
        Self {
            name: name.into(),
            lhs,
            rhs,
            common,
        }
    }

    /// The right-hand-side counterpart of an LHS node, if it is kept.
    pub fn rhs_for(&self, lhs_node: NodeId) -> Option<NodeId> {
        self.common
            .iter()
            .find(|(l, _)| *l == lhs_node)
            .map(|(_, r)| *r)
    }
}

/// The loaded rule list plus the seed graph every build starts from.
///
/// Immutable after construction and passed explicitly to whoever builds robots.
#[derive(Clone, Debug)]
pub struct Grammar {
    rules: Vec<Rule>,
    seed: Graph,
}

impl Grammar {
    /// Bundles `rules` with the standard single-node seed graph.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self::with_seed(rules, Graph::seed())
    }

    pub fn with_seed(rules: Vec<Rule>, seed: Graph) -> Self {
        Self { rules, seed }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Ok(Self::new(load_rules(path)?))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn seed(&self) -> &Graph {
        &self.seed
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct GrammarFile {
    rules: Vec<RuleDef>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleDef {
    name: String,
    #[serde(default)]
    lhs: GraphDef,
    #[serde(default)]
    rhs: GraphDef,
}

#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct GraphDef {
    #[serde(default)]
    nodes: Vec<NodeDef>,
    #[serde(default)]
    edges: Vec<EdgeDef>,
}

#[derive(Deserialize)]
struct NodeDef {
    name: String,
    #[serde(flatten)]
    attrs: NodeAttrs,
}

#[derive(Deserialize)]
struct EdgeDef {
    tail: String,
    head: String,
    #[serde(flatten)]
    attrs: EdgeAttrs,
}

impl GraphDef {
    fn into_graph(self, rule: &str, side: &str) -> Result<Graph, LoadError> {
        let mut graph = Graph::new();
        let mut seen = HashSet::new();
        for node in self.nodes {
            if !seen.insert(node.name.clone()) {
                return Err(LoadError::grammar(format!(
                    "rule '{rule}' {side}: duplicate node '{}'",
                    node.name
                )));
            }
            let mut attrs = node.attrs;
            if attrs.label.is_empty() {
                attrs.label = node.name.clone();
            }
            graph.add_node(node.name, attrs);
        }
        for edge in self.edges {
            let resolve = |name: &str| {
                graph.find_node(name).ok_or_else(|| {
                    LoadError::grammar(format!(
                        "rule '{rule}' {side}: edge references unknown node '{name}'"
                    ))
                })
            };
            let tail = resolve(&edge.tail)?;
            let head = resolve(&edge.head)?;
            graph.add_edge(tail, head, edge.attrs);
        }
        Ok(graph)
    }
}

/// Parses a grammar document into its ordered rule list.
pub fn parse_rules(json: &str) -> Result<Vec<Rule>, LoadError> {
    let file: GrammarFile =
        serde_json::from_str(json).map_err(|e| LoadError::grammar(e.to_string()))?;

    file.rules
        .into_iter()
        .map(|def| {
            if def.lhs.nodes.is_empty() {
                return Err(LoadError::grammar(format!(
                    "rule '{}' has an empty left-hand side",
                    def.name
                )));
            }
            let lhs = def.lhs.into_graph(&def.name, "lhs")?;
            let rhs = def.rhs.into_graph(&def.name, "rhs")?;
            Ok(Rule::new(def.name, lhs, rhs))
        })
        .collect()
}

/// Loads the ordered rule list from a grammar file.
pub fn load_rules(path: impl AsRef<Path>) -> Result<Vec<Rule>, LoadError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    let rules = parse_rules(&text)?;
    debug!(path = %path.display(), rules = rules.len(), "loaded grammar");
    Ok(rules)
}
