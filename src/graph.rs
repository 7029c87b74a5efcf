//! Morphology graphs rewritten by the grammar.
//!
//! A [`Graph`] is a directed graph whose edges point from parent to child. Nodes
//! that carry a [`LinkShape`] are terminal rigid links; nodes without one are
//! nonterminal symbols still waiting for a rule to expand them.

use crate::blueprint::{JointLimit, JointType, MaterialId};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Index of a node inside a [`Graph`].
pub type NodeId = usize;

/// Index of an edge inside a [`Graph`].
pub type EdgeId = usize;

/// Label of the single node making up every build's seed graph.
pub const SEED_LABEL: &str = "robot";

/// Geometric shape of a terminal link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkShape {
    Box,
    Cylinder,
    Sphere,
    Capsule,
}

/// Attributes carried by a graph node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeAttrs {
    /// Symbol used when matching rule patterns.
    pub label: String,
    /// Shape of the link, `None` for nonterminals.
    pub shape: Option<LinkShape>,
    /// Link length along its growth axis (m).
    pub length: f32,
    /// Link radius, or half-width for boxes (m).
    pub radius: f32,
    /// Density (kg/m^3).
    pub density: f32,
    /// Palette index used by the renderer.
    pub color: MaterialId,
    /// Body links share a common density after normalization.
    pub body: bool,
    /// A nonterminal that must be expanded before the graph can become a robot.
    pub require: bool,
}

impl Default for NodeAttrs {
    fn default() -> Self {
        Self {
            label: String::new(),
            shape: None,
            length: 0.1,
            radius: 0.025,
            density: 100.0,
            color: 0,
            body: false,
            require: false,
        }
    }
}

impl NodeAttrs {
    pub fn is_terminal(&self) -> bool {
        self.shape.is_some()
    }

    /// Extent of the link along its growth axis.
    pub fn extent(&self) -> f32 {
        match self.shape {
            Some(LinkShape::Sphere) => self.radius * 2.0,
            Some(_) => self.length,
            None => 0.0,
        }
    }
}

/// Attributes carried by a graph edge (the joint between parent and child).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeAttrs {
    /// Optional symbol; an unlabeled pattern edge matches any host edge.
    pub label: Option<String>,
    pub joint: JointType,
    /// Joint axis in the attachment frame.
    pub axis: Vec3,
    /// Rotations (degrees) applied before the child is attached.
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    /// Fraction along the parent link where the child attaches (1.0 = distal end).
    pub offset: f32,
    pub limits: Option<JointLimit>,
}

impl Default for EdgeAttrs {
    fn default() -> Self {
        Self {
            label: None,
            joint: JointType::Fixed,
            axis: Vec3::X,
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
            offset: 1.0,
            limits: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub name: String,
    pub attrs: NodeAttrs,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    /// Parent node.
    pub tail: NodeId,
    /// Child node.
    pub head: NodeId,
    pub attrs: EdgeAttrs,
}

/// An ordered node/edge structure. Node and edge order is significant: it fixes
/// match enumeration order and the order children are attached in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// The minimal seed morphology every build starts from.
    pub fn seed() -> Self {
        let mut graph = Self::new();
        graph.add_node(
            SEED_LABEL,
            NodeAttrs {
                label: SEED_LABEL.to_string(),
                ..Default::default()
            },
        );
        graph
    }

    pub fn add_node(&mut self, name: impl Into<String>, attrs: NodeAttrs) -> NodeId {
        self.nodes.push(Node {
            name: name.into(),
            attrs,
        });
        self.nodes.len() - 1
    }

    pub fn add_edge(&mut self, tail: NodeId, head: NodeId, attrs: EdgeAttrs) -> EdgeId {
        self.edges.push(Edge { tail, head, attrs });
        self.edges.len() - 1
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name)
    }

    /// Edges leaving `node`, in edge order.
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter().filter(move |e| e.tail == node)
    }

    pub fn in_degree(&self, node: NodeId) -> usize {
        self.edges.iter().filter(|e| e.head == node).count()
    }

    pub fn out_degree(&self, node: NodeId) -> usize {
        self.edges.iter().filter(|e| e.tail == node).count()
    }

    /// Removes the given nodes and every edge touching them, compacting ids while
    /// preserving the relative order of everything that remains.
    pub fn remove_nodes(&mut self, doomed: &[NodeId]) {
        if doomed.is_empty() {
            return;
        }
        let mut remap = vec![None; self.nodes.len()];
        let mut next = 0;
        for (id, slot) in remap.iter_mut().enumerate() {
            if !doomed.contains(&id) {
                *slot = Some(next);
                next += 1;
            }
        }

        let nodes = std::mem::take(&mut self.nodes);
        self.nodes = nodes
            .into_iter()
            .enumerate()
            .filter(|(id, _)| remap[*id].is_some())
            .map(|(_, node)| node)
            .collect();

        let edges = std::mem::take(&mut self.edges);
        self.edges = edges
            .into_iter()
            .filter_map(|edge| {
                Some(Edge {
                    tail: remap[edge.tail]?,
                    head: remap[edge.head]?,
                    attrs: edge.attrs,
                })
            })
            .collect();
    }
}
