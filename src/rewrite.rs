//! Rule matching and application.
//!
//! [`GraphRewriter`] is the narrow capability the phenotype builder needs. The
//! provided [`SubgraphRewriter`] matches by node label with a backtracking
//! search whose enumeration order is fully determined by node and edge order.

use crate::grammar::Rule;
use crate::graph::{Edge, EdgeId, Graph, Node, NodeId};

/// Where a rule's left-hand side sits in a host graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Match {
    /// Host node for each LHS node, indexed by LHS node id.
    pub nodes: Vec<NodeId>,
    /// Host edge for each LHS edge, indexed by LHS edge id.
    pub edges: Vec<EdgeId>,
}

/// Finds and applies rule matches.
pub trait GraphRewriter {
    /// All matches of `rule`'s left-hand side in `graph`, in a stable order.
    fn find_matches(&self, rule: &Rule, graph: &Graph) -> Vec<Match>;

    /// Rewrites `graph` at `found`, returning a new graph.
    fn apply_rule(&self, rule: &Rule, graph: &Graph, found: &Match) -> Graph;
}

impl<R: GraphRewriter + ?Sized> GraphRewriter for &R {
    fn find_matches(&self, rule: &Rule, graph: &Graph) -> Vec<Match> {
        (**self).find_matches(rule, graph)
    }

    fn apply_rule(&self, rule: &Rule, graph: &Graph, found: &Match) -> Graph {
        (**self).apply_rule(rule, graph, found)
    }
}

/// Label-based injective subgraph matcher.
///
/// Matches are produced in lexicographic order of the host node ids assigned to
/// the LHS nodes (first LHS node varies slowest).
#[derive(Clone, Copy, Debug, Default)]
pub struct SubgraphRewriter;

impl SubgraphRewriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn search(
        &self,
        rule: &Rule,
        graph: &Graph,
        assignment: &mut Vec<NodeId>,
        out: &mut Vec<Match>,
    ) {
        let depth = assignment.len();
        if depth == rule.lhs.node_count() {
            if let Some(edges) = assign_edges(rule, graph, assignment) {
                out.push(Match {
                    nodes: assignment.clone(),
                    edges,
                });
            }
            return;
        }

        let pattern = &rule.lhs.nodes[depth];
        for (candidate, node) in graph.nodes.iter().enumerate() {
            if node.attrs.label != pattern.attrs.label || assignment.contains(&candidate) {
                continue;
            }
            assignment.push(candidate);
            if edges_consistent(rule, graph, assignment) {
                self.search(rule, graph, assignment, out);
            }
            assignment.pop();
        }
    }
}

/// Every LHS edge whose endpoints are both assigned has at least one host edge
/// between their images.
fn edges_consistent(rule: &Rule, graph: &Graph, assignment: &[NodeId]) -> bool {
    rule.lhs.edges.iter().all(|pattern| {
        match (assignment.get(pattern.tail), assignment.get(pattern.head)) {
            (Some(&tail), Some(&head)) => graph
                .edges
                .iter()
                .any(|edge| edge_fits(pattern, edge, tail, head)),
            _ => true,
        }
    })
}

/// Picks a distinct host edge for every LHS edge, first fit in edge order.
fn assign_edges(rule: &Rule, graph: &Graph, assignment: &[NodeId]) -> Option<Vec<EdgeId>> {
    let mut used = Vec::with_capacity(rule.lhs.edge_count());
    for pattern in &rule.lhs.edges {
        let tail = assignment[pattern.tail];
        let head = assignment[pattern.head];
        let found = graph
            .edges
            .iter()
            .enumerate()
            .find(|(id, edge)| !used.contains(id) && edge_fits(pattern, edge, tail, head))
            .map(|(id, _)| id)?;
        used.push(found);
    }
    Some(used)
}

fn edge_fits(pattern: &Edge, edge: &Edge, tail: NodeId, head: NodeId) -> bool {
    edge.tail == tail
        && edge.head == head
        && match &pattern.attrs.label {
            Some(label) => edge.attrs.label.as_deref() == Some(label.as_str()),
            None => true,
        }
}

impl GraphRewriter for SubgraphRewriter {
    fn find_matches(&self, rule: &Rule, graph: &Graph) -> Vec<Match> {
        let mut out = Vec::new();
        if rule.lhs.node_count() == 0 {
            return out;
        }
        let mut assignment = Vec::with_capacity(rule.lhs.node_count());
        self.search(rule, graph, &mut assignment, &mut out);
        out
    }

    fn apply_rule(&self, rule: &Rule, graph: &Graph, found: &Match) -> Graph {
        // Host node -> LHS node, for matched host nodes.
        let matched_lhs = |host: NodeId| found.nodes.iter().position(|&n| n == host);

        let mut result = Graph::new();
        let mut host_map: Vec<Option<NodeId>> = vec![None; graph.node_count()];
        let mut rhs_map: Vec<Option<NodeId>> = vec![None; rule.rhs.node_count()];

        for (host, node) in graph.nodes.iter().enumerate() {
            match matched_lhs(host) {
                None => {
                    host_map[host] = Some(result.add_node(node.name.clone(), node.attrs.clone()));
                }
                Some(lhs) => {
                    if let Some(rhs) = rule.rhs_for(lhs) {
                        let id = result.add_node(node.name.clone(), rule.rhs.nodes[rhs].attrs.clone());
                        host_map[host] = Some(id);
                        rhs_map[rhs] = Some(id);
                    }
                }
            }
        }

        for (rhs, Node { name, attrs }) in rule.rhs.nodes.iter().enumerate() {
            if rhs_map[rhs].is_none() {
                rhs_map[rhs] = Some(result.add_node(name.clone(), attrs.clone()));
            }
        }

        for (id, edge) in graph.edges.iter().enumerate() {
            if found.edges.contains(&id) {
                continue;
            }
            if let (Some(tail), Some(head)) = (host_map[edge.tail], host_map[edge.head]) {
                result.add_edge(tail, head, edge.attrs.clone());
            }
        }

        for edge in &rule.rhs.edges {
            if let (Some(tail), Some(head)) = (rhs_map[edge.tail], rhs_map[edge.head]) {
                result.add_edge(tail, head, edge.attrs.clone());
            }
        }

        result
    }
}
