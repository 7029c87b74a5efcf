//! Turning a terminal graph into a simulation-ready robot.
//!
//! Normalization prunes free attachment points, checks that what is left is a
//! tree of terminal links, evens out body-link density and lowers the tree into
//! a [`TurtleProgram`] for the [`RobotInterpreter`](crate::RobotInterpreter).

use crate::error::BuildError;
use crate::graph::{EdgeAttrs, Graph, LinkShape, NodeId};
use crate::turtle::{RobotOp, TurtleProgram};

/// Prunes free attachment points and validates the result.
///
/// Returns the cleaned graph and its root node.
pub fn normalize_graph(graph: &Graph) -> Result<(Graph, NodeId), BuildError> {
    let mut graph = graph.clone();

    // Removing a free leaf can expose its parent as a new free leaf.
    loop {
        let free: Vec<NodeId> = (0..graph.node_count())
            .filter(|&id| {
                let attrs = &graph.nodes[id].attrs;
                !attrs.is_terminal() && !attrs.require && graph.out_degree(id) == 0
            })
            .collect();
        if free.is_empty() {
            break;
        }
        graph.remove_nodes(&free);
    }

    if let Some(node) = graph.nodes.iter().find(|n| !n.attrs.is_terminal()) {
        let what = if node.attrs.require {
            "dangling required connector"
        } else {
            "unresolved nonterminal"
        };
        return Err(BuildError::normalization(format!(
            "{what} '{}' ({})",
            node.name, node.attrs.label
        )));
    }

    let root = tree_root(&graph)?;
    equalize_body_density(&mut graph);
    Ok((graph, root))
}

fn tree_root(graph: &Graph) -> Result<NodeId, BuildError> {
    if graph.node_count() == 0 {
        return Err(BuildError::normalization("graph has no links"));
    }

    let roots: Vec<NodeId> = (0..graph.node_count())
        .filter(|&id| graph.in_degree(id) == 0)
        .collect();
    let root = match roots.as_slice() {
        [root] => *root,
        [] => return Err(BuildError::normalization("graph has no root link")),
        _ => {
            return Err(BuildError::normalization(format!(
                "graph has {} root links",
                roots.len()
            )));
        }
    };

    if let Some(id) = (0..graph.node_count()).find(|&id| graph.in_degree(id) > 1) {
        return Err(BuildError::normalization(format!(
            "link '{}' has more than one parent",
            graph.nodes[id].name
        )));
    }

    // With one root and in-degree <= 1 everywhere, n-1 edges plus full
    // reachability means a tree.
    let mut seen = vec![false; graph.node_count()];
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if std::mem::replace(&mut seen[id], true) {
            continue;
        }
        stack.extend(graph.out_edges(id).map(|e| e.head));
    }
    if let Some(id) = seen.iter().position(|s| !s) {
        return Err(BuildError::normalization(format!(
            "link '{}' is not connected to the root",
            graph.nodes[id].name
        )));
    }

    Ok(root)
}

/// Gives every body link the same density while keeping the body's mass per
/// unit length.
fn equalize_body_density(graph: &mut Graph) {
    let (mass, length) = graph
        .nodes
        .iter()
        .filter(|n| n.attrs.body)
        .fold((0.0f32, 0.0f32), |(m, l), n| {
            (m + n.attrs.length * n.attrs.density, l + n.attrs.length)
        });
    if length <= 0.0 {
        return;
    }
    let density = mass / length;
    for node in graph.nodes.iter_mut().filter(|n| n.attrs.body) {
        node.attrs.density = density;
    }
}

/// Lowers a normalized tree into a turtle program, depth first from `root`.
pub fn lower(graph: &Graph, root: NodeId) -> TurtleProgram {
    let mut program = TurtleProgram::new();
    emit_link(graph, root, None, &mut program);
    program
}

fn emit_link(
    graph: &Graph,
    id: NodeId,
    incoming: Option<(NodeId, &EdgeAttrs)>,
    program: &mut TurtleProgram,
) {
    let attrs = &graph.nodes[id].attrs;

    if let Some((parent, edge)) = incoming {
        program.push(RobotOp::Push, &[]);

        let back = (1.0 - edge.offset.clamp(0.0, 1.0)) * graph.nodes[parent].attrs.extent();
        if back > 0.0 {
            program.push(RobotOp::Move, &[-back]);
        }
        if edge.yaw != 0.0 {
            program.push(RobotOp::Yaw(1.0), &[edge.yaw]);
        }
        if edge.pitch != 0.0 {
            program.push(RobotOp::Pitch(1.0), &[edge.pitch]);
        }
        if edge.roll != 0.0 {
            program.push(RobotOp::Roll(1.0), &[edge.roll]);
        }
        program.push(RobotOp::SetJointType(edge.joint), &[]);
        program.push(RobotOp::SetJointAxis, &edge.axis.to_array());
        if let Some(limits) = edge.limits {
            program.push(
                RobotOp::SetJointLimits,
                &[limits.min, limits.max, limits.effort, limits.velocity],
            );
        }
    }

    program.push(RobotOp::SetWidth, &[attrs.radius * 2.0]);
    program.push(RobotOp::SetMaterial, &[f32::from(attrs.color)]);
    program.push(RobotOp::SetDensity, &[attrs.density]);
    match attrs.shape {
        Some(LinkShape::Box) => program.push(
            RobotOp::SpawnBox,
            &[attrs.length, attrs.radius * 2.0, attrs.radius * 2.0],
        ),
        Some(LinkShape::Cylinder) => {
            program.push(RobotOp::SpawnCylinder, &[attrs.length, attrs.radius])
        }
        Some(LinkShape::Capsule) => {
            program.push(RobotOp::SpawnCapsule, &[attrs.length, attrs.radius])
        }
        Some(LinkShape::Sphere) => program.push(RobotOp::SpawnSphere, &[attrs.radius]),
        // normalize_graph leaves only terminal links
        None => {}
    }

    for edge in graph.out_edges(id) {
        emit_link(graph, edge.head, Some((id, &edge.attrs)), program);
    }

    if incoming.is_some() {
        program.push(RobotOp::Pop, &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeAttrs;

    fn link(label: &str, length: f32, density: f32, body: bool) -> NodeAttrs {
        NodeAttrs {
            label: label.into(),
            shape: Some(LinkShape::Capsule),
            length,
            density,
            body,
            ..Default::default()
        }
    }

    fn nonterminal(label: &str, require: bool) -> NodeAttrs {
        NodeAttrs {
            label: label.into(),
            require,
            ..Default::default()
        }
    }

    #[test]
    fn free_attachment_points_are_pruned() {
        let mut g = Graph::new();
        let body = g.add_node("body", link("body", 0.2, 100.0, true));
        let tail = g.add_node("tail", nonterminal("tail", false));
        g.add_edge(body, tail, EdgeAttrs::default());

        let (clean, root) = normalize_graph(&g).unwrap();
        assert_eq!(clean.node_count(), 1);
        assert_eq!(root, 0);
    }

    #[test]
    fn required_connectors_fail() {
        let mut g = Graph::new();
        let body = g.add_node("body", link("body", 0.2, 100.0, true));
        let limb = g.add_node("leg", nonterminal("limb", true));
        g.add_edge(body, limb, EdgeAttrs::default());

        let err = normalize_graph(&g).unwrap_err();
        assert!(err.to_string().contains("dangling required connector"));
    }

    #[test]
    fn two_roots_fail() {
        let mut g = Graph::new();
        g.add_node("a", link("a", 0.1, 100.0, false));
        g.add_node("b", link("b", 0.1, 100.0, false));
        assert!(normalize_graph(&g).is_err());
    }

    #[test]
    fn body_density_is_equalized() {
        let mut g = Graph::new();
        let a = g.add_node("a", link("body", 0.1, 100.0, true));
        let b = g.add_node("b", link("body", 0.3, 300.0, true));
        let leg = g.add_node("leg", link("leg", 0.1, 50.0, false));
        g.add_edge(a, b, EdgeAttrs::default());
        g.add_edge(a, leg, EdgeAttrs::default());

        let (clean, _) = normalize_graph(&g).unwrap();
        // (0.1*100 + 0.3*300) / 0.4 = 250
        assert!((clean.nodes[0].attrs.density - 250.0).abs() < 1e-3);
        assert!((clean.nodes[1].attrs.density - 250.0).abs() < 1e-3);
        assert_eq!(clean.nodes[2].attrs.density, 50.0);
    }

    #[test]
    fn lowering_brackets_every_child() {
        let mut g = Graph::new();
        let a = g.add_node("a", link("body", 0.1, 100.0, true));
        let b = g.add_node("b", link("leg", 0.1, 100.0, false));
        g.add_edge(a, b, EdgeAttrs::default());

        let program = lower(&g, 0);
        let pushes = program.commands.iter().filter(|c| c.op == RobotOp::Push).count();
        let pops = program.commands.iter().filter(|c| c.op == RobotOp::Pop).count();
        let spawns = program
            .commands
            .iter()
            .filter(|c| c.op == RobotOp::SpawnCapsule)
            .count();
        assert_eq!((pushes, pops, spawns), (1, 1, 2));
    }
}
