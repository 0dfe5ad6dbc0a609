//! Structural checks and execution ordering for workflow graphs.

use hubcore::{Edge, NodeSpec, ValidationError, WorkflowDefinition};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet, VecDeque};

/// Build a dependency graph whose node weights are declaration positions.
/// Edges naming unknown nodes are dropped; a duplicated id resolves to its
/// first declaration.
fn build_graph(nodes: &[NodeSpec], edges: &[Edge]) -> DiGraph<usize, ()> {
    let mut graph = DiGraph::with_capacity(nodes.len(), edges.len());
    let mut node_to_index: HashMap<&str, NodeIndex> = HashMap::new();

    for (position, node) in nodes.iter().enumerate() {
        let idx = graph.add_node(position);
        node_to_index.entry(node.id.as_str()).or_insert(idx);
    }

    for edge in edges {
        let from = node_to_index.get(edge.source.as_str());
        let to = node_to_index.get(edge.target.as_str());
        if let (Some(from), Some(to)) = (from, to) {
            graph.add_edge(*from, *to, ());
        }
    }

    graph
}

/// Check that a node/edge set can be executed.
///
/// Pure and idempotent: the same graph always gets the same verdict.
pub fn validate(nodes: &[NodeSpec], edges: &[Edge]) -> Result<(), ValidationError> {
    if nodes.is_empty() {
        return Err(ValidationError::EmptyGraph);
    }

    if !nodes.iter().any(NodeSpec::is_trigger) {
        return Err(ValidationError::MissingTrigger);
    }

    let mut ids = HashSet::with_capacity(nodes.len());
    for node in nodes {
        if !ids.insert(node.id.as_str()) {
            return Err(ValidationError::DuplicateNodeId(node.id.clone()));
        }
    }

    if let Some(edge) = edges
        .iter()
        .find(|e| !ids.contains(e.source.as_str()) || !ids.contains(e.target.as_str()))
    {
        return Err(ValidationError::UnknownEdgeEndpoint {
            from: edge.source.clone(),
            to: edge.target.clone(),
        });
    }

    if has_cycle(&build_graph(nodes, edges)) {
        return Err(ValidationError::CycleDetected);
    }

    if let Some(trigger) = nodes
        .iter()
        .filter(|n| n.is_trigger())
        .find(|n| edges.iter().any(|e| e.target == n.id))
    {
        return Err(ValidationError::TriggerHasIncomingEdge(trigger.id.clone()));
    }

    Ok(())
}

pub fn validate_definition(definition: &WorkflowDefinition) -> Result<(), ValidationError> {
    validate(&definition.nodes, &definition.edges)
}

/// Depth-first search with visited and recursion-stack sets. An edge into a
/// node still on the stack is a back-edge, i.e. a cycle.
fn has_cycle(graph: &DiGraph<usize, ()>) -> bool {
    let mut visited = vec![false; graph.node_count()];
    let mut on_stack = vec![false; graph.node_count()];

    for start in graph.node_indices() {
        if visited[start.index()] {
            continue;
        }

        visited[start.index()] = true;
        on_stack[start.index()] = true;
        let mut stack: Vec<(NodeIndex, Vec<NodeIndex>)> =
            vec![(start, graph.neighbors_directed(start, Direction::Outgoing).collect())];

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            match frame.1.pop() {
                Some(next) if on_stack[next.index()] => return true,
                Some(next) if !visited[next.index()] => {
                    visited[next.index()] = true;
                    on_stack[next.index()] = true;
                    let successors = graph.neighbors_directed(next, Direction::Outgoing).collect();
                    stack.push((next, successors));
                }
                Some(_) => {}
                None => {
                    on_stack[node.index()] = false;
                    stack.pop();
                }
            }
        }
    }

    false
}

/// Order nodes so every edge's source runs before its target (Kahn's
/// algorithm). Nodes that become ready together keep declaration order.
///
/// The graph must already have passed [`validate`]: with a cycle the result
/// silently omits every node whose in-degree never reaches zero.
pub fn order<'a>(nodes: &'a [NodeSpec], edges: &[Edge]) -> Vec<&'a NodeSpec> {
    let graph = build_graph(nodes, edges);

    let mut in_degree: Vec<usize> = graph
        .node_indices()
        .map(|idx| graph.neighbors_directed(idx, Direction::Incoming).count())
        .collect();

    let mut queue: VecDeque<NodeIndex> = graph
        .node_indices()
        .filter(|idx| in_degree[idx.index()] == 0)
        .collect();

    let mut ordered = Vec::with_capacity(nodes.len());
    while let Some(idx) = queue.pop_front() {
        ordered.push(&nodes[graph[idx]]);

        let mut ready = Vec::new();
        for succ in graph.neighbors_directed(idx, Direction::Outgoing) {
            let degree = &mut in_degree[succ.index()];
            *degree -= 1;
            if *degree == 0 {
                ready.push(succ);
            }
        }
        ready.sort_unstable();
        queue.extend(ready);
    }

    ordered
}
