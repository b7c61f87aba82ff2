//! Graph view of an extracted schematic.
//!
//! A bipartite petgraph `DiGraph` with component and net nodes and one edge
//! per pin connection. The extraction result is a flat list; the graph makes
//! connectivity queries (neighbors of a part, parts on a net) cheap.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;

use crate::model::{Component, Net, Schematic};

#[derive(Debug, Clone)]
pub enum CircuitNode {
    Component(Component),
    Net(Net),
}

impl CircuitNode {
    pub fn as_component(&self) -> Option<&Component> {
        match self {
            CircuitNode::Component(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_net(&self) -> Option<&Net> {
        match self {
            CircuitNode::Net(n) => Some(n),
            _ => None,
        }
    }
}

/// Edge weight: the pin (on the component side) making the connection.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitEdge {
    pub pin_name: String,
}

#[derive(Debug, Clone)]
pub struct CircuitGraph {
    graph: DiGraph<CircuitNode, CircuitEdge>,
    component_indices: HashMap<String, NodeIndex>,
    /// Named nets only; anonymous nets are reachable through edges.
    net_indices: HashMap<String, NodeIndex>,
}

impl CircuitGraph {
    pub fn from_schematic(sch: &Schematic) -> Self {
        let mut graph = DiGraph::new();
        let mut component_indices = HashMap::new();
        let mut net_indices = HashMap::new();

        for component in &sch.components {
            let idx = graph.add_node(CircuitNode::Component(component.clone()));
            component_indices.insert(component.reference.clone(), idx);
        }

        for net in &sch.nets {
            let net_idx = graph.add_node(CircuitNode::Net(net.clone()));
            if let Some(name) = &net.name {
                net_indices.entry(name.clone()).or_insert(net_idx);
            }
            for conn in &net.connections {
                if let Some(&comp_idx) = component_indices.get(&conn.component_ref) {
                    let edge = CircuitEdge { pin_name: conn.pin_name.clone() };
                    graph.add_edge(comp_idx, net_idx, edge);
                }
            }
        }

        Self { graph, component_indices, net_indices }
    }

    pub fn component(&self, reference: &str) -> Option<&Component> {
        self.component_indices
            .get(reference)
            .and_then(|&idx| self.graph.node_weight(idx))
            .and_then(CircuitNode::as_component)
    }

    pub fn net(&self, name: &str) -> Option<&Net> {
        self.net_indices
            .get(name)
            .and_then(|&idx| self.graph.node_weight(idx))
            .and_then(CircuitNode::as_net)
    }

    /// All nets a component touches, anonymous ones included.
    pub fn nets_for_component(&self, reference: &str) -> Vec<&Net> {
        let Some(&comp_idx) = self.component_indices.get(reference) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(comp_idx, Direction::Outgoing)
            .filter_map(|edge| {
                self.graph
                    .node_weight(edge.target())
                    .and_then(CircuitNode::as_net)
            })
            .collect()
    }

    pub fn components_on_net(&self, name: &str) -> Vec<&Component> {
        let Some(&net_idx) = self.net_indices.get(name) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(net_idx, Direction::Incoming)
            .filter_map(|edge| {
                self.graph
                    .node_weight(edge.source())
                    .and_then(CircuitNode::as_component)
            })
            .collect()
    }

    /// References sharing at least one net with `reference`, sorted and
    /// deduplicated, the component itself excluded.
    pub fn neighbors(&self, reference: &str) -> Vec<String> {
        let mut refs: Vec<String> = self
            .nets_for_component(reference)
            .iter()
            .flat_map(|net| net.connected_refs())
            .filter(|r| *r != reference)
            .map(str::to_string)
            .collect();
        refs.sort();
        refs.dedup();
        refs
    }

    pub fn stats(&self) -> CircuitStats {
        CircuitStats {
            component_count: self.component_indices.len(),
            net_count: self
                .graph
                .node_weights()
                .filter(|n| n.as_net().is_some())
                .count(),
            connection_count: self.graph.edge_count(),
            power_net_count: self
                .graph
                .node_weights()
                .filter_map(CircuitNode::as_net)
                .filter(|n| n.is_power)
                .count(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CircuitStats {
    pub component_count: usize,
    pub net_count: usize,
    pub connection_count: usize,
    pub power_net_count: usize,
}
