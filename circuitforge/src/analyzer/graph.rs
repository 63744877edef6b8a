//! Circuit Graph
//!
//! Bipartite graph of component records and the nodes they touch, used by
//! the connectivity checks. Records are keyed by their position in the
//! netlist because references may repeat.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::Bfs;
use std::collections::{BTreeSet, HashMap};

use crate::parser::{Netlist, NodeId};

/// Vertex of the circuit graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphNode {
    /// Index into `Netlist::components`
    Component(usize),
    /// An electrical node
    Net(NodeId),
}

#[derive(Debug, Clone)]
pub struct CircuitGraph {
    graph: UnGraph<GraphNode, ()>,
    component_indices: Vec<NodeIndex>,
    net_indices: HashMap<NodeId, NodeIndex>,
}

impl CircuitGraph {
    pub fn from_netlist(netlist: &Netlist) -> Self {
        let mut graph = UnGraph::new_undirected();
        let mut net_indices: HashMap<NodeId, NodeIndex> = HashMap::new();
        let mut component_indices = Vec::with_capacity(netlist.components.len());

        for (position, record) in netlist.components.iter().enumerate() {
            let component = graph.add_node(GraphNode::Component(position));
            component_indices.push(component);

            for node in record.connected_nodes() {
                let net = *net_indices
                    .entry(node.clone())
                    .or_insert_with(|| graph.add_node(GraphNode::Net(node.clone())));
                if graph.find_edge(component, net).is_none() {
                    graph.add_edge(component, net, ());
                }
            }
        }

        Self {
            graph,
            component_indices,
            net_indices,
        }
    }

    pub fn component_count(&self) -> usize {
        self.component_indices.len()
    }

    pub fn net_count(&self) -> usize {
        self.net_indices.len()
    }

    /// Number of records attached to `node`
    pub fn degree(&self, node: &NodeId) -> usize {
        self.net_indices
            .get(node)
            .map(|idx| self.graph.neighbors(*idx).count())
            .unwrap_or(0)
    }

    /// Record positions reachable from `node` through shared nodes
    pub fn components_reachable_from(&self, node: &NodeId) -> BTreeSet<usize> {
        let mut reached = BTreeSet::new();
        let Some(start) = self.net_indices.get(node) else {
            return reached;
        };
        let mut bfs = Bfs::new(&self.graph, *start);
        while let Some(idx) = bfs.next(&self.graph) {
            if let Some(GraphNode::Component(position)) = self.graph.node_weight(idx) {
                reached.insert(*position);
            }
        }
        reached
    }

    /// Record positions sharing a node with record `position`
    pub fn neighbors_of(&self, position: usize) -> BTreeSet<usize> {
        let mut neighbors = BTreeSet::new();
        let Some(component) = self.component_indices.get(position) else {
            return neighbors;
        };
        for net in self.graph.neighbors(*component) {
            for other in self.graph.neighbors(net) {
                if let Some(GraphNode::Component(p)) = self.graph.node_weight(other) {
                    if *p != position {
                        neighbors.insert(*p);
                    }
                }
            }
        }
        neighbors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_graph_counts() {
        let netlist = parse("V1 1 0 9\nR1 1 2 1k\nC1 2 0 1u");
        let graph = CircuitGraph::from_netlist(&netlist);
        assert_eq!(graph.component_count(), 3);
        assert_eq!(graph.net_count(), 3);
        assert_eq!(graph.degree(&NodeId::ground()), 2);
        assert_eq!(graph.degree(&NodeId::new("2")), 2);
    }

    #[test]
    fn test_reachability_from_ground() {
        let netlist = parse("V1 1 0 9\nR1 1 0 1k\nR2 5 6 1k");
        let graph = CircuitGraph::from_netlist(&netlist);
        let reached = graph.components_reachable_from(&NodeId::ground());
        assert_eq!(reached.into_iter().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_neighbors() {
        let netlist = parse("V1 1 0 9\nR1 1 2 1k\nC1 2 0 1u\nR9 7 8 1");
        let graph = CircuitGraph::from_netlist(&netlist);
        assert_eq!(graph.neighbors_of(1).into_iter().collect::<Vec<_>>(), vec![0, 2]);
        assert!(graph.neighbors_of(3).is_empty());
    }

    #[test]
    fn test_floating_nodes_are_not_vertices() {
        let netlist = parse("R1\nR2");
        let graph = CircuitGraph::from_netlist(&netlist);
        assert_eq!(graph.net_count(), 0);
        assert!(graph.neighbors_of(0).is_empty());
    }
}
