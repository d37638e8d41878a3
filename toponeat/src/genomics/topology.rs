use super::ConnectionGene;
use crate::NodeId;

use std::collections::VecDeque;

/// Adjacency lists over a genome's enabled genes,
/// indexed by node id.
#[derive(Clone, Debug, Default)]
pub(crate) struct EnabledGraph {
    successors: Vec<Vec<NodeId>>,
}

impl EnabledGraph {
    pub(crate) fn from_genes(genes: &[ConnectionGene]) -> EnabledGraph {
        let mut graph = EnabledGraph::default();
        for gene in genes.iter().filter(|g| g.enabled()) {
            graph.add_edge(gene.input(), gene.output());
        }
        graph
    }

    pub(crate) fn add_edge(&mut self, input: NodeId, output: NodeId) {
        let slots = input.max(output) + 1;
        if self.successors.len() < slots {
            self.successors.resize_with(slots, Vec::new);
        }
        self.successors[input].push(output);
    }

    fn successors(&self, node: NodeId) -> &[NodeId] {
        self.successors.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns whether `to` can be reached from `from`
    /// following enabled genes. A node reaches itself.
    pub(crate) fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        if from == to {
            return true;
        }
        let mut visited = vec![false; self.successors.len().max(from + 1)];
        let mut stack = vec![from];
        visited[from] = true;
        while let Some(node) = stack.pop() {
            for &next in self.successors(node) {
                if next == to {
                    return true;
                }
                if !visited[next] {
                    visited[next] = true;
                    stack.push(next);
                }
            }
        }
        false
    }

    /// Marks every node reachable from `from`, including
    /// `from` itself. The returned vector has at least
    /// `slots` entries.
    pub(crate) fn reachable_from(&self, from: NodeId, slots: usize) -> Vec<bool> {
        let mut visited = vec![false; slots.max(self.successors.len()).max(from + 1)];
        let mut stack = vec![from];
        visited[from] = true;
        while let Some(node) = stack.pop() {
            for &next in self.successors(node) {
                if !visited[next] {
                    visited[next] = true;
                    stack.push(next);
                }
            }
        }
        visited
    }
}

/// Evaluation order of a genome's nodes, computed once
/// and cached until the genome's structure changes.
#[derive(Clone, Debug)]
pub(crate) struct Topology {
    /// One past the highest node id in the genome.
    slots: usize,
    /// Non-input nodes, each after all of its enabled sources.
    order: Vec<NodeId>,
    /// Indices of enabled genes feeding each node.
    incoming: Vec<Vec<usize>>,
    graph: EnabledGraph,
}

impl Topology {
    /// Builds the topology of the given genes. Returns `None`
    /// if the enabled genes contain a cycle.
    pub(crate) fn build(
        input_count: usize,
        output_count: usize,
        genes: &[ConnectionGene],
    ) -> Option<Topology> {
        let io_count = input_count + output_count;
        let slots = genes
            .iter()
            .map(|g| g.input().max(g.output()) + 1)
            .fold(io_count, usize::max);

        let mut present = vec![false; slots];
        present[..io_count].iter_mut().for_each(|p| *p = true);
        let mut incoming = vec![Vec::new(); slots];
        let mut in_degree = vec![0usize; slots];
        for (index, gene) in genes.iter().enumerate() {
            present[gene.input()] = true;
            present[gene.output()] = true;
            if gene.enabled() {
                incoming[gene.output()].push(index);
                in_degree[gene.output()] += 1;
            }
        }
        let graph = EnabledGraph::from_genes(genes);

        // Kahn's algorithm.
        let mut queue: VecDeque<NodeId> = (0..slots)
            .filter(|&n| present[n] && in_degree[n] == 0)
            .collect();
        let mut visited = 0;
        let mut order = Vec::with_capacity(slots);
        while let Some(node) = queue.pop_front() {
            visited += 1;
            if node >= input_count {
                order.push(node);
            }
            for &next in graph.successors(node) {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    queue.push_back(next);
                }
            }
        }

        let present_count = present.iter().filter(|p| **p).count();
        if visited < present_count {
            return None;
        }

        Some(Topology {
            slots,
            order,
            incoming,
            graph,
        })
    }

    pub(crate) fn slots(&self) -> usize {
        self.slots
    }

    pub(crate) fn order(&self) -> &[NodeId] {
        &self.order
    }

    pub(crate) fn incoming(&self, node: NodeId) -> &[usize] {
        &self.incoming[node]
    }

    pub(crate) fn graph(&self) -> &EnabledGraph {
        &self.graph
    }
}
