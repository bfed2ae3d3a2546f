//! Strongly-connected component labelling (C7).
//!
//! Iterative Tarjan's algorithm, grounded on spec §4.7's explicit call-stack
//! framing (`(node, parent, phase)`) rather than the naive recursive
//! presentation — needed because the edge-based graph's depth can track the
//! length of the longest path in the road network, which easily exceeds a
//! thread's default stack.

use routing_core::{BuildObserver, ComponentId, EdgeBasedNodeId};

use crate::edge_based_graph::EdgeBasedGraph;

/// Per-node result of an SCC pass, handed back to the caller to merge onto
/// `EdgeBasedNode` records (the driver doesn't own those records itself).
#[derive(Clone, Debug)]
pub struct SccResult {
    pub component_of: Vec<ComponentId>,
    pub component_size: Vec<u32>,
    pub tiny_component_threshold: usize,
}

impl SccResult {
    pub fn belongs_to_tiny_component(&self, node: EdgeBasedNodeId) -> bool {
        let component = self.component_of[node.index()];
        (self.component_size[component.index()] as usize) < self.tiny_component_threshold
    }
}

#[derive(Copy, Clone, Eq, PartialEq)]
enum Phase {
    Pre,
    Post,
}

struct Frame {
    node: EdgeBasedNodeId,
    parent: EdgeBasedNodeId,
    phase: Phase,
}

pub struct SccDriver;

impl SccDriver {
    /// Tarjan's algorithm over the edge-based graph's adjacency, labelling
    /// every node with a component id and recording each component's size.
    pub fn compute(
        graph: &EdgeBasedGraph,
        tiny_component_threshold: usize,
        observer: &mut dyn BuildObserver,
    ) -> SccResult {
        let n = graph.nodes.len();

        // CSR adjacency built from the edge list; edges are keyed by
        // `EdgeBasedNodeId`, already dense 0..n (spec §4.5 step 1).
        let mut out_degree = vec![0u32; n];
        for e in &graph.edges {
            out_degree[e.source.index()] += 1;
        }
        let mut offsets = vec![0u32; n + 1];
        for i in 0..n {
            offsets[i + 1] = offsets[i] + out_degree[i];
        }
        let mut adjacency = vec![EdgeBasedNodeId::INVALID; offsets[n] as usize];
        let mut cursor = offsets.clone();
        for e in &graph.edges {
            let slot = cursor[e.source.index()];
            adjacency[slot as usize] = e.target;
            cursor[e.source.index()] += 1;
        }

        let mut index = vec![u32::MAX; n];
        let mut lowlink = vec![u32::MAX; n];
        let mut on_stack = vec![false; n];
        let mut tarjan_stack: Vec<EdgeBasedNodeId> = Vec::new();
        let mut component_of = vec![ComponentId::INVALID; n];
        let mut component_size: Vec<u32> = Vec::new();
        let mut next_index: u32 = 0;
        let mut labelled = 0usize;

        let mut call_stack: Vec<Frame> = Vec::new();

        for start in 0..n {
            let start_id = EdgeBasedNodeId(start as u32);
            if index[start] != u32::MAX {
                continue;
            }
            call_stack.push(Frame { node: start_id, parent: start_id, phase: Phase::Pre });

            while let Some(frame) = call_stack.pop() {
                let u = frame.node.index();

                match frame.phase {
                    Phase::Pre => {
                        if index[u] != u32::MAX {
                            // Already discovered via another path while
                            // queued; only the lowlink update (handled by
                            // the pusher) applies.
                            continue;
                        }
                        index[u] = next_index;
                        lowlink[u] = next_index;
                        next_index += 1;
                        on_stack[u] = true;
                        tarjan_stack.push(frame.node);
                        labelled += 1;
                        if labelled % 4096 == 0 {
                            observer.on_scc_progress(labelled, n);
                        }

                        call_stack.push(Frame { node: frame.node, parent: frame.parent, phase: Phase::Post });

                        let begin = offsets[u] as usize;
                        let end = offsets[u + 1] as usize;
                        for &v in &adjacency[begin..end] {
                            let v_idx = v.index();
                            if index[v_idx] == u32::MAX {
                                call_stack.push(Frame { node: v, parent: frame.node, phase: Phase::Pre });
                            } else if on_stack[v_idx] {
                                lowlink[u] = lowlink[u].min(index[v_idx]);
                            }
                        }
                    }
                    Phase::Post => {
                        let parent_idx = frame.parent.index();
                        if parent_idx != u {
                            lowlink[parent_idx] = lowlink[parent_idx].min(lowlink[u]);
                        }

                        if lowlink[u] == index[u] {
                            let component_id = ComponentId(component_size.len() as u32);
                            let mut size = 0u32;
                            loop {
                                let popped = tarjan_stack.pop().expect("open SCC must contain its root");
                                on_stack[popped.index()] = false;
                                component_of[popped.index()] = component_id;
                                size += 1;
                                if popped.index() == u {
                                    break;
                                }
                            }
                            component_size.push(size);
                        }
                    }
                }
            }
        }

        observer.on_scc_progress(n, n);

        SccResult { component_of, component_size, tiny_component_threshold }
    }
}
