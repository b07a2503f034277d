// ============================================================
// Layer 4 — Graph Tensors
// ============================================================
// Turns the host-side Graph + NodeSplit into burn tensors:
//
//   features   [N, F]   float
//   adjacency  [N, N]   cached propagation operator
//   train/val/test      NodeSet = (index [K], targets [K])
//
// GCN training is full-batch: the whole graph is the only
// "batch", so instead of a Dataset/Batcher pair the graph is
// converted once and the split index tensors pick out which rows
// each phase scores.
//
// Reference: Burn Book §4 (Datasets)

use anyhow::{ensure, Result};
use burn::prelude::*;

use crate::domain::graph::{Graph, NodeSplit};
use crate::ml::conv::Adjacency;

/// Node indices and their labels, as tensors.
#[derive(Debug, Clone)]
pub struct NodeSet<B: Backend> {
    pub index:   Tensor<B, 1, Int>,
    pub targets: Tensor<B, 1, Int>,
    pub len:     usize,
}

impl<B: Backend> NodeSet<B> {
    pub fn new(nodes: &[usize], labels: &[usize], device: &B::Device) -> Result<Self> {
        if let Some(&bad) = nodes.iter().find(|&&n| n >= labels.len()) {
            anyhow::bail!("Node {} is out of range for {} nodes", bad, labels.len());
        }
        let index: Vec<i32>   = nodes.iter().map(|&n| n as i32).collect();
        let targets: Vec<i32> = nodes.iter().map(|&n| labels[n] as i32).collect();
        Ok(Self {
            index:   Tensor::<B, 1, Int>::from_ints(index.as_slice(), device),
            targets: Tensor::<B, 1, Int>::from_ints(targets.as_slice(), device),
            len:     nodes.len(),
        })
    }
}

/// Row-major `[N, F]` feature matrix of `graph` on `device`.
pub fn feature_tensor<B: Backend>(graph: &Graph, device: &B::Device) -> Result<Tensor<B, 2>> {
    let n = graph.num_nodes();
    let f = graph.num_features();
    ensure!(n > 0 && f > 0, "Graph has {} nodes and {} features", n, f);
    Ok(Tensor::<B, 1>::from_floats(graph.flat_features().as_slice(), device).reshape([n, f]))
}

/// A whole graph on one device.
#[derive(Debug, Clone)]
pub struct GraphTensors<B: Backend> {
    pub features:  Tensor<B, 2>,
    pub adjacency: Adjacency<B>,
    pub train:     NodeSet<B>,
    pub val:       NodeSet<B>,
    pub test:      NodeSet<B>,
}

impl<B: Backend> GraphTensors<B> {
    pub fn new(graph: &Graph, split: &NodeSplit, device: &B::Device) -> Result<Self> {
        let features  = feature_tensor(graph, device)?;
        let adjacency = Adjacency::from_edges(&graph.edges, graph.num_nodes(), device)?;

        Ok(Self {
            features,
            adjacency,
            train: NodeSet::new(&split.train, &graph.labels, device)?,
            val:   NodeSet::new(&split.val,   &graph.labels, device)?,
            test:  NodeSet::new(&split.test,  &graph.labels, device)?,
        })
    }
}
