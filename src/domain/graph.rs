// ============================================================
// Layer 3 — Graph Domain Types
// ============================================================
// A node-classification graph in host memory:
//
//   Graph
//     ├── node_ids     original identifiers from the dataset
//     ├── features     one feature vector per node   [N][F]
//     ├── labels       one class index per node      [N]
//     ├── class_names  label index → dataset label
//     └── edges        EdgeList (src → dst, optional weight)
//
// Connectivity is kept as an edge list rather than a matrix:
// that is how citation datasets are distributed, and it lets
// the preprocessor rewrite weights (normalisation) before the
// ML layer turns the list into a propagation operator.
//
// Reference: Kipf & Welling (2017) Semi-Supervised Classification
//            with Graph Convolutional Networks

use std::collections::HashSet;

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

// ─── EdgeList ─────────────────────────────────────────────────────────────────
/// Directed edges `sources[k] → targets[k]` with an optional weight each.
/// A missing weight vector means every edge weighs 1.0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeList {
    pub sources: Vec<usize>,
    pub targets: Vec<usize>,
    pub weights: Option<Vec<f32>>,
}

impl EdgeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an unweighted edge list from `(src, dst)` pairs.
    pub fn from_pairs(pairs: &[(usize, usize)]) -> Self {
        let (sources, targets) = pairs.iter().copied().unzip();
        Self { sources, targets, weights: None }
    }

    /// Build a weighted edge list from `(src, dst, weight)` triples.
    pub fn from_weighted(triples: &[(usize, usize, f32)]) -> Self {
        let mut edges = Self::new();
        edges.weights = Some(Vec::with_capacity(triples.len()));
        for &(s, t, w) in triples {
            edges.push(s, t, Some(w));
        }
        edges
    }

    /// Append one edge. A weight given to an unweighted list turns it
    /// into a weighted one (earlier edges get 1.0).
    pub fn push(&mut self, source: usize, target: usize, weight: Option<f32>) {
        self.sources.push(source);
        self.targets.push(target);
        match (&mut self.weights, weight) {
            (Some(ws), w) => ws.push(w.unwrap_or(1.0)),
            (None, Some(w)) => {
                let mut ws = vec![1.0; self.sources.len() - 1];
                ws.push(w);
                self.weights = Some(ws);
            }
            (None, None) => {}
        }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Weight of edge `k` (1.0 when the list is unweighted)
    pub fn weight(&self, k: usize) -> f32 {
        self.weights.as_ref().map_or(1.0, |ws| ws[k])
    }

    /// Iterate `(src, dst, weight)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        (0..self.len()).map(move |k| (self.sources[k], self.targets[k], self.weight(k)))
    }

    pub fn has_self_loops(&self) -> bool {
        self.sources.iter().zip(&self.targets).any(|(s, t)| s == t)
    }

    /// Add the reverse of every edge and drop repeated `(src, dst)` pairs.
    /// The first occurrence of a pair keeps its weight.
    pub fn to_undirected(&self) -> EdgeList {
        let mut seen = HashSet::with_capacity(self.len() * 2);
        let mut out  = EdgeList::new();
        if self.weights.is_some() {
            out.weights = Some(Vec::with_capacity(self.len() * 2));
        }

        for (s, t, w) in self.iter() {
            let weight = self.weights.as_ref().map(|_| w);
            for (a, b) in [(s, t), (t, s)] {
                if seen.insert((a, b)) {
                    out.push(a, b, weight);
                }
            }
        }
        out
    }

    /// Check every endpoint lies in `0..num_nodes` and the weight vector,
    /// if any, has one entry per edge.
    pub fn validate(&self, num_nodes: usize) -> Result<()> {
        ensure!(
            self.sources.len() == self.targets.len(),
            "Edge list has {} sources but {} targets",
            self.sources.len(),
            self.targets.len()
        );
        if let Some(ws) = &self.weights {
            ensure!(
                ws.len() == self.len(),
                "Edge list has {} edges but {} weights",
                self.len(),
                ws.len()
            );
        }
        if let Some((s, t, _)) = self.iter().find(|&(s, t, _)| s >= num_nodes || t >= num_nodes) {
            anyhow::bail!("Edge {} → {} is out of range for {} nodes", s, t, num_nodes);
        }
        Ok(())
    }
}

// ─── Graph ────────────────────────────────────────────────────────────────────
/// A fully loaded node-classification dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    pub node_ids:    Vec<String>,
    pub features:    Vec<Vec<f32>>,
    pub labels:      Vec<usize>,
    pub class_names: Vec<String>,
    pub edges:       EdgeList,
}

impl Graph {
    pub fn num_nodes(&self) -> usize {
        self.features.len()
    }

    pub fn num_features(&self) -> usize {
        self.features.first().map_or(0, |f| f.len())
    }

    pub fn num_classes(&self) -> usize {
        self.class_names.len()
    }

    /// Check the graph is internally consistent: equal-width feature rows,
    /// one label per node, labels below `num_classes`, edges in range.
    pub fn validate(&self) -> Result<()> {
        let n = self.num_nodes();
        let f = self.num_features();
        ensure!(n > 0, "Graph has no nodes");
        ensure!(self.labels.len() == n, "Graph has {} nodes but {} labels", n, self.labels.len());
        ensure!(self.node_ids.len() == n, "Graph has {} nodes but {} ids", n, self.node_ids.len());
        if let Some(row) = self.features.iter().position(|r| r.len() != f) {
            anyhow::bail!("Node {} has {} features, expected {}", row, self.features[row].len(), f);
        }
        if let Some(&bad) = self.labels.iter().find(|&&l| l >= self.num_classes()) {
            anyhow::bail!("Label {} is out of range for {} classes", bad, self.num_classes());
        }
        self.edges.validate(n)
    }

    /// Row-major copy of the feature matrix, `[N * F]`.
    pub fn flat_features(&self) -> Vec<f32> {
        self.features.iter().flatten().copied().collect()
    }
}

// ─── NodeSplit ────────────────────────────────────────────────────────────────
/// Disjoint node index sets for transductive training.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSplit {
    pub train: Vec<usize>,
    pub val:   Vec<usize>,
    pub test:  Vec<usize>,
}

impl NodeSplit {
    pub fn is_disjoint(&self) -> bool {
        let mut seen = HashSet::new();
        self.train.iter().chain(&self.val).chain(&self.test).all(|i| seen.insert(*i))
    }
}
