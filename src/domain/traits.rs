// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer talks to data sources and classifiers
// through these traits, never through concrete loaders or
// burn models.
//
//   - PlanetoidLoader implements GraphSource
//   - Inferencer      implements NodeClassifier
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::graph::Graph;

// ─── GraphSource ──────────────────────────────────────────────────────────────
/// Anything that can produce a node-classification graph.
pub trait GraphSource {
    /// Load the full graph: features, labels and edges.
    fn load(&self) -> Result<Graph>;
}

// ─── NodeClassifier ───────────────────────────────────────────────────────────
/// A prediction for a single node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodePrediction {
    pub node:        usize,
    pub class:       usize,
    pub probability: f32,
}

/// Anything that can assign classes to nodes of a loaded graph.
pub trait NodeClassifier {
    /// Predict the class of every node in `nodes`, in order.
    fn predict(&self, nodes: &[usize]) -> Result<Vec<NodePrediction>>;

    /// Fraction of `nodes` whose predicted class equals its label.
    fn evaluate(&self, nodes: &[usize]) -> Result<f64>;
}
