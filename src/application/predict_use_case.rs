// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Reloads a finished training run and classifies nodes:
//
//   Step 1: Read train_config.json       (Layer 6 - infra)
//   Step 2: Rebuild the same graph       (Layer 4 - data)
//   Step 3: Load the best checkpoint     (Layer 5 - ml)
//
// With no explicit node list the saved test split is scored, so
// the number printed matches the test accuracy reported at the
// end of training.

use anyhow::{ensure, Result};

use crate::domain::graph::Graph;
use crate::domain::traits::{NodeClassifier, NodePrediction};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::load_classifier;

pub struct PredictUseCase {
    graph:      Graph,
    test_nodes: Vec<usize>,
    classifier: Box<dyn NodeClassifier>,
}

impl PredictUseCase {
    /// `data_dir` overrides the dataset location stored with the checkpoint.
    pub fn new(checkpoint_dir: &str, data_dir: Option<String>) -> Result<Self> {
        let ckpt    = CheckpointManager::new(checkpoint_dir);
        let mut cfg = ckpt.load_config()?;
        if let Some(dir) = data_dir {
            cfg.data_dir = dir;
        }

        let graph      = cfg.prepare_graph()?;
        let split = ckpt.load_split()?;
        ensure!(split.is_disjoint(), "Saved split reuses nodes across train/val/test");
        let test_nodes = split.test;
        let classifier = load_classifier(&ckpt, &graph, cfg.device)?;
        Ok(Self { graph, test_nodes, classifier })
    }

    /// Accuracy on the test nodes saved at training time.
    pub fn evaluate_test(&self) -> Result<f64> {
        ensure!(!self.test_nodes.is_empty(), "The saved split has no test nodes");
        self.classifier.evaluate(&self.test_nodes)
    }

    pub fn predict(&self, nodes: &[usize]) -> Result<Vec<NodePrediction>> {
        self.classifier.predict(nodes)
    }

    pub fn test_nodes(&self) -> &[usize] {
        &self.test_nodes
    }

    /// Paper id of a node, as written in the .content file.
    pub fn node_id(&self, node: usize) -> &str {
        self.graph.node_ids.get(node).map_or("?", String::as_str)
    }

    pub fn class_name(&self, class: usize) -> &str {
        self.graph.class_names.get(class).map_or("?", String::as_str)
    }

    pub fn true_label(&self, node: usize) -> Option<&str> {
        self.graph.labels.get(node).map(|&l| self.class_name(l))
    }
}
