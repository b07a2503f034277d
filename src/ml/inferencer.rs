// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Rebuilds the layer stack from train_config.json, loads the
// best weights, and classifies nodes of the (preprocessed) graph.
//
// GCN inference is transductive: a prediction for one node still
// propagates over the whole graph, so the features and the
// adjacency are kept on the device and only the requested rows
// are selected at the end of the forward pass.
//
// Runs on a plain (non-autodiff) backend, so dropout is off.

use anyhow::{bail, Result};
use burn::{prelude::*, tensor::activation::softmax};

use crate::application::train_use_case::DeviceKind;
use crate::data::dataset::{feature_tensor, NodeSet};
use crate::domain::graph::Graph;
use crate::domain::traits::{NodeClassifier, NodePrediction};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::conv::Adjacency;
use crate::ml::model::{accuracy, GcnModel};

pub struct Inferencer<B: Backend> {
    model:     GcnModel<B>,
    features:  Tensor<B, 2>,
    adjacency: Adjacency<B>,
    labels:    Vec<usize>,
    device:    B::Device,
}

impl<B: Backend> Inferencer<B> {
    pub fn from_checkpoint(ckpt: &CheckpointManager, graph: &Graph, device: &B::Device) -> Result<Self> {
        let cfg       = ckpt.load_config()?;
        let model_cfg = cfg.model_config(graph.num_features(), graph.num_classes());
        let model     = ckpt.load_model(model_cfg.init::<B>(device), device)?;
        tracing::info!("Model loaded from checkpoint ({} layers)", model.depth());
        Self::new(model, graph, device)
    }

    pub fn new(model: GcnModel<B>, graph: &Graph, device: &B::Device) -> Result<Self> {
        Ok(Self {
            model,
            features:  feature_tensor(graph, device)?,
            adjacency: Adjacency::from_edges(&graph.edges, graph.num_nodes(), device)?,
            labels:    graph.labels.clone(),
            device:    device.clone(),
        })
    }

    fn node_set(&self, nodes: &[usize]) -> Result<NodeSet<B>> {
        NodeSet::new(nodes, &self.labels, &self.device)
    }

    fn logits(&self, set: &NodeSet<B>) -> Tensor<B, 2> {
        self.model.forward(self.features.clone(), &self.adjacency, set.index.clone())
    }
}

impl<B: Backend> NodeClassifier for Inferencer<B> {
    fn predict(&self, nodes: &[usize]) -> Result<Vec<NodePrediction>> {
        if nodes.is_empty() {
            return Ok(Vec::new());
        }
        let set   = self.node_set(nodes)?;
        let probs = softmax(self.logits(&set), 1);

        let classes: Vec<i64> = probs
            .clone()
            .argmax(1)
            .flatten::<1>(0, 1)
            .into_data()
            .convert::<i64>()
            .to_vec::<i64>()
            .map_err(|e| anyhow::anyhow!("Cannot read predicted classes: {e:?}"))?;
        let confidence: Vec<f32> = probs
            .max_dim(1)
            .flatten::<1>(0, 1)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Cannot read probabilities: {e:?}"))?;

        Ok(nodes
            .iter()
            .zip(classes)
            .zip(confidence)
            .map(|((&node, class), probability)| NodePrediction {
                node,
                class: class as usize,
                probability,
            })
            .collect())
    }

    fn evaluate(&self, nodes: &[usize]) -> Result<f64> {
        if nodes.is_empty() {
            bail!("No nodes to evaluate");
        }
        let set = self.node_set(nodes)?;
        Ok(accuracy(self.logits(&set), set.targets.clone()))
    }
}

/// Load the saved model on the requested backend.
pub fn load_classifier(
    ckpt:   &CheckpointManager,
    graph:  &Graph,
    device: DeviceKind,
) -> Result<Box<dyn NodeClassifier>> {
    Ok(match device {
        DeviceKind::Wgpu => Box::new(Inferencer::<burn::backend::Wgpu>::from_checkpoint(
            ckpt, graph, &burn::backend::wgpu::WgpuDevice::default(),
        )?),
        DeviceKind::NdArray => Box::new(Inferencer::<burn::backend::NdArray>::from_checkpoint(
            ckpt, graph, &burn::backend::ndarray::NdArrayDevice::default(),
        )?),
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::activation::Activation;
    use crate::domain::graph::EdgeList;
    use crate::ml::model::GcnConfig;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn graph() -> Graph {
        Graph {
            node_ids:    (0..4).map(|i| format!("n{i}")).collect(),
            features:    vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0], vec![0.5, 0.0]],
            labels:      vec![0, 1, 2, 0],
            class_names: vec!["a".into(), "b".into(), "c".into()],
            edges:       EdgeList::from_pairs(&[(0, 1), (1, 2), (2, 3), (3, 0)]).to_undirected(),
        }
    }

    fn inferencer() -> Inferencer<TestBackend> {
        let device = Default::default();
        let model  = GcnConfig::new(2, 3, vec![4], vec![Activation::Tanh]).init::<TestBackend>(&device);
        Inferencer::new(model, &graph(), &device).unwrap()
    }

    #[test]
    fn test_predictions_in_request_order() {
        let inf   = inferencer();
        let preds = inf.predict(&[3, 1]).unwrap();
        assert_eq!(preds.len(), 2);
        assert_eq!(preds[0].node, 3);
        assert_eq!(preds[1].node, 1);
        for p in &preds {
            assert!(p.class < 3);
            // The arg-max of three probabilities is at least a third
            assert!(p.probability >= 1.0 / 3.0 - 1e-6 && p.probability <= 1.0);
        }
    }

    #[test]
    fn test_evaluate_matches_predictions() {
        let inf     = inferencer();
        let nodes   = [0, 1, 2, 3];
        let preds   = inf.predict(&nodes).unwrap();
        let correct = preds.iter().filter(|p| p.class == graph().labels[p.node]).count();
        let acc     = inf.evaluate(&nodes).unwrap();
        assert!((acc - correct as f64 / 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_bad_requests() {
        let inf = inferencer();
        assert!(inf.predict(&[]).unwrap().is_empty());
        assert!(inf.predict(&[9]).is_err());
        assert!(inf.evaluate(&[]).is_err());
    }

    #[test]
    fn test_loads_trained_checkpoint() {
        use crate::application::train_use_case::TrainConfig;

        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path());
        let device = Default::default();
        let cfg    = TrainConfig {
            hiddens:     vec![4],
            activations: vec![Activation::Tanh],
            ..TrainConfig::default()
        };
        let model = cfg.model_config(2, 3).init::<TestBackend>(&device);
        ckpt.save_config(&cfg).unwrap();
        ckpt.save_model(&model, 1).unwrap();

        let direct = Inferencer::new(model, &graph(), &device).unwrap();
        let loaded = Inferencer::<TestBackend>::from_checkpoint(&ckpt, &graph(), &device).unwrap();
        assert_eq!(direct.predict(&[0, 2]).unwrap(), loaded.predict(&[0, 2]).unwrap());
    }
}
