// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Full-batch transductive training with per-layer Adam.
//
// Every epoch is a single optimisation step: the whole graph is
// propagated, but only the training nodes are scored.
//
//   1. forward on Autodiff<B>, loss on the train index
//   2. backward
//   3. split the gradients per layer (GradientsParams::from_module)
//   4. step each layer's own Adam with that layer's weight decay
//   5. model.valid() → inner backend, loss/accuracy on val index
//   6. save a checkpoint when validation improves
//
// Key Burn 0.20 insight:
//   - Dropout is only active on an autodiff backend, so the
//     validation pass on model.valid() is deterministic
//   - model.valid() lives on B::InnerBackend, so the validation
//     tensors are built on the inner backend too
//   - An optimizer only touches parameters present in the
//     GradientsParams it is given, so one optimizer per layer
//     applies exactly that layer's decay
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam
//            Kipf & Welling (2017) §5.1 (training setup)

use anyhow::{ensure, Result};
use burn::{
    module::AutodiffModule,
    optim::{decay::WeightDecayConfig, AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::{DeviceKind, TrainConfig};
use crate::data::dataset::GraphTensors;
use crate::domain::graph::{Graph, NodeSplit};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::model::{accuracy, GcnModel, ParamGroup};

/// Summary of a finished training run.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub best_epoch:    usize,
    pub best_val_acc:  f64,
    pub best_val_loss: f64,
    pub epochs_run:    usize,
    pub history:       Vec<EpochMetrics>,
    /// Filled in by the caller once the best checkpoint is scored on the test nodes
    pub test_acc:      Option<f64>,
}

/// Train on the backend selected in `cfg.device`.
pub fn run_training(
    cfg:   &TrainConfig,
    graph: &Graph,
    split: &NodeSplit,
    ckpt:  &CheckpointManager,
) -> Result<TrainReport> {
    let metrics = MetricsLogger::new(ckpt.dir())?;

    match cfg.device {
        DeviceKind::Wgpu => {
            let device = burn::backend::wgpu::WgpuDevice::default();
            tracing::info!("Using WGPU device: {:?}", device);
            fit::<burn::backend::Autodiff<burn::backend::Wgpu>>(cfg, graph, split, ckpt, &metrics, &device)
        }
        DeviceKind::NdArray => {
            let device = burn::backend::ndarray::NdArrayDevice::default();
            tracing::info!("Using NdArray device: {:?}", device);
            fit::<burn::backend::Autodiff<burn::backend::NdArray>>(cfg, graph, split, ckpt, &metrics, &device)
        }
    }
}

/// One Adam per parameter group. A zero decay disables the L2 term
/// instead of adding a no-op penalty.
fn build_optimizers<B: AutodiffBackend>(
    groups: &[ParamGroup],
) -> Vec<impl Optimizer<GcnModel<B>, B>> {
    groups
        .iter()
        .map(|g| {
            let decay = (g.weight_decay > 0.0)
                .then(|| WeightDecayConfig::new(g.weight_decay as f32));
            AdamConfig::new()
                .with_epsilon(1e-8)
                .with_weight_decay(decay)
                .init::<B, GcnModel<B>>()
        })
        .collect()
}

/// Split `grads` per layer and step each layer with its own optimizer.
/// `optimizers[i]` belongs to `model.layers()[i]`.
fn step_groups<B, O>(
    model:      GcnModel<B>,
    optimizers: &mut [O],
    mut grads:  B::Gradients,
    lr:         f64,
) -> GcnModel<B>
where
    B: AutodiffBackend,
    O: Optimizer<GcnModel<B>, B>,
{
    let layer_grads: Vec<GradientsParams> = model
        .layers()
        .map(|layer| GradientsParams::from_module(&mut grads, layer))
        .collect();

    let mut model = model;
    for (optim, g) in optimizers.iter_mut().zip(layer_grads) {
        model = optim.step(lr, model, g);
    }
    model
}

/// Train a freshly initialised model and keep the best checkpoint.
pub fn fit<B: AutodiffBackend>(
    cfg:     &TrainConfig,
    graph:   &Graph,
    split:   &NodeSplit,
    ckpt:    &CheckpointManager,
    metrics: &MetricsLogger,
    device:  &B::Device,
) -> Result<TrainReport> {
    cfg.validate()?;
    ensure!(!split.train.is_empty(), "No training nodes");
    ensure!(!split.val.is_empty(), "No validation nodes");
    ensure!(split.is_disjoint(), "Train, validation and test nodes overlap");

    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = cfg.model_config(graph.num_features(), graph.num_classes());
    let mut model: GcnModel<B> = model_cfg.init(device);

    let groups = model.param_groups();
    for g in &groups {
        tracing::info!(
            "Param group {}: {} params, weight_decay={}",
            g.layer, g.num_params, g.weight_decay
        );
    }
    let mut optimizers = build_optimizers::<B>(&groups);

    // ── Graph tensors: autodiff copy for training, inner copy for validation
    let train_t = GraphTensors::<B>::new(graph, split, device)?;
    let valid_t = GraphTensors::<B::InnerBackend>::new(graph, split, device)?;

    let mut history: Vec<EpochMetrics> = Vec::with_capacity(cfg.epochs);
    let mut best: Option<EpochMetrics> = None;
    let mut stale = 0usize;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {

        // ── Training step ─────────────────────────────────────────────────────
        let (loss, logits) = model.forward_loss(
            train_t.features.clone(),
            &train_t.adjacency,
            train_t.train.index.clone(),
            train_t.train.targets.clone(),
        );
        let train_loss: f64 = loss.clone().into_scalar().elem::<f64>();
        let train_acc       = accuracy(logits, train_t.train.targets.clone());

        model = step_groups(model, &mut optimizers, loss.backward(), cfg.lr);

        // ── Validation ────────────────────────────────────────────────────────
        let model_valid = model.valid();
        let (val_loss, val_logits) = model_valid.forward_loss(
            valid_t.features.clone(),
            &valid_t.adjacency,
            valid_t.val.index.clone(),
            valid_t.val.targets.clone(),
        );
        let val_loss: f64 = val_loss.into_scalar().elem::<f64>();
        let val_acc       = accuracy(val_logits, valid_t.val.targets.clone());

        let row = EpochMetrics { epoch, train_loss, train_acc, val_loss, val_acc };
        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | train_acc={:.1}% | val_loss={:.4} | val_acc={:.1}%",
            epoch, cfg.epochs, train_loss, train_acc * 100.0, val_loss, val_acc * 100.0,
        );
        metrics.log(&row)?;

        if row.improves_on(best.as_ref()) {
            ckpt.save_model(&model_valid, epoch)?;
            tracing::debug!("Validation improved at epoch {}", epoch);
            best  = Some(row.clone());
            stale = 0;
            history.push(row);
            continue;
        }

        stale += 1;
        history.push(row);
        if cfg.patience.is_some_and(|patience| stale >= patience) {
            tracing::info!("No improvement for {} epochs, stopping at epoch {}", stale, epoch);
            break;
        }
    }

    // The first epoch always improves on `None`, so `best` is set here
    let best = best.ok_or_else(|| anyhow::anyhow!("Training ran no epochs"))?;
    tracing::info!(
        "Training complete! Best epoch {} (val_acc={:.4}, val_loss={:.4})",
        best.epoch, best.val_acc, best.val_loss
    );

    Ok(TrainReport {
        best_epoch:    best.epoch,
        best_val_acc:  best.val_acc,
        best_val_loss: best.val_loss,
        epochs_run:    history.len(),
        history,
        test_acc:      None,
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::activation::Activation;
    use crate::domain::graph::EdgeList;
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = Autodiff<NdArray>;

    /// Two 4-node cliques joined by one edge. Features are a noisy
    /// one-hot of the clique, so the classes are easy to separate.
    fn two_cliques() -> Graph {
        let mut pairs = Vec::new();
        for base in [0, 4] {
            for i in 0..4 {
                for j in (i + 1)..4 {
                    pairs.push((base + i, base + j));
                }
            }
        }
        pairs.push((3, 4));
        let edges = crate::data::preprocessor::Preprocessor::new()
            .normalize_adjacency(&EdgeList::from_pairs(&pairs).to_undirected(), 8);

        let labels: Vec<usize> = (0..8).map(|i| i / 4).collect();
        let features = labels
            .iter()
            .enumerate()
            .map(|(i, &l)| {
                let noise = (i % 3) as f32 * 0.1;
                if l == 0 { vec![1.0, noise, 0.0] } else { vec![noise, 1.0, 0.0] }
            })
            .collect();

        Graph {
            node_ids:    (0..8).map(|i| i.to_string()).collect(),
            features,
            labels,
            class_names: vec!["left".into(), "right".into()],
            edges,
        }
    }

    fn split() -> NodeSplit {
        NodeSplit { train: vec![0, 5], val: vec![1, 2, 6, 7], test: vec![3, 4] }
    }

    fn config(dir: &std::path::Path) -> TrainConfig {
        TrainConfig {
            checkpoint_dir: dir.to_string_lossy().into_owned(),
            hiddens:        vec![8],
            activations:    vec![Activation::Relu],
            dropout:        0.0,
            lr:             0.05,
            epochs:         40,
            patience:       None,
            device:         DeviceKind::NdArray,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_training_reduces_loss_and_checkpoints() {
        let dir     = tempfile::tempdir().unwrap();
        let cfg     = config(dir.path());
        let ckpt    = CheckpointManager::new(dir.path());
        let metrics = MetricsLogger::new(dir.path()).unwrap();

        let report = fit::<TestBackend>(&cfg, &two_cliques(), &split(), &ckpt, &metrics, &Default::default())
            .unwrap();

        assert_eq!(report.epochs_run, 40);
        let first = report.history.first().unwrap().train_loss;
        let last  = report.history.last().unwrap().train_loss;
        assert!(last < first, "loss went from {first} to {last}");
        assert!(report.best_val_acc >= 0.5);
        assert_eq!(ckpt.best_epoch().unwrap(), report.best_epoch);

        let csv = std::fs::read_to_string(metrics.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 41);
    }

    #[test]
    fn test_patience_stops_when_nothing_changes() {
        let dir     = tempfile::tempdir().unwrap();
        // lr = 0 leaves the weights untouched, so validation never improves
        let cfg     = TrainConfig { lr: 0.0, patience: Some(2), ..config(dir.path()) };
        let ckpt    = CheckpointManager::new(dir.path());
        let metrics = MetricsLogger::new(dir.path()).unwrap();

        let report = fit::<TestBackend>(&cfg, &two_cliques(), &split(), &ckpt, &metrics, &Default::default())
            .unwrap();

        assert_eq!(report.best_epoch, 1);
        assert_eq!(report.epochs_run, 3);
    }

    #[test]
    fn test_zero_patience_rejected() {
        let dir     = tempfile::tempdir().unwrap();
        let cfg     = TrainConfig { patience: Some(0), ..config(dir.path()) };
        let ckpt    = CheckpointManager::new(dir.path());
        let metrics = MetricsLogger::new(dir.path()).unwrap();

        let err = fit::<TestBackend>(&cfg, &two_cliques(), &split(), &ckpt, &metrics, &Default::default())
            .unwrap_err();
        assert!(err.to_string().contains("patience"), "{err}");
    }

    #[test]
    fn test_patience_counts_only_stale_epochs() {
        let dir     = tempfile::tempdir().unwrap();
        let cfg     = TrainConfig { lr: 0.0, patience: Some(1), ..config(dir.path()) };
        let ckpt    = CheckpointManager::new(dir.path());
        let metrics = MetricsLogger::new(dir.path()).unwrap();

        let report = fit::<TestBackend>(&cfg, &two_cliques(), &split(), &ckpt, &metrics, &Default::default())
            .unwrap();

        // Epoch 1 improves and must not stop the run; epoch 2 is stale
        assert_eq!(report.best_epoch, 1);
        assert_eq!(report.epochs_run, 2);
    }

    #[test]
    fn test_weight_decay_applies_to_hidden_layers_only() {
        use crate::ml::conv::Adjacency;
        use crate::ml::model::GcnConfig;

        let device = Default::default();
        let cfg    = GcnConfig::new(3, 2, vec![4, 4], vec![Activation::Tanh, Activation::Tanh])
            .with_dropout(0.0)
            .with_weight_decay(0.5);
        let model: GcnModel<TestBackend> = cfg.init(&device);
        let mut optimizers = build_optimizers::<TestBackend>(&model.param_groups());

        let graph = two_cliques();
        let adj   = Adjacency::from_edges(&graph.edges, 8, &device).unwrap();
        let x     = crate::data::dataset::feature_tensor::<TestBackend>(&graph, &device).unwrap();
        let index = Tensor::<TestBackend, 1, Int>::from_ints([0, 1, 2, 3, 4, 5, 6, 7], &device);

        // A zero loss still produces (zero) gradients for every parameter,
        // so any movement comes from the decay term alone
        let loss  = model.forward(x, &adj, index).sum().mul_scalar(0.0);
        let grads = loss.backward();

        let weights = |m: &GcnModel<TestBackend>| -> Vec<Vec<f32>> {
            m.layers()
                .map(|l| l.linear.weight.val().into_data().convert::<f32>().to_vec::<f32>().unwrap())
                .collect()
        };
        let before = weights(&model);
        let model  = step_groups(model, &mut optimizers, grads, 0.1);
        let after  = weights(&model);

        assert_ne!(after[0], before[0], "first hidden layer should decay");
        assert_ne!(after[1], before[1], "second hidden layer should decay");
        assert_eq!(after[2], before[2], "output layer must not decay");
    }

    #[test]
    fn test_overlapping_split_rejected() {
        let dir     = tempfile::tempdir().unwrap();
        let cfg     = config(dir.path());
        let ckpt    = CheckpointManager::new(dir.path());
        let metrics = MetricsLogger::new(dir.path()).unwrap();
        let split   = NodeSplit { train: vec![0, 5], val: vec![5, 6], test: vec![3] };

        assert!(fit::<TestBackend>(&cfg, &two_cliques(), &split, &ckpt, &metrics, &Default::default()).is_err());
    }

    #[test]
    fn test_empty_validation_rejected() {
        let dir     = tempfile::tempdir().unwrap();
        let cfg     = config(dir.path());
        let ckpt    = CheckpointManager::new(dir.path());
        let metrics = MetricsLogger::new(dir.path()).unwrap();
        let split   = NodeSplit { train: vec![0], val: vec![], test: vec![] };

        assert!(fit::<TestBackend>(&cfg, &two_cliques(), &split, &ckpt, &metrics, &Default::default()).is_err());
    }
}
