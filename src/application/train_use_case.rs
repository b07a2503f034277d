// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the citation graph      (Layer 4 - data)
//   Step 2: Normalise features/adjacency (Layer 4 - data)
//   Step 3: Split train/val/test nodes   (Layer 4 - data)
//   Step 4: Save config and split        (Layer 6 - infra)
//   Step 5: Run training loop            (Layer 5 - ml)
//   Step 6: Score the best checkpoint    (Layer 5 - ml)
//           on the test nodes
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    loader::PlanetoidLoader,
    preprocessor::Preprocessor,
    splitter::split_per_class,
};
use crate::domain::{activation::Activation, graph::Graph, traits::GraphSource};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    inferencer::load_classifier,
    model::GcnConfig,
    trainer::{run_training, TrainReport},
};

/// Burn backend a run executes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// GPU through wgpu
    Wgpu,
    /// CPU
    NdArray,
}

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Serialisable so it can be saved to disk and reloaded for inference:
// the predict command rebuilds the graph and the layer stack from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:           String,
    /// File stem of the dataset, e.g. "cora" for cora.content / cora.cites
    pub dataset:            String,
    pub checkpoint_dir:     String,
    pub hiddens:            Vec<usize>,
    pub activations:        Vec<Activation>,
    pub dropout:            f64,
    pub weight_decay:       f64,
    pub lr:                 f64,
    pub epochs:             usize,
    /// Stop after this many epochs without validation improvement
    pub patience:           Option<usize>,
    pub use_bias:           bool,
    pub train_per_class:    usize,
    pub num_val:            usize,
    pub num_test:           usize,
    pub seed:               u64,
    pub normalize_features: bool,
    /// Weight of the self loop added to every node before normalisation
    pub self_loop:          f32,
    /// Keep citations one-way instead of symmetrising them
    pub directed:           bool,
    pub device:             DeviceKind,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:           "data/cora".to_string(),
            dataset:            "cora".to_string(),
            checkpoint_dir:     "checkpoints".to_string(),
            hiddens:            vec![16],
            activations:        vec![Activation::Relu],
            dropout:            0.5,
            weight_decay:       5e-4,
            lr:                 0.01,
            epochs:             200,
            patience:           None,
            use_bias:           true,
            train_per_class:    20,
            num_val:            500,
            num_test:           1000,
            seed:               42,
            normalize_features: true,
            self_loop:          1.0,
            directed:           false,
            device:             DeviceKind::Wgpu,
        }
    }
}

impl TrainConfig {
    /// Reject hyperparameters that would otherwise panic or loop
    /// inside burn.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.dropout),
            "dropout must be within [0, 1], got {}",
            self.dropout
        );
        ensure!(self.weight_decay >= 0.0, "weight_decay must be non-negative, got {}", self.weight_decay);
        ensure!(self.lr.is_finite() && self.lr >= 0.0, "lr must be a non-negative number, got {}", self.lr);
        ensure!(self.epochs > 0, "epochs must be at least 1");
        ensure!(self.patience != Some(0), "patience must be at least 1 when set");
        Ok(())
    }

    /// Layer stack for a graph with `in_channels` features and `out_channels` classes.
    pub fn model_config(&self, in_channels: usize, out_channels: usize) -> GcnConfig {
        GcnConfig::new(in_channels, out_channels, self.hiddens.clone(), self.activations.clone())
            .with_dropout(self.dropout)
            .with_weight_decay(self.weight_decay)
            .with_use_bias(self.use_bias)
    }

    /// Load the dataset and apply the configured preprocessing.
    /// Training and prediction both go through here so they see
    /// exactly the same graph.
    pub fn prepare_graph(&self) -> Result<Graph> {
        tracing::info!("Loading '{}' from '{}'", self.dataset, self.data_dir);
        let mut loader = PlanetoidLoader::new(&self.data_dir, &self.dataset);
        if self.directed {
            loader = loader.directed();
        }
        let mut graph = loader.load()?;
        graph.validate().context("Loaded graph is inconsistent")?;

        let prep = Preprocessor::with_self_loop(self.self_loop);
        if graph.edges.has_self_loops() {
            tracing::debug!("Replacing self loops in the raw graph with weight {}", self.self_loop);
        }
        if self.normalize_features {
            prep.normalize_features(&mut graph.features);
        }
        graph.edges = prep.normalize_adjacency(&graph.edges, graph.num_nodes());

        tracing::info!(
            "Graph ready: {} nodes, {} features, {} classes, {} edges",
            graph.num_nodes(),
            graph.num_features(),
            graph.num_classes(),
            graph.edges.len()
        );
        Ok(graph)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
// Owns the config and runs the full training pipeline.
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    /// Create a new TrainUseCase with the given configuration
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainReport> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Steps 1–2: Load and preprocess the graph ──────────────────────────
        let graph = cfg.prepare_graph()?;

        // ── Step 3: Planetoid-style node split ────────────────────────────────
        let split = split_per_class(
            &graph.labels,
            cfg.train_per_class,
            cfg.num_val,
            cfg.num_test,
            cfg.seed,
        )?;
        tracing::info!(
            "Split: {} train, {} validation, {} test",
            split.train.len(),
            split.val.len(),
            split.test.len()
        );

        // ── Step 4: Save config and split for inference ───────────────────────
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt.save_config(cfg)?;
        ckpt.save_split(&split)?;

        // ── Step 5: Run training loop (Layer 5) ───────────────────────────────
        let mut report = run_training(cfg, &graph, &split, &ckpt)?;

        // ── Step 6: Test accuracy of the best checkpoint ──────────────────────
        if !split.test.is_empty() {
            let classifier = load_classifier(&ckpt, &graph, cfg.device)?;
            let acc        = classifier.evaluate(&split.test)?;
            tracing::info!("Test accuracy: {:.4}", acc);
            report.test_acc = Some(acc);
        }

        Ok(report)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// 12 papers in two research areas, six per class, each area a ring.
    fn write_dataset(dir: &std::path::Path) {
        let mut content = String::new();
        for i in 0..12 {
            let (f, label) = if i < 6 { ("1\t0\t1", "theory") } else { ("0\t1\t1", "systems") };
            content.push_str(&format!("p{i}\t{f}\t{label}\n"));
        }
        let mut cites = String::new();
        for base in [0, 6] {
            for k in 0..6 {
                cites.push_str(&format!("p{}\tp{}\n", base + k, base + (k + 1) % 6));
            }
        }
        fs::write(dir.join("toy.content"), content).unwrap();
        fs::write(dir.join("toy.cites"), cites).unwrap();
    }

    fn config(data: &std::path::Path, ckpt: &std::path::Path) -> TrainConfig {
        TrainConfig {
            data_dir:        data.to_string_lossy().into_owned(),
            dataset:         "toy".to_string(),
            checkpoint_dir:  ckpt.to_string_lossy().into_owned(),
            hiddens:         vec![4],
            epochs:          5,
            train_per_class: 2,
            num_val:         4,
            num_test:        4,
            device:          DeviceKind::NdArray,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_model_config_carries_hyperparameters() {
        let cfg = TrainConfig { dropout: 0.3, weight_decay: 1e-3, use_bias: false, ..TrainConfig::default() };
        let m   = cfg.model_config(10, 4);
        assert_eq!(m.in_channels, 10);
        assert_eq!(m.out_channels, 4);
        assert_eq!(m.hiddens, vec![16]);
        assert_eq!(m.dropout, 0.3);
        assert_eq!(m.weight_decay, 1e-3);
        assert!(!m.use_bias);
    }

    #[test]
    fn test_validate_rejects_bad_hyperparameters() {
        assert!(TrainConfig::default().validate().is_ok());

        let bad_dropout = TrainConfig { dropout: 2.0, ..TrainConfig::default() };
        let err = bad_dropout.validate().unwrap_err().to_string();
        assert!(err.contains("dropout"), "{err}");

        assert!(TrainConfig { dropout: -0.1, ..TrainConfig::default() }.validate().is_err());
        assert!(TrainConfig { patience: Some(0), ..TrainConfig::default() }.validate().is_err());
        assert!(TrainConfig { patience: Some(1), ..TrainConfig::default() }.validate().is_ok());
        assert!(TrainConfig { epochs: 0, ..TrainConfig::default() }.validate().is_err());
        assert!(TrainConfig { lr: f64::NAN, ..TrainConfig::default() }.validate().is_err());
    }

    #[test]
    fn test_execute_rejects_dropout_before_loading() {
        // Nothing exists at data_dir, so an error about dropout proves the
        // check ran first instead of a panic inside burn later on
        let out = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            data_dir:       out.path().join("missing").to_string_lossy().into_owned(),
            checkpoint_dir: out.path().to_string_lossy().into_owned(),
            dropout:        2.0,
            device:         DeviceKind::NdArray,
            ..TrainConfig::default()
        };
        let err = TrainUseCase::new(cfg).execute().unwrap_err().to_string();
        assert!(err.contains("dropout"), "{err}");
    }

    #[test]
    fn test_config_json_round_trip() {
        let cfg  = TrainConfig { activations: vec![Activation::Elu], ..TrainConfig::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"elu\""));
        assert!(json.contains("\"wgpu\""));
        let back: TrainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.activations, vec![Activation::Elu]);
        assert_eq!(back.device, DeviceKind::Wgpu);
    }

    #[test]
    fn test_prepare_graph_adds_self_loops() {
        let data = tempfile::tempdir().unwrap();
        write_dataset(data.path());
        let graph = config(data.path(), data.path()).prepare_graph().unwrap();
        assert_eq!(graph.num_nodes(), 12);
        assert_eq!(graph.num_classes(), 2);
        assert!(graph.edges.has_self_loops());
        // Rows sum to one after feature normalisation
        let sum: f32 = graph.features[0].iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_execute_end_to_end() {
        let data = tempfile::tempdir().unwrap();
        let out  = tempfile::tempdir().unwrap();
        write_dataset(data.path());

        let report = TrainUseCase::new(config(data.path(), out.path())).execute().unwrap();
        assert_eq!(report.epochs_run, 5);
        assert!(report.test_acc.is_some());

        let ckpt = CheckpointManager::new(out.path());
        assert_eq!(ckpt.load_split().unwrap().test.len(), 4);
        assert_eq!(ckpt.load_config().unwrap().dataset, "toy");
        assert!(out.path().join("metrics.csv").exists());
    }
}
