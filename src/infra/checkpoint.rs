// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores everything the predict command needs to
// reproduce a training run:
//
//   checkpoints/
//     model_best.mpk.gz   ← weights with the best validation score
//     best_epoch.json     ← epoch those weights come from
//     train_config.json   ← hyperparameters (rebuilds the layer stack)
//     split.json          ← train / val / test node indices
//
// Weights go through Burn's CompactRecorder (MessagePack + gzip).
// The record only holds tensors, so the model has to be rebuilt
// from train_config.json with the same layer widths before the
// record can be loaded into it.
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{de::DeserializeOwned, Serialize};
use std::{fs, path::PathBuf};

use crate::application::train_use_case::TrainConfig;
use crate::domain::graph::NodeSplit;
use crate::ml::model::GcnModel;

const MODEL_FILE:  &str = "model_best";
const EPOCH_FILE:  &str = "best_epoch.json";
const CONFIG_FILE: &str = "train_config.json";
const SPLIT_FILE:  &str = "split.json";

/// Manages saving and loading of model checkpoints.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager rooted at `dir`.
    /// The directory is created lazily by the save methods.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Overwrite the best-model checkpoint with `model` from `epoch`.
    pub fn save_model<B: Backend>(&self, model: &GcnModel<B>, epoch: usize) -> Result<()> {
        self.ensure_dir()?;
        // Recorder appends the .mpk.gz extension itself
        let path = self.dir.join(MODEL_FILE);

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        self.write_json(EPOCH_FILE, &epoch)?;
        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load the best weights into `model`, which must have been built
    /// with the same layer widths as the saved one.
    pub fn load_model<B: Backend>(
        &self,
        model:  GcnModel<B>,
        device: &B::Device,
    ) -> Result<GcnModel<B>> {
        let epoch = self.best_epoch()?;
        let path  = self.dir.join(MODEL_FILE);

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.write_json(CONFIG_FILE, cfg)
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        self.read_json(CONFIG_FILE)
            .context("Make sure you have run 'train' before 'predict'")
    }

    pub fn save_split(&self, split: &NodeSplit) -> Result<()> {
        self.write_json(SPLIT_FILE, split)
    }

    pub fn load_split(&self) -> Result<NodeSplit> {
        self.read_json(SPLIT_FILE)
    }

    /// Epoch of the saved best model.
    pub fn best_epoch(&self) -> Result<usize> {
        self.read_json(EPOCH_FILE)
            .context("No checkpoint found. Have you run 'train' first?")
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        self.ensure_dir()?;
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Wrote '{}'", path.display());
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed JSON in '{}'", path.display()))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::activation::Activation;
    use crate::ml::model::GcnConfig;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_missing_checkpoint_is_an_error() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path());
        assert!(ckpt.best_epoch().is_err());
        assert!(ckpt.load_config().is_err());
    }

    #[test]
    fn test_model_weights_restored() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path().join("nested"));
        let device = Default::default();
        let cfg    = GcnConfig::new(4, 2, vec![3], vec![Activation::Relu]);

        let saved = cfg.init::<TestBackend>(&device);
        ckpt.save_model(&saved, 7).unwrap();
        assert_eq!(ckpt.best_epoch().unwrap(), 7);

        // A freshly initialised model has different random weights
        let fresh  = cfg.init::<TestBackend>(&device);
        let loaded = ckpt.load_model(fresh, &device).unwrap();

        let w = |m: &GcnModel<TestBackend>| {
            m.hidden[0].linear.weight.val().into_data().convert::<f32>().to_vec::<f32>().unwrap()
        };
        assert_eq!(w(&loaded), w(&saved));
        assert_eq!(loaded.activations.0, vec![Activation::Relu]);
    }

    #[test]
    fn test_split_persisted() {
        let dir   = tempfile::tempdir().unwrap();
        let ckpt  = CheckpointManager::new(dir.path());
        let split = NodeSplit { train: vec![0, 3], val: vec![1], test: vec![2, 4] };
        ckpt.save_split(&split).unwrap();
        assert_eq!(ckpt.load_split().unwrap(), split);
    }
}
