// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `predict`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, Activation, ...)
//
// List-valued flags are comma separated:
//   --hiddens 64,32 --activations relu,elu
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::train_use_case::{DeviceKind, TrainConfig};
use crate::domain::activation::Activation;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a GCN node classifier on a Planetoid citation graph
    Train(TrainArgs),

    /// Classify nodes using a trained checkpoint
    Predict(PredictArgs),
}

/// Burn backend to run on
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum Device {
    Wgpu,
    Ndarray,
}

impl From<Device> for DeviceKind {
    fn from(d: Device) -> Self {
        match d {
            Device::Wgpu    => DeviceKind::Wgpu,
            Device::Ndarray => DeviceKind::NdArray,
        }
    }
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory containing <dataset>.content and <dataset>.cites
    #[arg(long, default_value = "data/cora")]
    pub data_dir: String,

    /// Dataset file stem
    #[arg(long, default_value = "cora")]
    pub dataset: String,

    /// Directory to save checkpoints, config, split and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Width of each hidden graph convolution
    #[arg(long, value_delimiter = ',', default_value = "16")]
    pub hiddens: Vec<usize>,

    /// Activation after each hidden layer, paired with --hiddens
    #[arg(long, value_delimiter = ',', default_value = "relu")]
    pub activations: Vec<Activation>,

    /// Dropout probability after each hidden activation
    #[arg(long, default_value_t = 0.5)]
    pub dropout: f64,

    /// L2 penalty on hidden-layer parameters (the output layer has none)
    #[arg(long, default_value_t = 5e-4)]
    pub weight_decay: f64,

    /// Adam learning rate, shared by every parameter group
    #[arg(long, default_value_t = 0.01)]
    pub lr: f64,

    /// Number of full-batch training steps
    #[arg(long, default_value_t = 200)]
    pub epochs: usize,

    /// Stop after this many epochs without validation improvement
    #[arg(long)]
    pub patience: Option<usize>,

    /// Disable the bias term of every graph convolution
    #[arg(long)]
    pub no_bias: bool,

    /// Labelled training nodes drawn from each class
    #[arg(long, default_value_t = 20)]
    pub train_per_class: usize,

    #[arg(long, default_value_t = 500)]
    pub num_val: usize,

    #[arg(long, default_value_t = 1000)]
    pub num_test: usize,

    /// Seed for the node split
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Keep raw feature rows instead of normalising them to sum to one
    #[arg(long)]
    pub raw_features: bool,

    /// Weight of the self loop added to every node (0 disables it)
    #[arg(long, default_value_t = 1.0)]
    pub self_loop: f32,

    /// Keep citations one-way instead of symmetrising them
    #[arg(long)]
    pub directed: bool,

    #[arg(long, value_enum, default_value_t = Device::Wgpu)]
    pub device: Device,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2 —
/// the application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:           a.data_dir,
            dataset:            a.dataset,
            checkpoint_dir:     a.checkpoint_dir,
            hiddens:            a.hiddens,
            activations:        a.activations,
            dropout:            a.dropout,
            weight_decay:       a.weight_decay,
            lr:                 a.lr,
            epochs:             a.epochs,
            patience:           a.patience,
            use_bias:           !a.no_bias,
            train_per_class:    a.train_per_class,
            num_val:            a.num_val,
            num_test:           a.num_test,
            seed:               a.seed,
            normalize_features: !a.raw_features,
            self_loop:          a.self_loop,
            directed:           a.directed,
            device:             a.device.into(),
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Node indices to classify; scores the saved test split when omitted
    #[arg(long, value_delimiter = ',')]
    pub nodes: Vec<usize>,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Dataset directory, if it moved since training
    #[arg(long)]
    pub data_dir: Option<String>,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn train_config(args: &[&str]) -> TrainConfig {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Train(a) => a.into(),
            other => panic!("expected train, got {other:?}"),
        }
    }

    #[test]
    fn test_train_defaults() {
        let cfg = train_config(&["gcn-classifier", "train"]);
        assert_eq!(cfg.hiddens, vec![16]);
        assert_eq!(cfg.activations, vec![Activation::Relu]);
        assert_eq!(cfg.dropout, 0.5);
        assert_eq!(cfg.weight_decay, 5e-4);
        assert_eq!(cfg.lr, 0.01);
        assert!(cfg.use_bias);
        assert!(cfg.normalize_features);
        assert_eq!(cfg.device, DeviceKind::Wgpu);
        assert_eq!(cfg.patience, None);
    }

    #[test]
    fn test_comma_lists_and_flags() {
        let cfg = train_config(&[
            "gcn-classifier", "train",
            "--hiddens", "64,32",
            "--activations", "elu,Tanh",
            "--no-bias",
            "--patience", "10",
            "--device", "ndarray",
        ]);
        assert_eq!(cfg.hiddens, vec![64, 32]);
        assert_eq!(cfg.activations, vec![Activation::Elu, Activation::Tanh]);
        assert!(!cfg.use_bias);
        assert_eq!(cfg.patience, Some(10));
        assert_eq!(cfg.device, DeviceKind::NdArray);
    }

    #[test]
    fn test_unknown_activation_rejected() {
        let result = Cli::try_parse_from(["gcn-classifier", "train", "--activations", "relu,bogus"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_predict_nodes() {
        let cli = Cli::try_parse_from(["gcn-classifier", "predict", "--nodes", "3,1,4"]).unwrap();
        match cli.command {
            Commands::Predict(a) => {
                assert_eq!(a.nodes, vec![3, 1, 4]);
                assert_eq!(a.checkpoint_dir, "checkpoints");
            }
            other => panic!("expected predict, got {other:?}"),
        }

        let cli = Cli::try_parse_from(["gcn-classifier", "predict"]).unwrap();
        assert!(matches!(cli.command, Commands::Predict(ref a) if a.nodes.is_empty()));
    }
}
