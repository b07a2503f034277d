// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`   — trains a GCN on a citation graph
//   2. `predict` — loads a checkpoint and classifies nodes
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TrainArgs};

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "gcn-classifier",
    version = "0.1.0",
    about = "Train a graph convolutional network for node classification, then predict node classes."
)]
pub struct Cli {
    /// The subcommand to run (train or predict)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

/// Handles the `train` subcommand.
fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on '{}' in {}", args.dataset, args.data_dir);

    let report = TrainUseCase::new(args.into()).execute()?;

    println!(
        "\nTraining complete. Best epoch {} of {}: val_acc={:.2}% val_loss={:.4}",
        report.best_epoch,
        report.epochs_run,
        report.best_val_acc * 100.0,
        report.best_val_loss,
    );
    if let Some(acc) = report.test_acc {
        println!("Test accuracy: {:.2}%", acc * 100.0);
    }
    Ok(())
}

/// Handles the `predict` subcommand.
/// Without --nodes, reports accuracy on the saved test split.
fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let use_case = PredictUseCase::new(&args.checkpoint_dir, args.data_dir)?;

    if args.nodes.is_empty() {
        let acc = use_case.evaluate_test()?;
        println!(
            "\nTest accuracy on {} nodes: {:.2}%",
            use_case.test_nodes().len(),
            acc * 100.0
        );
        return Ok(());
    }

    println!("\n{:>6}  {:<12} {:<24} {:>7}  {}", "node", "paper", "predicted", "prob", "label");
    for p in use_case.predict(&args.nodes)? {
        println!(
            "{:>6}  {:<12} {:<24} {:>6.1}%  {}",
            p.node,
            use_case.node_id(p.node),
            use_case.class_name(p.class),
            p.probability * 100.0,
            use_case.true_label(p.node).unwrap_or("?"),
        );
    }
    Ok(())
}
