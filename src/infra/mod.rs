// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by the application and ML layers:
//
//   checkpoint.rs  — Saving and loading model weights
//                    Uses Burn's CompactRecorder for the
//                    parameters, and JSON for the training
//                    config, best epoch and node split so the
//                    predict command can rebuild the exact model
//                    and score the same test nodes.
//
//   metrics.rs     — Training metrics logging
//                    Writes one CSV row per epoch (loss and
//                    accuracy on train and validation nodes).
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
