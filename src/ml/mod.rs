// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains the Burn model, training and inference
// code. Only the data layer's tensor conversion shares it.
//
// What's in this layer:
//
//   conv.rs       — One graph convolution: A · (X W) + b
//                   plus the cached dense propagation operator
//
//   model.rs      — The layer stack built from hidden widths and
//                   activation names:
//                   • per-layer activation and dropout
//                   • per-layer parameter groups (weight decay on
//                     hidden layers, none on the output layer)
//                   • forward pass returning logits of selected nodes
//
//   trainer.rs    — The training loop
//                   Full-batch forward/backward, one Adam per
//                   parameter group, validation and checkpointing
//
//   inferencer.rs — The inference engine
//                   Loads a checkpoint and classifies nodes
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Kipf & Welling (2017) Semi-Supervised Classification
//            with Graph Convolutional Networks

/// Graph convolution operator and adjacency
pub mod conv;

/// GCN layer stack, parameter groups and forward pass
pub mod model;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Inference engine — loads checkpoint and predicts node classes
pub mod inferencer;
