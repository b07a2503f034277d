// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that describe what the
// system works with: graphs, edge lists, node splits and the
// names of activation functions.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Keeping tensors out of this layer means the graph model can be
// built, validated and unit tested without a device.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Activation names accepted by the layer stack builder
pub mod activation;

// Node features, labels, edge list and node splits
pub mod graph;

// Core abstractions (traits) that other layers implement
pub mod traits;
