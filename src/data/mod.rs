// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from the raw citation files
// all the way to device-resident tensors.
//
// The pipeline flows in this order:
//
//   <name>.content / <name>.cites
//       │
//       ▼
//   PlanetoidLoader   → parses papers, word features, citations
//       │
//       ▼
//   Preprocessor      → row-normalises features, renormalises
//       │               the adjacency D^-1/2 (A + I) D^-1/2
//       ▼
//   split_per_class   → seeded train / validation / test nodes
//       │
//       ▼
//   GraphTensors      → features, adjacency and split indices
//                       as burn tensors
//
// Training is full-batch, so there is no Dataset/Batcher pair:
// the graph is converted once and every epoch reuses it.
//
// Reference: Burn Book §4 (Datasets)
//            Rust Book §13 (Iterators and Closures)

/// Reads Planetoid .content / .cites files
pub mod loader;

/// Feature and adjacency normalisation
pub mod preprocessor;

/// Seeded per-class node split
pub mod splitter;

/// Converts the graph and split into burn tensors
pub mod dataset;
