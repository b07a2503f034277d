// ============================================================
// Layer 4 — Node Splitter
// ============================================================
// Splits the nodes of one graph into train / validation / test
// sets. Training is transductive: every node takes part in the
// forward pass, but only the train indices contribute to the
// loss and only the validation indices drive checkpointing.
//
// Planetoid-style split:
//   1. Group node indices by class
//   2. Shuffle each group and take `train_per_class` from it
//   3. Shuffle everything that is left
//   4. Take `num_val` validation nodes, then `num_test` test nodes
//
// The shuffle uses a seeded StdRng, so the same seed always
// produces the same split.
//
// Reference: Yang et al. (2016) Revisiting Semi-Supervised
//            Learning with Graph Embeddings
//            rand crate documentation

use anyhow::{ensure, Result};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::domain::graph::NodeSplit;

/// Split nodes labelled `labels` into a per-class balanced train set and
/// random validation / test sets.
///
/// # Errors
/// Fails when a class has fewer than `train_per_class` nodes or when too
/// few nodes remain for the requested validation and test sizes.
pub fn split_per_class(
    labels:          &[usize],
    train_per_class: usize,
    num_val:         usize,
    num_test:        usize,
    seed:            u64,
) -> Result<NodeSplit> {
    let mut rng = StdRng::seed_from_u64(seed);

    let num_classes = labels.iter().max().map_or(0, |&m| m + 1);
    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); num_classes];
    for (node, &label) in labels.iter().enumerate() {
        by_class[label].push(node);
    }

    let mut train = Vec::with_capacity(train_per_class * num_classes);
    let mut rest  = Vec::with_capacity(labels.len());

    for (class, mut nodes) in by_class.into_iter().enumerate() {
        ensure!(
            nodes.len() >= train_per_class,
            "Class {} has {} nodes, cannot take {} for training",
            class,
            nodes.len(),
            train_per_class
        );
        nodes.shuffle(&mut rng);
        let remaining = nodes.split_off(train_per_class);
        train.extend(nodes);
        rest.extend(remaining);
    }

    ensure!(
        rest.len() >= num_val + num_test,
        "Only {} nodes left after training split, need {} validation + {} test",
        rest.len(),
        num_val,
        num_test
    );

    rest.shuffle(&mut rng);
    let mut val: Vec<usize>  = rest[..num_val].to_vec();
    let mut test: Vec<usize> = rest[num_val..num_val + num_test].to_vec();

    train.sort_unstable();
    val.sort_unstable();
    test.sort_unstable();

    tracing::debug!(
        "Node split: {} train, {} validation, {} test (seed {})",
        train.len(),
        val.len(),
        test.len(),
        seed
    );

    Ok(NodeSplit { train, val, test })
}
