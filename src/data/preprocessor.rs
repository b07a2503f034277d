// ============================================================
// Layer 4 — Graph Preprocessor
// ============================================================
// Host-side transforms applied once, before any tensor exists.
//
// The graph convolution layers run with normalisation switched
// off: they aggregate exactly the edge weights they are given.
// The symmetric GCN normalisation therefore happens here:
//
//   Â = D^-1/2 (A + λI) D^-1/2        D_ii = Σ_j (A + λI)_ij
//
//   1. Drop any self loops already in the edge list
//   2. Add one self loop of weight λ per node (skipped when λ = 0)
//   3. Degree of a node = sum of weights of edges pointing at it
//   4. Each edge s → t is rescaled by 1/√(deg_s · deg_t)
//
// Nodes with zero degree keep zero-weight edges instead of
// producing infinities.
//
// Features are row-normalised so each bag-of-words vector sums
// to one; an all-zero row is left as it is.
//
// Reference: Kipf & Welling (2017), §2 "renormalization trick"

use crate::domain::graph::EdgeList;

pub struct Preprocessor {
    /// Weight of the self loop added to every node (λ above)
    self_loop: f32,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self { self_loop: 1.0 }
    }

    pub fn with_self_loop(self_loop: f32) -> Self {
        Self { self_loop }
    }

    /// Symmetrically normalise `edges` over a graph of `num_nodes` nodes.
    pub fn normalize_adjacency(&self, edges: &EdgeList, num_nodes: usize) -> EdgeList {
        let mut out = EdgeList::new();
        out.weights = Some(Vec::with_capacity(edges.len() + num_nodes));

        for (s, t, w) in edges.iter().filter(|&(s, t, _)| s != t) {
            out.push(s, t, Some(w));
        }
        if self.self_loop != 0.0 {
            for node in 0..num_nodes {
                out.push(node, node, Some(self.self_loop));
            }
        }

        let mut degree = vec![0.0f32; num_nodes];
        for (_, t, w) in out.iter() {
            degree[t] += w;
        }
        let inv_sqrt: Vec<f32> = degree
            .iter()
            .map(|&d| if d > 0.0 { d.powf(-0.5) } else { 0.0 })
            .collect();

        if let Some(ws) = out.weights.as_mut() {
            for (k, w) in ws.iter_mut().enumerate() {
                *w *= inv_sqrt[out.sources[k]] * inv_sqrt[out.targets[k]];
            }
        }

        tracing::debug!(
            "Normalised adjacency: {} edges ({} self loops of weight {})",
            out.len(),
            if self.self_loop != 0.0 { num_nodes } else { 0 },
            self.self_loop
        );
        out
    }

    /// Scale each feature row to unit L1 norm.
    pub fn normalize_features(&self, features: &mut [Vec<f32>]) {
        for row in features.iter_mut() {
            let sum: f32 = row.iter().map(|v| v.abs()).sum();
            if sum > 0.0 {
                row.iter_mut().for_each(|v| *v /= sum);
            }
        }
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn weight_of(edges: &EdgeList, s: usize, t: usize) -> f32 {
        edges
            .iter()
            .find(|&(a, b, _)| a == s && b == t)
            .map(|(_, _, w)| w)
            .unwrap()
    }

    #[test]
    fn test_two_node_graph() {
        // A + I = [[1,1],[1,1]] → every degree is 2 → every weight 1/2
        let edges = EdgeList::from_pairs(&[(0, 1), (1, 0)]);
        let norm  = Preprocessor::new().normalize_adjacency(&edges, 2);
        assert_eq!(norm.len(), 4);
        for (_, _, w) in norm.iter() {
            assert!((w - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_star_graph_weights() {
        // Hub 0 with leaves 1, 2 (undirected): deg(0)=3, deg(leaf)=2
        let edges = EdgeList::from_pairs(&[(0, 1), (1, 0), (0, 2), (2, 0)]);
        let norm  = Preprocessor::new().normalize_adjacency(&edges, 3);
        let expected = 1.0 / (3.0f32 * 2.0).sqrt();
        assert!((weight_of(&norm, 0, 1) - expected).abs() < 1e-6);
        assert!((weight_of(&norm, 0, 0) - 1.0 / 3.0).abs() < 1e-6);
        assert!((weight_of(&norm, 2, 2) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_existing_self_loops_replaced() {
        let edges = EdgeList::from_pairs(&[(0, 0), (0, 0)]);
        let norm  = Preprocessor::new().normalize_adjacency(&edges, 1);
        assert_eq!(norm.len(), 1);
        assert!((weight_of(&norm, 0, 0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_isolated_node_without_self_loop() {
        let norm = Preprocessor::with_self_loop(0.0)
            .normalize_adjacency(&EdgeList::from_pairs(&[(0, 1)]), 3);
        // Node 0 receives nothing: deg 0 → its outgoing edge is zeroed
        assert_eq!(norm.len(), 1);
        assert_eq!(weight_of(&norm, 0, 1), 0.0);
    }

    #[test]
    fn test_feature_rows_sum_to_one() {
        let mut feats = vec![vec![1.0, 3.0], vec![0.0, 0.0]];
        Preprocessor::new().normalize_features(&mut feats);
        assert_eq!(feats[0], vec![0.25, 0.75]);
        assert_eq!(feats[1], vec![0.0, 0.0]);
    }
}
