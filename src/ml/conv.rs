// ============================================================
// Layer 5 — Graph Convolution Operator
// ============================================================
// One GCN layer:
//
//   H' = A · (H · W) + b
//
// where A[dst][src] is the summed weight of every edge
// src → dst. Messages flow from source to target and are added
// up; the layer itself inserts no self loops and applies no
// degree normalisation. The preprocessor has already folded
// both into the edge weights.
//
// The propagation operator A is built once per graph and shared
// by every layer and every epoch (`Adjacency`), so the edge list
// is only walked a single time.
//
// Weights use Xavier-uniform initialisation; the bias starts at
// zero and is added after aggregation, so every node receives it
// exactly once regardless of its degree.
//
// Reference: Kipf & Welling (2017)
//            Burn Book §3 (Modules)

use anyhow::{ensure, Result};
use burn::{
    module::Param,
    nn::{Initializer, Linear, LinearConfig},
    prelude::*,
};

use crate::domain::graph::EdgeList;

// ─── Adjacency ────────────────────────────────────────────────────────────────
/// Dense propagation operator `[N, N]` built from an edge list.
#[derive(Debug, Clone)]
pub struct Adjacency<B: Backend> {
    matrix: Tensor<B, 2>,
}

impl<B: Backend> Adjacency<B> {
    /// Scatter `edges` into an `[N, N]` matrix on `device`.
    /// Parallel edges accumulate; an unweighted list counts 1.0 per edge.
    pub fn from_edges(edges: &EdgeList, num_nodes: usize, device: &B::Device) -> Result<Self> {
        edges.validate(num_nodes)?;
        ensure!(num_nodes > 0, "Cannot build an adjacency for an empty graph");

        let mut dense = vec![0.0f32; num_nodes * num_nodes];
        for (src, dst, w) in edges.iter() {
            dense[dst * num_nodes + src] += w;
        }

        let matrix = Tensor::<B, 1>::from_floats(dense.as_slice(), device)
            .reshape([num_nodes, num_nodes]);

        tracing::debug!("Built {n}x{n} adjacency from {} edges", edges.len(), n = num_nodes);
        Ok(Self { matrix })
    }

    pub fn num_nodes(&self) -> usize {
        self.matrix.dims()[0]
    }

    pub fn matrix(&self) -> Tensor<B, 2> {
        self.matrix.clone()
    }
}

// ─── GcnConv ──────────────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct GcnConvConfig {
    pub in_channels:  usize,
    pub out_channels: usize,
    #[config(default = true)]
    pub use_bias:     bool,
}

impl GcnConvConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> GcnConv<B> {
        let linear = LinearConfig::new(self.in_channels, self.out_channels)
            .with_bias(false)
            .with_initializer(Initializer::XavierUniform { gain: 1.0 })
            .init(device);
        let bias = self
            .use_bias
            .then(|| Param::from_tensor(Tensor::zeros([self.out_channels], device)));
        GcnConv { linear, bias }
    }
}

#[derive(Module, Debug)]
pub struct GcnConv<B: Backend> {
    pub linear: Linear<B>,
    pub bias:   Option<Param<Tensor<B, 1>>>,
}

impl<B: Backend> GcnConv<B> {
    /// x: [N, in] → [N, out]
    pub fn forward(&self, x: Tensor<B, 2>, adjacency: &Adjacency<B>) -> Tensor<B, 2> {
        let h   = self.linear.forward(x);
        let out = adjacency.matrix().matmul(h);
        match &self.bias {
            Some(bias) => out + bias.val().unsqueeze::<2>(),
            None       => out,
        }
    }
}
