// ============================================================
// Layer 5 — GCN Layer Stack
// ============================================================
// Builds a graph convolutional network from two parallel lists:
//
//   hiddens     = [16, 8]
//   activations = [relu, elu]
//
//   x ─▶ conv(in→16) ─▶ relu ─▶ dropout
//     ─▶ conv(16→8)  ─▶ elu  ─▶ dropout
//     ─▶ conv(8→out)                      ─▶ select rows ─▶ logits
//
// The lists are consumed pairwise, so the shorter one decides how
// many hidden layers exist. The output convolution has no
// activation; its raw scores feed cross-entropy directly.
//
// Every layer is its own parameter group. Hidden groups carry the
// configured weight decay and the output group carries none
// (Kipf & Welling regularise only the first layer of their
// two-layer model).
//
// Reference: Kipf & Welling (2017)
//            Burn Book §3 (Modules and Config)

use burn::{
    module::Ignored,
    nn::{loss::CrossEntropyLossConfig, Dropout, DropoutConfig},
    prelude::*,
};

use crate::domain::activation::Activation;
use crate::ml::conv::{Adjacency, GcnConv, GcnConvConfig};

const SELU_ALPHA: f64 = 1.673_263_242_354_377_3;
const SELU_SCALE: f64 = 1.050_700_987_355_480_5;
const LEAKY_RELU_SLOPE: f64 = 0.01;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct GcnConfig {
    pub in_channels:  usize,
    pub out_channels: usize,
    /// Width of each hidden layer
    pub hiddens:      Vec<usize>,
    /// Activation after each hidden layer, paired with `hiddens`
    pub activations:  Vec<Activation>,
    #[config(default = 0.5)]
    pub dropout:      f64,
    /// L2 penalty for hidden-layer parameters; the output layer gets none
    #[config(default = 5e-4)]
    pub weight_decay: f64,
    #[config(default = true)]
    pub use_bias:     bool,
}

/// Parameters of one layer and the weight decay its optimizer applies.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamGroup {
    pub layer:        usize,
    pub weight_decay: f64,
    pub num_params:   usize,
}

impl GcnConfig {
    /// Hidden layers actually built: `hiddens` and `activations` are
    /// consumed pairwise, so the shorter list sets the depth.
    pub fn hidden_layers(&self) -> impl Iterator<Item = (usize, Activation)> + '_ {
        self.hiddens.iter().copied().zip(self.activations.iter().copied())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> GcnModel<B> {
        if self.hiddens.len() != self.activations.len() {
            tracing::warn!(
                "{} hidden sizes but {} activations; building {} hidden layers",
                self.hiddens.len(),
                self.activations.len(),
                self.hiddens.len().min(self.activations.len())
            );
        }

        let mut hidden      = Vec::new();
        let mut activations = Vec::new();
        let mut inc         = self.in_channels;
        for (width, activation) in self.hidden_layers() {
            hidden.push(self.build_conv(inc, width, device));
            activations.push(activation);
            inc = width;
        }
        let output = self.build_conv(inc, self.out_channels, device);

        let param_groups = self.param_groups();
        let dropout      = DropoutConfig::new(self.dropout).init();
        GcnModel {
            hidden,
            output,
            activations:  Ignored(activations),
            param_groups: Ignored(param_groups),
            dropout,
        }
    }

    /// One group per layer in stack order. Hidden layers decay with
    /// `weight_decay`, the output layer does not decay.
    pub fn param_groups(&self) -> Vec<ParamGroup> {
        let mut dims: Vec<usize> = vec![self.in_channels];
        dims.extend(self.hidden_layers().map(|(h, _)| h));
        dims.push(self.out_channels);

        let last = dims.len() - 2;
        dims.windows(2)
            .enumerate()
            .map(|(layer, io)| {
                let bias = if self.use_bias { io[1] } else { 0 };
                ParamGroup {
                    layer,
                    weight_decay: if layer == last { 0.0 } else { self.weight_decay },
                    num_params:   io[0] * io[1] + bias,
                }
            })
            .collect()
    }

    fn build_conv<B: Backend>(&self, inc: usize, out: usize, device: &B::Device) -> GcnConv<B> {
        GcnConvConfig::new(inc, out).with_use_bias(self.use_bias).init(device)
    }
}

#[derive(Module, Debug)]
pub struct GcnModel<B: Backend> {
    pub hidden:       Vec<GcnConv<B>>,
    /// Final convolution, applied without activation or dropout
    pub output:       GcnConv<B>,
    pub activations:  Ignored<Vec<Activation>>,
    pub param_groups: Ignored<Vec<ParamGroup>>,
    pub dropout:      Dropout,
}

impl<B: Backend> GcnModel<B> {
    /// x: [N, in_channels], index: [K] → logits: [K, out_channels]
    pub fn forward(
        &self,
        x:         Tensor<B, 2>,
        adjacency: &Adjacency<B>,
        index:     Tensor<B, 1, Int>,
    ) -> Tensor<B, 2> {
        let mut x = x;
        for (layer, act) in self.hidden.iter().zip(self.activations.0.iter()) {
            x = activate(*act, layer.forward(x, adjacency));
            x = self.dropout.forward(x);
        }

        self.output.forward(x, adjacency).select(0, index)
    }

    pub fn forward_loss(
        &self,
        x:         Tensor<B, 2>,
        adjacency: &Adjacency<B>,
        index:     Tensor<B, 1, Int>,
        targets:   Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(x, adjacency, index);
        let ce     = CrossEntropyLossConfig::new().init(&logits.device());
        (ce.forward(logits.clone(), targets), logits)
    }

    /// Per-layer parameter groups recorded when the stack was built,
    /// with parameter counts taken from the layers themselves.
    pub fn param_groups(&self) -> Vec<ParamGroup> {
        self.param_groups
            .0
            .iter()
            .zip(self.layers())
            .map(|(group, layer)| ParamGroup { num_params: layer.num_params(), ..group.clone() })
            .collect()
    }

    /// Every convolution in stack order, output layer last.
    pub fn layers(&self) -> impl Iterator<Item = &GcnConv<B>> {
        self.hidden.iter().chain(std::iter::once(&self.output))
    }

    pub fn depth(&self) -> usize {
        self.hidden.len() + 1
    }
}

/// Apply a named activation.
pub fn activate<B: Backend, const D: usize>(act: Activation, x: Tensor<B, D>) -> Tensor<B, D> {
    use burn::tensor::activation as f;
    match act {
        Activation::Relu      => f::relu(x),
        Activation::Elu       => elu(x, 1.0),
        Activation::Selu      => elu(x, SELU_ALPHA).mul_scalar(SELU_SCALE),
        Activation::LeakyRelu => f::leaky_relu(x, LEAKY_RELU_SLOPE),
        Activation::Gelu      => f::gelu(x),
        Activation::Sigmoid   => f::sigmoid(x),
        Activation::Tanh      => f::tanh(x),
        Activation::Silu      => f::silu(x),
        Activation::Softplus  => f::softplus(x, 1.0),
        Activation::Identity  => x,
    }
}

// max(x, 0) + alpha * (exp(min(x, 0)) - 1); exp only ever sees x <= 0
fn elu<B: Backend, const D: usize>(x: Tensor<B, D>, alpha: f64) -> Tensor<B, D> {
    let negative = x.clone().clamp_max(0.0).exp().sub_scalar(1.0).mul_scalar(alpha);
    burn::tensor::activation::relu(x) + negative
}

/// Fraction of rows whose arg-max matches the target class.
pub fn accuracy<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> f64 {
    let total = targets.dims()[0];
    if total == 0 {
        return 0.0;
    }
    // argmax(1) returns shape [K, 1] — flatten to [K] before comparing
    let predicted = logits.argmax(1).flatten::<1>(0, 1);
    let correct: i64 = predicted.equal(targets).int().sum().into_scalar().elem::<i64>();
    correct as f64 / total as f64
}
