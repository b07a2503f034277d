// ============================================================
// Layer 3 — Activation Names
// ============================================================
// Each hidden graph-convolution layer is paired with the name of
// an activation function, e.g. `--activations relu,elu`.
//
// The names are parsed here, in the domain layer, so that a bad
// name is rejected while the configuration is being built,
// long before any tensor is allocated. The ML layer maps each
// variant to the matching burn function.
//
// Names are case-insensitive. `linear`, `identity` and `none`
// all mean "no activation".

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Activation applied after a hidden graph convolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Activation {
    Relu,
    Elu,
    Selu,
    LeakyRelu,
    Gelu,
    Sigmoid,
    Tanh,
    Silu,
    Softplus,
    /// Pass-through
    Identity,
}

impl Activation {
    /// Every accepted spelling, canonical names first.
    pub const NAMES: [&'static str; 12] = [
        "relu", "elu", "selu", "leaky_relu", "gelu", "sigmoid",
        "tanh", "silu", "softplus", "linear", "identity", "none",
    ];

    /// The canonical lowercase name, as written to train_config.json
    pub fn name(&self) -> &'static str {
        match self {
            Activation::Relu      => "relu",
            Activation::Elu       => "elu",
            Activation::Selu      => "selu",
            Activation::LeakyRelu => "leaky_relu",
            Activation::Gelu      => "gelu",
            Activation::Sigmoid   => "sigmoid",
            Activation::Tanh      => "tanh",
            Activation::Silu      => "silu",
            Activation::Softplus  => "softplus",
            Activation::Identity  => "linear",
        }
    }
}

impl FromStr for Activation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let act = match s.trim().to_lowercase().as_str() {
            "relu"                         => Activation::Relu,
            "elu"                          => Activation::Elu,
            "selu"                         => Activation::Selu,
            "leaky_relu" | "leakyrelu"     => Activation::LeakyRelu,
            "gelu"                         => Activation::Gelu,
            "sigmoid"                      => Activation::Sigmoid,
            "tanh"                         => Activation::Tanh,
            "silu" | "swish"               => Activation::Silu,
            "softplus"                     => Activation::Softplus,
            "linear" | "identity" | "none" => Activation::Identity,
            other => bail!(
                "Unknown activation '{}'. Expected one of: {}",
                other,
                Self::NAMES.join(", ")
            ),
        };
        Ok(act)
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<String> for Activation {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Activation> for String {
    fn from(a: Activation) -> Self {
        a.name().to_string()
    }
}
