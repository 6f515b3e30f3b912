//! Feed-forward network classifier.
//!
//! The network reads `[flux ratio, major eigenvalue, minor eigenvalue]` and
//! produces one activation per [`SourceType`]; the most active output wins.
//! Every layer is fully connected with a logistic activation.
//!
//! # Parameter layout
//!
//! Parameters are flat, layer by layer and neuron by neuron. Each neuron
//! contributes its input weights followed by its bias, so a layer of `n`
//! neurons fed by `m` inputs consumes `n * (m + 1)` parameters.

use super::SourceClassifier;
use crate::source::{Source, SourceType};
use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// Errors constructing a network
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("parameter count mismatch: topology needs {expected}, got {got}")]
    ParameterCount { expected: usize, got: usize },

    #[error("network must have at least one input and one layer, got {inputs} inputs and {layers} layers")]
    EmptyTopology { inputs: usize, layers: usize },

    #[error("layer {index} has no neurons")]
    EmptyLayer { index: usize },
}

/// Width of the feature vector the pretrained network reads
pub const PRETRAINED_INPUTS: usize = 3;

/// Layer sizes of the pretrained network, output layer last
pub const PRETRAINED_LAYERS: [usize; 3] = [4, 4, 6];

/// Weights and biases of the pretrained network
pub const PRETRAINED_PARAMETERS: [f64; 66] = [
    1.1342973367371332, -2.686399965949776, -1.183947600746605, -1.2909343864147822,
    1.220267272296525, 1.2722888159185817, -0.5785770637784854, 0.9399417262035493,
    -0.29411436417652, -0.2686562238985049, 0.8225590961571908, 0.8163491807820592,
    -2.417196242984236, 1.1391005264312741, -0.8781652180198124, -1.0294356583396442,
    4.161501566817192, -1.5665312874662265, -1.410515258327577, 4.2321684981157,
    0.03012668407874716, 0.5343032081772355, 0.9452803696986759, 1.0513098301544503,
    -0.32731564850346034, 0.046251759073640236, -4.8955557598415975, 1.2579438659696651,
    0.0974370996575036, 1.4582193810401405, 1.0825952532575551, 1.480833734939218,
    0.9108362473383418, 0.15330348846047617, -4.470348331090813, 1.0313164017306462,
    -6.362317558798425, 0.11034741479027868, 2.568858682692154, 2.285788610562752,
    -0.3376578088344199, 2.707312816608264, 0.010482934203044419, -5.58497375933043,
    2.1876543221562317, -0.855300570993043, 2.963581734985444, -0.5353876346111963,
    2.3753511749058265, -5.198915679333386, -1.1555220768194827, -0.632136621634756,
    -0.9102443940795066, -1.9328088494609266, -1.461761040745588, -1.443327142703491,
    -0.6371866584321354, -1.9994449672909955, -1.8927941075681458, -0.8667008159336119,
    -1.0814995173326556, -2.0848783734590293, -0.3882575363829958, -1.7164112366648014,
    -0.5326624654124, -1.8537129002252917,
];

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[derive(Debug, Clone, PartialEq)]
struct Layer {
    /// One row per neuron
    weights: DMatrix<f64>,
    biases: DVector<f64>,
}

/// Fully connected feed-forward network with logistic activations
#[derive(Debug, Clone, PartialEq)]
pub struct FeedForwardNetwork {
    inputs: usize,
    layers: Vec<Layer>,
}

impl FeedForwardNetwork {
    /// Number of parameters a topology needs
    pub fn parameter_count(inputs: usize, layer_sizes: &[usize]) -> usize {
        let mut fan_in = inputs;
        let mut total = 0;
        for &size in layer_sizes {
            total += size * (fan_in + 1);
            fan_in = size;
        }
        total
    }

    /// Build a network from its topology and flat parameter vector
    ///
    /// # Arguments
    /// * `inputs` - Width of the input vector
    /// * `layer_sizes` - Neurons per layer, output layer last
    /// * `parameters` - Weights and biases in the layout described above
    pub fn new(inputs: usize, layer_sizes: &[usize], parameters: &[f64]) -> Result<Self, NetworkError> {
        if inputs == 0 || layer_sizes.is_empty() {
            return Err(NetworkError::EmptyTopology {
                inputs,
                layers: layer_sizes.len(),
            });
        }
        if let Some(index) = layer_sizes.iter().position(|&n| n == 0) {
            return Err(NetworkError::EmptyLayer { index });
        }

        let expected = Self::parameter_count(inputs, layer_sizes);
        if parameters.len() != expected {
            return Err(NetworkError::ParameterCount {
                expected,
                got: parameters.len(),
            });
        }

        let mut layers = Vec::with_capacity(layer_sizes.len());
        let mut fan_in = inputs;
        let mut offset = 0;
        for &neurons in layer_sizes {
            let stride = fan_in + 1;
            let block = &parameters[offset..offset + neurons * stride];
            let weights = DMatrix::from_fn(neurons, fan_in, |n, i| block[n * stride + i]);
            let biases = DVector::from_fn(neurons, |n, _| block[n * stride + fan_in]);
            layers.push(Layer { weights, biases });
            offset += neurons * stride;
            fan_in = neurons;
        }

        Ok(Self { inputs, layers })
    }

    pub fn inputs(&self) -> usize {
        self.inputs
    }

    pub fn outputs(&self) -> usize {
        self.layers.last().map_or(0, |l| l.biases.len())
    }

    /// Forward pass
    ///
    /// Inputs shorter than the network's input width are zero-padded and
    /// longer ones truncated.
    pub fn forward(&self, input: &[f64]) -> Vec<f64> {
        let mut activation = DVector::from_fn(self.inputs, |i, _| input.get(i).copied().unwrap_or(0.0));
        for layer in &self.layers {
            activation = (&layer.weights * &activation + &layer.biases).map(sigmoid);
        }
        activation.iter().copied().collect()
    }
}

/// Classifies sources with a feed-forward network
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkClassifier {
    network: FeedForwardNetwork,
}

impl NetworkClassifier {
    pub fn new(network: FeedForwardNetwork) -> Self {
        Self { network }
    }

    /// The classifier with the shipped pretrained weights
    pub fn pretrained() -> Result<Self, NetworkError> {
        let network = FeedForwardNetwork::new(PRETRAINED_INPUTS, &PRETRAINED_LAYERS, &PRETRAINED_PARAMETERS)?;
        Ok(Self::new(network))
    }

    pub fn network(&self) -> &FeedForwardNetwork {
        &self.network
    }

    fn features(source: &Source) -> [f64; 3] {
        [
            source.flux_ratio,
            source.eigenvalues.major,
            source.eigenvalues.minor,
        ]
    }
}

impl SourceClassifier for NetworkClassifier {
    fn classify(&self, source: &Source) -> SourceType {
        let output = self.network.forward(&Self::features(source));
        if output.is_empty() || output.iter().any(|v| v.is_nan()) {
            return SourceType::Unknown;
        }

        let mut best = 0;
        for (i, &v) in output.iter().enumerate() {
            if v > output[best] {
                best = i;
            }
        }

        u8::try_from(best)
            .ok()
            .and_then(SourceType::from_ordinal)
            .unwrap_or(SourceType::Unknown)
    }
}
