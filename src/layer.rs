use rand::Rng;
use serde::{ Serialize, Deserialize };

use crate::{
  scalar::Real,
  tensor::Tensor,
  variable::Variable,
  ops::{ Arith, BaseOps, RealOps, Hops },
};


/// Initial values of a freshly created parameter.

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Init<T> {
  Zeros,
  Constant(T),
  Normal { mean: T, std: T },
  GlorotUniform,
}

impl<T: Real> Init<T> {
  pub fn generate(&self, dims: &[usize], rng: &mut impl Rng) -> Tensor<T> {
    match *self {
      Self::Zeros => Tensor::zeros(dims),
      Self::Constant(value) => Tensor::fill(dims, value),
      Self::Normal { mean, std } => Tensor::normal(dims, mean, std, rng),
      Self::GlorotUniform => Tensor::glorot_uniform(dims, rng),
    }
  }
}


/// Nonlinearity applied to a layer's output.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
  Linear,
  Relu,
  Sigmoid,
  /// Softmax along the last dimension.
  Softmax,
}

impl Activation {
  pub fn apply<T, H>(&self, x: &H) -> H
  where
    T: Real,
    H: Hops<T>,
    for<'a> &'a H: Arith<&'a H, H> + Arith<T, H>,
  {
    match self {
      Self::Linear => x.clone(),
      Self::Relu => x.relu(),
      Self::Sigmoid => x.sigmoid(),
      Self::Softmax => x.softmax(-1),
    }
  }
}


/// Anything holding trainable parameters.

pub trait Trainable<T: Real> {
  /// All parameters along with a name that is unique within `self`.
  fn named_parameters(&self) -> Vec<(String, Variable<T>)>;

  fn parameters(&self) -> Vec<Variable<T>> {
    self.named_parameters()
      .into_iter()
      .map(|(_, param)| param )
      .collect()
  }
}


/// Fully connected layer computing `activation(x × weights + bias)`
/// for `[batch, inputs]` shaped `x`.

#[derive(Debug, Clone)]
pub struct Dense<T: Real> {
  pub weights: Variable<T>,
  pub bias: Variable<T>,
  pub activation: Activation,
}

impl<T: Real> Dense<T> {
  pub fn new(
    inputs: usize,
    outputs: usize,
    activation: Activation,
    kernel_init: Init<T>,
    bias_init: Init<T>,
    rng: &mut impl Rng,
  ) -> Self {
    Self {
      weights: kernel_init.generate(&[inputs, outputs], rng).trained(),
      bias: bias_init.generate(&[outputs], rng).trained(),
      activation,
    }
  }

  pub fn inputs(&self) -> usize {
    self.weights.dim(0)
  }

  pub fn outputs(&self) -> usize {
    self.weights.dim(1)
  }

  pub fn forward(&self, input: &Variable<T>) -> Variable<T> {
    self.activation.apply::<T, _>(&(input.mm(&self.weights) + &self.bias))
  }

  /// Same as [forward](Self::forward), without recording a graph.

  pub fn infer(&self, input: &Tensor<T>) -> Tensor<T> {
    self.activation.apply::<T, _>(&(input.mm(self.weights.tensor()) + self.bias.tensor()))
  }
}

impl<T: Real> Trainable<T> for Dense<T> {
  fn named_parameters(&self) -> Vec<(String, Variable<T>)> {
    vec![
      ("weights".to_string(), self.weights.clone()),
      ("bias".to_string(), self.bias.clone()),
    ]
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use rand::{ SeedableRng, rngs::StdRng };
  use crate::ops::NumericOps;

  fn layer(activation: Activation) -> Dense<f64> {
    let mut rng = StdRng::seed_from_u64(5);
    Dense::new(3, 2, activation, Init::GlorotUniform, Init::Constant(0.5), &mut rng)
  }

  #[test]
  fn shapes() {
    let dense = layer(Activation::Linear);
    assert_eq!((dense.inputs(), dense.outputs()), (3, 2));
    let out = dense.infer(&Tensor::ones(&[4,3]));
    assert_eq!(out.shape().dims, vec![4, 2]);
  }

  #[test]
  fn zero_kernel() {
    let mut rng = StdRng::seed_from_u64(5);
    let dense = Dense::new(3, 2, Activation::Linear, Init::Zeros, Init::Constant(1.5), &mut rng);
    let out = dense.infer(&Tensor::arrange(&[2,3], 0.0, 1.0));
    assert_eq!(out, Tensor::fill(&[2,2], 1.5));
  }

  #[test]
  fn forward_matches_infer() {
    let dense = layer(Activation::Sigmoid);
    let x = Tensor::arrange(&[2,3], -1.0, 0.5);
    assert_eq!(dense.forward(&x.tracked()).tensor(), &dense.infer(&x));
  }

  #[test]
  fn softmax_rows() {
    let dense = layer(Activation::Softmax);
    let out = dense.infer(&Tensor::arrange(&[5,3], -2.0, 0.3));
    for row in out.sum(-1).to_vec() {
      assert!((row - 1.0).abs() < 1e-12);
    }
  }

  #[test]
  fn relu() {
    let x = Tensor::vec(&[-1.0, 0.5]);
    assert_eq!(Activation::Relu.apply::<f64, _>(&x), Tensor::vec(&[0.0, 0.5]));
    assert_eq!(Activation::Linear.apply::<f64, _>(&x), x);
  }

  #[test]
  fn parameters() {
    let dense = layer(Activation::Relu);
    let names: Vec<_> = dense.named_parameters().into_iter().map(|(name, _)| name ).collect();
    assert_eq!(names, vec!["weights", "bias"]);
    let loss = dense.forward(&Tensor::ones(&[1,3]).tracked()).sum(0);
    let ids: Vec<_> = loss.parameters().iter().map(|p| p.id() ).collect();
    let own: Vec<_> = dense.parameters().iter().map(|p| p.id() ).collect();
    assert_eq!(ids, own);
    assert!(dense.parameters().iter().all(|p| p.is_trainable() ));
  }

  #[test]
  fn normal_init() {
    let mut rng = StdRng::seed_from_u64(1);
    let init = Init::Normal { mean: 2.0, std: 0.0 };
    assert_eq!(init.generate(&[3], &mut rng), Tensor::vec(&[2.0, 2.0, 2.0]));
  }
}
