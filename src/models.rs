//! The three training programs as reusable library code.
//!
//! Every submodule pairs a serializable `Config`, whose default holds
//! the original hyperparameters, with a model struct and a `train`
//! function that runs the whole program and returns a report.

pub mod linear;
pub mod softmax;
pub mod mlp;

use crate::{ scalar::Real, tensor::Tensor };


/// Fraction of rows whose greatest prediction matches the
/// hot class of the corresponding one-hot target row.

pub fn accuracy<T: Real>(predictions: &Tensor<T>, targets: &Tensor<T>) -> T {
  predictions.argmax(-1).accuracy(&targets.argmax(-1))
}
