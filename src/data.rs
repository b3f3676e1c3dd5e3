//! In-memory datasets and shuffled mini-batch iteration.

use rand::Rng;
use rand::seq::SliceRandom;

pub mod mnist;

use crate::{
  internal::*,
  error::{ Error, Result },
  scalar::Real,
  tensor::Tensor,
  ops::BaseOps,
};


/// Inputs paired row by row with their targets.
///
/// Both tensors share their first dimension, the number of samples.

#[derive(Debug, Clone)]
pub struct Dataset<T: Real> {
  inputs: Tensor<T>,
  targets: Tensor<T>,
}

impl<T: Real> Dataset<T> {
  pub fn new(inputs: Tensor<T>, targets: Tensor<T>) -> Result<Self> {
    if inputs.rank() == 0 || targets.rank() == 0 {
      return Err(Error::InvalidData("inputs and targets need a sample dimension".to_string()))
    }
    if inputs.dim(0) != targets.dim(0) {
      return Err(Error::InvalidData(format!(
        "{} inputs do not match {} targets", inputs.dim(0), targets.dim(0)
      )))
    }
    Ok(Self { inputs: inputs.contiguous(), targets: targets.contiguous() })
  }

  pub fn inputs(&self) -> &Tensor<T> {
    &self.inputs
  }

  pub fn targets(&self) -> &Tensor<T> {
    &self.targets
  }

  pub fn len(&self) -> usize {
    self.inputs.dim(0)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Number of features per sample.

  pub fn sample_dim(&self) -> usize {
    self.inputs.shape().dims[1..].iter().product()
  }

  pub fn target_dim(&self) -> usize {
    self.targets.shape().dims[1..].iter().product()
  }

  /// Gather the samples at `indices` into a batch of inputs and targets.

  pub fn batch(&self, indices: &[usize]) -> (Tensor<T>, Tensor<T>) {
    (self.inputs.select_rows(indices), self.targets.select_rows(indices))
  }

  /// Shuffled mini-batches of at most `batch_size` samples each.

  pub fn batches<R: Rng>(&self, batch_size: usize, mode: Mode, rng: R) -> Result<Batches<'_, T, R>> {
    Batches::new(self, batch_size, mode, rng)
  }
}


/// How [Batches] behaves once every sample has been visited.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  /// Stop after a single pass. The last batch may be smaller.
  Epoch,
  /// Reshuffle and keep going forever. Batches may straddle two passes.
  Repeat,
}


/// Iterator over shuffled mini-batches of a [Dataset].

#[derive(Debug)]
pub struct Batches<'a, T: Real, R: Rng> {
  dataset: &'a Dataset<T>,
  order: Vec<usize>,
  cursor: usize,
  batch_size: usize,
  mode: Mode,
  rng: R,
}

impl<'a, T: Real, R: Rng> Batches<'a, T, R> {
  pub fn new(dataset: &'a Dataset<T>, batch_size: usize, mode: Mode, mut rng: R) -> Result<Self> {
    if batch_size == 0 {
      return Err(Error::InvalidData("batch size must be positive".to_string()))
    }
    if mode == Mode::Repeat && dataset.is_empty() {
      return Err(Error::InvalidData("cannot repeat an empty dataset".to_string()))
    }
    let mut order: Vec<usize> = (0..dataset.len()).collect();
    order.shuffle(&mut rng);
    Ok(Self { dataset, order, cursor: 0, batch_size, mode, rng })
  }

  /// Number of batches in a single pass over the dataset.

  pub fn per_epoch(&self) -> usize {
    (self.order.len() + self.batch_size - 1) / self.batch_size
  }

  fn next_indices(&mut self) -> Option<Vec<usize>> {
    match self.mode {
      Mode::Epoch => {
        if self.cursor >= self.order.len() { return None }
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let indices = self.order[self.cursor..end].to_vec();
        self.cursor = end;
        Some(indices)
      },
      Mode::Repeat => {
        let mut indices = Vec::with_capacity(self.batch_size);
        while indices.len() < self.batch_size {
          if self.cursor == self.order.len() {
            self.order.shuffle(&mut self.rng);
            self.cursor = 0;
          }
          let take = (self.batch_size - indices.len()).min(self.order.len() - self.cursor);
          indices.extend_from_slice(&self.order[self.cursor..self.cursor + take]);
          self.cursor += take;
        }
        Some(indices)
      },
    }
  }
}

impl<T: Real, R: Rng> Iterator for Batches<'_, T, R> {
  type Item = (Tensor<T>, Tensor<T>);

  fn next(&mut self) -> Option<Self::Item> {
    let indices = self.next_indices()?;
    Some(self.dataset.batch(&indices))
  }
}


/// Scale raw bytes from `[0, 255]` to `[0, 1]`.

pub fn normalize<T: Real + Send + Sync>(bytes: &[u8]) -> Vec<T> {
  let scale: T = lit(255.0);

  #[cfg(feature = "rayon")]
  {
    use rayon::prelude::*;
    bytes.par_iter().map(|&byte| lit::<T>(byte) / scale ).collect()
  }

  #[cfg(not(feature = "rayon"))]
  bytes.iter().map(|&byte| lit::<T>(byte) / scale ).collect()
}


/// One-hot encode class `labels` into a `[labels, depth]` tensor.

pub fn one_hot<T: Real>(labels: &[u8], depth: usize) -> Result<Tensor<T>> {
  if let Some(label) = labels.iter().find(|&&label| label as usize >= depth ) {
    return Err(Error::InvalidData(format!("label {label} out of range for depth {depth}")))
  }
  let indices: Vec<usize> = labels.iter().map(|&label| label as usize ).collect();
  Ok(Tensor::from_vec(indices).one_hot(depth))
}
