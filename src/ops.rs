use std::ops::{ Add, Sub, Mul, Div };

use crate::internal::*;
use crate::Shape;
use crate::scalar::{ Inner, Numeric, Real };


/// Shorthand for the four arithmetic operators producing `Out`.

pub trait Arith<Rhs, Out>: Add<Rhs, Output=Out> + Sub<Rhs, Output=Out> + Mul<Rhs, Output=Out> + Div<Rhs, Output=Out> {}
impl<L, Rhs, Out> Arith<Rhs, Out> for L
where
  L: Add<Rhs, Output=Out> + Sub<Rhs, Output=Out> + Mul<Rhs, Output=Out> + Div<Rhs, Output=Out>
{}


/// Structural operations that are also implemented
/// for non-differentiable [Inner] types.

pub trait BaseOps<I: Inner>: Clone {
  fn scalar(item: I) -> Self;
  fn shape(&self) -> &Shape;
  fn broadcast(&self, dims: &[usize]) -> Self;
  fn reshape(&self, dims: &[usize]) -> Self;
  fn transpose(&self, dim1: isize, dim2: isize) -> Self;

  fn dim(&self, idx: isize) -> usize {
    self.shape()[idx]
  }
}


/// Reductions over every dimension from `dim` onwards.
///
/// `sum(0)` reduces a tensor to a scalar, `sum(-1)` to one value per row.

pub trait NumericOps<I: Numeric>: Sized {
  fn sum(&self, dim: isize) -> Self;

  /// Greatest value. On a [Variable](crate::Variable) the result is treated
  /// as a constant and does not propagate gradients.
  fn max(&self, dim: isize) -> Self;
}


/// Differentiable low-level operations.

pub trait RealOps<I: Real> {
  fn mm(&self, rhs: &Self) -> Self;
  fn powf(&self, exp: I) -> Self;
  fn exp(&self) -> Self;
  fn log(&self) -> Self;
  fn abs(&self) -> Self;
  fn relu(&self) -> Self;
  fn sigmoid(&self) -> Self;
}


/// High-level operations, implemented exclusively on top of
/// the lower level traits. As a result, these are all
/// differentiable when called on a [Variable](crate::Variable).

pub trait Hops<I>: BaseOps<I> + NumericOps<I> + RealOps<I>
where
  I: Real,
  for<'a> &'a Self: Arith<&'a Self, Self> + Arith<I, Self>,
{
  fn sqr(&self) -> Self {
    self.powf(lit(2.0))
  }

  fn sqrt(&self) -> Self {
    self.powf(lit(0.5))
  }

  /// Reshape the output of a reduction over `dim` so that it
  /// broadcasts against `self` again.

  fn kept(&self, reduced: &Self, dim: isize) -> Self {
    let rank = self.shape().rank();
    let d = negative_index(dim, rank, false);
    let mut dims = self.shape().dims[..d].to_vec();
    dims.resize(rank, 1);
    reduced.reshape(&dims)
  }

  fn mean(&self, dim: isize) -> Self {
    let d = negative_index(dim, self.shape().rank(), false);
    let n: usize = self.shape().dims[d..].iter().product();
    &self.sum(dim) / lit::<I>(n)
  }

  fn variance(&self, dim: isize) -> Self {
    let centered = self - &self.kept(&self.mean(dim), dim);
    centered.sqr().mean(dim)
  }

  fn softmax(&self, dim: isize) -> Self {
    let shifted = self - &self.kept(&self.max(dim), dim);
    let exp = shifted.exp();
    &exp / &exp.kept(&exp.sum(dim), dim)
  }

  fn log_softmax(&self, dim: isize) -> Self {
    let shifted = self - &self.kept(&self.max(dim), dim);
    let normalizer = shifted.exp().sum(dim).log();
    &shifted - &shifted.kept(&normalizer, dim)
  }

  /// Mean squared error against `target`, averaged over all elements.

  fn mse(&self, target: &Self) -> Self {
    (self - target).sqr().mean(0)
  }

  /// Mean cross entropy between predicted class probabilities along
  /// the last dimension and one-hot `target`s.

  fn cross_entropy(&self, target: &Self) -> Self {
    let log_probs = (self + lit::<I>(1e-10)).log();
    let per_sample = (target * &log_probs).sum(-1);
    &per_sample.mean(0) * -I::one()
  }

  /// Mean softmax cross entropy computed directly
  /// from unnormalized `self` logits.

  fn softmax_cross_entropy(&self, target: &Self) -> Self {
    let per_sample = (target * &self.log_softmax(-1)).sum(-1);
    &per_sample.mean(0) * -I::one()
  }
}
