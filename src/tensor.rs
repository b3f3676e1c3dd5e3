use std::rc::Rc;
use std::cell::{ Ref, RefCell };

use rand::Rng;
use itertools::Itertools;

mod cops;
mod lops;

use crate::{
  internal::*,
  shape::Shape,
  variable::Variable,
  scalar::{ Inner, Numeric, Real },
  ops::{ BaseOps, Hops },
};


/// Multidimensional array.
///
/// Tensors may contain any type that satisfies [Inner], but
/// additional methods are available for [Numeric], [Real]
/// and [boolean](bool) inner types.
///
/// Clones are cheap and share their storage. Views created by
/// [transpose](BaseOps::transpose) or [broadcast](BaseOps::broadcast)
/// share it as well, so [feed](Tensor::feed)ing a tensor is visible
/// through all of them.
///
/// [Real] tensor types can be wrapped in a [Variable] by
/// calling [tracked](Tensor::tracked) or [trained](Tensor::trained).

#[derive(Debug, Clone)]
pub struct Tensor<T: Inner> {
  shape: Shape,
  data: Rc<RefCell<Vec<T>>>,
}

impl<T: Real> Hops<T> for Tensor<T> {}

impl<T: Inner> PartialEq for Tensor<T> {
  fn eq(&self, rhs: &Self) -> bool {
    if self.shape.squeezed() != rhs.shape.squeezed() { return false }
    let data_l = self.data.borrow();
    let data_r = rhs.data.borrow();
    self.shape.iter()
      .zip(rhs.shape.iter())
      .all(|(i, j)| data_l[i] == data_r[j] )
  }
}

impl<T: Inner> Tensor<T> {
  pub fn from_shape(shape: Shape, data: Vec<T>) -> Self {
    assert_eq!(shape.size(), data.len(),
      "{} doesn't match data length {}", shape, data.len());
    Self { shape, data: Rc::new(RefCell::new(data)) }
  }

  pub fn new(dims: &[usize], data: Vec<T>) -> Self {
    Self::from_shape(Shape::new(dims), data)
  }

  pub fn vec(vec: &[T]) -> Self {
    Self::new(&[vec.len()], vec.to_vec())
  }

  pub fn from_vec(vec: Vec<T>) -> Self {
    Self::new(&[vec.len()], vec)
  }

  pub fn fill(dims: &[usize], filler: T) -> Self {
    Self::new(dims, vec![filler; dims.iter().product()])
  }

  /// Generate every element from its flat row-major index.

  pub fn from_fn(dims: &[usize], cb: impl FnMut(usize) -> T) -> Self {
    let size = dims.iter().product();
    Self::new(dims, (0..size).map(cb).collect())
  }

  pub fn raw(&self) -> Ref<Vec<T>> {
    self.data.borrow()
  }

  /// Copy all elements into a vector in row-major order.

  pub fn to_vec(&self) -> Vec<T> {
    self.param_iter().collect()
  }

  pub fn size(&self) -> usize {
    self.shape.size()
  }

  pub fn rank(&self) -> usize {
    self.shape.rank()
  }

  pub fn item(&self) -> T {
    assert!(self.shape.squeezed().is_empty(),
      "Can't extract item from non-scalar {}", self.shape);
    self.raw()[self.shape.offset]
  }

  pub fn shared_with(&self, other: &Self) -> bool {
    Rc::ptr_eq(&self.data, &other.data)
  }

  /// Overwrite this tensor's elements in place with those of `other`.

  pub fn feed(&self, other: &Self) {
    assert!(self.shape.squeezed() == other.shape.squeezed(),
      "Could not feed {} tensor with {} tensor", self.shape, other.shape);
    // Avoid clashing borrows when both share storage
    let other = if self.shared_with(other) { other.detach() } else { other.clone() };
    let mut data = self.data.borrow_mut();
    let other_data = other.data.borrow();
    for (i, j) in self.shape.iter().zip(other.shape.iter()) {
      data[i] = other_data[j];
    }
  }

  pub fn assign(&self, other: &Self) {
    self.feed(other)
  }

  /// Set every element to `filler` in place.

  pub fn refill(&self, filler: T) {
    let mut data = self.data.borrow_mut();
    for i in self.shape.iter() {
      data[i] = filler;
    }
  }

  pub fn contiguous(&self) -> Self {
    if self.shape.contiguous() && self.shape.offset == 0 && self.raw().len() == self.size() {
      self.clone()
    } else {
      self.detach()
    }
  }

  /// Copy into fresh, contiguous storage.

  pub fn detach(&self) -> Self {
    self.vectorize(|a| a )
  }

  pub fn zip<O, F>(&self, rhs: &Self, mut cb: F) -> Tensor<O>
  where
    O: Inner,
    F: FnMut(T, T) -> O,
  {
    if self.shape.dims == rhs.shape.dims && self.shape.contiguous() && rhs.shape.contiguous() {
      let data_l = self.data.borrow();
      let data_r = rhs.data.borrow();
      let (ol, or) = (self.shape.offset, rhs.shape.offset);
      let n = self.size();
      let data = data_l[ol..ol + n].iter()
        .zip(&data_r[or..or + n])
        .map(|(&a, &b)| cb(a, b) )
        .collect();
      return Tensor::new(&self.shape.dims, data)
    }
    let dims = Shape::broadcast_dims(&self.shape.dims, &rhs.shape.dims);
    let lhs = self.broadcast(&dims);
    let rhs = rhs.broadcast(&dims);
    let data = lhs.param_iter()
      .zip(rhs.param_iter())
      .map(|(a, b)| cb(a, b) )
      .collect();
    Tensor::new(&dims, data)
  }

  pub fn vectorize<O, F>(&self, cb: F) -> Tensor<O>
  where
    O: Inner,
    F: FnMut(T) -> O,
  {
    let data = self.param_iter().map(cb).collect();
    Tensor::new(&self.shape.dims, data)
  }

  pub fn param_iter(&self) -> TensorIterator<T> {
    TensorIterator::new(self)
  }

  pub fn unsqueeze(&self, dim: isize) -> Self {
    Self { shape: self.shape.unsqueeze(dim), data: self.data.clone() }
  }

  /// Gather rows along the first dimension into a new contiguous tensor.

  pub fn select_rows(&self, indices: &[usize]) -> Self {
    let this = self.contiguous();
    let rows = this.shape.dims.first().copied().unwrap_or(1);
    let width = this.size() / rows.max(1);
    let data = this.raw();
    let mut out = Vec::with_capacity(indices.len() * width);
    for &i in indices {
      assert!(i < rows, "Row index {} out of bounds for {}", i, this.shape);
      out.extend_from_slice(&data[i * width..(i + 1) * width]);
    }
    let mut dims = this.shape.dims.clone();
    dims[0] = indices.len();
    Tensor::new(&dims, out)
  }

  pub fn equal(&self, rhs: &Self) -> Tensor<bool> {
    self.zip(rhs, |a, b| a == b )
  }
}

impl<T: Numeric> Tensor<T> {
  pub fn zeros(dims: &[usize]) -> Self {
    Self::fill(dims, T::zero())
  }

  pub fn ones(dims: &[usize]) -> Self {
    Self::fill(dims, T::one())
  }

  pub fn arrange(dims: &[usize], start: T, step: T) -> Self {
    Self::from_fn(dims, |i| lit::<T>(i) * step + start )
  }

  /// Sum a broadcasted tensor back down to `dims`, accumulating
  /// every element that was repeated during broadcasting.

  pub fn sum_to(&self, dims: &[usize]) -> Self {
    if self.shape.dims == dims { return self.clone() }
    let out = Self::zeros(dims);
    {
      let target = out.shape.broadcast(&self.shape.dims);
      let mut raw = out.data.borrow_mut();
      for (i, value) in target.iter().zip(self.param_iter()) {
        raw[i] += value;
      }
    }
    out
  }

  /// Add `other` into this tensor in place.

  pub fn accumulate(&self, other: &Self) {
    assert!(self.shape.squeezed() == other.shape.squeezed(),
      "Could not accumulate {} tensor into {} tensor", other.shape, self.shape);
    let other = if self.shared_with(other) { other.detach() } else { other.clone() };
    let mut data = self.data.borrow_mut();
    for (i, value) in self.shape.iter().zip(other.param_iter()) {
      data[i] += value;
    }
  }

  pub fn gt(&self, rhs: &Self) -> Tensor<bool> {
    self.zip(rhs, |a, b| a > b )
  }

  /// Collapse all dimensions from `dim` onwards into
  /// the index of their greatest value.

  pub fn argmax(&self, dim: isize) -> Tensor<usize> {
    // Ties resolve to the first occurrence
    self.collapse(dim, |values| {
      let mut index = 0;
      for (i, &value) in values.iter().enumerate() {
        if value > values[index] { index = i }
      }
      index
    })
  }

  pub fn cast<I: Numeric>(&self) -> Tensor<I> {
    self.vectorize(|a| lit::<I>(a) )
  }

  /// Reduce every dimension from `dim` onwards with `cb`.

  pub(crate) fn collapse<O, F>(&self, dim: isize, cb: F) -> Tensor<O>
  where
    O: Inner,
    F: Fn(&[T]) -> O,
  {
    let dim = negative_index(dim, self.rank(), false);
    let dims = &self.shape.dims[..dim];
    let this = self.contiguous();
    let raw = this.raw();
    let outer: usize = dims.iter().product();
    let inner = this.size() / outer.max(1);
    let data = if inner == 0 {
      vec![]
    } else {
      raw[..this.size()].chunks(inner).map(cb).collect()
    };
    Tensor::new(dims, data)
  }
}

impl<T: Numeric + num_traits::Unsigned> Tensor<T> {
  /// Expand class indices into vectors that are one at the index
  /// and zero elsewhere, appending a dimension of size `depth`.

  pub fn one_hot<O: Numeric>(&self, depth: usize) -> Tensor<O> {
    let mut data = vec![O::zero(); self.size() * depth];
    for (row, label) in self.param_iter().enumerate() {
      let i: usize = lit(label);
      assert!(i < depth, "Label {} out of range for depth {}", i, depth);
      data[row * depth + i] = O::one();
    }
    let mut dims = self.shape.dims.clone();
    dims.push(depth);
    Tensor::new(&dims, data)
  }
}

impl Tensor<usize> {
  /// Fraction of entries that agree with `labels`.

  pub fn accuracy<O: Real>(&self, labels: &Self) -> O {
    assert_eq!(self.shape.dims, labels.shape.dims,
      "Cannot compare {} predictions to {} labels", self.shape, labels.shape);
    if self.size() == 0 { return O::zero() }
    let hits = self.equal(labels).param_iter().filter(|&hit| hit ).count();
    lit::<O>(hits) / lit::<O>(self.size())
  }
}

impl<T: Real> Tensor<T> {
  /// Uniform samples from `[0, 1)`.

  pub fn rand(dims: &[usize], rng: &mut impl Rng) -> Self {
    Self::from_fn(dims, |_| rng.gen_range(T::zero(), T::one()) )
  }

  pub fn uniform(dims: &[usize], low: T, high: T, rng: &mut impl Rng) -> Self {
    Self::from_fn(dims, |_| rng.gen_range(low, high) )
  }

  /// Samples from the standard normal distribution.

  pub fn randn(dims: &[usize], rng: &mut impl Rng) -> Self {
    let len: usize = dims.iter().product();
    let mut data = Vec::with_capacity(len + 1);
    while data.len() < len {
      let (r1, r2): (T, T) = randn(rng);
      data.push(r1);
      data.push(r2);
    }
    data.truncate(len);
    Self::new(dims, data)
  }

  pub fn normal(dims: &[usize], mean: T, std: T, rng: &mut impl Rng) -> Self {
    Self::randn(dims, rng).vectorize(|a| a * std + mean )
  }

  /// Glorot/Xavier uniform initialization for a `[fan_in, fan_out]` matrix.

  pub fn glorot_uniform(dims: &[usize], rng: &mut impl Rng) -> Self {
    let fan_in = if dims.len() > 1 { dims[dims.len() - 2] } else { 1 };
    let fan_out = dims.last().copied().unwrap_or(1);
    let limit = (lit::<T>(6.0) / lit::<T>(fan_in + fan_out)).sqrt();
    Self::uniform(dims, -limit, limit, rng)
  }

  pub fn trained(&self) -> Variable<T> {
    Variable::from_tensor(self.contiguous(), true)
  }

  pub fn tracked(&self) -> Variable<T> {
    Variable::from_tensor(self.clone(), false)
  }

  pub fn signum(&self) -> Self {
    self.vectorize(|a| if a > T::zero() {
      T::one()
    } else if a < T::zero() {
      -T::one()
    } else {
      T::zero()
    })
  }
}

impl Tensor<bool> {
  pub fn numeric<O: Numeric>(&self) -> Tensor<O> {
    self.vectorize(|a| if a { O::one() } else { O::zero() })
  }
}

impl<T: Inner> std::fmt::Display for Tensor<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "Tensor{:?} ", self.shape.dims)?;
    print_chunks(0, &self.shape.dims, &self.to_vec(), f)
  }
}

fn print_chunks<T: std::fmt::Debug>(idx: usize, dims: &[usize], vec: &[T], f: &mut std::fmt::Formatter) -> std::fmt::Result {
  let indent = " ".repeat(idx * 2);
  if dims.is_empty() {
    write!(f, "{indent}{:?}", vec[0])?;
  } else if idx == dims.len() - 1 || vec.is_empty() {
    writeln!(f, "{indent}[{}]", vec.iter().map(|a| format!("{a:?}") ).join(", "))?;
  } else {
    writeln!(f, "{indent}[")?;
    for chunk in vec.chunks(vec.len() / dims[idx]) {
      print_chunks(idx + 1, dims, chunk, f)?;
    }
    writeln!(f, "{indent}]")?;
  }
  Ok(())
}


/// Iterates a tensor's elements in row-major order, honoring its strides.

pub struct TensorIterator<'a, T: Inner> {
  data: Ref<'a, Vec<T>>,
  shape_iter: Box<dyn Iterator<Item=usize> + 'a>,
}

impl<'a, T: Inner> TensorIterator<'a, T> {
  fn new(tensor: &'a Tensor<T>) -> Self {
    Self {
      data: tensor.data.borrow(),
      shape_iter: tensor.shape.iter(),
    }
  }
}

impl<T: Inner> Iterator for TensorIterator<'_, T> {
  type Item = T;

  fn next(&mut self) -> Option<T> {
    self.shape_iter.next().map(|i| self.data[i] )
  }
}
