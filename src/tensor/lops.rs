use crate::{
  shape::Shape,
  tensor::Tensor,
  scalar::{ Inner, Numeric, Signed, Real },
  ops::{ BaseOps, NumericOps, RealOps },
};


impl<T: Inner> BaseOps<T> for Tensor<T> {
  fn scalar(item: T) -> Self {
    Self::new(&[], vec![item])
  }

  fn shape(&self) -> &Shape {
    &self.shape
  }

  fn broadcast(&self, dims: &[usize]) -> Self {
    if self.shape.dims == dims { return self.clone() }
    Self { shape: self.shape.broadcast(dims), data: self.data.clone() }
  }

  fn reshape(&self, dims: &[usize]) -> Self {
    let this = self.contiguous();
    Self { shape: this.shape.view(dims), data: this.data }
  }

  fn transpose(&self, dim1: isize, dim2: isize) -> Self {
    Self { shape: self.shape.transpose(dim1, dim2), data: self.data.clone() }
  }
}

impl<T: Numeric> NumericOps<T> for Tensor<T> {
  fn sum(&self, dim: isize) -> Self {
    self.collapse(dim, |values| values.iter().copied().sum() )
  }

  fn max(&self, dim: isize) -> Self {
    self.collapse(dim, |values| {
      values.iter()
        .copied()
        .reduce(|a, b| if b > a { b } else { a } )
        .unwrap_or_else(T::zero)
    })
  }
}

impl<T: Real> RealOps<T> for Tensor<T> {
  fn mm(&self, rhs: &Self) -> Self {
    let (rank_l, rank_r) = (self.rank(), rhs.rank());
    assert!((2..=3).contains(&rank_l) && (2..=3).contains(&rank_r),
      "Can only multiply matrices or batches of matrices, got {} & {}", self.shape, rhs.shape);
    assert_eq!(self.shape[-1], rhs.shape[-2],
      "Cannot multiply {} with {}", self.shape, rhs.shape);

    let batches = match (rank_l, rank_r) {
      (3, 3) => {
        assert_eq!(self.shape[0], rhs.shape[0],
          "Batch sizes of {} & {} differ", self.shape, rhs.shape);
        Some(self.shape[0])
      },
      (3, _) => Some(self.shape[0]),
      (_, 3) => Some(rhs.shape[0]),
      _ => None,
    };

    let data = self.matmul(rhs, batches.unwrap_or(1));
    let (rows, cols) = (self.shape[-2], rhs.shape[-1]);
    match batches {
      Some(n) => Self::new(&[n, rows, cols], data),
      None => Self::new(&[rows, cols], data),
    }
  }

  fn powf(&self, exp: T) -> Self {
    self.vectorize(|a| a.powf(exp) )
  }

  fn exp(&self) -> Self {
    self.vectorize(|a| a.exp() )
  }

  fn log(&self) -> Self {
    self.vectorize(|a| a.ln() )
  }

  fn abs(&self) -> Self {
    self.vectorize(|a| num_traits::Float::abs(a) )
  }

  fn relu(&self) -> Self {
    self.vectorize(|a| if a > T::zero() { a } else { T::zero() })
  }

  fn sigmoid(&self) -> Self {
    self.vectorize(|a| T::one() / (T::one() + (-a).exp()) )
  }
}

impl<T: Signed> std::ops::Neg for &Tensor<T> {
  type Output = Tensor<T>;

  fn neg(self) -> Self::Output {
    self.vectorize(|a| -a )
  }
}

impl<T: Signed> std::ops::Neg for Tensor<T> {
  type Output = Tensor<T>;

  fn neg(self) -> Self::Output {
    -&self
  }
}

macro_rules! add_operator {
  ($trait:ident, $meth:ident, $symbol:tt) => {
    impl<T: Numeric> std::ops::$trait for &Tensor<T> { // &tensor * &other
      type Output = Tensor<T>;

      fn $meth(self, rhs: Self) -> Tensor<T> {
        self.zip(rhs, |a, b| a $symbol b )
      }
    }

    impl<T: Numeric> std::ops::$trait for Tensor<T> { // tensor * other
      type Output = Tensor<T>;

      fn $meth(self, rhs: Self) -> Tensor<T> {
        &self $symbol &rhs
      }
    }

    impl<T: Numeric> std::ops::$trait<Tensor<T>> for &Tensor<T> { // &tensor * other
      type Output = Tensor<T>;

      fn $meth(self, rhs: Tensor<T>) -> Tensor<T> {
        self $symbol &rhs
      }
    }

    impl<T: Numeric> std::ops::$trait<&Tensor<T>> for Tensor<T> { // tensor * &other
      type Output = Tensor<T>;

      fn $meth(self, rhs: &Tensor<T>) -> Tensor<T> {
        &self $symbol rhs
      }
    }

    impl<T: Numeric> std::ops::$trait<T> for &Tensor<T> { // &tensor * T
      type Output = Tensor<T>;

      fn $meth(self, rhs: T) -> Tensor<T> {
        self.vectorize(|a| a $symbol rhs )
      }
    }

    impl<T: Numeric> std::ops::$trait<T> for Tensor<T> { // tensor * T
      type Output = Tensor<T>;

      fn $meth(self, rhs: T) -> Tensor<T> {
        &self $symbol rhs
      }
    }

    impl std::ops::$trait<&Tensor<f32>> for f32 { // f32 * &tensor
      type Output = Tensor<f32>;

      fn $meth(self, tensor: &Tensor<f32>) -> Tensor<f32> {
        tensor.vectorize(|a| self $symbol a )
      }
    }

    impl std::ops::$trait<Tensor<f32>> for f32 { // f32 * tensor
      type Output = Tensor<f32>;

      fn $meth(self, tensor: Tensor<f32>) -> Tensor<f32> {
        self $symbol &tensor
      }
    }

    impl std::ops::$trait<&Tensor<f64>> for f64 { // f64 * &tensor
      type Output = Tensor<f64>;

      fn $meth(self, tensor: &Tensor<f64>) -> Tensor<f64> {
        tensor.vectorize(|a| self $symbol a )
      }
    }

    impl std::ops::$trait<Tensor<f64>> for f64 { // f64 * tensor
      type Output = Tensor<f64>;

      fn $meth(self, tensor: Tensor<f64>) -> Tensor<f64> {
        self $symbol &tensor
      }
    }
  };
}

add_operator!(Add, add, +);
add_operator!(Sub, sub, -);
add_operator!(Mul, mul, *);
add_operator!(Div, div, /);


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sum() {
    let a = Tensor::new(&[3,2], vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(a.sum(0), Tensor::scalar(21));
    assert_eq!(a.sum(-1), Tensor::vec(&[3, 7, 11]));
  }

  #[test]
  fn max() {
    let a = Tensor::new(&[2,3], vec![1, 9, 3, -4, -5, -6]);
    assert_eq!(a.max(-1), Tensor::vec(&[9, -4]));
    assert_eq!(a.max(0).item(), 9);
  }

  #[test]
  fn reshape_transposed() {
    let a = Tensor::arrange(&[2,3], 0, 1).transpose(0, 1).reshape(&[6]);
    assert_eq!(a, Tensor::vec(&[0, 3, 1, 4, 2, 5]));
  }

  #[test]
  fn scalar_operators() {
    let a = Tensor::vec(&[1.0f32, 2.0]);
    assert_eq!(&a * 2.0, Tensor::vec(&[2.0, 4.0]));
    assert_eq!(1.0f32 - &a, Tensor::vec(&[0.0, -1.0]));
    assert_eq!(-a, Tensor::vec(&[-1.0, -2.0]));
  }

  #[test]
  fn activations() {
    let a = Tensor::vec(&[-1.0f64, 0.0, 2.0]);
    assert_eq!(a.relu(), Tensor::vec(&[0.0, 0.0, 2.0]));
    assert_eq!(a.sigmoid().to_vec()[1], 0.5);
    assert_eq!(a.abs(), Tensor::vec(&[1.0, 0.0, 2.0]));
  }
}
