use rand::distributions::uniform::SampleUniform;
use num_traits::{ Num, NumAssignOps, NumCast };


/// All types that may be stored in a [Tensor](crate::Tensor).
///
/// This trait gets implemented automatically for all types
/// that satisfy its dependent traits.

pub trait Inner: PartialEq + Clone + Copy + std::fmt::Debug + 'static {}
impl<T: PartialEq + Clone + Copy + std::fmt::Debug + 'static> Inner for T {}


/// All numeric types.
///
/// This trait gets implemented automatically for all types
/// that satisfy its dependent traits.

pub trait Numeric: Inner + PartialOrd + Num + NumCast + NumAssignOps + std::iter::Sum {}
impl<T: Inner + PartialOrd + Num + NumCast + NumAssignOps + std::iter::Sum> Numeric for T {}


/// All signed numeric types.

pub trait Signed: Numeric + num_traits::Signed {}
impl<T: Numeric + num_traits::Signed> Signed for T {}


/// Row-major general matrix multiply `c = a × b` for
/// element types with an accelerated kernel.

pub trait Gemm: Sized {
  fn gemm(m: usize, k: usize, n: usize, a: &[Self], b: &[Self], c: &mut [Self]);
}

macro_rules! naive_gemm {
  ($m:ident, $k:ident, $n:ident, $a:ident, $b:ident, $c:ident) => {
    for i in 0..$m {
      for p in 0..$k {
        let a = $a[i * $k + p];
        let row = &$b[p * $n..(p + 1) * $n];
        for (out, &b) in $c[i * $n..(i + 1) * $n].iter_mut().zip(row) {
          *out += a * b;
        }
      }
    }
  };
}

impl Gemm for f32 {
  #[cfg(feature = "unsafe")]
  fn gemm(m: usize, k: usize, n: usize, a: &[f32], b: &[f32], c: &mut [f32]) {
    assert!(a.len() >= m * k && b.len() >= k * n && c.len() >= m * n);
    unsafe {
      matrixmultiply::sgemm(
        m, k, n,
        1.0,
        a.as_ptr(), k as isize, 1,
        b.as_ptr(), n as isize, 1,
        0.0,
        c.as_mut_ptr(), n as isize, 1,
      );
    }
  }

  #[cfg(not(feature = "unsafe"))]
  fn gemm(m: usize, k: usize, n: usize, a: &[f32], b: &[f32], c: &mut [f32]) {
    c.iter_mut().for_each(|x| *x = 0.0 );
    naive_gemm!(m, k, n, a, b, c);
  }
}

impl Gemm for f64 {
  #[cfg(feature = "unsafe")]
  fn gemm(m: usize, k: usize, n: usize, a: &[f64], b: &[f64], c: &mut [f64]) {
    assert!(a.len() >= m * k && b.len() >= k * n && c.len() >= m * n);
    unsafe {
      matrixmultiply::dgemm(
        m, k, n,
        1.0,
        a.as_ptr(), k as isize, 1,
        b.as_ptr(), n as isize, 1,
        0.0,
        c.as_mut_ptr(), n as isize, 1,
      );
    }
  }

  #[cfg(not(feature = "unsafe"))]
  fn gemm(m: usize, k: usize, n: usize, a: &[f64], b: &[f64], c: &mut [f64]) {
    c.iter_mut().for_each(|x| *x = 0.0 );
    naive_gemm!(m, k, n, a, b, c);
  }
}


/// All continuous numeric types.
///
/// This trait gets implemented automatically for all types
/// that satisfy its dependent traits.

pub trait Real: Signed + num_traits::Float + SampleUniform + Gemm {}
impl<T: Signed + num_traits::Float + SampleUniform + Gemm> Real for T {}
