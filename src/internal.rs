use rand::Rng;
use num_traits::NumCast;

use crate::{
  scalar::Real,
};


#[inline]
pub fn negative_index(i: isize, n: usize, start_behind: bool) -> usize {
  if i < 0 {
    let offset = if start_behind { 1 } else { 0 };
    (n as isize + i + offset) as usize
  } else {
    i as usize
  }
}


/// Convert a float literal or count into any numeric type.

#[inline]
pub fn lit<T: NumCast>(value: impl num_traits::ToPrimitive) -> T {
  <T as NumCast>::from(value).unwrap()
}


// Polar Box-Muller transformation

pub fn randn<T: Real>(rng: &mut impl Rng) -> (T, T) {
  loop {
    let u: T = rng.gen_range(-T::one(), T::one());
    let v: T = rng.gen_range(-T::one(), T::one());
    let r = u * u + v * v;
    // Try again if outside unit circle
    if r == T::zero() || r >= T::one() { continue }
    let c = (lit::<T>(-2.0) * r.ln() / r).sqrt();
    return (u * c, v * c)
  }
}
