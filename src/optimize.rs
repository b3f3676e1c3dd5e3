use std::collections::HashMap;

use crate::{
  internal::*,
  scalar::Real,
  tensor::Tensor,
  variable::Variable,
  ops::{ BaseOps, Hops },
};


/// An optimization strategy to be used with [Optimizer].
///
/// Returns the change to be added to `param`'s current value.

pub trait Strategy<R: Real> {
  fn update(&mut self, param: &Variable<R>, grad: &Tensor<R>, rate: R, step: usize) -> Tensor<R>;
}


/// Generic optimizer that allows for several optimization [strategies](Strategy) to be used.

#[derive(Debug)]
pub struct Optimizer<R: Real, S: Strategy<R>> {
  strategy: S,
  pub learning_rate: R,
  step: usize,
}

impl<R: Real, S: Strategy<R>> Optimizer<R, S> {
  pub fn new(learning_rate: R, strategy: S) -> Self {
    Self { strategy, learning_rate, step: 1 }
  }

  /// Number of the next update, starting at one.

  pub fn step(&self) -> usize {
    self.step
  }

  /// Back-propagate `loss`, move all `params` against their
  /// gradient and reset the gradients of the whole graph.

  pub fn minimize(&mut self, loss: &Variable<R>, params: &[Variable<R>]) {
    loss.backward();

    for param in params {
      let Some(grad) = param.grad() else {
        panic!("Constant {param} cannot be optimized")
      };
      let change = self.strategy.update(param, grad, self.learning_rate, self.step);
      let weights = param.tensor();
      weights.feed(&(weights + change));
    }

    loss.reset();
    self.step += 1;
  }
}


/// Stochastic Gradient Descent strategy

#[derive(Debug, Clone, Default)]
pub struct SGD;

impl<R: Real> Strategy<R> for SGD {
  fn update(&mut self, _param: &Variable<R>, grad: &Tensor<R>, rate: R, _step: usize) -> Tensor<R> {
    grad * -rate
  }
}


/// Stochastic Gradient Descent with momentum

#[derive(Debug, Clone)]
pub struct Momentum<R: Real> {
  pub momentum: R,
  v: HashMap<usize, Tensor<R>>,
}

impl<R: Real> Momentum<R> {
  pub fn new(momentum: R) -> Self {
    Self { momentum, v: HashMap::new() }
  }
}

impl<R: Real> Default for Momentum<R> {
  fn default() -> Self {
    Self::new(lit(0.9))
  }
}

impl<R: Real> Strategy<R> for Momentum<R> {
  fn update(&mut self, param: &Variable<R>, grad: &Tensor<R>, rate: R, _step: usize) -> Tensor<R> {
    let v = self.v.entry(param.id())
      .or_insert_with(|| Tensor::zeros(&param.shape().dims) );
    v.feed(&(&*v * self.momentum - grad * rate));
    v.clone()
  }
}


/// Stochastic Gradient Descent with Nesterov momentum

#[derive(Debug, Clone)]
pub struct Nesterov<R: Real> {
  pub momentum: R,
  v: HashMap<usize, Tensor<R>>,
}

impl<R: Real> Nesterov<R> {
  pub fn new(momentum: R) -> Self {
    Self { momentum, v: HashMap::new() }
  }
}

impl<R: Real> Default for Nesterov<R> {
  fn default() -> Self {
    Self::new(lit(0.9))
  }
}

impl<R: Real> Strategy<R> for Nesterov<R> {
  fn update(&mut self, param: &Variable<R>, grad: &Tensor<R>, rate: R, _step: usize) -> Tensor<R> {
    let v = self.v.entry(param.id())
      .or_insert_with(|| Tensor::zeros(&param.shape().dims) );
    let v_prev = v.detach();
    v.feed(&(&v_prev * self.momentum - grad * rate));
    v_prev * -self.momentum + &*v * (R::one() + self.momentum)
  }
}


/// Adaptive Moment Estimation strategy (ADAM)

#[derive(Debug, Clone)]
pub struct Adam<R: Real> {
  pub beta1: R,
  pub beta2: R,
  pub epsilon: R,
  moments: HashMap<usize, (Tensor<R>, Tensor<R>)>,
}

impl<R: Real> Adam<R> {
  pub fn new(beta1: R, beta2: R, epsilon: R) -> Self {
    Self { beta1, beta2, epsilon, moments: HashMap::new() }
  }
}

impl<R: Real> Default for Adam<R> {
  fn default() -> Self {
    Self::new(lit(0.9), lit(0.999), lit(1e-8))
  }
}

impl<R: Real> Strategy<R> for Adam<R> {
  fn update(&mut self, param: &Variable<R>, grad: &Tensor<R>, rate: R, step: usize) -> Tensor<R> {
    let (m, v) = self.moments.entry(param.id())
      .or_insert_with(|| {
        let dims = &param.shape().dims;
        (Tensor::zeros(dims), Tensor::zeros(dims))
      });
    m.feed(&(&*m * self.beta1 + grad        * (R::one() - self.beta1)));
    v.feed(&(&*v * self.beta2 + grad.sqr()  * (R::one() - self.beta2)));
    let step: R = lit(step);
    let mt = &*m / (R::one() - self.beta1.powf(step));
    let vt = &*v / (R::one() - self.beta2.powf(step));
    mt * -rate / (vt.sqrt() + self.epsilon)
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::ops::NumericOps;

  // Minimize (x - 3)² elementwise, starting at zero
  fn descend<S: Strategy<f64>>(strategy: S, rate: f64, steps: usize) -> Tensor<f64> {
    let x = Tensor::zeros(&[2]).trained();
    let mut optimizer = Optimizer::new(rate, strategy);
    for _ in 0..steps {
      let loss = (&x - 3.0).sqr().sum(0);
      optimizer.minimize(&loss, &loss.parameters());
    }
    x.tensor().detach()
  }

  fn assert_near(x: &Tensor<f64>, target: f64, tolerance: f64) {
    for value in x.to_vec() {
      assert!((value - target).abs() < tolerance, "{value} is not near {target}");
    }
  }

  #[test]
  fn sgd_step() {
    let x = descend(SGD, 0.1, 1);
    // Gradient at zero is -6
    assert_near(&x, 0.6, 1e-12);
  }

  #[test]
  fn sgd() {
    assert_near(&descend(SGD, 0.1, 100), 3.0, 1e-6);
  }

  #[test]
  fn momentum() {
    assert_near(&descend(Momentum::default(), 0.01, 500), 3.0, 1e-3);
  }

  #[test]
  fn nesterov() {
    assert_near(&descend(Nesterov::default(), 0.01, 500), 3.0, 1e-3);
  }

  #[test]
  fn adam() {
    assert_near(&descend(Adam::default(), 0.1, 500), 3.0, 5e-2);
  }

  #[test]
  fn adam_first_step() {
    // Bias correction makes the first step exactly the learning rate
    let x = descend(Adam::new(0.9, 0.999, 1e-7), 0.001, 1);
    assert_near(&x, 0.001, 1e-8);
  }

  #[test]
  fn resets_gradients() {
    let w = Tensor::vec(&[1.0, 2.0]).trained();
    let mut optimizer = Optimizer::new(0.1, SGD);
    let loss = w.sqr().sum(0);
    optimizer.minimize(&loss, &[w.clone()]);
    assert_eq!(w.grad().unwrap(), &Tensor::zeros(&[2]));
    assert_eq!(optimizer.step(), 2);
  }

  #[test]
  #[should_panic]
  fn constant_parameter() {
    let w = Tensor::vec(&[1.0, 2.0]).trained();
    let c = Tensor::vec(&[1.0, 2.0]).tracked();
    let loss = (&w * &c).sum(0);
    Optimizer::new(0.1, SGD).minimize(&loss, &[c]);
  }
}
