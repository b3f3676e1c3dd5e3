//! Linear regression of `y = W·x + b` on a handful of points.

use rand::Rng;
use serde::{ Serialize, Deserialize };

use crate::{
  error::{ Error, Result },
  tensor::Tensor,
  variable::Variable,
  layer::Trainable,
  optimize::{ Optimizer, SGD },
  ops::Hops,
};


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
  pub learning_rate: f32,
  pub steps: usize,
  pub x_train: Vec<f32>,
  pub y_train: Vec<f32>,
  pub x_test: Vec<f32>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      learning_rate: 0.01,
      steps: 1000,
      x_train: vec![1.0, 2.0, 3.0, 4.0],
      y_train: vec![2.0, 4.0, 6.0, 8.0],
      x_test: vec![3.5, 5.0, 5.5, 6.0],
    }
  }
}


/// A single weight and bias, both drawn from a standard normal.

#[derive(Debug, Clone)]
pub struct LinearRegression {
  pub w: Variable<f32>,
  pub b: Variable<f32>,
}

impl LinearRegression {
  pub fn new(rng: &mut impl Rng) -> Self {
    Self {
      w: Tensor::randn(&[1], rng).trained(),
      b: Tensor::randn(&[1], rng).trained(),
    }
  }

  pub fn forward(&self, x: &Variable<f32>) -> Variable<f32> {
    &self.w * x + &self.b
  }

  pub fn predict(&self, x: &Tensor<f32>) -> Tensor<f32> {
    self.w.tensor() * x + self.b.tensor()
  }

  /// Run full batch gradient descent on the training points and
  /// return the loss reached afterwards.

  pub fn fit(&self, config: &Config) -> Result<f32> {
    if config.x_train.is_empty() {
      return Err(Error::InvalidData("no training points".to_string()))
    }
    if config.x_train.len() != config.y_train.len() {
      return Err(Error::InvalidData(format!(
        "{} training inputs do not match {} targets", config.x_train.len(), config.y_train.len()
      )))
    }
    let x = Tensor::vec(&config.x_train);
    let y = Tensor::vec(&config.y_train);
    let mut optimizer = Optimizer::new(config.learning_rate, SGD);
    for _ in 0..config.steps {
      let loss = self.forward(&x.tracked()).mse(&y.tracked());
      optimizer.minimize(&loss, &self.parameters());
    }
    Ok(self.predict(&x).mse(&y).item())
  }
}

impl Trainable<f32> for LinearRegression {
  fn named_parameters(&self) -> Vec<(String, Variable<f32>)> {
    vec![
      ("w".to_string(), self.w.clone()),
      ("b".to_string(), self.b.clone()),
    ]
  }
}


#[derive(Debug, Clone, PartialEq)]
pub struct LinearReport {
  pub predictions: Vec<f32>,
  pub final_loss: f32,
}


/// Fit a fresh model and predict the test points.

pub fn train(config: &Config, rng: &mut impl Rng) -> Result<LinearReport> {
  let model = LinearRegression::new(rng);
  let final_loss = model.fit(config)?;
  let predictions = model.predict(&Tensor::vec(&config.x_test)).to_vec();
  Ok(LinearReport { predictions, final_loss })
}


#[cfg(test)]
mod tests {
  use super::*;
  use rand::{ SeedableRng, rngs::StdRng };

  #[test]
  fn fits_line() {
    let report = train(&Config::default(), &mut StdRng::seed_from_u64(42)).unwrap();
    for (prediction, expected) in report.predictions.iter().zip([7.0, 10.0, 11.0, 12.0]) {
      assert!((prediction - expected).abs() < 0.5, "predicted {prediction}, expected {expected}");
    }
    assert!(report.final_loss < 0.1);
  }

  #[test]
  fn zero_steps() {
    let model = LinearRegression::new(&mut StdRng::seed_from_u64(3));
    let (w, b) = (model.w.item(), model.b.item());
    let x = Tensor::vec(&[1.0, 2.0]);
    let before = model.predict(&x);
    model.fit(&Config { steps: 0, ..Config::default() }).unwrap();
    assert_eq!((model.w.item(), model.b.item()), (w, b));
    assert_eq!(model.predict(&x), before);
    assert_eq!(before, Tensor::vec(&[w + b, 2.0 * w + b]));
  }

  #[test]
  fn deterministic() {
    let a = train(&Config::default(), &mut StdRng::seed_from_u64(8)).unwrap();
    let b = train(&Config::default(), &mut StdRng::seed_from_u64(8)).unwrap();
    assert_eq!(a, b);
  }

  #[test]
  fn mismatched_points() {
    let config = Config { y_train: vec![1.0], ..Config::default() };
    assert!(train(&config, &mut StdRng::seed_from_u64(0)).is_err());
  }

  #[test]
  fn no_points() {
    let config = Config { x_train: vec![], y_train: vec![], ..Config::default() };
    let Err(Error::InvalidData(message)) = train(&config, &mut StdRng::seed_from_u64(0)) else {
      panic!("empty training set accepted")
    };
    assert_eq!(message, "no training points");
  }
}
