//! Softmax regression: a single dense layer followed by softmax,
//! trained with cross entropy on mini-batches drawn forever.

use rand::Rng;
use serde::{ Serialize, Deserialize };

use crate::{
  error::Result,
  tensor::Tensor,
  variable::Variable,
  layer::{ Dense, Activation, Init, Trainable },
  data::{ Dataset, Mode },
  optimize::{ Optimizer, SGD },
  ops::Hops,
  models::accuracy,
};


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
  pub learning_rate: f32,
  pub steps: usize,
  pub batch_size: usize,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      learning_rate: 0.5,
      steps: 1000,
      batch_size: 100,
    }
  }
}


#[derive(Debug, Clone)]
pub struct SoftmaxRegression {
  pub layer: Dense<f32>,
}

impl SoftmaxRegression {
  /// Zero initialized kernel and bias.

  pub fn new(inputs: usize, classes: usize, rng: &mut impl Rng) -> Self {
    Self {
      layer: Dense::new(inputs, classes, Activation::Softmax, Init::Zeros, Init::Zeros, rng),
    }
  }

  /// Class probabilities for every row of `x`.

  pub fn forward(&self, x: &Variable<f32>) -> Variable<f32> {
    self.layer.forward(x)
  }

  pub fn predict(&self, x: &Tensor<f32>) -> Tensor<f32> {
    self.layer.infer(x)
  }

  pub fn evaluate(&self, data: &Dataset<f32>) -> f32 {
    accuracy(&self.predict(data.inputs()), data.targets())
  }

  /// Take `config.steps` gradient steps on shuffled batches from `data`,
  /// returning the loss of the last batch.

  pub fn fit(&self, config: &Config, data: &Dataset<f32>, rng: &mut impl Rng) -> Result<f32> {
    let mut optimizer = Optimizer::new(config.learning_rate, SGD);
    let mut last_loss = 0.0;
    for (x, y) in data.batches(config.batch_size, Mode::Repeat, &mut *rng)?.take(config.steps) {
      let loss = self.forward(&x.tracked()).cross_entropy(&y.tracked());
      optimizer.minimize(&loss, &self.parameters());
      last_loss = loss.item();
    }
    Ok(last_loss)
  }
}

impl Trainable<f32> for SoftmaxRegression {
  fn named_parameters(&self) -> Vec<(String, Variable<f32>)> {
    self.layer.named_parameters()
      .into_iter()
      .map(|(name, param)| (format!("softmax.{name}"), param) )
      .collect()
  }
}


#[derive(Debug, Clone, PartialEq)]
pub struct SoftmaxReport {
  pub accuracy: f32,
  pub final_loss: f32,
}


pub fn train(config: &Config, train: &Dataset<f32>, test: &Dataset<f32>, rng: &mut impl Rng) -> Result<SoftmaxReport> {
  let model = SoftmaxRegression::new(train.sample_dim(), train.target_dim(), rng);
  let final_loss = model.fit(config, train, rng)?;
  Ok(SoftmaxReport { accuracy: model.evaluate(test), final_loss })
}


#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use rand::{ SeedableRng, rngs::StdRng };
  use crate::error::Error;
  use crate::data::{ one_hot, mnist::{ Mnist, DEFAULT_DIR } };

  /// Two well separated clusters in the plane, alternating classes.

  pub(crate) fn clusters(n: usize) -> Dataset<f32> {
    let inputs = Tensor::from_fn(&[n, 2], |i| {
      let (row, col) = (i / 2, i % 2);
      let side = if row % 2 == 0 { -1.5 } else { 1.5 };
      let jitter = ((row * 37 + col * 11) % 13) as f32 / 13.0 - 0.5;
      side + jitter * 0.5
    });
    let labels: Vec<u8> = (0..n).map(|row| (row % 2) as u8 ).collect();
    Dataset::new(inputs, one_hot(&labels, 2).unwrap()).unwrap()
  }

  fn small() -> Config {
    Config { steps: 200, batch_size: 20, ..Config::default() }
  }

  #[test]
  fn separates_clusters() {
    let data = clusters(100);
    let report = train(&small(), &data, &data, &mut StdRng::seed_from_u64(1)).unwrap();
    assert!(report.accuracy > 0.95, "accuracy {}", report.accuracy);
    assert!(report.final_loss < 0.2, "loss {}", report.final_loss);
  }

  #[test]
  fn uniform_before_training() {
    let data = clusters(10);
    let model = SoftmaxRegression::new(2, 2, &mut StdRng::seed_from_u64(0));
    assert_eq!(model.fit(&Config { steps: 0, ..small() }, &data, &mut StdRng::seed_from_u64(0)).unwrap(), 0.0);
    assert_eq!(model.predict(data.inputs()), Tensor::fill(&[10, 2], 0.5));
  }

  #[test]
  fn deterministic() {
    let data = clusters(60);
    let a = train(&small(), &data, &data, &mut StdRng::seed_from_u64(5)).unwrap();
    let b = train(&small(), &data, &data, &mut StdRng::seed_from_u64(5)).unwrap();
    assert_eq!(a, b);
  }

  #[test]
  fn zero_batch_size() {
    let data = clusters(10);
    let config = Config { batch_size: 0, ..small() };
    assert!(train(&config, &data, &data, &mut StdRng::seed_from_u64(0)).is_err());
    let config = Config { steps: 0, ..config };
    assert!(matches!(train(&config, &data, &data, &mut StdRng::seed_from_u64(0)), Err(Error::InvalidData(_))));
  }

  #[test]
  #[ignore = "needs the MNIST corpus in data/mnist"]
  fn mnist_accuracy() {
    let mnist = Mnist::load(DEFAULT_DIR).unwrap();
    let report = train(&Config::default(), &mnist.train, &mnist.test, &mut StdRng::seed_from_u64(0)).unwrap();
    assert!(report.accuracy > 0.90, "accuracy {}", report.accuracy);
  }
}
