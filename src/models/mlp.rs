//! Multilayer perceptron with two ReLU hidden layers, trained with
//! Adam for a fixed number of shuffled epochs.

use rand::Rng;
use serde::{ Serialize, Deserialize };

use crate::{
  error::{ Error, Result },
  tensor::Tensor,
  variable::Variable,
  layer::{ Dense, Activation, Init, Trainable },
  data::{ Dataset, Mode },
  optimize::{ Optimizer, Adam },
  ops::Hops,
  models::accuracy,
};


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
  pub learning_rate: f32,
  pub epochs: usize,
  pub batch_size: usize,
  /// Report the average loss every this many epochs.
  pub display_step: usize,
  pub hidden1_size: usize,
  pub hidden2_size: usize,
  /// Standard deviation of the normal distribution all
  /// kernels and biases get drawn from.
  pub init_std: f32,
  pub beta1: f32,
  pub beta2: f32,
  pub epsilon: f32,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      learning_rate: 0.001,
      epochs: 30,
      batch_size: 256,
      display_step: 1,
      hidden1_size: 256,
      hidden2_size: 256,
      init_std: 1.0,
      beta1: 0.9,
      beta2: 0.999,
      epsilon: 1e-7,
    }
  }
}


#[derive(Debug, Clone)]
pub struct Mlp {
  pub hidden1: Dense<f32>,
  pub hidden2: Dense<f32>,
  pub output: Dense<f32>,
}

impl Mlp {
  pub fn new(config: &Config, inputs: usize, classes: usize, rng: &mut impl Rng) -> Self {
    let init = Init::Normal { mean: 0.0, std: config.init_std };
    Self {
      hidden1: Dense::new(inputs, config.hidden1_size, Activation::Relu, init, init, rng),
      hidden2: Dense::new(config.hidden1_size, config.hidden2_size, Activation::Relu, init, init, rng),
      output: Dense::new(config.hidden2_size, classes, Activation::Linear, init, init, rng),
    }
  }

  /// Unnormalized class scores for every row of `x`.

  pub fn forward(&self, x: &Variable<f32>) -> Variable<f32> {
    let hidden = self.hidden2.forward(&self.hidden1.forward(x));
    self.output.forward(&hidden)
  }

  pub fn infer(&self, x: &Tensor<f32>) -> Tensor<f32> {
    let hidden = self.hidden2.infer(&self.hidden1.infer(x));
    self.output.infer(&hidden)
  }

  pub fn evaluate(&self, data: &Dataset<f32>) -> f32 {
    accuracy(&self.infer(data.inputs()), data.targets())
  }

  /// Train for `config.epochs` passes over `data`.
  ///
  /// Returns the average loss of every epoch, measured on each batch right
  /// after its update. `on_epoch` receives the one-based epoch number and
  /// its loss every `config.display_step` epochs.

  pub fn fit<F>(&self, config: &Config, data: &Dataset<f32>, rng: &mut impl Rng, mut on_epoch: F) -> Result<Vec<f32>>
  where
    F: FnMut(usize, f32),
  {
    if config.display_step == 0 {
      return Err(Error::InvalidData("display step must be positive".to_string()))
    }
    let strategy = Adam::new(config.beta1, config.beta2, config.epsilon);
    let mut optimizer = Optimizer::new(config.learning_rate, strategy);
    let params = self.parameters();
    // Full batches per epoch, the partial tail is still trained on
    let total_batch = (data.len() / config.batch_size.max(1)).max(1) as f32;

    let mut losses = Vec::with_capacity(config.epochs);
    for epoch in 0..config.epochs {
      let mut average_loss = 0.0;
      for (x, y) in data.batches(config.batch_size, Mode::Epoch, &mut *rng)? {
        let loss = self.forward(&x.tracked()).softmax_cross_entropy(&y.tracked());
        optimizer.minimize(&loss, &params);
        average_loss += self.infer(&x).softmax_cross_entropy(&y).item() / total_batch;
      }
      if epoch % config.display_step == 0 {
        on_epoch(epoch + 1, average_loss);
      }
      losses.push(average_loss);
    }
    Ok(losses)
  }
}

impl Trainable<f32> for Mlp {
  fn named_parameters(&self) -> Vec<(String, Variable<f32>)> {
    [("hidden1", &self.hidden1), ("hidden2", &self.hidden2), ("output", &self.output)]
      .into_iter()
      .flat_map(|(prefix, layer)| {
        layer.named_parameters()
          .into_iter()
          .map(move |(name, param)| (format!("{prefix}.{name}"), param) )
      })
      .collect()
  }
}


#[derive(Debug, Clone, PartialEq)]
pub struct MlpReport {
  pub epoch_losses: Vec<f32>,
  pub accuracy: f32,
}


pub fn train<F>(config: &Config, train: &Dataset<f32>, test: &Dataset<f32>, rng: &mut impl Rng, on_epoch: F) -> Result<MlpReport>
where
  F: FnMut(usize, f32),
{
  let model = Mlp::new(config, train.sample_dim(), train.target_dim(), rng);
  let epoch_losses = model.fit(config, train, rng, on_epoch)?;
  Ok(MlpReport { epoch_losses, accuracy: model.evaluate(test) })
}


#[cfg(test)]
mod tests {
  use super::*;
  use rand::{ SeedableRng, rngs::StdRng };
  use crate::ops::BaseOps;
  use crate::models::softmax::tests::clusters;
  use crate::data::mnist::{ Mnist, DEFAULT_DIR };

  fn small() -> Config {
    Config {
      learning_rate: 0.01,
      epochs: 30,
      batch_size: 10,
      hidden1_size: 16,
      hidden2_size: 16,
      init_std: 0.1,
      ..Config::default()
    }
  }

  #[test]
  fn learns_clusters() {
    let data = clusters(100);
    let mut reported = vec![];
    let report = train(&small(), &data, &data, &mut StdRng::seed_from_u64(2), |epoch, loss| {
      reported.push((epoch, loss));
    }).unwrap();
    assert_eq!(report.epoch_losses.len(), 30);
    assert_eq!(reported.len(), 30);
    assert_eq!(reported[0], (1, report.epoch_losses[0]));
    assert!(report.epoch_losses.iter().all(|&loss| loss >= 0.0 ));
    assert!(report.epoch_losses[29] < report.epoch_losses[0]);
    assert!(report.accuracy > 0.8, "accuracy {}", report.accuracy);
  }

  #[test]
  fn display_step() {
    let data = clusters(20);
    let config = Config { epochs: 5, display_step: 2, ..small() };
    let mut epochs = vec![];
    train(&config, &data, &data, &mut StdRng::seed_from_u64(0), |epoch, _| epochs.push(epoch) ).unwrap();
    assert_eq!(epochs, vec![1, 3, 5]);
    let config = Config { display_step: 0, ..small() };
    assert!(train(&config, &data, &data, &mut StdRng::seed_from_u64(0), |_, _| {} ).is_err());
  }

  #[test]
  fn zero_epochs() {
    let data = clusters(20);
    let model = Mlp::new(&small(), 2, 2, &mut StdRng::seed_from_u64(3));
    let before = model.infer(data.inputs());
    let config = Config { epochs: 0, ..small() };
    let losses = model.fit(&config, &data, &mut StdRng::seed_from_u64(3), |_, _| panic!("no epoch ran") ).unwrap();
    assert!(losses.is_empty());
    assert_eq!(model.infer(data.inputs()), before);
  }

  #[test]
  fn parameter_names() {
    let model = Mlp::new(&small(), 2, 2, &mut StdRng::seed_from_u64(0));
    let names: Vec<_> = model.named_parameters().into_iter().map(|(name, _)| name ).collect();
    assert_eq!(names, vec![
      "hidden1.weights", "hidden1.bias",
      "hidden2.weights", "hidden2.bias",
      "output.weights", "output.bias",
    ]);
    assert_eq!(model.output.infer(&Tensor::zeros(&[3, 16])).shape().dims, vec![3, 2]);
  }

  #[test]
  fn deterministic() {
    let data = clusters(40);
    let config = Config { epochs: 3, ..small() };
    let a = train(&config, &data, &data, &mut StdRng::seed_from_u64(6), |_, _| {} ).unwrap();
    let b = train(&config, &data, &data, &mut StdRng::seed_from_u64(6), |_, _| {} ).unwrap();
    assert_eq!(a, b);
  }

  #[test]
  #[ignore = "needs the MNIST corpus in data/mnist"]
  fn mnist_accuracy() {
    let mnist = Mnist::load(DEFAULT_DIR).unwrap();
    let report = train(&Config::default(), &mnist.train, &mnist.test, &mut StdRng::seed_from_u64(0), |_, _| {} ).unwrap();
    assert!(report.epoch_losses.last() < report.epoch_losses.first());
    assert!(report.accuracy > 0.93, "accuracy {}", report.accuracy);
  }
}
