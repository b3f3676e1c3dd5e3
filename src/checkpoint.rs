//! Persisting trained parameters with [postcard].

use std::path::Path;

use serde::{ Serialize, Deserialize, de::DeserializeOwned };

use crate::{
  error::{ Error, Result },
  scalar::Real,
  tensor::Tensor,
  layer::Trainable,
  ops::BaseOps,
};


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry<T> {
  pub name: String,
  pub dims: Vec<usize>,
  pub data: Vec<T>,
}


/// Snapshot of all named parameters of a model.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint<T> {
  pub entries: Vec<Entry<T>>,
}

impl<T: Real + Serialize + DeserializeOwned> Checkpoint<T> {
  pub fn capture(model: &impl Trainable<T>) -> Self {
    let entries = model.named_parameters()
      .into_iter()
      .map(|(name, param)| Entry {
        name,
        dims: param.shape().dims.clone(),
        data: param.to_vec(),
      })
      .collect();
    Self { entries }
  }

  /// Overwrite `model`'s parameters in place.
  ///
  /// Every parameter must have a stored counterpart of the same shape.

  pub fn restore(&self, model: &impl Trainable<T>) -> Result<()> {
    let params = model.named_parameters();
    // Validate everything before touching any parameter
    let mut updates = Vec::with_capacity(params.len());
    for (name, param) in &params {
      let Some(entry) = self.entries.iter().find(|entry| &entry.name == name ) else {
        return Err(Error::InvalidData(format!("checkpoint has no parameter {name}")))
      };
      if entry.dims != param.shape().dims || entry.data.len() != param.size() {
        return Err(Error::InvalidData(format!(
          "parameter {name} has Shape{:?}, checkpoint stores Shape{:?}", param.shape().dims, entry.dims
        )))
      }
      updates.push((param, Tensor::new(&entry.dims, entry.data.clone())));
    }
    for (param, tensor) in updates {
      param.tensor().feed(&tensor);
    }
    Ok(())
  }

  pub fn to_bytes(&self) -> Result<Vec<u8>> {
    Ok(postcard::to_allocvec(self)?)
  }

  pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
    Ok(postcard::from_bytes(bytes)?)
  }

  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    std::fs::write(path, self.to_bytes()?)?;
    Ok(())
  }

  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    Self::from_bytes(&std::fs::read(path)?)
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use rand::{ SeedableRng, rngs::StdRng };
  use crate::models::{ linear::LinearRegression, mlp::{ self, Mlp } };

  fn network(seed: u64) -> Mlp {
    let config = mlp::Config { hidden1_size: 4, hidden2_size: 3, ..mlp::Config::default() };
    Mlp::new(&config, 2, 2, &mut StdRng::seed_from_u64(seed))
  }

  #[test]
  fn restores_parameters() {
    let source = network(1);
    let target = network(2);
    let x = Tensor::new(&[1, 2], vec![0.5, -1.0]);
    assert_ne!(source.infer(&x), target.infer(&x));
    let bytes = Checkpoint::capture(&source).to_bytes().unwrap();
    Checkpoint::from_bytes(&bytes).unwrap().restore(&target).unwrap();
    assert_eq!(source.infer(&x), target.infer(&x));
  }

  #[test]
  fn rejects_other_architecture() {
    let checkpoint = Checkpoint::capture(&network(1));
    let model = LinearRegression::new(&mut StdRng::seed_from_u64(0));
    let before = model.w.item();
    assert!(matches!(checkpoint.restore(&model), Err(Error::InvalidData(_))));
    assert_eq!(model.w.item(), before);
  }

  #[test]
  fn corrupt_bytes() {
    assert!(matches!(Checkpoint::<f32>::from_bytes(&[0xff]), Err(Error::Serialize(_))));
  }

  #[test]
  fn file_round_trip() {
    let model = LinearRegression::new(&mut StdRng::seed_from_u64(4));
    let path = std::env::temp_dir().join(format!("microfit-checkpoint-{}", std::process::id()));
    let checkpoint = Checkpoint::capture(&model);
    checkpoint.save(&path).unwrap();
    let loaded = Checkpoint::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(loaded, checkpoint);
  }
}
