//! Loader for the MNIST handwritten digit corpus in its
//! original IDX format.
//!
//! Expects the four uncompressed files `train-images-idx3-ubyte`,
//! `train-labels-idx1-ubyte`, `t10k-images-idx3-ubyte` and
//! `t10k-labels-idx1-ubyte` in a single directory.

use std::path::Path;

use crate::{
  error::{ Error, Result },
  scalar::Real,
  tensor::Tensor,
  data::{ Dataset, normalize, one_hot },
};


/// Where the programs look for the corpus, relative to the working directory.
pub const DEFAULT_DIR: &str = "data/mnist";

pub const IMAGE_MAGIC: u32 = 0x0000_0803;
pub const LABEL_MAGIC: u32 = 0x0000_0801;

pub const NUM_CLASSES: usize = 10;


/// Raw grayscale images as stored in an IDX3 file.

#[derive(Debug, Clone, PartialEq)]
pub struct Images {
  pub count: usize,
  pub rows: usize,
  pub cols: usize,
  pub pixels: Vec<u8>,
}

impl Images {
  pub fn parse(bytes: &[u8]) -> Result<Self> {
    let mut header = Header::new(bytes);
    header.magic(IMAGE_MAGIC)?;
    let count = header.dim()?;
    let rows = header.dim()?;
    let cols = header.dim()?;
    let size = count.checked_mul(rows)
      .and_then(|n| n.checked_mul(cols) )
      .ok_or_else(|| Error::Format(format!("{count} images of {rows}x{cols} pixels overflow")) )?;
    let pixels = header.payload(size)?.to_vec();
    Ok(Self { count, rows, cols, pixels })
  }

  pub fn pixels_per_image(&self) -> usize {
    self.rows * self.cols
  }
}


/// Parse the class labels stored in an IDX1 file.

pub fn parse_labels(bytes: &[u8]) -> Result<Vec<u8>> {
  let mut header = Header::new(bytes);
  header.magic(LABEL_MAGIC)?;
  let count = header.dim()?;
  Ok(header.payload(count)?.to_vec())
}


// Cursor over the big endian header fields of an IDX file
struct Header<'a> {
  bytes: &'a [u8],
  pos: usize,
}

impl<'a> Header<'a> {
  fn new(bytes: &'a [u8]) -> Self {
    Self { bytes, pos: 0 }
  }

  fn word(&mut self) -> Result<u32> {
    let Some(word) = self.bytes.get(self.pos..self.pos + 4) else {
      return Err(Error::Format(format!("header truncated at byte {}", self.pos)))
    };
    self.pos += 4;
    Ok(u32::from_be_bytes([word[0], word[1], word[2], word[3]]))
  }

  fn magic(&mut self, expected: u32) -> Result<()> {
    let magic = self.word()?;
    if magic != expected {
      return Err(Error::Format(format!("magic number {magic:#010x}, expected {expected:#010x}")))
    }
    Ok(())
  }

  fn dim(&mut self) -> Result<usize> {
    Ok(self.word()? as usize)
  }

  fn payload(&self, len: usize) -> Result<&'a [u8]> {
    let available = self.bytes.len() - self.pos;
    if available != len {
      return Err(Error::Format(format!("expected {len} bytes of data, found {available}")))
    }
    Ok(&self.bytes[self.pos..])
  }
}


fn read(path: &Path) -> Result<Vec<u8>> {
  std::fs::read(path).map_err(|err| {
    let msg = format!("{}: {err}", path.display());
    Error::Io(std::io::Error::new(err.kind(), msg))
  })
}


/// Pair flattened, normalized images with one-hot labels.

pub fn dataset<T: Real + Send + Sync>(images: &Images, labels: &[u8]) -> Result<Dataset<T>> {
  if images.count != labels.len() {
    return Err(Error::Format(format!(
      "{} images do not match {} labels", images.count, labels.len()
    )))
  }
  let inputs = Tensor::new(&[images.count, images.pixels_per_image()], normalize(&images.pixels));
  let targets = one_hot(labels, NUM_CLASSES)?;
  Dataset::new(inputs, targets)
}


/// Training and test split of the corpus.

#[derive(Debug, Clone)]
pub struct Mnist<T: Real> {
  pub train: Dataset<T>,
  pub test: Dataset<T>,
}

impl<T: Real + Send + Sync> Mnist<T> {
  pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
    let dir = dir.as_ref();
    let split = |images: &str, labels: &str| -> Result<Dataset<T>> {
      let images = Images::parse(&read(&dir.join(images))?)?;
      let labels = parse_labels(&read(&dir.join(labels))?)?;
      dataset(&images, &labels)
    };
    Ok(Self {
      train: split("train-images-idx3-ubyte", "train-labels-idx1-ubyte")?,
      test: split("t10k-images-idx3-ubyte", "t10k-labels-idx1-ubyte")?,
    })
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  fn idx(magic: u32, dims: &[u32], data: &[u8]) -> Vec<u8> {
    let mut bytes = magic.to_be_bytes().to_vec();
    for dim in dims {
      bytes.extend_from_slice(&dim.to_be_bytes());
    }
    bytes.extend_from_slice(data);
    bytes
  }

  #[test]
  fn images() {
    let bytes = idx(IMAGE_MAGIC, &[2, 2, 1], &[0, 255, 51, 0]);
    let images = Images::parse(&bytes).unwrap();
    assert_eq!((images.count, images.rows, images.cols), (2, 2, 1));
    assert_eq!(images.pixels_per_image(), 2);
  }

  #[test]
  fn labels() {
    let bytes = idx(LABEL_MAGIC, &[3], &[7, 0, 9]);
    assert_eq!(parse_labels(&bytes).unwrap(), vec![7, 0, 9]);
  }

  #[test]
  fn wrong_magic() {
    let bytes = idx(LABEL_MAGIC, &[1, 1, 1], &[0]);
    assert!(matches!(Images::parse(&bytes), Err(Error::Format(_))));
  }

  #[test]
  fn truncated() {
    assert!(matches!(parse_labels(&[0, 0, 8]), Err(Error::Format(_))));
    let bytes = idx(LABEL_MAGIC, &[4], &[1, 2]);
    assert!(matches!(parse_labels(&bytes), Err(Error::Format(_))));
  }

  #[test]
  fn paired_dataset() {
    let images = Images::parse(&idx(IMAGE_MAGIC, &[2, 1, 2], &[0, 255, 255, 0])).unwrap();
    let data: Dataset<f32> = dataset(&images, &[3, 1]).unwrap();
    assert_eq!(data.inputs(), &Tensor::new(&[2, 2], vec![0.0, 1.0, 1.0, 0.0]));
    assert_eq!(data.targets().argmax(-1), Tensor::vec(&[3, 1]));
    assert!(dataset::<f32>(&images, &[3]).is_err());
    assert!(dataset::<f32>(&images, &[3, 10]).is_err());
  }

  #[test]
  fn missing_directory() {
    let result = Mnist::<f32>::load("does/not/exist");
    assert!(matches!(result, Err(Error::Io(_))));
  }

  #[test]
  #[ignore = "needs the MNIST corpus in data/mnist"]
  fn corpus() {
    let mnist = Mnist::<f32>::load(DEFAULT_DIR).unwrap();
    assert_eq!(mnist.train.len(), 60_000);
    assert_eq!(mnist.test.len(), 10_000);
    assert_eq!(mnist.train.sample_dim(), 784);
    assert_eq!(mnist.test.target_dim(), 10);
  }
}
