use microfit::{
  data::mnist::{ Mnist, DEFAULT_DIR },
  models::softmax::{ self, Config },
};


fn main() -> Result<(), microfit::Error> {
  let mnist = Mnist::load(DEFAULT_DIR)?;
  let report = softmax::train(&Config::default(), &mnist.train, &mnist.test, &mut rand::thread_rng())?;
  println!("Accuracy: {:.6}", report.accuracy);
  Ok(())
}
