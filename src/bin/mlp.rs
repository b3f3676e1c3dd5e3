use microfit::{
  data::mnist::{ Mnist, DEFAULT_DIR },
  models::mlp::{ self, Config },
};


fn main() -> Result<(), microfit::Error> {
  let mnist = Mnist::load(DEFAULT_DIR)?;
  let report = mlp::train(&Config::default(), &mnist.train, &mnist.test, &mut rand::thread_rng(), |epoch, loss| {
    println!("Epoch: {epoch}, Loss: {loss:.6}");
  })?;
  println!("Accuracy: {:.6}", report.accuracy);
  Ok(())
}
