use microfit::models::linear::{ self, Config };


fn main() -> Result<(), microfit::Error> {
  let report = linear::train(&Config::default(), &mut rand::thread_rng())?;
  println!("{:?}", report.predictions);
  Ok(())
}
