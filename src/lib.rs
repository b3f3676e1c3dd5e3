//! Introductory model training on top of a tiny automatic
//! differentiation engine. CPU only. Few dependencies.
//!
//! # Features
//!
//! - **Eager auto-grad**: Operations on [Variable]s get recorded as they
//! execute and can be back-propagated through afterwards.
//!
//! - **Broadcasting**: Tensors with differing but compatible shapes get
//! broadcasted to matching dimensions automatically for arithmetic.
//!
//! - **Zero-copy views**: Tensors may be transposed and broadcasted
//! without copying any data.
//!
//! - **Optimization**: Includes standard optimizers, such as SGD, Nesterov and Adam.
//!
//! - **Programs**: Linear regression, softmax regression and a multilayer
//! perceptron, runnable as binaries or through [models].
//!
//! # Examples
//!
//! Minimizing a non-linear function:
//! ```
//! use rand::{ SeedableRng, rngs::StdRng };
//! use microfit::{ ops::*, Tensor, optimize::{ Optimizer, Adam } };
//!
//! let mut rng = StdRng::seed_from_u64(0);
//!
//! // Create trainable variables from tensors
//! let w = Tensor::randn(&[2, 8], &mut rng).trained();
//! let b = Tensor::zeros(&[8]).trained();
//!
//! // Use a standard optimizer
//! let mut optimizer = Optimizer::new(0.001, Adam::default());
//!
//! // Basic training loop
//! for _ in 0..100 {
//!   // Track training data for compute operations to be recorded
//!   let x = Tensor::new(&[1, 2], vec![1.0, 2.0]).tracked();
//!
//!   // Compute loss
//!   let loss = ((x.mm(&w) + &b).sigmoid() - 0.5).sqr().mean(0);
//!
//!   // Back-prop, optimize and reset gradients
//!   optimizer.minimize(&loss, &loss.parameters());
//! }
//! ```
//!
//! # Optional features
//!
//! Some features can be toggled in your `Cargo.toml`.
//!
//! - `unsafe` *(default)*: Accelerated matrix math using the [matrixmultiply] crate.
//! - `rayon`: Parallel pixel conversion while loading MNIST.

mod internal;
mod shape;
mod tensor;
mod variable;
mod error;

pub mod scalar;
pub mod ops;
pub mod optimize;
pub mod layer;
pub mod data;
pub mod models;
pub mod checkpoint;

pub use shape::Shape;
pub use tensor::{ Tensor, TensorIterator };
pub use variable::{ Variable, UnaryOp, BinaryOp };
pub use error::{ Error, Result };
