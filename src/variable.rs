use std::rc::Rc;
use std::collections::HashSet;
use std::sync::atomic::{ AtomicUsize, Ordering };
use std::fmt::Debug;

use rand::Rng;

mod mops;

use crate::{
  internal::*,
  tensor::Tensor,
  scalar::Real,
  ops::{ BaseOps, NumericOps, RealOps, Hops },
};


pub fn make_id() -> usize {
  static LAST_ID: AtomicUsize = AtomicUsize::new(0);
  LAST_ID.fetch_add(1, Ordering::Relaxed)
}


/// Unary computational operation that can also compute its derivative.

pub trait UnaryOp<T: Real>: Debug {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T>;
  fn derive(&self, lhs: &Tensor<T>, grad: &Tensor<T>) -> Tensor<T>;
}


/// Binary computational operation that can also compute its derivative.

pub trait BinaryOp<T: Real>: Debug {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T>;
  fn derive(&self, lhs: &Tensor<T>, rhs: &Tensor<T>, grad: &Tensor<T>) -> (Tensor<T>, Tensor<T>);
}


#[derive(Debug)]
enum Op<T: Real> {
  Unary(Box<dyn UnaryOp<T>>),
  Binary(Box<dyn BinaryOp<T>>),
}


/// Node in a computation graph, containing a [Variable]'s data and gradient,
/// as well as the operation used to create it.

#[derive(Debug)]
struct Node<T: Real> {
  id: usize,
  data: Tensor<T>,
  grad: Option<Tensor<T>>,
  op: Option<Op<T>>,
  previous: Vec<Rc<Self>>,
  trainable: bool,
}

impl<T: Real> Node<T> {
  fn backward(&self) {
    let (Some(op), Some(grad)) = (&self.op, &self.grad) else { return };
    let lhs = &self.previous[0];
    let changes = match op {
      Op::Unary(op) => vec![op.derive(&lhs.data, grad)],
      Op::Binary(op) => {
        let rhs = &self.previous[1];
        let (dl, dr) = op.derive(&lhs.data, &rhs.data, grad);
        vec![dl, dr]
      },
    };
    for (change, prev) in changes.iter().zip(&self.previous) {
      if let Some(grad) = &prev.grad {
        grad.accumulate(change);
      }
    }
  }

  fn reset_gradient(&self, filler: T) {
    if let Some(grad) = &self.grad {
      grad.refill(filler);
    }
  }
}


/// Variables track the computational operations used to create them and allow
/// for computing their gradient with respect to all input variables involved.
///
/// They get created by calling [tracked](Tensor::tracked) or
/// [trained](Tensor::trained) on any differentiable [Tensor] type.
///
/// Variables dereference to their underlying [Tensor] automatically for
/// non-differentiable operations. Differentiable operations, on the other hand,
/// will always return another Variable.

#[derive(Debug, Clone)]
pub struct Variable<T: Real> {
  node: Rc<Node<T>>,
}

impl<T: Real> Hops<T> for Variable<T> {}

impl<T: Real> std::ops::Deref for Variable<T> {
  type Target = Tensor<T>;

  fn deref(&self) -> &Self::Target {
    &self.node.data
  }
}

impl<T: Real> PartialEq for Variable<T> {
  fn eq(&self, rhs: &Self) -> bool {
    self.node.data == rhs.node.data
  }
}

impl<T: Real> Variable<T> {
  pub(crate) fn from_tensor(tensor: Tensor<T>, trainable: bool) -> Self {
    Self {
      node: Rc::new(Node {
        id: make_id(),
        grad: trainable.then(|| Tensor::zeros(&tensor.shape().dims) ),
        data: tensor,
        op: None,
        previous: vec![],
        trainable,
      }),
    }
  }

  fn operation(op: Op<T>, data: Tensor<T>, previous: Vec<Rc<Node<T>>>) -> Self {
    let grad = previous.iter().any(|prev| prev.grad.is_some() );
    Self {
      node: Rc::new(Node {
        id: make_id(),
        grad: grad.then(|| Tensor::zeros(&data.shape().dims) ),
        data,
        op: Some(op),
        previous,
        trainable: false,
      }),
    }
  }

  pub fn id(&self) -> usize {
    self.node.id
  }

  pub fn tensor(&self) -> &Tensor<T> {
    &self.node.data
  }

  pub fn grad(&self) -> Option<&Tensor<T>> {
    self.node.grad.as_ref()
  }

  pub fn is_trainable(&self) -> bool {
    self.node.trainable
  }

  pub fn unary_op(&self, op: impl UnaryOp<T> + 'static) -> Self {
    let data = op.run(&self.node.data);
    Self::operation(Op::Unary(Box::new(op)), data, vec![self.node.clone()])
  }

  pub fn binary_op(&self, op: impl BinaryOp<T> + 'static, rhs: &Self) -> Self {
    let data = op.run(&self.node.data, &rhs.node.data);
    Self::operation(Op::Binary(Box::new(op)), data, vec![self.node.clone(), rhs.node.clone()])
  }

  /// Compute gradients across this Variable's entire graph.
  ///
  /// Gradients of leaf variables accumulate until [reset](Variable::reset) gets called.

  pub fn backward(&self) {
    assert!(self.grad().is_some(), "Cannot compute gradients for constant {self}");
    let history = self.history();
    for node in history.iter().filter(|node| node.op.is_some() ) {
      node.reset_gradient(T::zero());
    }
    self.node.reset_gradient(T::one());
    for node in history.iter().rev() {
      node.backward();
    }
  }

  /// List all trainable parameters in this Variable's graph.

  pub fn parameters(&self) -> Vec<Self> {
    self.history()
      .into_iter()
      .filter(|node| node.trainable )
      .map(|node| Self { node } )
      .collect()
  }

  /// Set gradients to zero for this Variable's entire graph.

  pub fn reset(&self) {
    for node in self.history() {
      node.reset_gradient(T::zero());
    }
  }

  // Nodes in topological order, inputs first
  fn history(&self) -> Vec<Rc<Node<T>>> {
    let mut history = vec![];
    let mut visited = HashSet::new();
    let mut stack = vec![(self.node.clone(), false)];
    while let Some((node, expanded)) = stack.pop() {
      if expanded {
        history.push(node);
        continue
      }
      if !visited.insert(node.id) { continue }
      stack.push((node.clone(), true));
      for prev in node.previous.iter().rev() {
        if !visited.contains(&prev.id) {
          stack.push((prev.clone(), false));
        }
      }
    }
    history
  }

  /// Compute a function's gradient with respect to a random
  /// input numerically and compare it to the automatically derived
  /// solution.
  ///
  /// Returns the mean absolute difference between both gradients.

  pub fn check_gradients<F>(dims: &[usize], rng: &mut impl Rng, generator: F) -> T
  where
    F: Fn(&Self) -> Self
  {
    let eps: T = lit(1e-3);
    let input = Tensor::randn(dims, rng);
    let var = input.trained();
    // Compute gradient using auto diff
    let output = generator(&var).sum(0);
    output.backward();
    let grad = var.grad().unwrap().detach();
    // Compute gradient numerically for every element of the input
    let numeric = Tensor::from_fn(dims, |i| {
      let offset = Tensor::from_fn(dims, |j| if i == j { eps } else { T::zero() });
      let prev = generator(&(&input - &offset).tracked()).sum(0).item();
      let next = generator(&(&input + &offset).tracked()).sum(0).item();
      (next - prev) / (eps + eps)
    });
    (grad - numeric).abs().mean(0).item()
  }

  /// Counts of graph nodes, operations and trainable elements
  /// reachable from this Variable.

  pub fn statistics(&self) -> (usize, usize, usize) {
    let history = self.history();
    let num_ops = history.iter().filter(|node| node.op.is_some() ).count();
    let num_params = self.parameters().iter().map(|param| param.size() ).sum();
    (history.len(), num_ops, num_params)
  }
}

impl<T: Real> std::fmt::Display for Variable<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    let title = if self.node.trainable { "Trainable" } else if self.node.grad.is_some() {
      "Computed"
    } else {
      "Tracked"
    };
    write!(f, "{title} {}", self.tensor())
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use rand::{ SeedableRng, rngs::StdRng };

  fn assert_gradient(dims: &[usize], generator: impl Fn(&Variable<f64>) -> Variable<f64>) {
    let error = Variable::check_gradients(dims, &mut StdRng::seed_from_u64(11), generator);
    assert!(error < 1e-5, "Gradient mismatch of {error}");
  }

  #[test]
  fn x_squared() {
    let x = Tensor::vec(&[3.0, 5.0]).trained();
    let z = &x * &x + 2.0;
    z.backward();
    assert_eq!(z, Tensor::vec(&[11.0, 27.0]).tracked());
    assert_eq!(x.grad(), Some(&Tensor::vec(&[6.0, 10.0])));
  }

  #[test]
  fn shared_subexpression() {
    let x = Tensor::scalar(3.0).trained();
    let y = &x * 2.0;
    let z = &y * &y;
    z.backward();
    assert_eq!(x.grad().unwrap().item(), 24.0);
  }

  #[test]
  fn reset() {
    let x = Tensor::vec(&[1.0, 2.0]).trained();
    let z = (&x * 3.0).sum(0);
    z.backward();
    z.backward();
    assert_eq!(x.grad().unwrap(), &Tensor::vec(&[6.0, 6.0]));
    z.reset();
    assert_eq!(x.grad().unwrap(), &Tensor::vec(&[0.0, 0.0]));
  }

  #[test]
  fn parameters() {
    let w = Tensor::<f64>::ones(&[2,2]).trained();
    let b = Tensor::zeros(&[2]).trained();
    let x = Tensor::ones(&[3,2]).tracked();
    let y = (x.mm(&w) + &b).sum(0);
    let ids: Vec<_> = y.parameters().iter().map(|p| p.id() ).collect();
    assert_eq!(ids, vec![w.id(), b.id()]);
    assert!(w.is_trainable() && !x.is_trainable() && !y.is_trainable());
    assert_eq!(y.statistics().2, 6);
  }

  #[test]
  #[should_panic]
  fn constant_backward() {
    Tensor::vec(&[1.0]).tracked().sum(0).backward();
  }

  #[test]
  fn arithmetic_gradients() {
    assert_gradient(&[2,3], |x| x * x - x / (x.sqr() + 1.0) );
  }

  #[test]
  fn broadcast_gradients() {
    let rows = Tensor::new(&[4,1], vec![0.5, -1.0, 2.0, 3.0]).tracked();
    assert_gradient(&[3], |x| x * &rows + x );
  }

  #[test]
  fn matmul_gradients() {
    let rhs = Tensor::new(&[3,2], vec![1.0, -2.0, 0.5, 0.3, -1.0, 2.0]).tracked();
    let lhs = Tensor::new(&[4,2], vec![1.0, -2.0, 0.5, 0.3, -1.0, 2.0, 0.1, 0.0]).tracked();
    assert_gradient(&[2,3], |x| x.mm(&rhs) );
    assert_gradient(&[2,3], |x| lhs.mm(x) );
  }

  #[test]
  fn reduction_gradients() {
    assert_gradient(&[3,4], |x| x.mean(-1).sqr() );
    assert_gradient(&[3,4], |x| x.variance(-1) );
  }

  #[test]
  fn activation_gradients() {
    assert_gradient(&[5], |x| x.sigmoid() );
    assert_gradient(&[5], |x| x.exp() * 0.5 );
    assert_gradient(&[5], |x| (x.sqr() + 1.0).log() );
    assert_gradient(&[2,5], |x| x.softmax(-1) * x );
    assert_gradient(&[2,5], |x| x.transpose(0, 1).reshape(&[10]).sqr() );
  }

  #[test]
  fn loss_gradients() {
    let target = Tensor::vec(&[2usize, 0, 1]).one_hot(3).tracked();
    assert_gradient(&[3,3], |x| x.softmax_cross_entropy(&target) );
    assert_gradient(&[3,3], |x| x.softmax(-1).cross_entropy(&target) );
    assert_gradient(&[3,3], |x| x.mse(&target) );
  }
}
