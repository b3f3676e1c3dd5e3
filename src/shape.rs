use crate::internal::*;


/// The shape of a [Tensor](crate::Tensor).
///
/// Besides its dimensions, a shape records how to step through the
/// underlying storage, which allows transposed and broadcasted
/// views to share data with the tensor they were derived from.

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
  pub dims: Vec<usize>,
  pub(crate) strides: Vec<isize>,
  pub(crate) offset: usize,
}

impl Shape {
  pub fn new(dims: &[usize]) -> Self {
    Self {
      dims: dims.to_vec(),
      strides: Self::make_strides(dims),
      offset: 0,
    }
  }

  fn make_strides(dims: &[usize]) -> Vec<isize> {
    let mut strides = vec![1; dims.len()];
    for i in (1..dims.len()).rev() {
      strides[i - 1] = dims[i] as isize * strides[i];
    }
    strides
  }

  pub fn size(&self) -> usize {
    self.dims.iter().product()
  }

  pub fn rank(&self) -> usize {
    self.dims.len()
  }

  /// Whether this shape walks its storage front to back without gaps.

  pub fn contiguous(&self) -> bool {
    self.strides == Self::make_strides(&self.dims)
  }

  /// Storage indices of all elements in row-major order.

  pub fn iter(&self) -> Box<dyn Iterator<Item=usize> + '_> {
    if self.contiguous() {
      Box::new(self.offset..self.offset + self.size())
    } else {
      Box::new(ShapeIterator::new(self))
    }
  }

  /// Reinterpret contiguous dimensions. A single `0` gets
  /// replaced by whatever size is left over.

  pub fn view(&self, dims: &[usize]) -> Self {
    assert!(self.contiguous(), "Cannot view non-contiguous {}", self);
    let known: usize = dims.iter().filter(|&&n| n != 0 ).product();
    let dims: Vec<usize> = dims.iter()
      .map(|&n| if n == 0 { self.size() / known.max(1) } else { n })
      .collect();
    assert_eq!(dims.iter().product::<usize>(), self.size(),
      "Cannot view {} as Shape{:?}", self, dims);
    Self { strides: Self::make_strides(&dims), dims, offset: self.offset }
  }

  pub fn unsqueeze(&self, dim: isize) -> Self {
    let d = negative_index(dim, self.rank(), true);
    let mut shape = self.clone();
    let stride = if d < self.rank() {
      self.strides[d] * self.dims[d] as isize
    } else { 1 };
    shape.dims.insert(d, 1);
    shape.strides.insert(d, stride);
    shape
  }

  pub fn transpose(&self, dim1: isize, dim2: isize) -> Self {
    let dim1 = negative_index(dim1, self.rank(), false);
    let dim2 = negative_index(dim2, self.rank(), false);
    let mut shape = self.clone();
    shape.dims.swap(dim1, dim2);
    shape.strides.swap(dim1, dim2);
    shape
  }

  /// Dimensions resulting from broadcasting two shapes against each other,
  /// aligned at their trailing dimension.

  pub fn broadcast_dims(lhs: &[usize], rhs: &[usize]) -> Vec<usize> {
    let rank = lhs.len().max(rhs.len());
    let mut dims = vec![0; rank];
    for i in 0..rank {
      let l = if i < lhs.len() { lhs[lhs.len() - 1 - i] } else { 1 };
      let r = if i < rhs.len() { rhs[rhs.len() - 1 - i] } else { 1 };
      assert!(l == r || l == 1 || r == 1,
        "Could not broadcast Shape{:?} & Shape{:?}", lhs, rhs);
      dims[rank - 1 - i] = l.max(r);
    }
    dims
  }

  /// Stretch this shape to `dims` without copying, using zero strides
  /// for every dimension that gets repeated.

  pub fn broadcast(&self, dims: &[usize]) -> Self {
    assert!(dims.len() >= self.rank(),
      "Could not broadcast {} to lower rank Shape{:?}", self, dims);
    let lead = dims.len() - self.rank();
    let strides = dims.iter().enumerate().map(|(d, &n)| {
      if d < lead { return 0 }
      let own = self.dims[d - lead];
      assert!(own == n || own == 1, "Could not broadcast {} to Shape{:?}", self, dims);
      if own == 1 && n != 1 { 0 } else { self.strides[d - lead] }
    }).collect();
    Self { dims: dims.to_vec(), strides, offset: self.offset }
  }

  /// Dimensions with all ones removed, used to compare shapes loosely.

  pub fn squeezed(&self) -> Vec<usize> {
    self.dims.iter().copied().filter(|&n| n != 1 ).collect()
  }
}

impl std::ops::Index<isize> for Shape {
  type Output = usize;

  fn index(&self, i: isize) -> &usize {
    &self.dims[negative_index(i, self.rank(), false)]
  }
}

impl std::fmt::Display for Shape {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "Shape{:?}", self.dims)
  }
}


/// Walks the storage indices of a strided [Shape].

pub struct ShapeIterator<'a> {
  shape: &'a Shape,
  counter: Vec<usize>,
  idx: isize,
  remaining: usize,
}

impl<'a> ShapeIterator<'a> {
  fn new(shape: &'a Shape) -> Self {
    Self {
      counter: vec![0; shape.rank()],
      idx: shape.offset as isize,
      remaining: shape.size(),
      shape,
    }
  }
}

impl Iterator for ShapeIterator<'_> {
  type Item = usize;

  fn next(&mut self) -> Option<usize> {
    if self.remaining == 0 { return None }
    self.remaining -= 1;
    let out = self.idx as usize;
    // Advance like an odometer, innermost dimension first
    for d in (0..self.counter.len()).rev() {
      self.counter[d] += 1;
      self.idx += self.shape.strides[d];
      if self.counter[d] < self.shape.dims[d] { break }
      self.idx -= self.shape.strides[d] * self.shape.dims[d] as isize;
      self.counter[d] = 0;
    }
    Some(out)
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    (self.remaining, Some(self.remaining))
  }
}
