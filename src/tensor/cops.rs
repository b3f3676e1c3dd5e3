use crate::{
  tensor::Tensor,
  scalar::Real,
};


impl<T: Real> Tensor<T> {
  /// Batched matrix multiplication over contiguous `[b, m, k] × [b, k, n]` operands.

  pub(crate) fn matmul(&self, rhs: &Self, batches: usize) -> Vec<T> {
    let lhs = self.contiguous();
    let rhs = rhs.contiguous();

    let rows_l = lhs.shape[-2];
    let cols_l = lhs.shape[-1];
    let cols_r = rhs.shape[-1];

    let data_l = lhs.raw();
    let data_r = rhs.raw();

    let (size_l, size_r, size_o) = (rows_l * cols_l, cols_l * cols_r, rows_l * cols_r);
    let mut data = vec![T::zero(); batches * size_o];
    for b in 0..batches {
      // Operands with a single matrix get reused for every batch
      let a = if lhs.size() == size_l { &data_l[..size_l] } else { &data_l[b * size_l..(b + 1) * size_l] };
      let m = if rhs.size() == size_r { &data_r[..size_r] } else { &data_r[b * size_r..(b + 1) * size_r] };
      T::gemm(rows_l, cols_l, cols_r, a, m, &mut data[b * size_o..(b + 1) * size_o]);
    }

    data
  }
}
