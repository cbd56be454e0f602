//! Dimension simplification applied before planning.
//!
//! Neither step changes which elements are visited; both only shrink the
//! loop nest the planner has to reason about.

/// Drop size-1 dimensions together with their strides.
///
/// A tensor whose dimensions are all 1 compresses to rank 0.
pub fn elide_unit_dims(
    dims: &[usize],
    src_strides: &[isize],
    dst_strides: &[isize],
) -> (Vec<usize>, Vec<isize>, Vec<isize>) {
    let kept: Vec<usize> = (0..dims.len()).filter(|&i| dims[i] != 1).collect();
    (
        kept.iter().map(|&i| dims[i]).collect(),
        kept.iter().map(|&i| src_strides[i]).collect(),
        kept.iter().map(|&i| dst_strides[i]).collect(),
    )
}

/// Bilateral dimension fusion for src + dst stride patterns.
///
/// Two dimensions `i` and `i+1` can be fused if BOTH src and dst strides
/// are contiguous for those dimensions. Returns the fused (dims, src_strides, dst_strides).
pub fn fuse_dims_bilateral(
    dims: &[usize],
    src_strides: &[isize],
    dst_strides: &[isize],
) -> (Vec<usize>, Vec<isize>, Vec<isize>) {
    let n = dims.len();
    if n <= 1 {
        return (dims.to_vec(), src_strides.to_vec(), dst_strides.to_vec());
    }

    let mut fused_dims = Vec::with_capacity(n);
    let mut fused_src = Vec::with_capacity(n);
    let mut fused_dst = Vec::with_capacity(n);

    fused_dims.push(dims[0]);
    fused_src.push(src_strides[0]);
    fused_dst.push(dst_strides[0]);

    for i in 1..n {
        let last = fused_dims.len() - 1;
        let d_prev = fused_dims[last];

        let src_contiguous = src_strides[i] == fused_src[last] * d_prev as isize;
        let dst_contiguous = dst_strides[i] == fused_dst[last] * d_prev as isize;

        if src_contiguous && dst_contiguous {
            fused_dims[last] *= dims[i];
        } else {
            fused_dims.push(dims[i]);
            fused_src.push(src_strides[i]);
            fused_dst.push(dst_strides[i]);
        }
    }

    (fused_dims, fused_src, fused_dst)
}
