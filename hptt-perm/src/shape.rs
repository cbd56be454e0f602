//! Shape/permutation model: validation and canonical column-major form.
//!
//! The caller describes a transposition with the HPTT convention:
//! `perm[k]` is the source axis that becomes destination axis `k`, so
//! `size_b[k] = size_a[perm[k]]` and `B[i_perm[0], i_perm[1], ..] = A[i_0, i_1, ..]`.
//! Outer sizes describe the enclosing buffer of a sub-tensor; they default
//! to the sizes of `A` and the permuted sizes of `B`.
//!
//! [`CanonicalShape`] is the engine's view of a request: column-major index
//! order (fastest axis first), one entry per source axis with its extent,
//! its source stride, and the stride of the destination axis it maps to.
//! Size-1 axes can be elided from that view; they never change which
//! elements are read or written.

use crate::error::{HpttError, Operand, Result};
use crate::fuse::elide_unit_dims;

/// Memory order of the caller's index tuples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Layout {
    /// First index varies fastest (the engine's native order).
    #[default]
    ColMajor,
    /// Last index varies fastest.
    RowMajor,
}

/// A transposition request as the caller states it.
#[derive(Debug, Clone, Copy)]
pub struct ShapeRequest<'a> {
    pub perm: &'a [usize],
    pub size_a: &'a [usize],
    pub outer_size_a: Option<&'a [usize]>,
    pub outer_size_b: Option<&'a [usize]>,
    pub layout: Layout,
}

impl<'a> ShapeRequest<'a> {
    /// Dense column-major request without outer sizes.
    pub fn new(perm: &'a [usize], size_a: &'a [usize]) -> Self {
        Self {
            perm,
            size_a,
            outer_size_a: None,
            outer_size_b: None,
            layout: Layout::ColMajor,
        }
    }

    pub fn outer_size_a(mut self, outer: &'a [usize]) -> Self {
        self.outer_size_a = Some(outer);
        self
    }

    pub fn outer_size_b(mut self, outer: &'a [usize]) -> Self {
        self.outer_size_b = Some(outer);
        self
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }
}

/// Validated, column-major form of a [`ShapeRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalShape {
    perm: Vec<usize>,
    size_a: Vec<usize>,
    outer_a: Vec<usize>,
    outer_b: Vec<usize>,
    dims: Vec<usize>,
    src_strides: Vec<isize>,
    dst_strides: Vec<isize>,
    len_a: usize,
    len_b: usize,
}

impl CanonicalShape {
    /// Validate `req` and build its canonical form.
    ///
    /// When `elide_unit_axes` is set, size-1 axes are dropped from
    /// [`dims`](Self::dims) and the stride arrays.
    pub fn new(req: &ShapeRequest<'_>, elide_unit_axes: bool) -> Result<Self> {
        let rank = req.perm.len();
        check_rank("size_a", rank, req.size_a.len())?;
        if let Some(outer) = req.outer_size_a {
            check_rank("outer_size_a", rank, outer.len())?;
        }
        if let Some(outer) = req.outer_size_b {
            check_rank("outer_size_b", rank, outer.len())?;
        }
        validate_perm(req.perm)?;

        if let Some(axis) = req.size_a.iter().position(|&s| s == 0) {
            return Err(HpttError::ZeroSize { axis });
        }

        let size_b: Vec<usize> = req.perm.iter().map(|&p| req.size_a[p]).collect();
        let outer_a = match req.outer_size_a {
            Some(outer) => {
                check_outer(Operand::Source, outer, req.size_a)?;
                outer.to_vec()
            }
            None => req.size_a.to_vec(),
        };
        let outer_b = match req.outer_size_b {
            Some(outer) => {
                check_outer(Operand::Destination, outer, &size_b)?;
                outer.to_vec()
            }
            None => size_b,
        };

        let (perm, size_a, outer_a, outer_b) = match req.layout {
            Layout::ColMajor => (req.perm.to_vec(), req.size_a.to_vec(), outer_a, outer_b),
            Layout::RowMajor => (
                row_major_perm(req.perm),
                req.size_a.iter().rev().copied().collect(),
                outer_a.into_iter().rev().collect(),
                outer_b.into_iter().rev().collect(),
            ),
        };

        let len_a = checked_len(&outer_a)?;
        let len_b = checked_len(&outer_b)?;

        let stride_a = col_major_strides(&outer_a);
        let stride_b = col_major_strides(&outer_b);
        let inv = inverse_perm(&perm);
        let dst_for_src: Vec<isize> = inv.iter().map(|&k| stride_b[k]).collect();

        let (dims, src_strides, dst_strides) = if elide_unit_axes {
            elide_unit_dims(&size_a, &stride_a, &dst_for_src)
        } else {
            (size_a.clone(), stride_a, dst_for_src)
        };

        Ok(Self {
            perm,
            size_a,
            outer_a,
            outer_b,
            dims,
            src_strides,
            dst_strides,
            len_a,
            len_b,
        })
    }

    /// Number of axes of the original request.
    pub fn rank(&self) -> usize {
        self.perm.len()
    }

    /// Column-major permutation.
    pub fn perm(&self) -> &[usize] {
        &self.perm
    }

    /// Column-major sizes of `A`.
    pub fn size_a(&self) -> &[usize] {
        &self.size_a
    }

    /// Column-major sizes of `B`.
    pub fn size_b(&self) -> Vec<usize> {
        self.perm.iter().map(|&p| self.size_a[p]).collect()
    }

    pub fn outer_size_a(&self) -> &[usize] {
        &self.outer_a
    }

    pub fn outer_size_b(&self) -> &[usize] {
        &self.outer_b
    }

    /// Extents of the retained source axes.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Source stride of each retained axis.
    pub fn src_strides(&self) -> &[isize] {
        &self.src_strides
    }

    /// Destination stride of each retained source axis.
    pub fn dst_strides(&self) -> &[isize] {
        &self.dst_strides
    }

    /// Number of logical elements transposed.
    pub fn total_len(&self) -> usize {
        self.size_a.iter().product()
    }

    /// Minimum buffer length for the given operand.
    pub fn required_len(&self, operand: Operand) -> usize {
        match operand {
            Operand::Source => self.len_a,
            Operand::Destination => self.len_b,
        }
    }

    /// Check that the caller's buffers cover the described tensors.
    pub fn check_buffers(&self, len_a: usize, len_b: usize) -> Result<()> {
        for (operand, len) in [(Operand::Source, len_a), (Operand::Destination, len_b)] {
            let required = self.required_len(operand);
            if len < required {
                return Err(HpttError::BufferTooSmall {
                    operand,
                    len,
                    required,
                });
            }
        }
        Ok(())
    }
}

/// Column-major strides for the given outer sizes.
pub fn col_major_strides(outer: &[usize]) -> Vec<isize> {
    let mut strides = Vec::with_capacity(outer.len());
    let mut acc = 1isize;
    for &o in outer {
        strides.push(acc);
        acc *= o as isize;
    }
    strides
}

/// Inverse of a (validated) permutation.
pub fn inverse_perm(perm: &[usize]) -> Vec<usize> {
    let mut inv = vec![0; perm.len()];
    for (k, &p) in perm.iter().enumerate() {
        inv[p] = k;
    }
    inv
}

/// Permutation expressed in reversed (column-major) index order.
pub fn row_major_perm(perm: &[usize]) -> Vec<usize> {
    let n = perm.len();
    (0..n).map(|k| n - 1 - perm[n - 1 - k]).collect()
}

fn validate_perm(perm: &[usize]) -> Result<()> {
    let mut seen = vec![false; perm.len()];
    for &p in perm {
        if p >= perm.len() || seen[p] {
            return Err(HpttError::InvalidPermutation {
                perm: perm.to_vec(),
            });
        }
        seen[p] = true;
    }
    Ok(())
}

fn check_rank(what: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(HpttError::RankMismatch {
            what,
            expected,
            found,
        });
    }
    Ok(())
}

fn check_outer(operand: Operand, outer: &[usize], sizes: &[usize]) -> Result<()> {
    for (axis, (&o, &s)) in outer.iter().zip(sizes).enumerate() {
        if o < s {
            return Err(HpttError::OuterSizeTooSmall {
                operand,
                axis,
                outer: o,
                size: s,
            });
        }
    }
    Ok(())
}

fn checked_len(outer: &[usize]) -> Result<usize> {
    let len = outer
        .iter()
        .try_fold(1usize, |acc, &o| acc.checked_mul(o))
        .ok_or(HpttError::OffsetOverflow)?;
    if len > isize::MAX as usize {
        return Err(HpttError::OffsetOverflow);
    }
    Ok(len)
}
