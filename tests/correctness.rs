use approx::assert_relative_eq;
use hptt_rs::{
    c_tensor_transpose, d_tensor_transpose, s_tensor_transpose, tensor_transpose,
    z_tensor_transpose, HpttError, KernelVariant, Layout, Operand, SelectionMethod, Transpose,
    TransposeDesc,
};
use num_complex::{Complex32, Complex64};
use proptest::prelude::*;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

fn make_vec(len: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(-10.0..10.0)).collect()
}

/// Column-major offset of `idx` in a buffer with `outer` extents.
fn offset(idx: &[usize], outer: &[usize]) -> usize {
    let mut off = 0;
    let mut stride = 1;
    for (&i, &o) in idx.iter().zip(outer) {
        off += i * stride;
        stride *= o;
    }
    off
}

/// Visit every index tuple of `sizes`, first axis fastest.
fn for_each_index(sizes: &[usize], mut f: impl FnMut(&[usize])) {
    let total: usize = sizes.iter().product();
    let mut idx = vec![0; sizes.len()];
    for _ in 0..total {
        f(&idx);
        for k in 0..sizes.len() {
            idx[k] += 1;
            if idx[k] < sizes[k] {
                break;
            }
            idx[k] = 0;
        }
    }
}

/// Reference `B = alpha * permute(A) + beta * B` with outer sizes.
#[allow(clippy::too_many_arguments)]
fn reference(
    perm: &[usize],
    size_a: &[usize],
    outer_a: &[usize],
    outer_b: &[usize],
    a: &[f64],
    b: &mut [f64],
    alpha: f64,
    beta: f64,
) {
    let size_b: Vec<usize> = perm.iter().map(|&p| size_a[p]).collect();
    for_each_index(&size_b, |jb| {
        let mut ia = vec![0; perm.len()];
        for (k, &p) in perm.iter().enumerate() {
            ia[p] = jb[k];
        }
        let dst = offset(jb, outer_b);
        b[dst] = alpha * a[offset(&ia, outer_a)] + beta * b[dst];
    });
}

#[test]
fn test_scenario_transpose_3d() {
    let size_a = [2, 3, 4];
    let a: Vec<f64> = (0..24).map(|i| i as f64).collect();
    let mut b = vec![0.0; 24];
    d_tensor_transpose(&[1, 0, 2], 1.0, &a, &size_a, None, 0.0, &mut b, None, 1, false).unwrap();

    // B has shape [3, 2, 4]
    for_each_index(&size_a, |i| {
        assert_eq!(
            b[offset(&[i[1], i[0], i[2]], &[3, 2, 4])],
            a[offset(i, &size_a)],
            "index {i:?}"
        );
    });
}

#[test]
fn test_scenario_scale_accumulate() {
    let size_a = [2, 3, 4];
    let a: Vec<f64> = (0..24).map(|i| i as f64).collect();
    let mut b = vec![1.0; 24];
    d_tensor_transpose(&[1, 0, 2], 2.0, &a, &size_a, None, 1.0, &mut b, None, 1, false).unwrap();

    for_each_index(&size_a, |i| {
        assert_eq!(
            b[offset(&[i[1], i[0], i[2]], &[3, 2, 4])],
            2.0 * a[offset(i, &size_a)] + 1.0
        );
    });
}

#[test]
fn test_scenario_complex_conjugate() {
    let a = [
        Complex64::new(1.0, 2.0),
        Complex64::new(3.0, -4.0),
        Complex64::new(-5.0, 6.0),
        Complex64::new(7.0, 0.5),
    ];
    let mut b = [Complex64::new(0.0, 0.0); 4];
    z_tensor_transpose(
        &[1, 0],
        Complex64::new(1.0, 0.0),
        true,
        &a,
        &[2, 2],
        None,
        Complex64::new(0.0, 0.0),
        &mut b,
        None,
        1,
        false,
    )
    .unwrap();
    assert_eq!(b, [a[0].conj(), a[2].conj(), a[1].conj(), a[3].conj()]);
}

#[test]
fn test_complex_scale_without_conjugate() {
    let a: Vec<Complex32> = (0..12)
        .map(|i| Complex32::new(i as f32, -(i as f32) / 2.0))
        .collect();
    let mut b = vec![Complex32::new(1.0, 1.0); 12];
    let alpha = Complex32::new(0.0, 1.0);
    let beta = Complex32::new(2.0, 0.0);
    c_tensor_transpose(&[1, 0], alpha, false, &a, &[3, 4], None, beta, &mut b, None, 1, false)
        .unwrap();
    for j0 in 0..4 {
        for j1 in 0..3 {
            let expected = alpha * a[j1 + 3 * j0] + beta * Complex32::new(1.0, 1.0);
            assert_relative_eq!(b[j0 + 4 * j1].re, expected.re, epsilon = 1e-6);
            assert_relative_eq!(b[j0 + 4 * j1].im, expected.im, epsilon = 1e-6);
        }
    }
}

#[test]
fn test_identity_is_copy() {
    let a: Vec<f32> = (0..120).map(|i| i as f32 * 0.25).collect();
    let mut b = vec![f32::NAN; 120];
    s_tensor_transpose(&[0, 1, 2], 1.0, &a, &[4, 5, 6], None, 0.0, &mut b, None, 1, false)
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_round_trip_with_inverse() {
    let mut rng = StdRng::seed_from_u64(7);
    for rank in 1..=6 {
        let size_a: Vec<usize> = (0..rank).map(|_| rng.gen_range(1..=6)).collect();
        let mut perm: Vec<usize> = (0..rank).collect();
        perm.shuffle(&mut rng);
        let mut inv = vec![0; rank];
        for (k, &p) in perm.iter().enumerate() {
            inv[p] = k;
        }
        let size_b: Vec<usize> = perm.iter().map(|&p| size_a[p]).collect();
        let total: usize = size_a.iter().product();

        let a = make_vec(total, rank as u64);
        let mut b = vec![0.0; total];
        let mut back = vec![0.0; total];
        d_tensor_transpose(&perm, 1.0, &a, &size_a, None, 0.0, &mut b, None, 2, false).unwrap();
        d_tensor_transpose(&inv, 1.0, &b, &size_b, None, 0.0, &mut back, None, 3, false).unwrap();
        assert_eq!(a, back, "perm {perm:?} size {size_a:?}");
    }
}

#[test]
fn test_sub_tensor_leaves_padding_untouched() {
    let size_a = [3, 4, 2];
    let outer_a = [5, 6, 3];
    let perm = [2, 0, 1];
    let outer_b = [4, 4, 7]; // B logical shape [2, 3, 4]

    let len_a: usize = outer_a.iter().product();
    let len_b: usize = outer_b.iter().product();
    let a = make_vec(len_a, 1);
    let b0 = vec![-123.5; len_b];

    let mut expected = b0.clone();
    reference(&perm, &size_a, &outer_a, &outer_b, &a, &mut expected, 1.5, 0.5);

    for threads in [1, 4] {
        let mut b = b0.clone();
        d_tensor_transpose(
            &perm,
            1.5,
            &a,
            &size_a,
            Some(&outer_a),
            0.5,
            &mut b,
            Some(&outer_b),
            threads,
            false,
        )
        .unwrap();
        assert_eq!(b, expected);
        let touched = b.iter().zip(&b0).filter(|(x, y)| x != y).count();
        assert!(touched <= 24);
    }
}

#[test]
fn test_sub_tensor_with_unit_leading_axis() {
    // A leading size-1 axis is elided; the remaining axes have no unit stride.
    let size_a = [1, 5, 6];
    let outer_a = [3, 5, 6];
    let perm = [0, 2, 1];
    let outer_b = [2, 6, 5];
    let a = make_vec(90, 2);
    let b0 = make_vec(60, 3);

    let mut expected = b0.clone();
    reference(&perm, &size_a, &outer_a, &outer_b, &a, &mut expected, -1.0, 2.0);

    let desc = TransposeDesc::<f64>::new(&perm, &size_a)
        .outer_size_a(&outer_a)
        .outer_size_b(&outer_b)
        .alpha(-1.0)
        .beta(2.0);
    let t = Transpose::new(&desc).unwrap();
    assert!(matches!(t.plan().variant(), KernelVariant::Strided { .. }));
    let mut b = b0.clone();
    t.execute(&a, &mut b).unwrap();
    assert_eq!(b, expected);
}

#[test]
fn test_row_major_matches_reversed_column_major() {
    // Row-major [2, 3, 4] with perm [2, 0, 1] is column-major [4, 3, 2]
    // with perm [1, 2, 0].
    let a = make_vec(24, 4);
    let mut row = vec![0.0; 24];
    let mut col = vec![0.0; 24];
    d_tensor_transpose(&[2, 0, 1], 1.0, &a, &[2, 3, 4], None, 0.0, &mut row, None, 1, true)
        .unwrap();
    d_tensor_transpose(&[1, 2, 0], 1.0, &a, &[4, 3, 2], None, 0.0, &mut col, None, 1, false)
        .unwrap();
    assert_eq!(row, col);

    // Row-major check by index: B[i2, i0, i1] = A[i0, i1, i2].
    for i0 in 0..2 {
        for i1 in 0..3 {
            for i2 in 0..4 {
                let a_off = (i0 * 3 + i1) * 4 + i2;
                let b_off = (i2 * 2 + i0) * 3 + i1;
                assert_eq!(row[b_off], a[a_off]);
            }
        }
    }
}

#[test]
fn test_row_major_sub_tensor() {
    // Row-major A[2, 3, 4] inside a [3, 5, 6] buffer, perm [2, 0, 1]:
    // B[4, 2, 3] inside a [5, 4, 4] buffer.
    let perm = [2, 0, 1];
    let size_a = [2, 3, 4];
    let outer_a = [3, 5, 6];
    let outer_b = [5, 4, 4];
    let a = make_vec(90, 11);
    let b0 = make_vec(80, 12);

    let mut expected = b0.clone();
    let mut logical = vec![false; 80];
    for i0 in 0..2 {
        for i1 in 0..3 {
            for i2 in 0..4 {
                let a_off = (i0 * 5 + i1) * 6 + i2;
                let b_off = (i2 * 4 + i0) * 4 + i1;
                expected[b_off] = 2.0 * a[a_off] + 0.5 * b0[b_off];
                logical[b_off] = true;
            }
        }
    }
    assert_eq!(logical.iter().filter(|&&x| x).count(), 24);

    for threads in [1, 3] {
        let mut b = b0.clone();
        d_tensor_transpose(
            &perm,
            2.0,
            &a,
            &size_a,
            Some(&outer_a),
            0.5,
            &mut b,
            Some(&outer_b),
            threads,
            true,
        )
        .unwrap();
        assert_eq!(b, expected, "threads {threads}");
        for (k, (&x, &y)) in b.iter().zip(&b0).enumerate() {
            if !logical[k] {
                assert_eq!(x.to_bits(), y.to_bits(), "padding element {k} changed");
            }
        }
    }

    // Outer sizes are checked against the row-major (unreversed) sizes.
    let mut b = b0.clone();
    let err = d_tensor_transpose(
        &perm,
        2.0,
        &a,
        &size_a,
        Some(&outer_a),
        0.5,
        &mut b,
        Some(&[5, 4, 2]),
        1,
        true,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        HpttError::OuterSizeTooSmall {
            operand: Operand::Destination,
            axis: 2,
            ..
        }
    ));
    assert_eq!(b, b0);
}

#[test]
fn test_rank_zero_and_all_unit() {
    let mut b = [5.0];
    d_tensor_transpose(&[], 3.0, &[2.0], &[], None, 1.0, &mut b, None, 1, false).unwrap();
    assert_eq!(b[0], 11.0);

    let mut b = [5.0];
    d_tensor_transpose(&[1, 0], 3.0, &[2.0], &[1, 1], None, 0.0, &mut b, None, 8, false)
        .unwrap();
    assert_eq!(b[0], 6.0);
}

#[test]
fn test_determinism_across_threads() {
    let size_a = [33, 17, 9, 13];
    let perm = [3, 1, 0, 2];
    let total: usize = size_a.iter().product();
    let a = make_vec(total, 11);
    let b0 = make_vec(total, 12);

    let mut reference_out: Option<Vec<f64>> = None;
    for threads in [1, 2, 3, 5, 8] {
        let mut b = b0.clone();
        d_tensor_transpose(&perm, 0.3, &a, &size_a, None, -1.7, &mut b, None, threads, false)
            .unwrap();
        match &reference_out {
            None => reference_out = Some(b),
            Some(r) => assert_eq!(&b, r, "threads {threads}"),
        }
    }
}

#[test]
fn test_handle_reuse() {
    let perm = [1, 2, 0];
    let size_a = [6, 7, 8];
    let desc = TransposeDesc::<f64>::new(&perm, &size_a)
        .alpha(2.0)
        .num_threads(2);
    let t = Transpose::new(&desc).unwrap();
    assert_eq!(t.num_threads(), 2);
    assert_eq!(t.method(), SelectionMethod::Estimate);

    for seed in 0..3 {
        let a = make_vec(336, seed);
        let mut b = vec![0.0; 336];
        t.execute(&a, &mut b).unwrap();
        let mut expected = vec![0.0; 336];
        reference(&perm, &size_a, &size_a, &[7, 8, 6], &a, &mut expected, 2.0, 0.0);
        assert_eq!(b, expected);
    }
}

#[test]
fn test_generic_entry_point() {
    let perm = [2, 1, 0];
    let size_a = [3, 4, 5];
    let a = make_vec(60, 21);
    let mut expected = vec![0.0; 60];
    reference(&perm, &size_a, &size_a, &[5, 4, 3], &a, &mut expected, 1.0, 0.0);

    let desc = TransposeDesc::<f64>::new(&perm, &size_a).layout(Layout::ColMajor);
    let mut b = vec![0.0; 60];
    tensor_transpose(&desc, &a, &mut b, SelectionMethod::Estimate).unwrap();
    assert_eq!(b, expected);
}

#[test]
fn test_invalid_arguments() {
    let a = vec![0.0; 24];
    let mut b = vec![7.0; 24];
    let call = |perm: &[usize], size: &[usize], outer_b: Option<&[usize]>, threads, b: &mut [f64]| {
        d_tensor_transpose(perm, 1.0, &a, size, None, 0.0, b, outer_b, threads, false)
    };

    assert!(matches!(
        call(&[0, 0, 1], &[2, 3, 4], None, 1, &mut b),
        Err(HpttError::InvalidPermutation { .. })
    ));
    assert!(matches!(
        call(&[0, 1, 3], &[2, 3, 4], None, 1, &mut b),
        Err(HpttError::InvalidPermutation { .. })
    ));
    assert!(matches!(
        call(&[0, 1], &[2, 3, 4], None, 1, &mut b),
        Err(HpttError::RankMismatch { .. })
    ));
    assert_eq!(
        call(&[0, 1, 2], &[2, 0, 4], None, 1, &mut b),
        Err(HpttError::ZeroSize { axis: 1 })
    );
    assert!(matches!(
        call(&[1, 0, 2], &[2, 3, 4], Some(&[3, 1, 4]), 1, &mut b),
        Err(HpttError::OuterSizeTooSmall {
            operand: Operand::Destination,
            axis: 1,
            ..
        })
    ));
    assert_eq!(
        call(&[1, 0, 2], &[2, 3, 4], None, 0, &mut b),
        Err(HpttError::InvalidThreadCount)
    );
    assert!(matches!(
        call(&[1, 0, 2], &[2, 3, 4], None, 1, &mut b[..20]),
        Err(HpttError::BufferTooSmall {
            operand: Operand::Destination,
            ..
        })
    ));

    // Validation failures never touch the destination.
    assert!(b.iter().all(|&x| x == 7.0));
    assert!(HpttError::InvalidThreadCount.is_invalid_argument());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_matches_reference(
        sizes in prop::collection::vec(1usize..7, 1..6),
        seed in any::<u64>(),
        threads in 1usize..5,
        beta_is_zero in any::<bool>(),
    ) {
        let rank = sizes.len();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut perm: Vec<usize> = (0..rank).collect();
        perm.shuffle(&mut rng);
        let total: usize = sizes.iter().product();
        let size_b: Vec<usize> = perm.iter().map(|&p| sizes[p]).collect();

        let a = make_vec(total, seed);
        let b0 = make_vec(total, seed ^ 1);
        let beta = if beta_is_zero { 0.0 } else { 0.75 };

        let mut expected = b0.clone();
        reference(&perm, &sizes, &sizes, &size_b, &a, &mut expected, 1.25, beta);

        let mut b = b0.clone();
        d_tensor_transpose(&perm, 1.25, &a, &sizes, None, beta, &mut b, None, threads, false)
            .unwrap();
        prop_assert_eq!(b, expected);
    }
}
