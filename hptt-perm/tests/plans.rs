use approx::assert_relative_eq;
use hptt_perm::{
    candidate_choices, execute, CanonicalShape, Layout, PlanBuilder, PlanConfig, SelectionMethod,
    ShapeRequest,
};
use num_complex::Complex64;
use proptest::prelude::*;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

fn builder<T: hptt_perm::TransposeElement>(
    req: &ShapeRequest<'_>,
    threads: usize,
    config: &PlanConfig,
) -> (CanonicalShape, PlanBuilder) {
    let shape = CanonicalShape::new(req, config.elide_unit_axes).unwrap();
    let builder = PlanBuilder::new::<T>(&shape, threads, config).unwrap();
    (shape, builder)
}

#[test]
fn test_unit_axes_kept_or_elided_agree() {
    let perm = [3, 1, 0, 2];
    let size = [5, 1, 7, 1];
    let req = ShapeRequest::new(&perm, &size);
    let a: Vec<f64> = (0..35).map(|i| i as f64 - 17.0).collect();

    let mut outputs = Vec::new();
    for elide in [true, false] {
        let config = PlanConfig {
            elide_unit_axes: elide,
            ..PlanConfig::default()
        };
        let (_, b) = builder::<f64>(&req, 1, &config);
        let mut out = vec![0.0; 35];
        execute(&b.default_plan(), &a, &mut out, 1.0, 0.0, false).unwrap();
        outputs.push(out);
    }
    assert_eq!(outputs[0], outputs[1]);
}

#[test]
fn test_scaled_round_trip_complex() {
    let mut rng = StdRng::seed_from_u64(5);
    let size = [4, 6, 5];
    let perm = [1, 2, 0];
    let inv = [2, 0, 1];
    let size_b = [6, 5, 4];
    let a: Vec<Complex64> = (0..120)
        .map(|_| Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
        .collect();

    let (_, fwd) = builder::<Complex64>(&ShapeRequest::new(&perm, &size), 1, &PlanConfig::default());
    let (_, back) =
        builder::<Complex64>(&ShapeRequest::new(&inv, &size_b), 1, &PlanConfig::default());

    let zero = Complex64::new(0.0, 0.0);
    let mut b = vec![zero; 120];
    let mut c = vec![zero; 120];
    execute(&fwd.default_plan(), &a, &mut b, Complex64::new(0.0, 3.0), zero, true).unwrap();
    execute(&back.default_plan(), &b, &mut c, Complex64::new(0.0, 1.0 / 3.0), zero, true)
        .unwrap();

    // conj(i/3 * conj(3i * conj(x))) = x
    for (x, y) in a.iter().zip(&c) {
        assert_relative_eq!(x.re, y.re, epsilon = 1e-12);
        assert_relative_eq!(x.im, y.im, epsilon = 1e-12);
    }
}

#[test]
fn test_row_major_plan_matches_reversed_request() {
    let row = ShapeRequest::new(&[2, 0, 1], &[3, 4, 5]).layout(Layout::RowMajor);
    let col = ShapeRequest::new(&[1, 2, 0], &[5, 4, 3]);
    let (row_shape, row_builder) = builder::<f64>(&row, 1, &PlanConfig::default());
    let (col_shape, col_builder) = builder::<f64>(&col, 1, &PlanConfig::default());
    assert_eq!(row_shape, col_shape);
    assert_eq!(row_builder.default_plan(), col_builder.default_plan());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_every_candidate_agrees(
        sizes in prop::collection::vec(1usize..9, 1..5),
        seed in any::<u64>(),
        threads in 1usize..4,
    ) {
        let rank = sizes.len();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut perm: Vec<usize> = (0..rank).collect();
        perm.shuffle(&mut rng);
        let total: usize = sizes.iter().product();
        let a: Vec<f64> = (0..total).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let b0: Vec<f64> = (0..total).map(|_| rng.gen_range(-1.0..1.0)).collect();

        let config = PlanConfig { min_parallel_len: 0, ..PlanConfig::default() };
        let (_, b) = builder::<f64>(&ShapeRequest::new(&perm, &sizes), threads, &config);

        let mut expected = b0.clone();
        execute(&b.default_plan(), &a, &mut expected, 0.5, 1.5, false).unwrap();

        for choice in candidate_choices(&b, SelectionMethod::Patient, 24) {
            let plan = b.build(&choice).unwrap();
            let mut out = b0.clone();
            execute(&plan, &a, &mut out, 0.5, 1.5, false).unwrap();
            prop_assert_eq!(&out, &expected, "plan {}", plan);
        }
    }
}
