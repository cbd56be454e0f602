//! Reusable transposition handle.

use hptt_perm::{
    execute_in, tune_in, tuning_workers, CanonicalShape, ExecutionPlan, Layout, PlanBuilder,
    PlanConfig, Result, SelectionMethod, ShapeRequest, TransposeElement, TuningConfig, Workers,
};

/// Everything that defines a transposition except the data.
#[derive(Debug, Clone)]
pub struct TransposeDesc<'a, T> {
    pub request: ShapeRequest<'a>,
    pub alpha: T,
    pub beta: T,
    /// Conjugate the source elements (no effect on real types).
    pub conj: bool,
    pub num_threads: usize,
    pub config: PlanConfig,
}

impl<'a, T: TransposeElement> TransposeDesc<'a, T> {
    /// `B = permute(A)`, column-major, dense, one thread.
    pub fn new(perm: &'a [usize], size_a: &'a [usize]) -> Self {
        Self {
            request: ShapeRequest::new(perm, size_a),
            alpha: <T as num_traits::One>::one(),
            beta: <T as num_traits::Zero>::zero(),
            conj: false,
            num_threads: 1,
            config: PlanConfig::default(),
        }
    }

    pub fn alpha(mut self, alpha: T) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn beta(mut self, beta: T) -> Self {
        self.beta = beta;
        self
    }

    pub fn conj(mut self, conj: bool) -> Self {
        self.conj = conj;
        self
    }

    pub fn num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn outer_size_a(mut self, outer: &'a [usize]) -> Self {
        self.request = self.request.outer_size_a(outer);
        self
    }

    pub fn outer_size_b(mut self, outer: &'a [usize]) -> Self {
        self.request = self.request.outer_size_b(outer);
        self
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.request = self.request.layout(layout);
        self
    }

    pub fn config(mut self, config: PlanConfig) -> Self {
        self.config = config;
        self
    }
}

/// A validated transposition with its selected plan.
///
/// Build once, execute on any number of buffer pairs of the described
/// shape. The handle owns its worker pool, so repeated executions do not
/// pay for thread start-up.
#[derive(Debug)]
pub struct Transpose<T> {
    shape: CanonicalShape,
    plan: ExecutionPlan,
    method: SelectionMethod,
    alpha: T,
    beta: T,
    conj: bool,
    workers: Workers,
}

impl<T: TransposeElement> Transpose<T> {
    /// Validate `desc` and pick the default plan. No data is touched.
    pub fn new(desc: &TransposeDesc<'_, T>) -> Result<Self> {
        let shape = CanonicalShape::new(&desc.request, desc.config.elide_unit_axes)?;
        let plan = PlanBuilder::new::<T>(&shape, desc.num_threads, &desc.config)?.default_plan();
        log::debug!("plan: {plan}");
        Ok(Self::from_parts(desc, shape, plan, SelectionMethod::Estimate, None))
    }

    /// Validate `desc`, time candidate plans on `a`/`b` with the preset
    /// for `method`, and keep the fastest.
    ///
    /// On success `b` holds the transposition result, exactly as if
    /// [`Transpose::execute`] had been called once.
    pub fn autotune(
        desc: &TransposeDesc<'_, T>,
        method: SelectionMethod,
        a: &[T],
        b: &mut [T],
    ) -> Result<Self> {
        Self::autotune_with(desc, method, &TuningConfig::for_method(method), a, b)
    }

    /// [`Transpose::autotune`] with explicit search limits.
    pub fn autotune_with(
        desc: &TransposeDesc<'_, T>,
        method: SelectionMethod,
        config: &TuningConfig,
        a: &[T],
        b: &mut [T],
    ) -> Result<Self> {
        let shape = CanonicalShape::new(&desc.request, desc.config.elide_unit_axes)?;
        shape.check_buffers(a.len(), b.len())?;
        let builder = PlanBuilder::new::<T>(&shape, desc.num_threads, &desc.config)?;

        let workers = tuning_workers(&builder, method);
        let report = tune_in(
            &builder,
            a,
            b,
            desc.alpha,
            desc.beta,
            desc.conj,
            method,
            config,
            &workers,
        )?;
        if report.fallback {
            log::debug!("no candidate could be timed; keeping the default plan");
        }
        let handle = Self::from_parts(desc, shape, report.plan, method, Some(workers));
        if method == SelectionMethod::Estimate {
            handle.execute(a, b)?;
        }
        Ok(handle)
    }

    /// `b = alpha * op(permute(a)) + beta * b`.
    ///
    /// Fails before touching `b` if either buffer is shorter than its
    /// outer sizes require.
    pub fn execute(&self, a: &[T], b: &mut [T]) -> Result<()> {
        self.shape.check_buffers(a.len(), b.len())?;
        execute_in(
            &self.plan,
            a,
            b,
            self.alpha,
            self.beta,
            self.conj,
            &self.workers,
        )
    }

    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    pub fn shape(&self) -> &CanonicalShape {
        &self.shape
    }

    /// How the plan was selected.
    pub fn method(&self) -> SelectionMethod {
        self.method
    }

    pub fn num_threads(&self) -> usize {
        self.plan.num_threads()
    }

    /// Keeps `pool` when it already has one thread per work unit.
    fn from_parts(
        desc: &TransposeDesc<'_, T>,
        shape: CanonicalShape,
        plan: ExecutionPlan,
        method: SelectionMethod,
        pool: Option<Workers>,
    ) -> Self {
        let needed = plan.work_units().len().min(plan.num_threads()).max(1);
        let workers = match pool {
            Some(pool) if pool.num_threads() == needed => pool,
            _ => Workers::new(needed),
        };
        Self {
            shape,
            plan,
            method,
            alpha: desc.alpha,
            beta: desc.beta,
            conj: desc.conj,
            workers,
        }
    }
}
