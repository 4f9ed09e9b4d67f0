//! Sequential quadratic programming in the manner of SLSQP.
//!
//! Each iteration linearises the equality constraints, solves the equality-constrained
//! quadratic subproblem through its KKT system (fixing variables that would leave their
//! bounds), and takes a step along the result with an L1 exact-penalty line search. The
//! Lagrangian Hessian is approximated with Powell-damped BFGS updates.

use log::trace;
use nalgebra::{DMatrix, DVector, SMatrix, SVector};

use crate::problem::max_abs;
use crate::{Minimizer, Problem, Solution, SolverError, Status};

/// Relative forward-difference step (√ machine epsilon).
const FD_STEP: f64 = 1.49e-8;
/// Contractions tried before the line search accepts its last trial point.
const MAX_LINE_SEARCH: usize = 10;
/// Sufficient-decrease factor of the merit line search.
const ARMIJO: f64 = 0.1;

/// SLSQP-style minimizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sqp {
    pub max_iterations: usize,
    /// Absolute tolerance on both the objective change and the constraint violation.
    pub tolerance: f64,
}

impl Default for Sqp {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

impl Sqp {
    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations,
            tolerance,
        }
    }
}

/// Search direction and multiplier estimates from one QP subproblem.
struct QpStep<const N: usize> {
    direction: SVector<f64, N>,
    multipliers: Vec<f64>,
}

impl Minimizer for Sqp {
    fn minimize<const N: usize>(
        &self,
        problem: &Problem<'_, N>,
        x0: SVector<f64, N>,
    ) -> Result<Solution<N>, SolverError> {
        if x0.iter().any(|v| !v.is_finite()) {
            return Err(SolverError::InvalidStart);
        }

        let mut x = problem.clamp(&x0);
        let mut hessian = SMatrix::<f64, N, N>::identity();
        let mut penalty = 0.0_f64;

        let mut fx = problem.objective_checked(&x, 0)?;
        let mut cx = problem.constraints_checked(&x, 0)?;
        let mut grad = gradient(problem, problem.objective, &x, fx, "objective gradient", 0)?;
        let mut jac = jacobian(problem, &x, &cx, 0)?;

        for iteration in 1..=self.max_iterations {
            let step = solve_subproblem(problem, &hessian, &grad, &jac, &cx, &x, iteration)?;
            let d = step.direction;

            let largest_multiplier = max_abs(&step.multipliers);
            penalty = largest_multiplier.max(0.5 * (penalty + largest_multiplier));

            let violation: f64 = cx.iter().map(|c| c.abs()).sum();
            let merit0 = fx + penalty * violation;
            let slope = grad.dot(&d) - penalty * violation;

            let mut alpha = 1.0;
            let mut trial = x;
            let mut f_trial = fx;
            let mut c_trial = cx.clone();
            for _ in 0..MAX_LINE_SEARCH {
                trial = problem.clamp(&(x + d * alpha));
                f_trial = (problem.objective)(&trial);
                c_trial = problem.constraint_values(&trial);
                let merit = f_trial + penalty * c_trial.iter().map(|c| c.abs()).sum::<f64>();
                if merit <= merit0 + ARMIJO * alpha * slope {
                    break;
                }
                // Minimiser of the quadratic through merit0, slope and merit, kept above a tenth.
                let denom = 2.0 * (merit - merit0 - alpha * slope);
                let next = if denom > 0.0 {
                    -slope * alpha * alpha / denom
                } else {
                    0.1 * alpha
                };
                alpha = next.max(0.1 * alpha);
            }

            if !f_trial.is_finite() {
                return Err(SolverError::NonFinite {
                    quantity: "objective",
                    iteration,
                });
            }
            if c_trial.iter().any(|c| !c.is_finite()) {
                return Err(SolverError::NonFinite {
                    quantity: "equality constraint",
                    iteration,
                });
            }

            trace!(
                "sqp iteration {iteration}: f={f_trial:.9e} violation={:.3e} alpha={alpha:.3e}",
                max_abs(&c_trial)
            );

            if (f_trial - fx).abs() < self.tolerance && max_abs(&c_trial) < self.tolerance {
                return Ok(solution(trial, f_trial, c_trial, iteration, Status::Converged));
            }

            let grad_trial = gradient(
                problem,
                problem.objective,
                &trial,
                f_trial,
                "objective gradient",
                iteration,
            )?;
            let jac_trial = jacobian(problem, &trial, &c_trial, iteration)?;

            let s = trial - x;
            let y = lagrangian_gradient(&grad_trial, &jac_trial, &step.multipliers)
                - lagrangian_gradient(&grad, &jac, &step.multipliers);
            damped_bfgs_update(&mut hessian, &s, &y);

            x = trial;
            fx = f_trial;
            cx = c_trial;
            grad = grad_trial;
            jac = jac_trial;
        }

        Ok(solution(x, fx, cx, self.max_iterations, Status::IterationLimit))
    }
}

fn solution<const N: usize>(
    x: SVector<f64, N>,
    objective: f64,
    constraints: Vec<f64>,
    iterations: usize,
    status: Status,
) -> Solution<N> {
    Solution {
        x,
        objective,
        constraints,
        iterations,
        status,
    }
}

/// Forward-difference gradient, stepping backwards where a forward step would cross the
/// upper bound.
fn gradient<const N: usize>(
    problem: &Problem<'_, N>,
    f: &crate::Function<'_, N>,
    x: &SVector<f64, N>,
    fx: f64,
    quantity: &'static str,
    iteration: usize,
) -> Result<SVector<f64, N>, SolverError> {
    let mut grad = SVector::<f64, N>::zeros();
    for i in 0..N {
        let mut h = FD_STEP * x[i].abs().max(1.0);
        if x[i] + h > problem.bounds[i].upper {
            h = -h;
        }
        let mut xh = *x;
        xh[i] += h;
        let value = (f(&xh) - fx) / h;
        if !value.is_finite() {
            return Err(SolverError::NonFinite {
                quantity,
                iteration,
            });
        }
        grad[i] = value;
    }
    Ok(grad)
}

fn jacobian<const N: usize>(
    problem: &Problem<'_, N>,
    x: &SVector<f64, N>,
    cx: &[f64],
    iteration: usize,
) -> Result<Vec<SVector<f64, N>>, SolverError> {
    problem
        .equalities
        .iter()
        .zip(cx)
        .map(|(c, &value)| gradient(problem, *c, x, value, "constraint gradient", iteration))
        .collect()
}

fn lagrangian_gradient<const N: usize>(
    grad: &SVector<f64, N>,
    jac: &[SVector<f64, N>],
    multipliers: &[f64],
) -> SVector<f64, N> {
    jac.iter()
        .zip(multipliers)
        .fold(*grad, |acc, (a, lambda)| acc - a * *lambda)
}

/// BFGS update with Powell damping so the approximation stays positive definite.
fn damped_bfgs_update<const N: usize>(
    hessian: &mut SMatrix<f64, N, N>,
    s: &SVector<f64, N>,
    y: &SVector<f64, N>,
) {
    let bs = *hessian * s;
    let sbs = s.dot(&bs);
    if sbs <= 1e-16 {
        return;
    }
    let mut y = *y;
    let mut sy = s.dot(&y);
    if sy < 0.2 * sbs {
        let theta = 0.8 * sbs / (sbs - sy);
        y = y * theta + bs * (1.0 - theta);
        sy = s.dot(&y);
    }
    *hessian += y * y.transpose() / sy - bs * bs.transpose() / sbs;
}

/// Solve `min g·d + ½ dᵀHd` s.t. `c + J d = 0`, `lower ≤ x + d ≤ upper`.
///
/// Variables whose unconstrained step leaves the box are pinned to the violated bound one
/// at a time and the reduced KKT system is solved again.
fn solve_subproblem<const N: usize>(
    problem: &Problem<'_, N>,
    hessian: &SMatrix<f64, N, N>,
    grad: &SVector<f64, N>,
    jac: &[SVector<f64, N>],
    cx: &[f64],
    x: &SVector<f64, N>,
    iteration: usize,
) -> Result<QpStep<N>, SolverError> {
    let m = jac.len();
    let mut d = SVector::<f64, N>::zeros();
    let mut fixed = [false; N];

    loop {
        let free: Vec<usize> = (0..N).filter(|&i| !fixed[i]).collect();
        let nf = free.len();

        // Too few free variables left to meet the linearised constraints: step to the
        // bounds and let the merit line search judge the result.
        if nf == 0 || nf < m {
            return Ok(QpStep {
                direction: d,
                multipliers: vec![0.0; m],
            });
        }

        let size = nf + m;
        let mut kkt = DMatrix::<f64>::zeros(size, size);
        let mut rhs = DVector::<f64>::zeros(size);

        for (r, &i) in free.iter().enumerate() {
            for (s, &j) in free.iter().enumerate() {
                kkt[(r, s)] = hessian[(i, j)];
            }
            for (q, a) in jac.iter().enumerate() {
                kkt[(r, nf + q)] = -a[i];
                kkt[(nf + q, r)] = a[i];
            }
            let pinned: f64 = (0..N).filter(|&j| fixed[j]).map(|j| hessian[(i, j)] * d[j]).sum();
            rhs[r] = -(grad[i] + pinned);
        }
        for (q, a) in jac.iter().enumerate() {
            let pinned: f64 = (0..N).filter(|&j| fixed[j]).map(|j| a[j] * d[j]).sum();
            rhs[nf + q] = -(cx[q] + pinned);
        }

        let sol = kkt
            .lu()
            .solve(&rhs)
            .filter(|sol| sol.iter().all(|v| v.is_finite()))
            .ok_or(SolverError::SingularSubproblem(iteration))?;

        for (r, &i) in free.iter().enumerate() {
            d[i] = sol[r];
        }

        let violated = free.iter().find_map(|&i| {
            let bound = &problem.bounds[i];
            let target = x[i] + d[i];
            if target < bound.lower {
                Some((i, bound.lower - x[i]))
            } else if target > bound.upper {
                Some((i, bound.upper - x[i]))
            } else {
                None
            }
        });

        match violated {
            Some((i, step)) => {
                d[i] = step;
                fixed[i] = true;
            }
            None => {
                return Ok(QpStep {
                    direction: d,
                    multipliers: sol.iter().skip(nf).copied().collect(),
                });
            }
        }
    }
}
