//! Bounded minimisation for the smoothing-parameter fit.
//!
//! Two stages:
//! 1. a coarse grid over the unit box, keeping the lowest objective
//! 2. a Nelder-Mead refinement started from the best grid point, with every
//!    trial point clamped back into the box

/// Result of a minimisation.
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub value: f64,
}

/// Options for [`minimize_unit_box`].
#[derive(Debug, Clone)]
pub struct MinimizeOptions {
    /// Grid points per axis for the coarse search.
    pub grid_steps: usize,
    pub max_iters: usize,
    /// Stop when the simplex objective spread falls below this.
    pub tolerance: f64,
}

impl Default for MinimizeOptions {
    fn default() -> Self {
        Self {
            grid_steps: 11,
            max_iters: 500,
            tolerance: 1e-10,
        }
    }
}

fn clamp_unit(x: &mut [f64]) {
    for v in x.iter_mut() {
        *v = v.clamp(0.0, 1.0);
    }
}

/// Evaluate, mapping non-finite objectives to +inf so they never win.
fn eval<F: Fn(&[f64]) -> f64>(f: &F, x: &[f64]) -> f64 {
    let v = f(x);
    if v.is_finite() {
        v
    } else {
        f64::INFINITY
    }
}

/// Best point of a regular grid over `[0, 1]^dim`.
pub fn grid_search<F: Fn(&[f64]) -> f64>(f: &F, dim: usize, steps: usize) -> Minimum {
    let steps = steps.max(2);
    let total = steps.pow(dim as u32);
    let mut best = Minimum {
        x: vec![0.5; dim],
        value: f64::INFINITY,
    };
    let mut x = vec![0.0; dim];

    for idx in 0..total {
        let mut rest = idx;
        for v in x.iter_mut() {
            *v = (rest % steps) as f64 / (steps - 1) as f64;
            rest /= steps;
        }
        let value = eval(f, &x);
        if value < best.value {
            best = Minimum {
                x: x.clone(),
                value,
            };
        }
    }
    best
}

/// Minimise `f` over the unit box `[0, 1]^dim`.
pub fn minimize_unit_box<F: Fn(&[f64]) -> f64>(f: F, dim: usize, opts: &MinimizeOptions) -> Minimum {
    if dim == 0 {
        return Minimum {
            x: Vec::new(),
            value: eval(&f, &[]),
        };
    }

    let start = grid_search(&f, dim, opts.grid_steps);
    let refined = nelder_mead(&f, &start.x, opts);
    if refined.value <= start.value {
        refined
    } else {
        start
    }
}

/// `from + coef * (towards - from)`, clamped into the box.
fn point(from: &[f64], towards: &[f64], coef: f64) -> Vec<f64> {
    let mut x: Vec<f64> = from
        .iter()
        .zip(towards)
        .map(|(c, w)| c + coef * (w - c))
        .collect();
    clamp_unit(&mut x);
    x
}

fn nelder_mead<F: Fn(&[f64]) -> f64>(f: &F, x0: &[f64], opts: &MinimizeOptions) -> Minimum {
    const ALPHA: f64 = 1.0;
    const GAMMA: f64 = 2.0;
    const RHO: f64 = 0.5;
    const SIGMA: f64 = 0.5;
    const STEP: f64 = 0.05;

    let dim = x0.len();

    // Initial simplex: x0 plus one step along each axis, pointing inward.
    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(dim + 1);
    simplex.push((x0.to_vec(), eval(f, x0)));
    for i in 0..dim {
        let mut x = x0.to_vec();
        x[i] = if x[i] + STEP <= 1.0 { x[i] + STEP } else { x[i] - STEP };
        let v = eval(f, &x);
        simplex.push((x, v));
    }

    for _ in 0..opts.max_iters {
        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
        let best = simplex[0].1;
        let worst = simplex[dim].1;
        if (worst - best).abs() <= opts.tolerance * (1.0 + best.abs()) {
            break;
        }

        let mut centroid = vec![0.0; dim];
        for (x, _) in &simplex[..dim] {
            for (c, v) in centroid.iter_mut().zip(x) {
                *c += v / dim as f64;
            }
        }

        let worst_x = simplex[dim].0.clone();
        let reflected = point(&centroid, &worst_x, -ALPHA);
        let f_reflected = eval(f, &reflected);

        if f_reflected < simplex[0].1 {
            let expanded = point(&centroid, &worst_x, -GAMMA);
            let f_expanded = eval(f, &expanded);
            simplex[dim] = if f_expanded < f_reflected {
                (expanded, f_expanded)
            } else {
                (reflected, f_reflected)
            };
        } else if f_reflected < simplex[dim - 1].1 {
            simplex[dim] = (reflected, f_reflected);
        } else {
            let contracted = point(&centroid, &worst_x, RHO);
            let f_contracted = eval(f, &contracted);
            if f_contracted < worst {
                simplex[dim] = (contracted, f_contracted);
            } else {
                let best_x = simplex[0].0.clone();
                for (x, v) in simplex.iter_mut().skip(1) {
                    *x = point(&best_x, &x[..], SIGMA);
                    *v = eval(f, x);
                }
            }
        }
    }

    simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
    let (x, value) = simplex.swap_remove(0);
    Minimum { x, value }
}
