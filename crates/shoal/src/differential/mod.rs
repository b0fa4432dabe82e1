//! Fixed-step and adaptive Runge-Kutta solvers over vector states.

use serde::{Deserialize, Serialize};

/// The state of a system of first-order equations.
pub type State = Vec<f64>;

/// One point of a solution trajectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveOutput {
    /// The time of this sample.
    pub time: f64,
    /// The state at this time.
    pub state: State,
}

/// Scales a state by a factor.
fn scaled(state: &State, factor: f64) -> State {
    state.iter().map(|x| x * factor).collect()
}

/// Adds weighted states onto a base state.
fn combined(base: &State, terms: &[(f64, &State)]) -> State {
    let mut out = base.clone();
    for (weight, term) in terms {
        for (slot, x) in out.iter_mut().zip(term.iter()) {
            *slot += weight * x;
        }
    }
    out
}

/// Integrates `derivative` from `time_start` to `time_end` with the
/// classical fourth-order Runge-Kutta scheme over a fixed number of steps.
///
/// With `collect` set, every step's state is kept; otherwise only the
/// final state is returned (as a single-element trajectory).
#[allow(clippy::cast_precision_loss)]
pub fn runge_kutta_4<F>(
    derivative: &F,
    initial: State,
    time_start: f64,
    time_end: f64,
    steps: usize,
    collect: bool,
) -> Vec<SolveOutput>
where
    F: Fn(f64, &State) -> State,
{
    let step = (time_end - time_start) / steps.max(1) as f64;
    let mut outputs = Vec::with_capacity(if collect { steps } else { 1 });

    let mut time = time_start;
    let mut state = initial;
    for _ in 0..steps {
        let k1 = scaled(&derivative(time, &state), step);
        let k2 = scaled(&derivative(time + step / 2.0, &combined(&state, &[(0.5, &k1)])), step);
        let k3 = scaled(&derivative(time + step / 2.0, &combined(&state, &[(0.5, &k2)])), step);
        let k4 = scaled(&derivative(time + step, &combined(&state, &[(1.0, &k3)])), step);

        state = combined(
            &state,
            &[
                (1.0 / 6.0, &k1),
                (2.0 / 6.0, &k2),
                (2.0 / 6.0, &k3),
                (1.0 / 6.0, &k4),
            ],
        );
        time += step;
        if collect {
            outputs.push(SolveOutput {
                time,
                state: state.clone(),
            });
        }
    }

    if !collect {
        outputs.push(SolveOutput { time, state });
    }
    outputs
}

/// Integrates `derivative` from `time_start` to `time_end` with the
/// Runge-Kutta-Fehlberg 4(5) scheme, adapting the step so the local error
/// estimate stays within `tolerance`. Returns every accepted step.
pub fn runge_kutta_fehlberg_45<F>(
    derivative: &F,
    initial: State,
    time_start: f64,
    time_end: f64,
    tolerance: f64,
) -> Vec<SolveOutput>
where
    F: Fn(f64, &State) -> State,
{
    let mut outputs = Vec::new();
    let mut time = time_start;
    let mut state = initial;
    let mut step = (time_end - time_start) / 10.0;
    let minimum_step = (time_end - time_start) * 1e-10;

    while time < time_end {
        step = step.min(time_end - time);

        let k1 = scaled(&derivative(time, &state), step);
        let k2 = scaled(
            &derivative(time + step / 4.0, &combined(&state, &[(1.0 / 4.0, &k1)])),
            step,
        );
        let k3 = scaled(
            &derivative(
                time + 3.0 * step / 8.0,
                &combined(&state, &[(3.0 / 32.0, &k1), (9.0 / 32.0, &k2)]),
            ),
            step,
        );
        let k4 = scaled(
            &derivative(
                time + 12.0 * step / 13.0,
                &combined(
                    &state,
                    &[
                        (1932.0 / 2197.0, &k1),
                        (-7200.0 / 2197.0, &k2),
                        (7296.0 / 2197.0, &k3),
                    ],
                ),
            ),
            step,
        );
        let k5 = scaled(
            &derivative(
                time + step,
                &combined(
                    &state,
                    &[
                        (439.0 / 216.0, &k1),
                        (-8.0, &k2),
                        (3680.0 / 513.0, &k3),
                        (-845.0 / 4104.0, &k4),
                    ],
                ),
            ),
            step,
        );
        let k6 = scaled(
            &derivative(
                time + step / 2.0,
                &combined(
                    &state,
                    &[
                        (-8.0 / 27.0, &k1),
                        (2.0, &k2),
                        (-3544.0 / 2565.0, &k3),
                        (1859.0 / 4104.0, &k4),
                        (-11.0 / 40.0, &k5),
                    ],
                ),
            ),
            step,
        );

        // Fourth-order solution and the fifth-order error estimate.
        let fourth = combined(
            &state,
            &[
                (25.0 / 216.0, &k1),
                (1408.0 / 2565.0, &k3),
                (2197.0 / 4104.0, &k4),
                (-1.0 / 5.0, &k5),
            ],
        );
        let fifth = combined(
            &state,
            &[
                (16.0 / 135.0, &k1),
                (6656.0 / 12825.0, &k3),
                (28561.0 / 56430.0, &k4),
                (-9.0 / 50.0, &k5),
                (2.0 / 55.0, &k6),
            ],
        );
        let error = fourth
            .iter()
            .zip(fifth.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0_f64, f64::max);

        if error <= tolerance || step <= minimum_step {
            time += step;
            state = fourth;
            outputs.push(SolveOutput {
                time,
                state: state.clone(),
            });
        }

        // Standard step-size controller, clamped into [0.1, 4] times the
        // current step.
        let factor = if error > 0.0 {
            (0.84 * (tolerance * step / error).powf(0.25)).clamp(0.1, 4.0)
        } else {
            4.0
        };
        step = (step * factor).max(minimum_step);
    }
    outputs
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    #[test]
    fn rk4_matches_exponential_growth() {
        // y' = y, y(0) = 1, so y(1) = e.
        let outputs = super::runge_kutta_4(&|_, state| state.clone(), vec![1.0], 0.0, 1.0, 100, false);
        let y = outputs[outputs.len() - 1].state[0];
        assert!(approx_eq!(f64, y, core::f64::consts::E, epsilon = 1e-6), "y(1) = {y}");
    }

    #[test]
    fn rk4_collects_every_step() {
        let outputs = super::runge_kutta_4(&|_, state| state.clone(), vec![1.0], 0.0, 1.0, 10, true);
        assert_eq!(outputs.len(), 10);
        assert!(approx_eq!(f64, outputs[9].time, 1.0, epsilon = 1e-12));
    }

    #[test]
    fn rkf45_meets_the_tolerance() {
        // y' = -2ty, y(0) = 1, so y(1) = exp(-1).
        let derivative = |t: f64, state: &Vec<f64>| vec![-2.0 * t * state[0]];
        let outputs = super::runge_kutta_fehlberg_45(&derivative, vec![1.0], 0.0, 1.0, 1e-8);
        let last = &outputs[outputs.len() - 1];
        assert!(approx_eq!(f64, last.time, 1.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, last.state[0], (-1.0_f64).exp(), epsilon = 1e-5));
    }
}
