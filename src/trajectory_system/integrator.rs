//! Adaptive Dormand–Prince 5(4) integration over one fixed phase window.

use tracing::debug;

use crate::constants::{MAX_STEP_FACTOR, MIN_STEP_FACTOR, STATE_DIM, STEP_SAFETY};
use crate::control::configuration::GliderConfig;
use crate::errors::IntegrationError;
use crate::trajectory_system::dynamics::EquationsOfMotion;
use crate::trajectory_system::state::GliderState;

// Dormand–Prince tableau
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// Difference between the 5th and embedded 4th order weights
const E1: f64 = -71.0 / 57600.0;
const E3: f64 = 71.0 / 16695.0;
const E4: f64 = -71.0 / 1920.0;
const E5: f64 = 17253.0 / 339200.0;
const E6: f64 = -22.0 / 525.0;
const E7: f64 = 1.0 / 40.0;

const ERROR_EXPONENT: f64 = -1.0 / 5.0;

/// Time span `[start, end]` owned by one phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseWindow {
    pub phase: usize,
    pub start: f64,
    pub end: f64,
}

impl PhaseWindow {
    pub fn new(phase: usize, length: f64) -> Self {
        PhaseWindow {
            phase,
            start: phase as f64 * length,
            end: (phase + 1) as f64 * length,
        }
    }

    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// `samples` evenly spaced times covering `[start, end)`.
    pub fn report_times(&self, samples: usize) -> Vec<f64> {
        let length = self.length();
        (0..samples)
            .map(|j| self.start + length * j as f64 / samples as f64)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepStats {
    pub accepted: usize,
    pub rejected: usize,
    pub evaluations: usize,
}

/// Sampled output of one phase.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectorySegment {
    pub window: PhaseWindow,
    pub times: Vec<f64>,
    pub states: Vec<GliderState>,
    /// Integrated state at `window.end`.
    pub terminal: GliderState,
    pub stats: StepStats,
}

impl TrajectorySegment {
    pub fn phase(&self) -> usize {
        self.window.phase
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentIntegrator {
    window: f64,
    samples: usize,
    rtol: f64,
    atol: f64,
}

impl SegmentIntegrator {
    pub fn new(window: f64, samples: usize, rtol: f64, atol: f64) -> Result<Self, IntegrationError> {
        if !(window.is_finite() && window > 0.0) {
            return Err(IntegrationError::InvalidWindow(format!(
                "length must be positive, got {}",
                window
            )));
        }
        if samples < 2 {
            return Err(IntegrationError::InvalidWindow(format!(
                "at least 2 samples required, got {}",
                samples
            )));
        }
        if !(rtol > 0.0 && atol > 0.0) {
            return Err(IntegrationError::InvalidWindow(
                "tolerances must be positive".to_string(),
            ));
        }
        Ok(SegmentIntegrator {
            window,
            samples,
            rtol,
            atol,
        })
    }

    pub fn from_config(config: &GliderConfig) -> Result<Self, IntegrationError> {
        let settings = &config.integration;
        Self::new(settings.window, settings.samples, settings.rtol, settings.atol)
    }

    pub fn phase_window(&self, phase: usize) -> PhaseWindow {
        PhaseWindow::new(phase, self.window)
    }

    pub fn integrate<E>(
        &self,
        initial: &GliderState,
        phase: usize,
        eom: &E,
    ) -> Result<TrajectorySegment, IntegrationError>
    where
        E: EquationsOfMotion + ?Sized,
    {
        let window = self.phase_window(phase);
        let report_times = window.report_times(self.samples);
        let mut stats = StepStats::default();

        let mut t = window.start;
        let mut y = *initial;
        if !y.is_finite() {
            return Err(IntegrationError::NonFiniteState { time: t });
        }
        let mut f = evaluate(eom, t, &y, &mut stats)?;
        let mut h = self.initial_step(eom, t, &y, &f, window.length(), &mut stats)?;

        let mut times = Vec::with_capacity(self.samples);
        let mut states = Vec::with_capacity(self.samples);
        times.push(t);
        states.push(y);

        let targets = report_times[1..].iter().copied().chain(std::iter::once(window.end));
        for target in targets {
            while t < target {
                let remaining = target - t;
                let min_step = 10.0 * f64::EPSILON * t.abs().max(1.0);
                if remaining <= min_step {
                    t = target;
                    break;
                }
                if h < min_step {
                    return Err(IntegrationError::StepSizeTooSmall { time: t, step: h });
                }

                let clamped = h >= remaining;
                let h_try = if clamped { remaining } else { h };
                let (y_new, f_new, error_norm) = self.step(eom, t, &y, &f, h_try, &mut stats)?;

                if error_norm <= 1.0 {
                    let factor = if error_norm == 0.0 {
                        MAX_STEP_FACTOR
                    } else {
                        (STEP_SAFETY * error_norm.powf(ERROR_EXPONENT)).min(MAX_STEP_FACTOR)
                    };
                    t = if clamped { target } else { t + h_try };
                    y = y_new;
                    f = f_new;
                    h = if clamped {
                        h.max(h_try * factor)
                    } else {
                        h_try * factor
                    };
                    stats.accepted += 1;

                    if !y.is_finite() {
                        return Err(IntegrationError::NonFiniteState { time: t });
                    }
                } else {
                    let factor =
                        (STEP_SAFETY * error_norm.powf(ERROR_EXPONENT)).max(MIN_STEP_FACTOR);
                    h = h_try * factor;
                    stats.rejected += 1;
                }
            }

            if target < window.end {
                times.push(target);
                states.push(y);
            }
        }

        debug!(
            phase,
            accepted = stats.accepted,
            rejected = stats.rejected,
            evaluations = stats.evaluations,
            "Segment integrated"
        );

        Ok(TrajectorySegment {
            window,
            times,
            states,
            terminal: y,
            stats,
        })
    }

    fn step<E>(
        &self,
        eom: &E,
        t: f64,
        y: &GliderState,
        k1: &GliderState,
        h: f64,
        stats: &mut StepStats,
    ) -> Result<(GliderState, GliderState, f64), IntegrationError>
    where
        E: EquationsOfMotion + ?Sized,
    {
        let k2 = evaluate(eom, t + C2 * h, &combine(y, h, &[(A21, k1)]), stats)?;
        let k3 = evaluate(eom, t + C3 * h, &combine(y, h, &[(A31, k1), (A32, &k2)]), stats)?;
        let k4 = evaluate(
            eom,
            t + C4 * h,
            &combine(y, h, &[(A41, k1), (A42, &k2), (A43, &k3)]),
            stats,
        )?;
        let k5 = evaluate(
            eom,
            t + C5 * h,
            &combine(y, h, &[(A51, k1), (A52, &k2), (A53, &k3), (A54, &k4)]),
            stats,
        )?;
        let k6 = evaluate(
            eom,
            t + h,
            &combine(y, h, &[(A61, k1), (A62, &k2), (A63, &k3), (A64, &k4), (A65, &k5)]),
            stats,
        )?;

        let y_new = combine(y, h, &[(B1, k1), (B3, &k3), (B4, &k4), (B5, &k5), (B6, &k6)]);
        let k7 = evaluate(eom, t + h, &y_new, stats)?;

        let error = combine(
            &GliderState::zeros(),
            h,
            &[(E1, k1), (E3, &k3), (E4, &k4), (E5, &k5), (E6, &k6), (E7, &k7)],
        );

        let mut sum = 0.0;
        for i in 0..STATE_DIM {
            let scale = self.atol + y.as_slice()[i].abs().max(y_new.as_slice()[i].abs()) * self.rtol;
            sum += (error.as_slice()[i] / scale).powi(2);
        }
        let error_norm = (sum / STATE_DIM as f64).sqrt();

        Ok((y_new, k7, error_norm))
    }

    fn initial_step<E>(
        &self,
        eom: &E,
        t0: f64,
        y0: &GliderState,
        f0: &GliderState,
        interval: f64,
        stats: &mut StepStats,
    ) -> Result<f64, IntegrationError>
    where
        E: EquationsOfMotion + ?Sized,
    {
        let scale: Vec<f64> = y0
            .as_slice()
            .iter()
            .map(|v| self.atol + v.abs() * self.rtol)
            .collect();
        let d0 = rms_scaled(y0.as_slice(), &scale);
        let d1 = rms_scaled(f0.as_slice(), &scale);

        let h0 = if d0 < 1e-5 || d1 < 1e-5 {
            1e-6_f64.min(interval)
        } else {
            (0.01 * d0 / d1).min(interval)
        };

        let y1 = y0.axpy(h0, f0);
        let f1 = evaluate(eom, t0 + h0, &y1, stats)?;
        let df: Vec<f64> = f1
            .as_slice()
            .iter()
            .zip(f0.as_slice())
            .map(|(a, b)| a - b)
            .collect();
        let d2 = rms_scaled(&df, &scale) / h0;

        let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
            (h0 * 1e-3).max(1e-6)
        } else {
            (0.01 / d1.max(d2)).powf(1.0 / 5.0)
        };

        Ok((100.0 * h0).min(h1).min(interval))
    }
}

fn evaluate<E>(
    eom: &E,
    time: f64,
    state: &GliderState,
    stats: &mut StepStats,
) -> Result<GliderState, IntegrationError>
where
    E: EquationsOfMotion + ?Sized,
{
    stats.evaluations += 1;
    let derivative = eom.derivative(time, state);
    match derivative.first_non_finite() {
        Some(slot) => Err(IntegrationError::NonFiniteDerivative { time, slot }),
        None => Ok(derivative),
    }
}

fn combine(base: &GliderState, h: f64, terms: &[(f64, &GliderState)]) -> GliderState {
    terms
        .iter()
        .fold(*base, |acc, (coefficient, k)| acc.axpy(h * coefficient, k))
}

fn rms_scaled(values: &[f64], scale: &[f64]) -> f64 {
    let sum: f64 = values
        .iter()
        .zip(scale)
        .map(|(v, s)| (v / s).powi(2))
        .sum();
    (sum / values.len() as f64).sqrt()
}
