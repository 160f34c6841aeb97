//! Score-driven step size for the coarse scan.

/// Next cursor step, in coarse pixels, after observing `score`.
///
/// Non-positive or `NaN` scores use `max_step`; otherwise the step is
/// `round((1 − score) · max_step)` clamped to `[1, max_step]`, so sampling
/// gets denser as the score approaches 1.
pub fn adaptive_step(score: f32, max_step: usize) -> usize {
    let max_step = max_step.max(1);
    if score.is_nan() || score <= 0.0 {
        return max_step;
    }
    let scaled = ((1.0 - f64::from(score)) * max_step as f64).round();
    if scaled < 1.0 {
        1
    } else {
        (scaled as usize).min(max_step)
    }
}
