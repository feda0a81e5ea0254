//! Helper functions and utilities

use crate::config::Variant;
use std::time::{Duration, Instant};

/// Measures how long a closure takes
pub fn measure_time<F, T>(f: F) -> (T, Duration)
where
    F: FnOnce() -> T
{
    let start = Instant::now();
    let result = f();
    let duration = start.elapsed();
    (result, duration)
}

pub fn millis(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1e6
}

/// The single stdout line of a benchmark binary: `Time (<variant>): <ms> ms`
pub fn timing_line(variant: Variant, duration: Duration) -> String {
    format!("Time ({}): {} ms", variant.label(), millis(duration))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_time_returns_closure_value() {
        let (value, elapsed) = measure_time(|| 6 * 7);
        assert_eq!(value, 42);
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn timing_line_format() {
        let line = timing_line(Variant::OpenCl, Duration::from_micros(1500));
        assert_eq!(line, "Time (OpenCL): 1.5 ms");
    }
}
