//! Phase timing for compile jobs.
//!
//! A [`JobTracer`] is shared by any number of jobs and keeps the most recent
//! durations of each step. Parse times are kept per source byte and compile
//! times per AST node, so estimates scale with the next unit's size.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;

/// Samples kept per phase.
const SAMPLE_CAPACITY: usize = 10;

/// Ring buffer of the latest samples, in seconds (or seconds per unit).
#[derive(Default, Debug)]
struct Samples {
    values: VecDeque<f64>,
}

impl Samples {
    fn push(&mut self, value: f64) {
        if self.values.len() == SAMPLE_CAPACITY {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    fn average(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / units(self.values.len())
    }
}

#[derive(Default, Debug)]
struct TracerState {
    prepare_to_parse: Samples,
    parse_per_byte: Samples,
    finalize_parsing: Samples,
    prepare_to_compile: Samples,
    compile_per_node: Samples,
    finalize_compiling: Samples,
}

/// Shared recorder of compile step durations.
#[derive(Default, Debug)]
pub struct JobTracer {
    state: Mutex<TracerState>,
}

#[expect(
    clippy::cast_precision_loss,
    reason = "sizes beyond 2^53 do not need exact averages"
)]
fn units(count: usize) -> f64 {
    count.max(1) as f64
}

fn duration(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO)
}

impl JobTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_prepare_to_parse(&self, elapsed: Duration) {
        self.state.lock().prepare_to_parse.push(elapsed.as_secs_f64());
    }

    pub fn record_parse(&self, elapsed: Duration, source_bytes: usize) {
        self.state
            .lock()
            .parse_per_byte
            .push(elapsed.as_secs_f64() / units(source_bytes));
    }

    pub fn record_finalize_parsing(&self, elapsed: Duration) {
        self.state.lock().finalize_parsing.push(elapsed.as_secs_f64());
    }

    pub fn record_prepare_to_compile(&self, elapsed: Duration) {
        self.state.lock().prepare_to_compile.push(elapsed.as_secs_f64());
    }

    pub fn record_compile(&self, elapsed: Duration, ast_nodes: usize) {
        self.state
            .lock()
            .compile_per_node
            .push(elapsed.as_secs_f64() / units(ast_nodes));
    }

    pub fn record_finalize_compiling(&self, elapsed: Duration) {
        self.state.lock().finalize_compiling.push(elapsed.as_secs_f64());
    }

    pub fn estimate_prepare_to_parse(&self) -> Duration {
        duration(self.state.lock().prepare_to_parse.average())
    }

    pub fn estimate_parse(&self, source_bytes: usize) -> Duration {
        duration(self.state.lock().parse_per_byte.average() * units(source_bytes))
    }

    pub fn estimate_finalize_parsing(&self) -> Duration {
        duration(self.state.lock().finalize_parsing.average())
    }

    pub fn estimate_prepare_to_compile(&self) -> Duration {
        duration(self.state.lock().prepare_to_compile.average())
    }

    pub fn estimate_compile(&self, ast_nodes: usize) -> Duration {
        duration(self.state.lock().compile_per_node.average() * units(ast_nodes))
    }

    pub fn estimate_finalize_compiling(&self) -> Duration {
        duration(self.state.lock().finalize_compiling.average())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: Duration, expected: Duration) -> bool {
        (actual.as_secs_f64() - expected.as_secs_f64()).abs() < 1e-9
    }

    #[test]
    fn test_empty_tracer_estimates_zero() {
        let tracer = JobTracer::new();
        assert_eq!(tracer.estimate_prepare_to_parse(), Duration::ZERO);
        assert_eq!(tracer.estimate_parse(1000), Duration::ZERO);
        assert_eq!(tracer.estimate_compile(1000), Duration::ZERO);
    }

    #[test]
    fn test_parse_estimate_scales_with_size() {
        let tracer = JobTracer::new();
        tracer.record_parse(Duration::from_millis(10), 100);
        assert!(close(tracer.estimate_parse(200), Duration::from_millis(20)));
    }

    #[test]
    fn test_compile_estimate_scales_with_nodes() {
        let tracer = JobTracer::new();
        tracer.record_compile(Duration::from_millis(4), 40);
        tracer.record_compile(Duration::from_millis(12), 40);
        assert!(close(tracer.estimate_compile(10), Duration::from_millis(2)));
    }

    #[test]
    fn test_old_samples_are_dropped() {
        let tracer = JobTracer::new();
        tracer.record_finalize_parsing(Duration::from_millis(100));
        for _ in 0..SAMPLE_CAPACITY {
            tracer.record_finalize_parsing(Duration::from_millis(3));
        }
        assert!(close(
            tracer.estimate_finalize_parsing(),
            Duration::from_millis(3)
        ));
    }
}
