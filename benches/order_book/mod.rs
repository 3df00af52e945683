
use criterion::Criterion;

/// Register all order book benchmarks.
pub fn register_benchmarks(c: &mut Criterion) {
    update_level::register_benchmarks(c);
}
