use criterion::{criterion_group, criterion_main};

mod order_book;

use features::register_benchmarks as register_feature_benchmarks;
use order_book::register_benchmarks as register_order_book_benchmarks;
use pipeline::register_benchmarks as register_pipeline_benchmarks;

// Define the benchmark groups
criterion_group!(
    benches,
    register_order_book_benchmarks,
    register_feature_benchmarks,
    register_pipeline_benchmarks,
);

criterion_main!(benches);
