mod pool;
mod router;

pub use pool::bench_pool;
pub use router::bench_router;
