mod lissajous;
mod scope;
mod spectrum;

pub use lissajous::bench_lissajous;
pub use scope::bench_scope;
pub use spectrum::bench_spectrum;
