pub mod clock;
pub mod rng;

pub use clock::TokioClock;
pub use rng::StdRngSource;
