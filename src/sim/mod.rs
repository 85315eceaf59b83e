//! `FernSim`: the deterministic scheduler used by actor tests (spec §4.7).
//!
//! Runs only in the test harness thread; it has no I/O and never touches
//! the compiler pipeline (spec §5 "FernSim runs in the test harness
//! thread"). Three small, independently testable pieces: a seeded PRNG, a
//! virtual clock that only moves when told to, and the event queue that
//! ties them together.

pub mod clock;
pub mod rng;
pub mod scheduler;

pub use clock::VirtualClock;
pub use rng::XorShiftRng;
pub use scheduler::{Event, FernSim};
