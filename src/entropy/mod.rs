//! The entropy subsystem: the mixing pool (§4.D) and its source plugins (§4.C).

pub mod pool;
pub mod sources;

pub use pool::Pool;
pub use sources::{EntropySource, FillOutcome, InputEvent, UserEventCollector};
