//! Store core integration tests.

#[cfg(feature = "emitter")]
mod listeners;
mod properties;
