//! Cross-module tests of the full tick loop.
//!
//! - `determinism.rs`: Same seed and inputs give identical state hashes
//! - `integration.rs`: End-to-end scenarios through [`Simulation`](crate::simulation::Simulation)
//! - `properties.rs`: Property tests over random command streams and layouts
//! - `helpers.rs`: Configuration and setup shortcuts

mod helpers;
mod integration;
