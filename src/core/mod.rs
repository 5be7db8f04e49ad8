// src/core/mod.rs

// The `mod.rs` file acts as the root of the `core` module, exposing its
// sub-modules to the crate.

/// Contains all data structures and models used throughout the application,
/// such as `FingerprintResult`, `Confidence` and the per-category info
/// structs.
pub mod models;

/// The signature registries: per-category detection rule tables and the
/// server banner patterns, compiled once at startup.
pub mod signatures;

/// Weighted evidence scoring over one captured response, winner selection
/// and version extraction.
pub mod scorer;

/// The HTTP collaborator: retries, rate limiting, redirect control and
/// request statistics.
pub mod http;

/// Reachability probing of well-known paths.
pub mod prober;

/// The probe controller running the eight detection phases.
pub mod engine;

/// Derivation of the flattened technology list, stack summary and overall
/// confidence.
pub mod synthesis;
