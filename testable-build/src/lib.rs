//! Build-time generator for Swift test hooks.
//!
//! This crate scans Swift sources for `@Testable` types and keeps their
//! generated `testHooks` regions up to date, the same way
//! `testable generate` does.
//!
//! # Example
//!
//! In your `build.rs`:
//!
//! ```ignore
//! fn main() {
//!     testable_build::generate_hooks()
//!         .scan_path("Sources/App")
//!         .run()
//!         .expect("Failed to generate test hooks");
//! }
//! ```

mod generator;

pub use generator::{BuildSummary, HooksGenerator};

/// Create a new hooks generator with default settings.
pub fn generate_hooks() -> HooksGenerator {
    HooksGenerator::new()
}
