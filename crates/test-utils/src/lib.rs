//! Shared test utilities for the dimension workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Feature, product and layer fixtures
//! - Temporary configuration files
//! - Approximate float assertions
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{assert_approx_eq, fixtures};
//! ```

pub mod files;
pub mod fixtures;

// Re-export commonly used items at the crate root
pub use files::*;
pub use fixtures::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Macro for approximate equality of an envelope against `(min_x, min_y, max_x, max_y)`.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_bbox_approx_eq;
///
/// assert_bbox_approx_eq!(result.bounds, (0.0, 0.0, 10.0, 5.0), 1e-9);
/// ```
#[macro_export]
macro_rules! assert_bbox_approx_eq {
    ($bbox:expr, ($min_x:expr, $min_y:expr, $max_x:expr, $max_y:expr), $epsilon:expr) => {{
        let bbox = &$bbox;
        $crate::assert_approx_eq!(bbox.min_x, $min_x, $epsilon);
        $crate::assert_approx_eq!(bbox.min_y, $min_y, $epsilon);
        $crate::assert_approx_eq!(bbox.max_x, $max_x, $epsilon);
        $crate::assert_approx_eq!(bbox.max_y, $max_y, $epsilon);
    }};
}
