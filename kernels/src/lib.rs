//! statrt Reduction Kernels
//!
//! Pure reduction functions over slices of `f64`. Every kernel walks the
//! slice strictly left to right so results are bit-reproducible against a
//! plain sequential loop.
//!
//! # Pass Structure
//!
//! - `sum`, `mean`: one pass
//! - `variance`, `stddev`: mean pass, then one deviation pass
//! - `skewness`: mean pass, then one pass accumulating m2 and m3 together
//! - `kurtosis`: mean pass, then one pass accumulating m2 and m4 together
//!
//! No online (Welford) update is used anywhere; the mean always comes from
//! its own pass.
//!
//! # Degenerate Inputs
//!
//! Kernels never fail. Inputs with no defined answer produce IEEE NaN:
//! an empty slice (except `sum`, which is `0.0`), a single element for the
//! sample statistics, and a zero second moment for `skewness`/`kurtosis`.

pub mod moments;
pub mod stats;

pub use moments::{deviation_squares, moments_2_3, moments_2_4};
pub use stats::{kurtosis, mean, skewness, stddev, sum, variance};
