//! Linear pivot calibration.
//!
//! Estimates a tool-tip offset in the flange frame together with the
//! stationary pivot point in the base frame from flange poses recorded while
//! the tip rests in a fixed divot. See [`PivotCalibrator`].

mod pivot;

pub use pivot::*;
