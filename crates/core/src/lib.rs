#![forbid(unsafe_code)]

pub mod bkt;
pub mod model;
pub mod time;

pub use bkt::{BktError, BktEstimator, BktParams};
pub use time::Clock;
