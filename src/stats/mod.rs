//! Statistics module - correlation between census indicators

mod correlation;

pub use correlation::{CorrelationCalculator, CorrelationMatrix};
