pub mod logging;
pub mod config;
pub mod commands;

pub mod error;
pub mod scheme;
pub mod order;
pub mod tilt_series;
pub mod validate;
pub mod order_file;
pub mod resolve;
pub mod dose_filter;
pub mod mrc;


pub use error::TiltOrderError;
pub use scheme::TiltScheme;
pub use tilt_series::{DoseAssignment, TiltOrderResult, TiltSeriesSpec};
pub use validate::LengthPolicy;
