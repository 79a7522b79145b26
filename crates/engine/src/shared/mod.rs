pub mod config;
pub mod errors;
pub mod js;

pub use config::FillTiming;
pub use errors::to_fill_error;
