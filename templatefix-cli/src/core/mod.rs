mod error;
mod output;
mod types;

pub use error::MigrateError;
pub use output::{OutputFormat, OutputWriter};
pub use types::*;
