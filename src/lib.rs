#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
// Style preference: format!("{}", x) over format!("{x}")
#![allow(clippy::uninlined_format_args)]
// Token counts and timeouts cross integer widths at the provider boundary
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]

pub mod bus;
pub mod channels;
pub mod cli;
pub mod config;
pub mod errors;
pub mod providers;
pub mod relay;
pub mod utils;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
