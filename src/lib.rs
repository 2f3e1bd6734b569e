#![warn(clippy::pedantic)]
// Noisy doc/signature lints that would require annotating every pub function
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
// Keeping format!("{}", x) over format!("{x}") for readability with complex exprs
#![allow(clippy::uninlined_format_args)]
// Token counts and backoff math cast between integer widths and f64
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::module_name_repetitions)]

pub mod bus;
pub mod channels;
pub mod cli;
pub mod config;
pub mod errors;
pub mod game;
pub mod gateway;
pub mod providers;
pub mod relay;
pub mod session;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
