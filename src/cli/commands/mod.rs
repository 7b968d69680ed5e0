//! CLI command implementations.

mod ask;
mod config;
mod doctor;
mod info;
mod process;
mod serve;
mod summarize;

pub use ask::{run_ask, run_suggest};
pub use config::run_config;
pub use doctor::run_doctor;
pub use info::run_info;
pub use process::{run_batch, run_process};
pub use serve::run_serve;
pub use summarize::run_summarize;
