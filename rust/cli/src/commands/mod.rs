//! Command handlers for the `tonk` CLI.
//!
//! Each command lives in its own module and exposes
//! `pub fn handle_COMMAND_command(...) -> Result<(), CliError>`, writing to the
//! output streams it is given.

pub mod cfg;
pub mod deal;
pub mod sim;
pub mod verify;

pub use cfg::handle_cfg_command;
pub use deal::handle_deal_command;
pub use sim::{handle_sim_command, SimOptions};
pub use verify::handle_verify_command;
