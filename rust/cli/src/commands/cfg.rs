//! Configuration command handler.
//!
//! `tonk cfg` prints the resolved configuration, each value with the source
//! it came from (`default`, `file` or `env`):
//!
//! ```json
//! {
//!   "seats": {
//!     "value": 2,
//!     "source": "default"
//!   },
//!   ...
//! }
//! ```

use crate::config;
use crate::error::CliError;
use crate::ui;
use std::io::Write;

pub fn handle_cfg_command(out: &mut dyn Write, err: &mut dyn Write) -> Result<(), CliError> {
    let resolved = match config::load_with_sources() {
        Ok(r) => r,
        Err(e) => {
            ui::write_error(err, &format!("Invalid configuration: {}", e))?;
            return Err(CliError::Config(format!("Invalid configuration: {}", e)));
        }
    };

    let config::ConfigResolved { config, sources } = resolved;
    let display = serde_json::json!({
        "seats": {
            "value": config.seats,
            "source": sources.seats,
        },
        "stake": {
            "value": config.stake,
            "source": sources.stake,
        },
        "seed": {
            "value": config.seed,
            "source": sources.seed,
        },
        "policy": {
            "value": config.policy,
            "source": sources.policy,
        },
        "max_turns": {
            "value": config.max_turns,
            "source": sources.max_turns,
        }
    });
    let json_str = serde_json::to_string_pretty(&display).map_err(std::io::Error::other)?;
    writeln!(out, "{}", json_str)?;
    Ok(())
}
