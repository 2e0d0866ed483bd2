//! Simulation command handler.
//!
//! Plays whole rounds with an auto-play policy in every seat and appends each
//! settlement to a JSONL ledger. Round `i` is shuffled with `seed + i`, so a
//! run is reproducible from its base seed.

use crate::config::{self, Config};
use crate::error::CliError;
use crate::ui;
use std::collections::BTreeMap;
use std::io::Write;
use tonk_ai::{create_autoplayer, AutoPlayer};
use tonk_engine::logger::SettlementLogger;
use tonk_engine::player::PlayerProfile;
use tonk_engine::scoring::EndReason;
use tonk_engine::session::{RoundStatus, TableSession};

/// Flags given on the command line; `None` falls back to the configuration.
#[derive(Debug, Clone, Default)]
pub struct SimOptions {
    pub rounds: u64,
    pub seats: Option<usize>,
    pub stake: Option<u64>,
    pub seed: Option<u64>,
    pub policy: Option<String>,
    pub max_turns: Option<u32>,
    pub output: Option<String>,
}

impl SimOptions {
    fn resolve(&self, base: Config) -> Result<Config, CliError> {
        let cfg = Config {
            seats: self.seats.unwrap_or(base.seats),
            stake: self.stake.unwrap_or(base.stake),
            seed: self.seed.or(base.seed),
            policy: self.policy.clone().unwrap_or(base.policy),
            max_turns: self.max_turns.unwrap_or(base.max_turns),
        };
        config::validate(&cfg).map_err(|e| CliError::InvalidInput(e.to_string()))?;
        Ok(cfg)
    }
}

#[derive(Debug, Default)]
struct Summary {
    finished: u64,
    stalled: u64,
    wins: BTreeMap<String, u64>,
    reasons: BTreeMap<&'static str, u64>,
}

pub fn handle_sim_command(
    opts: SimOptions,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), CliError> {
    if opts.rounds == 0 {
        ui::write_error(err, "rounds must be >= 1")?;
        return Err(CliError::InvalidInput("rounds must be >= 1".to_string()));
    }
    let base = config::load().map_err(|e| CliError::Config(e.to_string()))?;
    let cfg = match opts.resolve(base) {
        Ok(cfg) => cfg,
        Err(e) => {
            ui::write_error(err, &e.to_string())?;
            return Err(e);
        }
    };
    let policy = create_autoplayer(&cfg.policy)
        .ok_or_else(|| CliError::InvalidInput(format!("unknown policy '{}'", cfg.policy)))?;

    let mut logger = match &opts.output {
        Some(path) => SettlementLogger::create(path)?,
        None => SettlementLogger::discarding(),
    };

    let base_seed = cfg.seed.unwrap_or_else(rand::random);
    let mut summary = Summary::default();
    for round in 0..opts.rounds {
        let seed = base_seed.wrapping_add(round);
        let table = play_round(&cfg, policy.as_ref(), round, seed)?;
        match table.settlement() {
            Some(record) => {
                summary.finished += 1;
                *summary.wins.entry(record.winner_id.clone()).or_default() += 1;
                *summary.reasons.entry(reason_name(record.end_reason)).or_default() += 1;
                logger.write(&record)?;
            }
            None => summary.stalled += 1,
        }
    }

    writeln!(out, "Seed: {}", base_seed)?;
    writeln!(out, "Rounds: {}", opts.rounds)?;
    writeln!(out, "Finished: {}", summary.finished)?;
    writeln!(out, "Stalled: {}", summary.stalled)?;
    let wins: Vec<String> = (0..cfg.seats)
        .map(|i| {
            let id = format!("p{i}");
            let n = summary.wins.get(&id).copied().unwrap_or(0);
            format!("{id}={n}")
        })
        .collect();
    writeln!(out, "Wins: {}", wins.join(" "))?;
    let reasons: Vec<String> = ["tonk", "stalemate", "forfeit"]
        .iter()
        .map(|r| format!("{r}={}", summary.reasons.get(r).copied().unwrap_or(0)))
        .collect();
    writeln!(out, "Reasons: {}", reasons.join(" "))?;
    if let Some(path) = &opts.output {
        writeln!(out, "Wrote {} records to {}", logger.written(), path)?;
    }
    if summary.stalled > 0 {
        ui::display_warning(
            err,
            &format!(
                "{} round(s) stopped after {} turns without a winner",
                summary.stalled, cfg.max_turns
            ),
        )?;
    }
    Ok(())
}

/// Plays one round to its end or until `max_turns` actions were applied.
fn play_round(
    cfg: &Config,
    policy: &dyn AutoPlayer,
    round: u64,
    seed: u64,
) -> Result<TableSession, CliError> {
    let mut table = TableSession::new(format!("sim-{round}"), cfg.stake);
    for i in 0..cfg.seats {
        table.join(PlayerProfile::new(format!("p{i}"), format!("Bot {}", i + 1)))?;
    }
    table.start(seed)?;

    for _ in 0..cfg.max_turns {
        let Some(seat) = table.current_seat() else {
            break;
        };
        let player_id = seat.id().clone();
        let action = policy.next_action(&table, &player_id);
        if let RoundStatus::Finished(_) = table.apply(&action)? {
            break;
        }
    }
    Ok(table)
}

fn reason_name(reason: EndReason) -> &'static str {
    match reason {
        EndReason::Tonk => "tonk",
        EndReason::Stalemate => "stalemate",
        EndReason::Forfeit => "forfeit",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(rounds: u64) -> SimOptions {
        SimOptions {
            rounds,
            seats: Some(3),
            stake: Some(5),
            seed: Some(7),
            policy: Some("greedy".into()),
            max_turns: Some(500),
            output: None,
        }
    }

    #[test]
    fn rounds_finish_and_are_summarized() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        handle_sim_command(opts(5), &mut out, &mut err).unwrap();
        let output = String::from_utf8(out).unwrap();
        let count = |label: &str| -> u64 {
            output
                .lines()
                .find_map(|l| l.strip_prefix(label))
                .and_then(|v| v.trim().parse().ok())
                .unwrap()
        };
        assert_eq!(count("Rounds:"), 5);
        assert_eq!(count("Finished:") + count("Stalled:"), 5);
        assert!(output.contains("Wins: p0="));
        assert!(output.contains("Reasons: tonk="));
    }

    #[test]
    fn zero_rounds_is_rejected() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = handle_sim_command(opts(0), &mut out, &mut err);
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
        assert!(String::from_utf8(err).unwrap().contains("rounds must be >= 1"));
    }

    #[test]
    fn turn_limit_stalls_rounds() {
        let cfg = Config {
            seats: 2,
            stake: 1,
            seed: None,
            policy: "baseline".into(),
            max_turns: 1,
        };
        let policy = create_autoplayer("baseline").unwrap();
        let table = play_round(&cfg, policy.as_ref(), 0, 3).unwrap();
        assert!(table.settlement().is_none());
    }
}
