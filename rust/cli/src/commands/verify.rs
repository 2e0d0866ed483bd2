//! Verify command handler.
//!
//! Checks a settlement ledger line by line: every line must be a
//! `SettlementRecord` whose winner is one of its players, whose pot divides
//! evenly among them and whose end time is not before its start.

use crate::error::{BatchValidationError, CliError};
use crate::ui;
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use tonk_engine::logger::SettlementRecord;

pub fn handle_verify_command(
    input: &Path,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), CliError> {
    let contents = match std::fs::read_to_string(input) {
        Ok(c) => c,
        Err(e) => {
            ui::write_error(err, &format!("cannot read {}: {}", input.display(), e))?;
            return Err(e.into());
        }
    };

    let mut records = 0usize;
    let mut errors: Vec<BatchValidationError<usize>> = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        records += 1;
        let problem = match serde_json::from_str::<SettlementRecord>(line) {
            Ok(record) => check_record(&record).err(),
            Err(e) => Some(format!("not a settlement record: {}", e)),
        };
        if let Some(message) = problem {
            errors.push(BatchValidationError {
                item_context: idx + 1,
                message,
            });
        }
    }

    if records == 0 {
        ui::write_error(err, "no settlement records found")?;
        return Err(CliError::InvalidInput("empty ledger".into()));
    }
    if errors.is_empty() {
        writeln!(out, "Verify: OK ({} records)", records)?;
        return Ok(());
    }
    for e in &errors {
        writeln!(err, "line {}", e)?;
    }
    writeln!(out, "Verify: FAILED ({} of {} records invalid)", errors.len(), records)?;
    Err(CliError::InvalidInput(format!(
        "{} invalid settlement record(s)",
        errors.len()
    )))
}

fn check_record(record: &SettlementRecord) -> Result<(), String> {
    if record.players.len() < 2 {
        return Err(format!("{} player(s), a round needs at least 2", record.players.len()));
    }
    let mut seen = HashSet::new();
    if let Some(dup) = record.players.iter().find(|p| !seen.insert(p.id.as_str())) {
        return Err(format!("player {} listed twice", dup.id));
    }
    if !record.players.iter().any(|p| p.id == record.winner_id) {
        return Err(format!("winner {} is not one of the players", record.winner_id));
    }
    if record.pot_amount % record.players.len() as u64 != 0 {
        return Err(format!(
            "pot {} does not split evenly among {} players",
            record.pot_amount,
            record.players.len()
        ));
    }
    if record.ended_at < record.started_at {
        return Err("round ended before it started".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tonk_engine::player::PlayerProfile;
    use tonk_engine::player::{Action, ActionKind};
    use tonk_engine::session::TableSession;

    fn settled() -> SettlementRecord {
        let mut t = TableSession::new("v1", 5);
        t.join(PlayerProfile::new("a", "A")).unwrap();
        t.join(PlayerProfile::new("b", "B")).unwrap();
        t.start(3).unwrap();
        t.apply(&Action::new("v1", "a", ActionKind::Tonk)).unwrap();
        t.settlement().unwrap()
    }

    #[test]
    fn real_settlements_pass() {
        assert_eq!(check_record(&settled()), Ok(()));
    }

    #[test]
    fn foreign_winner_and_uneven_pot_fail() {
        let mut record = settled();
        record.winner_id = "zed".into();
        assert!(check_record(&record).unwrap_err().contains("zed"));

        let mut record = settled();
        record.pot_amount = 11;
        assert!(check_record(&record).unwrap_err().contains("split evenly"));
    }

    #[test]
    fn reports_line_numbers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let good = serde_json::to_string(&settled()).unwrap();
        writeln!(file, "{good}").unwrap();
        writeln!(file, "{{\"tableId\": 1}}").unwrap();
        writeln!(file, "{good}").unwrap();

        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = handle_verify_command(file.path(), &mut out, &mut err);
        assert!(result.is_err());
        let stderr = String::from_utf8(err).unwrap();
        assert!(stderr.starts_with("line 2: not a settlement record"));
        assert!(String::from_utf8(out).unwrap().contains("1 of 3 records invalid"));
    }
}
