//! Deal command handler.
//!
//! Shuffles, deals one round and prints every hand with its value, the
//! discard top and the size of the draw pile. The same seed always prints
//! the same deal.

use crate::error::CliError;
use tonk_engine::cards::Card;
use tonk_engine::player::PlayerProfile;
use tonk_engine::session::TableSession;
use std::io::Write;

pub fn handle_deal_command(seed: u64, seats: usize, out: &mut dyn Write) -> Result<(), CliError> {
    let mut table = TableSession::new("deal", 1);
    for i in 0..seats {
        table.join(PlayerProfile::new(format!("p{i}"), format!("Seat {}", i + 1)))?;
    }
    table.start(seed)?;

    writeln!(out, "Seed: {}", seed)?;
    for seat in table.seats() {
        writeln!(
            out,
            "{} ({}): {} = {}",
            seat.name(),
            seat.id(),
            format_cards(seat.hand()),
            seat.hand_value()
        )?;
    }
    match table.discard_top() {
        Some(card) => writeln!(out, "Discard: {}", card)?,
        None => writeln!(out, "Discard: -")?,
    }
    writeln!(out, "Deck: {}", table.draw_count())?;
    Ok(())
}

fn format_cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deal(seed: u64, seats: usize) -> String {
        let mut out = Vec::new();
        handle_deal_command(seed, seats, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn prints_one_line_per_seat() {
        let output = deal(42, 3);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "Seed: 42");
        assert!(lines[1].starts_with("Seat 1 (p0): "));
        assert!(lines[3].starts_with("Seat 3 (p2): "));
        assert!(lines[4].starts_with("Discard: "));
        assert_eq!(lines[5], "Deck: 24");
    }

    #[test]
    fn same_seed_same_deal() {
        assert_eq!(deal(12345, 4), deal(12345, 4));
        assert_ne!(deal(1, 2), deal(2, 2));
    }

    #[test]
    fn too_many_seats_is_an_engine_error() {
        let mut out = Vec::new();
        let result = handle_deal_command(1, 5, &mut out);
        assert!(matches!(result, Err(CliError::Engine(_))));
    }
}
