use crate::events::TableEvent;
use tonk_engine::player::{PlayerId, TableId};

/// Outbound side of a table, as seen by its task.
///
/// A table never knows who is listening. It hands the transport a renderer and
/// the transport calls it once per distinct viewer, so each subscriber receives
/// the snapshot variant that shows only its own hand (`None` for spectators).
/// Implementations must deliver events for one table in the order they are
/// passed in.
pub trait Transport: Send + Sync {
    fn broadcast(&self, table_id: &TableId, render: &dyn Fn(Option<&PlayerId>) -> TableEvent);

    /// Delivers an event only to subscriptions opened by `player_id`.
    fn send_to(&self, table_id: &TableId, player_id: &PlayerId, event: TableEvent);

    /// Called once when the table task stops; pending events may still be drained.
    fn close(&self, table_id: &TableId);
}
