use crate::errors::TableError;
use crate::events::EventBus;
use crate::ledger::SettlementSink;
use crate::settings::{SettingsError, TableSettings};
use crate::table::{spawn_table, TableHandle};
use crate::transport::Transport;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tonk_engine::player::{Action, PlayerId, PlayerProfile, TableId};
use tonk_engine::session::TableSession;
use tonk_engine::snapshot::StateSnapshot;
use uuid::Uuid;

/// Directory of running tables.
///
/// Each table runs on its own task; the registry only routes lifecycle calls
/// and actions to the right handle. Locks are never held across an await.
pub struct TableRegistry {
    tables: RwLock<HashMap<TableId, TableHandle>>,
    transport: Arc<dyn Transport>,
    ledger: Arc<dyn SettlementSink>,
    settings: TableSettings,
}

impl TableRegistry {
    pub fn new(
        settings: TableSettings,
        transport: Arc<dyn Transport>,
        ledger: Arc<dyn SettlementSink>,
    ) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self {
            tables: RwLock::new(HashMap::new()),
            transport,
            ledger,
            settings,
        })
    }

    /// Registry delivering through an in-process [`EventBus`] sized by
    /// `settings.event_buffer`. The returned bus is where clients subscribe.
    pub fn with_event_bus(
        settings: TableSettings,
        ledger: Arc<dyn SettlementSink>,
    ) -> Result<(Self, EventBus), SettingsError> {
        let bus = EventBus::from_settings(&settings);
        let registry = Self::new(settings, Arc::new(bus.clone()), ledger)?;
        Ok((registry, bus))
    }

    pub fn settings(&self) -> &TableSettings {
        &self.settings
    }

    /// Opens a waiting table under `table_id`. A closed table with the same id is replaced.
    pub fn create_session(
        &self,
        table_id: impl Into<TableId>,
        stake_amount: u64,
    ) -> Result<TableHandle, TableError> {
        let table_id = table_id.into();
        let session = TableSession::with_rules(table_id.clone(), stake_amount, self.settings.rules)?;

        let mut guard = self
            .tables
            .write()
            .map_err(|_| TableError::StoragePoisoned)?;
        if guard.get(&table_id).is_some_and(|h| !h.is_closed()) {
            return Err(TableError::AlreadyExists(table_id));
        }

        tracing::info!(
            table_id = %table_id,
            stake = stake_amount,
            "creating table"
        );

        let handle = spawn_table(
            session,
            self.settings.command_queue_capacity,
            &self.settings.autoplay_policy,
            Arc::clone(&self.transport),
            Arc::clone(&self.ledger),
        );
        guard.insert(table_id, handle.clone());
        Ok(handle)
    }

    /// Opens a table under a fresh random id.
    pub fn open_table(&self, stake_amount: u64) -> Result<TableHandle, TableError> {
        self.create_session(Uuid::new_v4().to_string(), stake_amount)
    }

    pub fn handle(&self, table_id: &str) -> Result<TableHandle, TableError> {
        let guard = self
            .tables
            .read()
            .map_err(|_| TableError::StoragePoisoned)?;
        guard
            .get(table_id)
            .cloned()
            .ok_or_else(|| TableError::NotFound(table_id.to_string()))
    }

    pub async fn join(
        &self,
        table_id: &str,
        profile: PlayerProfile,
    ) -> Result<StateSnapshot, TableError> {
        self.handle(table_id)?.join(profile).await
    }

    pub async fn leave(
        &self,
        table_id: &str,
        player_id: impl Into<PlayerId>,
    ) -> Result<StateSnapshot, TableError> {
        self.handle(table_id)?.leave(player_id).await
    }

    pub async fn start(
        &self,
        table_id: &str,
        seed: Option<u64>,
    ) -> Result<StateSnapshot, TableError> {
        self.handle(table_id)?.start(seed).await
    }

    /// Routes an action to the table it names.
    pub async fn submit(&self, action: Action) -> Result<StateSnapshot, TableError> {
        self.handle(&action.table_id)?.submit(action).await
    }

    pub async fn set_connected(
        &self,
        table_id: &str,
        player_id: impl Into<PlayerId>,
        connected: bool,
    ) -> Result<StateSnapshot, TableError> {
        self.handle(table_id)?
            .set_connected(player_id, connected)
            .await
    }

    pub async fn snapshot(
        &self,
        table_id: &str,
        viewer: Option<PlayerId>,
    ) -> Result<StateSnapshot, TableError> {
        self.handle(table_id)?.snapshot(viewer).await
    }

    pub async fn reset(&self, table_id: &str) -> Result<StateSnapshot, TableError> {
        self.handle(table_id)?.reset().await
    }

    /// Stops the table task and forgets the table, whatever state it is in.
    pub async fn archive(&self, table_id: &str) -> Result<(), TableError> {
        let handle = {
            let mut guard = self
                .tables
                .write()
                .map_err(|_| TableError::StoragePoisoned)?;
            guard
                .remove(table_id)
                .ok_or_else(|| TableError::NotFound(table_id.to_string()))?
        };
        match handle.shutdown().await {
            // an aborted table has already stopped
            Ok(()) | Err(TableError::Closed(_)) => {}
            Err(e) => return Err(e),
        }
        tracing::info!(table_id = %table_id, "table archived");
        Ok(())
    }

    /// Ids of registered tables, sorted.
    pub fn table_ids(&self) -> Result<Vec<TableId>, TableError> {
        let guard = self
            .tables
            .read()
            .map_err(|_| TableError::StoragePoisoned)?;
        let mut ids: Vec<TableId> = guard.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    pub fn len(&self) -> usize {
        self.tables.read().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
