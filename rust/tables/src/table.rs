use crate::errors::{IntoErrorResponse, TableError};
use crate::events::TableEvent;
use crate::ledger::SettlementSink;
use crate::transport::Transport;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tonk_ai::baseline::BaselineAutoPlayer;
use tonk_ai::{create_autoplayer, AutoPlayer};
use tonk_engine::deck::Deck;
use tonk_engine::errors::GameError;
use tonk_engine::player::{Action, PlayerId, PlayerProfile, TableId};
use tonk_engine::session::{RoundStatus, TableSession};
use tonk_engine::snapshot::StateSnapshot;

type Reply<T> = oneshot::Sender<Result<T, TableError>>;

/// Requests a table task processes one at a time, in arrival order.
pub(crate) enum TableCommand {
    Join {
        profile: PlayerProfile,
        reply: Reply<StateSnapshot>,
    },
    Leave {
        player_id: PlayerId,
        reply: Reply<StateSnapshot>,
    },
    Start {
        seed: Option<u64>,
        deck: Option<Deck>,
        reply: Reply<StateSnapshot>,
    },
    Submit {
        action: Action,
        reply: Reply<StateSnapshot>,
    },
    SetConnected {
        player_id: PlayerId,
        connected: bool,
        reply: Reply<StateSnapshot>,
    },
    Snapshot {
        viewer: Option<PlayerId>,
        reply: Reply<StateSnapshot>,
    },
    Reset {
        reply: Reply<StateSnapshot>,
    },
    Shutdown {
        reply: Reply<()>,
    },
}

/// Cloneable address of a running table task.
///
/// Every method enqueues one command and waits for its reply; a table whose
/// task has stopped answers [`TableError::Closed`].
#[derive(Debug, Clone)]
pub struct TableHandle {
    table_id: TableId,
    commands: mpsc::Sender<TableCommand>,
}

impl TableHandle {
    pub fn table_id(&self) -> &TableId {
        &self.table_id
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> TableCommand,
    ) -> Result<T, TableError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(build(tx))
            .await
            .map_err(|_| TableError::Closed(self.table_id.clone()))?;
        rx.await
            .map_err(|_| TableError::Closed(self.table_id.clone()))?
    }

    /// Seats a player; returns the table as the new player sees it.
    pub async fn join(&self, profile: PlayerProfile) -> Result<StateSnapshot, TableError> {
        self.request(|reply| TableCommand::Join { profile, reply })
            .await
    }

    pub async fn leave(&self, player_id: impl Into<PlayerId>) -> Result<StateSnapshot, TableError> {
        let player_id = player_id.into();
        self.request(|reply| TableCommand::Leave { player_id, reply })
            .await
    }

    /// Starts the round with a shuffle keyed by `seed`, or a random seed.
    pub async fn start(&self, seed: Option<u64>) -> Result<StateSnapshot, TableError> {
        self.request(|reply| TableCommand::Start {
            seed,
            deck: None,
            reply,
        })
        .await
    }

    pub async fn start_with_deck(&self, deck: Deck) -> Result<StateSnapshot, TableError> {
        self.request(|reply| TableCommand::Start {
            seed: None,
            deck: Some(deck),
            reply,
        })
        .await
    }

    /// Applies a player action; returns the table as the actor sees it afterwards.
    pub async fn submit(&self, action: Action) -> Result<StateSnapshot, TableError> {
        self.request(|reply| TableCommand::Submit { action, reply })
            .await
    }

    pub async fn set_connected(
        &self,
        player_id: impl Into<PlayerId>,
        connected: bool,
    ) -> Result<StateSnapshot, TableError> {
        let player_id = player_id.into();
        self.request(|reply| TableCommand::SetConnected {
            player_id,
            connected,
            reply,
        })
        .await
    }

    pub async fn snapshot(&self, viewer: Option<PlayerId>) -> Result<StateSnapshot, TableError> {
        self.request(|reply| TableCommand::Snapshot { viewer, reply })
            .await
    }

    /// Replaces an ended round with a fresh waiting one at the same stake.
    pub async fn reset(&self) -> Result<StateSnapshot, TableError> {
        self.request(|reply| TableCommand::Reset { reply }).await
    }

    pub async fn shutdown(&self) -> Result<(), TableError> {
        self.request(|reply| TableCommand::Shutdown { reply }).await
    }
}

/// What a successful mutation is announced as, unless it ended the round.
enum Announce {
    Joined(PlayerId),
    Left(PlayerId),
    Started,
    Updated,
}

/// The single writer of one table's session.
struct TableActor {
    session: TableSession,
    transport: Arc<dyn Transport>,
    ledger: Arc<dyn SettlementSink>,
    autoplayer: Box<dyn AutoPlayer>,
    fallback: BaselineAutoPlayer,
    aborted: bool,
}

/// Spawns the task owning `session` and returns its handle. Must be called inside a tokio runtime.
pub(crate) fn spawn_table(
    session: TableSession,
    queue_capacity: usize,
    autoplay_policy: &str,
    transport: Arc<dyn Transport>,
    ledger: Arc<dyn SettlementSink>,
) -> TableHandle {
    let table_id = session.table_id().clone();
    let autoplayer: Box<dyn AutoPlayer> = match create_autoplayer(autoplay_policy) {
        Some(policy) => policy,
        None => {
            tracing::warn!(
                table_id = %table_id,
                policy = autoplay_policy,
                "unknown autoplay policy, using baseline"
            );
            Box::new(BaselineAutoPlayer::new())
        }
    };
    let (tx, rx) = mpsc::channel(queue_capacity.max(1));
    let actor = TableActor {
        session,
        transport,
        ledger,
        autoplayer,
        fallback: BaselineAutoPlayer::new(),
        aborted: false,
    };
    tokio::spawn(actor.run(rx));
    TableHandle {
        table_id,
        commands: tx,
    }
}

impl TableActor {
    async fn run(mut self, mut commands: mpsc::Receiver<TableCommand>) {
        tracing::debug!(table_id = %self.session.table_id(), "table task started");
        while let Some(command) = commands.recv().await {
            if !self.handle(command) || self.aborted {
                break;
            }
        }
        self.transport.close(self.session.table_id());
        tracing::info!(
            table_id = %self.session.table_id(),
            version = self.session.version(),
            aborted = self.aborted,
            "table task stopped"
        );
    }

    /// Returns false when the task should stop.
    fn handle(&mut self, command: TableCommand) -> bool {
        match command {
            TableCommand::Join { profile, reply } => {
                let player_id = profile.id.clone();
                let result = self.session.join(profile).map(|()| RoundStatus::Ongoing);
                let outcome = self
                    .commit(result, Announce::Joined(player_id.clone()))
                    .map(|()| self.session.snapshot(Some(player_id.as_str())));
                if outcome.is_ok() {
                    tracing::info!(
                        table_id = %self.session.table_id(),
                        player_id = %player_id,
                        seats = self.session.seats().len(),
                        "player joined"
                    );
                }
                let _ = reply.send(outcome);
            }
            TableCommand::Leave { player_id, reply } => {
                let result = self.session.leave(&player_id);
                let outcome = self
                    .commit(result, Announce::Left(player_id.clone()))
                    .map(|()| self.session.snapshot(None));
                if outcome.is_ok() {
                    tracing::info!(
                        table_id = %self.session.table_id(),
                        player_id = %player_id,
                        "player left"
                    );
                }
                let _ = reply.send(outcome);
            }
            TableCommand::Start { seed, deck, reply } => {
                let result = match deck {
                    Some(deck) => self.session.start_with_deck(deck),
                    None => self.session.start(seed.unwrap_or_else(rand::random)),
                };
                let outcome = self
                    .commit(result, Announce::Started)
                    .map(|()| self.session.snapshot(None));
                if outcome.is_ok() {
                    tracing::info!(
                        table_id = %self.session.table_id(),
                        seats = self.session.seats().len(),
                        pot = self.session.pot_amount(),
                        "round started"
                    );
                }
                let _ = reply.send(outcome);
            }
            TableCommand::Submit { action, reply } => {
                let outcome = self.submit(&action);
                let _ = reply.send(outcome);
            }
            TableCommand::SetConnected {
                player_id,
                connected,
                reply,
            } => {
                let result = self.session.set_connected(&player_id, connected);
                let outcome = self
                    .commit(result, Announce::Updated)
                    .map(|()| self.session.snapshot(Some(player_id.as_str())));
                if outcome.is_ok() {
                    tracing::info!(
                        table_id = %self.session.table_id(),
                        player_id = %player_id,
                        connected,
                        "connection changed"
                    );
                }
                let _ = reply.send(outcome);
            }
            TableCommand::Snapshot { viewer, reply } => {
                let _ = reply.send(Ok(self.session.snapshot(viewer.as_deref())));
            }
            TableCommand::Reset { reply } => {
                let outcome = match self.session.next_round() {
                    Ok(next) => {
                        self.session = next;
                        self.announce(Announce::Updated);
                        tracing::info!(
                            table_id = %self.session.table_id(),
                            seats = self.session.seats().len(),
                            "table reset for a new round"
                        );
                        Ok(self.session.snapshot(None))
                    }
                    Err(e) => Err(e.into()),
                };
                let _ = reply.send(outcome);
            }
            TableCommand::Shutdown { reply } => {
                let _ = reply.send(Ok(()));
                return false;
            }
        }
        true
    }

    fn submit(&mut self, action: &Action) -> Result<StateSnapshot, TableError> {
        let result = self.session.apply(action);
        if let Err(e) = &result {
            if !e.is_fatal() {
                let error = e.log_and_respond(self.session.table_id(), &action.player_id);
                self.transport.send_to(
                    self.session.table_id(),
                    &action.player_id,
                    TableEvent::Rejected {
                        table_id: self.session.table_id().clone(),
                        player_id: action.player_id.clone(),
                        error,
                    },
                );
            }
        } else {
            tracing::debug!(
                table_id = %self.session.table_id(),
                player_id = %action.player_id,
                kind = ?action.kind,
                version = self.session.version(),
                "action applied"
            );
        }
        self.commit(result, Announce::Updated)?;
        Ok(self.session.snapshot(Some(action.player_id.as_str())))
    }

    /// Publishes the outcome of a mutation, settles a finished round and plays
    /// for a disconnected current seat. A fatal error aborts the table.
    fn commit(
        &mut self,
        result: Result<RoundStatus, GameError>,
        announce: Announce,
    ) -> Result<(), TableError> {
        match result {
            Ok(RoundStatus::Ongoing) => self.announce(announce),
            Ok(RoundStatus::Finished(_)) => self.settle(),
            Err(e) => {
                if e.is_fatal() {
                    self.abort(&e);
                }
                return Err(e.into());
            }
        }
        self.autoplay();
        Ok(())
    }

    fn announce(&self, announce: Announce) {
        let session = &self.session;
        self.transport.broadcast(session.table_id(), &|viewer| {
            let snapshot = session.snapshot(viewer.map(String::as_str));
            match &announce {
                Announce::Joined(player_id) => TableEvent::PlayerJoined {
                    player_id: player_id.clone(),
                    snapshot,
                },
                Announce::Left(player_id) => TableEvent::PlayerLeft {
                    player_id: player_id.clone(),
                    snapshot,
                },
                Announce::Started => TableEvent::GameStarted { snapshot },
                Announce::Updated => TableEvent::StateUpdated { snapshot },
            }
        });
    }

    fn settle(&self) {
        let Some(record) = self.session.settlement() else {
            return;
        };
        if let Err(e) = self.ledger.record(&record) {
            tracing::warn!(
                table_id = %record.table_id,
                error = %e,
                "failed to record settlement"
            );
        }
        tracing::info!(
            table_id = %record.table_id,
            winner_id = %record.winner_id,
            reason = ?record.end_reason,
            pot = record.pot_amount,
            "round ended"
        );
        let session = &self.session;
        self.transport.broadcast(session.table_id(), &|viewer| TableEvent::GameEnded {
            snapshot: session.snapshot(viewer.map(String::as_str)),
            settlement: record.clone(),
        });
    }

    /// Finishes the turn of a current seat that disconnected mid-turn.
    fn autoplay(&mut self) {
        let mut use_fallback = false;
        while let Some(index) = self.session.awaiting_autoplay() {
            let player_id = self.session.seats()[index].id().clone();
            let action = if use_fallback {
                self.fallback.next_action(&self.session, &player_id)
            } else {
                self.autoplayer.next_action(&self.session, &player_id)
            };
            let policy = if use_fallback {
                self.fallback.name()
            } else {
                self.autoplayer.name()
            };
            tracing::debug!(
                table_id = %self.session.table_id(),
                player_id = %player_id,
                kind = ?action.kind,
                policy,
                "playing for disconnected seat"
            );
            match self.session.apply(&action) {
                Ok(RoundStatus::Ongoing) => self.announce(Announce::Updated),
                Ok(RoundStatus::Finished(_)) => self.settle(),
                Err(e) if e.is_fatal() => {
                    self.abort(&e);
                    return;
                }
                Err(e) if !use_fallback => {
                    tracing::warn!(
                        table_id = %self.session.table_id(),
                        player_id = %player_id,
                        error = %e,
                        "autoplay move rejected, retrying with baseline"
                    );
                    use_fallback = true;
                }
                Err(e) => {
                    tracing::error!(
                        table_id = %self.session.table_id(),
                        player_id = %player_id,
                        error = %e,
                        "baseline autoplay move rejected"
                    );
                    return;
                }
            }
        }
    }

    fn abort(&mut self, error: &GameError) {
        self.aborted = true;
        let response = error.to_error_response();
        tracing::error!(
            table_id = %self.session.table_id(),
            version = self.session.version(),
            error = %error,
            "consistency violation, aborting table"
        );
        let table_id = self.session.table_id().clone();
        let version = self.session.version() + 1;
        self.transport.broadcast(&table_id, &|_| TableEvent::Aborted {
            table_id: table_id.clone(),
            version,
            reason: response.message.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::ledger::SettlementStore;

    fn actor(bus: &EventBus) -> TableActor {
        let mut session = TableSession::new("t1", 5);
        session.join(PlayerProfile::new("a", "A")).unwrap();
        session.join(PlayerProfile::new("b", "B")).unwrap();
        session.start(1).unwrap();
        TableActor {
            session,
            transport: Arc::new(bus.clone()),
            ledger: Arc::new(SettlementStore::new()),
            autoplayer: Box::new(BaselineAutoPlayer::new()),
            fallback: BaselineAutoPlayer::new(),
            aborted: false,
        }
    }

    #[tokio::test]
    async fn consistency_violation_aborts_and_closes_the_table() {
        let bus = EventBus::new();
        let mut actor = actor(&bus);
        let mut events = bus.subscribe("t1".into(), Some("a".into()));
        let version = actor.session.version();

        let result = actor.commit(
            Err(GameError::ConsistencyViolation("K♥ held twice".into())),
            Announce::Updated,
        );
        assert!(matches!(
            result,
            Err(TableError::Game(GameError::ConsistencyViolation(_)))
        ));
        assert!(actor.aborted);
        match events.try_next_fresh() {
            Some(TableEvent::Aborted {
                table_id,
                version: v,
                reason,
            }) => {
                assert_eq!(table_id, "t1");
                assert_eq!(v, version + 1);
                assert!(reason.contains("K♥ held twice"), "reason: {reason}");
            }
            other => panic!("expected Aborted, got {other:?}"),
        }

        // the task answers what is already queued, then stops for good
        let (tx, rx) = mpsc::channel(4);
        let handle = TableHandle {
            table_id: "t1".into(),
            commands: tx,
        };
        let task = tokio::spawn(actor.run(rx));
        handle.snapshot(None).await.unwrap();
        task.await.unwrap();

        assert!(handle.is_closed());
        assert!(matches!(
            handle.snapshot(None).await,
            Err(TableError::Closed(_))
        ));
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn rejected_moves_do_not_abort() {
        let bus = EventBus::new();
        let mut actor = actor(&bus);
        let mut events = bus.subscribe("t1".into(), Some("b".into()));

        let result = actor.submit(&Action::new(
            "t1",
            "b",
            tonk_engine::player::ActionKind::DrawDeck,
        ));
        assert!(matches!(result, Err(TableError::Game(GameError::InvalidMove(_)))));
        assert!(!actor.aborted);
        assert!(matches!(
            events.try_next_fresh(),
            Some(TableEvent::Rejected { .. })
        ));
    }
}
