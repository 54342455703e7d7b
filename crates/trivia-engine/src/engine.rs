//! The orchestrator: one lock, many timers.
//!
//! Every inbound event and every timer firing becomes a single atomic
//! mutation under the registry lock. Spawned tasks (question countdown,
//! leaderboard auto-advance, grace expiry) capture only identifiers plus an
//! epoch/generation number and re-read live state when they fire; a
//! cancelled or superseded task never acts.
//!
//! Locking order is registry → graces, always, and no handler awaits while
//! holding either lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use trivia_core::constants::{GRACE_SECONDS, LEADERBOARD_SECONDS, QUESTION_SECONDS};
use trivia_core::errors::TriviaError;
use trivia_core::events::{ClientEvent, HostResync, Phase, PlayerResync, ServerEvent};
use trivia_core::ids::{ConnectionId, GameCode, PlayerName};

use crate::broadcast::{Broadcaster, Transport};
use crate::projection::{leaderboard, monitor_snapshot};
use crate::question::{sample_questions, QuestionBank};
use crate::registry::SessionRegistry;
use crate::session::{Advance, DroppedRole, JoinOutcome, Session};

/// Tunable windows. Defaults match the product constants.
#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    /// Seconds a question stays open.
    pub question_secs: u64,
    /// Seconds the leaderboard shows before auto-advancing.
    pub leaderboard_secs: u64,
    /// Seconds a dropped identity may reconnect.
    pub grace_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            question_secs: QUESTION_SECONDS,
            leaderboard_secs: LEADERBOARD_SECONDS,
            grace_secs: GRACE_SECONDS,
        }
    }
}

/// A disconnected identity awaiting reconnect or removal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum GraceKey {
    /// The session's host.
    Host(GameCode),
    /// A player, by case-folded name key.
    Player(GameCode, String),
}

impl GraceKey {
    fn code(&self) -> &GameCode {
        match self {
            Self::Host(code) | Self::Player(code, _) => code,
        }
    }
}

struct GraceEntry {
    token: CancellationToken,
    generation: u64,
}

enum Tick {
    Continue,
    Stop,
}

/// The session orchestrator.
pub struct Engine {
    registry: Mutex<SessionRegistry>,
    graces: Mutex<HashMap<GraceKey, GraceEntry>>,
    grace_generation: AtomicU64,
    broadcaster: Broadcaster,
    config: EngineConfig,
}

impl Engine {
    /// Build an engine over a transport.
    pub fn new(transport: Arc<dyn Transport>, config: EngineConfig) -> Arc<Self> {
        Arc::new(Self {
            registry: Mutex::new(SessionRegistry::new()),
            graces: Mutex::new(HashMap::new()),
            grace_generation: AtomicU64::new(0),
            broadcaster: Broadcaster::new(transport),
            config,
        })
    }

    /// Number of live games.
    pub fn game_count(&self) -> usize {
        self.registry.lock().len()
    }

    /// Route one inbound event from a connection.
    #[instrument(skip(self, event), fields(conn = %connection))]
    pub fn handle_event(self: &Arc<Self>, connection: &ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::CreateGame => self.create_game(connection),
            ClientEvent::ReconnectHost { game_id } => self.reconnect_host(connection, &game_id),
            ClientEvent::JoinGame {
                game_id,
                player_name,
            } => self.join_game(connection, &game_id, &player_name),
            ClientEvent::ReconnectPlayer {
                game_id,
                player_name,
            } => self.reconnect_player(connection, &game_id, &player_name),
            ClientEvent::StartGame { game_id } => self.start_game(connection, &game_id),
            ClientEvent::SubmitAnswer { game_id, answer } => {
                self.submit_answer(connection, &game_id, &answer);
            }
            ClientEvent::NextQuestion { game_id } => self.next_question(connection, &game_id),
            ClientEvent::ShowLeaderboard { game_id } => {
                self.show_leaderboard(connection, &game_id);
            }
            ClientEvent::MonitorGame { game_id } => self.monitor_game(connection, &game_id),
        }
    }

    /// The transport lost a connection: start grace periods for whatever
    /// identities it held. Not an error — reconnects cancel them.
    #[instrument(skip(self), fields(conn = %connection))]
    pub fn handle_disconnect(self: &Arc<Self>, connection: &ConnectionId) {
        let dropped: Vec<GraceKey> = {
            let mut registry = self.registry.lock();
            registry
                .iter_mut()
                .filter_map(|session| {
                    let code = session.code().clone();
                    session.mark_disconnected(connection).map(|role| match role {
                        DroppedRole::Host => GraceKey::Host(code),
                        DroppedRole::Player(name) => GraceKey::Player(code, name.key()),
                    })
                })
                .collect()
        };
        for key in dropped {
            debug!(code = %key.code(), "grace period started");
            self.start_grace(key);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Inbound operations
    // ─────────────────────────────────────────────────────────────────────

    fn create_game(self: &Arc<Self>, connection: &ConnectionId) {
        let code = {
            let mut registry = self.registry.lock();
            let session = registry.create(
                connection.clone(),
                QuestionBank::shuffled(sample_questions()),
                self.config.question_secs,
            );
            session.code().clone()
        };
        self.broadcaster.subscribe_host(connection, &code);
        self.broadcaster.reply(
            connection,
            &ServerEvent::GameCreated {
                game_id: code.clone(),
            },
        );
        info!(code = %code, "host created game");
    }

    fn reconnect_host(self: &Arc<Self>, connection: &ConnectionId, raw_code: &str) {
        let code = GameCode::normalize(raw_code);
        let mut registry = self.registry.lock();
        let Some(session) = registry.get_mut(&code) else {
            self.broadcaster.error(connection, "Game not found");
            return;
        };
        self.cancel_grace(&GraceKey::Host(code.clone()));
        session.rebind_host(connection.clone());
        self.broadcaster.subscribe_host(connection, &code);
        let resync = HostResync {
            game_id: code.clone(),
            phase: session.phase(),
            question: session.question_view(),
            seconds_remaining: session.seconds_remaining(),
            leaderboard: leaderboard(session),
        };
        self.broadcaster
            .reply(connection, &ServerEvent::ReconnectedAsHost(resync));
        info!(code = %code, "host reconnected");
    }

    fn join_game(self: &Arc<Self>, connection: &ConnectionId, raw_code: &str, raw_name: &str) {
        let code = GameCode::normalize(raw_code);
        let name = PlayerName::new(raw_name);
        let mut registry = self.registry.lock();
        let Some(session) = registry.get_mut(&code) else {
            self.broadcaster.error(connection, "Game not found");
            return;
        };
        match session.join(connection.clone(), name.clone()) {
            Ok(outcome) => {
                if outcome == JoinOutcome::Reclaimed {
                    self.cancel_grace(&GraceKey::Player(code.clone(), name.key()));
                }
                self.broadcaster.subscribe_player(connection, &code);
                self.broadcaster.reply(
                    connection,
                    &ServerEvent::GameJoined {
                        game_id: code.clone(),
                    },
                );
                if outcome == JoinOutcome::Joined {
                    self.broadcaster.host(
                        &code,
                        &ServerEvent::PlayerJoined {
                            player_name: name.as_str().to_string(),
                        },
                    );
                }
                self.push_monitor_snapshot(session);
                info!(code = %code, player = %name, ?outcome, "player joined");
            }
            Err(err) => self.surface(connection, &err),
        }
    }

    fn reconnect_player(
        self: &Arc<Self>,
        connection: &ConnectionId,
        raw_code: &str,
        raw_name: &str,
    ) {
        let code = GameCode::normalize(raw_code);
        let name = PlayerName::new(raw_name);
        let mut registry = self.registry.lock();
        let Some(session) = registry.get_mut(&code) else {
            self.broadcaster.error(connection, "Game not found");
            return;
        };
        match session.rebind_player(&name, connection.clone()) {
            Ok(player) => {
                let score = player.score;
                let answered_index = player.answered_index;
                let resync = PlayerResync {
                    game_id: code.clone(),
                    phase: session.phase(),
                    score,
                    answered_current_question: answered_index == Some(session.current_index()),
                    question: session.question_view(),
                    seconds_remaining: session.seconds_remaining(),
                };
                self.cancel_grace(&GraceKey::Player(code.clone(), name.key()));
                self.broadcaster.subscribe_player(connection, &code);
                self.broadcaster
                    .reply(connection, &ServerEvent::ReconnectedAsPlayer(resync));
                self.push_monitor_snapshot(session);
                info!(code = %code, player = %name, "player reconnected");
            }
            Err(err) => self.surface(connection, &err),
        }
    }

    fn start_game(self: &Arc<Self>, connection: &ConnectionId, raw_code: &str) {
        let code = GameCode::normalize(raw_code);
        let mut registry = self.registry.lock();
        let Some(session) = registry.get_mut(&code) else {
            self.broadcaster.error(connection, "Game not found");
            return;
        };
        match session.start(connection) {
            Ok(()) => {
                self.broadcaster.participants(&code, &ServerEvent::GameStarted);
                self.open_question(session);
                info!(code = %code, "game started");
            }
            Err(err) => self.surface(connection, &err),
        }
    }

    fn submit_answer(self: &Arc<Self>, connection: &ConnectionId, raw_code: &str, answer: &str) {
        let code = GameCode::normalize(raw_code);
        let mut registry = self.registry.lock();
        let Some(session) = registry.get_mut(&code) else {
            self.broadcaster.error(connection, "Game not found");
            return;
        };
        match session.submit_answer(connection, answer) {
            Ok(record) => {
                self.broadcaster.reply(
                    connection,
                    &ServerEvent::AnswerResult {
                        correct: record.correct,
                        correct_answer: record.correct_answer.clone(),
                        points: record.points,
                    },
                );
                self.broadcaster.host(
                    &code,
                    &ServerEvent::PlayerAnswered {
                        player_name: record.player_name.clone(),
                        correct: record.correct,
                        score: record.score,
                    },
                );
                self.push_monitor_snapshot(session);
                debug!(code = %code, player = %record.player_name, points = record.points, "answer recorded");
                if record.all_answered {
                    // Early completion: don't wait out the deadline.
                    self.finish_question(session);
                }
            }
            Err(err) => self.surface(connection, &err),
        }
    }

    fn next_question(self: &Arc<Self>, connection: &ConnectionId, raw_code: &str) {
        let code = GameCode::normalize(raw_code);
        let mut registry = self.registry.lock();
        let Some(session) = registry.get_mut(&code) else {
            self.broadcaster.error(connection, "Game not found");
            return;
        };
        if !session.is_host(connection) {
            return;
        }
        self.advance_session(session);
    }

    fn show_leaderboard(self: &Arc<Self>, connection: &ConnectionId, raw_code: &str) {
        let code = GameCode::normalize(raw_code);
        let mut registry = self.registry.lock();
        let Some(session) = registry.get_mut(&code) else {
            self.broadcaster.error(connection, "Game not found");
            return;
        };
        if !session.is_host(connection) {
            return;
        }
        if session.phase() == Phase::Question {
            self.finish_question(session);
        }
    }

    fn monitor_game(self: &Arc<Self>, connection: &ConnectionId, raw_code: &str) {
        let code = GameCode::normalize(raw_code);
        let registry = self.registry.lock();
        let Some(session) = registry.get(&code) else {
            self.broadcaster.error(connection, "Game not found");
            return;
        };
        self.broadcaster.subscribe_monitor(connection, &code);
        self.broadcaster.reply(
            connection,
            &ServerEvent::MonitoringData(monitor_snapshot(session)),
        );
        debug!(code = %code, "monitor attached");
    }

    // ─────────────────────────────────────────────────────────────────────
    // Transitions shared by operations and timers
    // ─────────────────────────────────────────────────────────────────────

    /// Open the session's current question: broadcast it and start the countdown.
    fn open_question(self: &Arc<Self>, session: &mut Session) {
        if let Some(view) = session.question_view() {
            self.broadcaster
                .participants(session.code(), &ServerEvent::NewQuestion(view));
        }
        self.push_monitor_snapshot(session);

        let token = CancellationToken::new();
        session.set_question_timer(token.clone());
        let engine = Arc::clone(self);
        let code = session.code().clone();
        let epoch = session.epoch();
        drop(tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = token.cancelled() => return,
                    () = tokio::time::sleep(Duration::from_secs(1)) => {
                        if matches!(engine.question_tick(&code, epoch), Tick::Stop) {
                            return;
                        }
                    }
                }
            }
        }));
    }

    /// One second of countdown. Re-reads live state; a stale epoch stops the task.
    fn question_tick(self: &Arc<Self>, code: &GameCode, epoch: u64) -> Tick {
        let mut registry = self.registry.lock();
        let Some(session) = registry.get_mut(code) else {
            return Tick::Stop;
        };
        if session.phase() != Phase::Question || session.epoch() != epoch {
            return Tick::Stop;
        }
        if session.deadline_passed() {
            debug!(code = %code, "question deadline");
            self.finish_question(session);
            return Tick::Stop;
        }
        let remaining = session.seconds_remaining().unwrap_or(0);
        let update = ServerEvent::QuestionTimerUpdate {
            seconds_remaining: remaining,
        };
        self.broadcaster.participants(code, &update);
        self.broadcaster.monitors(code, &update);
        self.push_monitor_snapshot(session);
        Tick::Continue
    }

    /// Question → Leaderboard plus the auto-advance countdown.
    fn finish_question(self: &Arc<Self>, session: &mut Session) {
        if session.close_question().is_err() {
            return;
        }
        self.broadcaster.participants(
            session.code(),
            &ServerEvent::LeaderboardUpdate {
                leaderboard: leaderboard(session),
            },
        );
        self.push_monitor_snapshot(session);

        let token = CancellationToken::new();
        session.set_advance_timer(token.clone());
        let engine = Arc::clone(self);
        let code = session.code().clone();
        let epoch = session.epoch();
        let wait = Duration::from_secs(self.config.leaderboard_secs);
        drop(tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                () = tokio::time::sleep(wait) => engine.advance_deadline(&code, epoch),
            }
        }));
    }

    /// Auto-advance fired: only act if the leaderboard is still showing.
    fn advance_deadline(self: &Arc<Self>, code: &GameCode, epoch: u64) {
        let mut registry = self.registry.lock();
        let Some(session) = registry.get_mut(code) else {
            return;
        };
        if session.phase() != Phase::Leaderboard || session.epoch() != epoch {
            return;
        }
        debug!(code = %code, "leaderboard auto-advance");
        self.advance_session(session);
    }

    /// Leaderboard → next question or game over.
    fn advance_session(self: &Arc<Self>, session: &mut Session) {
        match session.advance() {
            Ok(Advance::NextQuestion) => self.open_question(session),
            Ok(Advance::Finished) => {
                self.broadcaster.participants(
                    session.code(),
                    &ServerEvent::GameOver {
                        leaderboard: leaderboard(session),
                    },
                );
                self.push_monitor_snapshot(session);
                info!(code = %session.code(), "game over");
            }
            Err(_) => {}
        }
    }

    fn push_monitor_snapshot(&self, session: &Session) {
        self.broadcaster.monitors(
            session.code(),
            &ServerEvent::MonitoringData(monitor_snapshot(session)),
        );
    }

    /// Surface or swallow an operation error per the taxonomy.
    fn surface(&self, connection: &ConnectionId, err: &TriviaError) {
        if err.is_silent() {
            debug!(error = %err, "silently dropped");
        } else {
            self.broadcaster.error(connection, &err.to_string());
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Grace periods
    // ─────────────────────────────────────────────────────────────────────

    fn start_grace(self: &Arc<Self>, key: GraceKey) {
        let generation = self.grace_generation.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        {
            let mut graces = self.graces.lock();
            // At most one grace per identity: a restart supersedes.
            if let Some(old) = graces.insert(
                key.clone(),
                GraceEntry {
                    token: token.clone(),
                    generation,
                },
            ) {
                old.token.cancel();
            }
        }
        let engine = Arc::clone(self);
        let wait = Duration::from_secs(self.config.grace_secs);
        drop(tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                () = tokio::time::sleep(wait) => engine.grace_expired(&key, generation),
            }
        }));
    }

    fn cancel_grace(&self, key: &GraceKey) {
        if let Some(entry) = self.graces.lock().remove(key) {
            entry.token.cancel();
        }
    }

    /// Drop every grace entry belonging to a destroyed session.
    fn cancel_graces_for(&self, code: &GameCode) {
        let mut graces = self.graces.lock();
        graces.retain(|key, entry| {
            if key.code() == code {
                entry.token.cancel();
                false
            } else {
                true
            }
        });
    }

    /// A grace window elapsed without reconnect: remove the identity.
    fn grace_expired(self: &Arc<Self>, key: &GraceKey, generation: u64) {
        let mut registry = self.registry.lock();
        {
            let mut graces = self.graces.lock();
            match graces.get(key) {
                Some(entry) if entry.generation == generation => {
                    let _ = graces.remove(key);
                }
                // Superseded or already cancelled — stand down.
                _ => return,
            }
        }
        match key {
            GraceKey::Host(code) => {
                info!(code = %code, "host grace expired, tearing down");
                self.broadcaster.participants(code, &ServerEvent::HostLeft);
                self.broadcaster.monitors(code, &ServerEvent::HostLeft);
                let _ = registry.destroy(code);
                self.cancel_graces_for(code);
            }
            GraceKey::Player(code, name_key) => {
                let Some(session) = registry.get_mut(code) else {
                    return;
                };
                let name = PlayerName::new(name_key);
                let Some(removed) = session.remove_player(&name) else {
                    return;
                };
                info!(code = %code, player = %removed.name, "player grace expired, removed");
                self.broadcaster.host(
                    code,
                    &ServerEvent::PlayerLeft {
                        player_name: removed.name.as_str().to_string(),
                    },
                );
                self.push_monitor_snapshot(session);

                if session.phase() == Phase::Lobby && session.connected_player_count() == 0 {
                    // Last player left an unstarted game.
                    let _ = registry.destroy(code);
                    self.cancel_graces_for(code);
                } else if session.phase() == Phase::Question && session.all_connected_answered() {
                    // The departed player was the last outstanding answer.
                    self.finish_question(session);
                }
            }
        }
    }
}
