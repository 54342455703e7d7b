//! Per-game session state machine.
//!
//! A [`Session`] owns the roster, the shuffled question bank, the current
//! phase, and the cancellation tokens for its (at most one each) question
//! timer and leaderboard auto-advance timer. All mutation happens through
//! methods that enforce the phase transitions:
//!
//! Lobby → Question → Leaderboard → {Question | GameOver}
//!
//! Key rules:
//!
//! - Display names are unique case-insensitively among *connected* players;
//!   a join naming a disconnected roster slot reclaims it, score intact.
//! - The first answer a player submits for a question index is the one that
//!   counts; resubmissions are stale no-ops.
//! - Entering the leaderboard backfills every missing answer as zero points
//!   at max elapsed, so standings are always complete.
//! - Every transition bumps `epoch`; timer tasks compare their captured
//!   epoch against the live one and stand down on mismatch.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use trivia_core::constants::{FAST_ANSWER_SECONDS, MAX_POINTS};
use trivia_core::errors::TriviaError;
use trivia_core::events::{Phase, QuestionView};
use trivia_core::ids::{ConnectionId, GameCode, PlayerName};

use crate::question::{Question, QuestionBank};

/// One roster entry.
#[derive(Clone, Debug)]
pub struct Player {
    /// Display name, the stable business key.
    pub name: PlayerName,
    /// Current transport connection; rebound on reconnect.
    pub connection: ConnectionId,
    /// Whether the connection is currently live.
    pub connected: bool,
    /// Running score. Monotonic within a session.
    pub score: u32,
    /// Last question index with a recorded answer.
    pub answered_index: Option<usize>,
    /// Seconds taken for that answer.
    pub answer_elapsed_secs: Option<f64>,
}

impl Player {
    /// Whether this player has a recorded answer for `index`.
    pub fn answered(&self, index: usize) -> bool {
        self.answered_index == Some(index)
    }
}

/// How a `joinGame` resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JoinOutcome {
    /// A new roster slot was created.
    Joined,
    /// The name matched a disconnected slot; identity rebound, score kept.
    Reclaimed,
}

/// What a recorded answer did.
#[derive(Clone, Debug)]
pub struct AnswerRecord {
    /// Display name of the answerer.
    pub player_name: String,
    /// Whether the answer matched the correct option.
    pub correct: bool,
    /// Points awarded by the decay curve.
    pub points: u32,
    /// The player's running score after this answer.
    pub score: u32,
    /// The correct option, for the private reply.
    pub correct_answer: String,
    /// True if this answer completed the set of connected players.
    pub all_answered: bool,
}

/// Result of advancing past the leaderboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Advance {
    /// A further question opened.
    NextQuestion,
    /// The bank is exhausted; the session is now terminal.
    Finished,
}

/// Which role a dropped connection held in a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DroppedRole {
    /// The session's host.
    Host,
    /// A player, by roster name.
    Player(PlayerName),
}

/// One running game.
#[derive(Debug)]
pub struct Session {
    code: GameCode,
    host: ConnectionId,
    host_connected: bool,
    phase: Phase,
    bank: QuestionBank,
    current_index: usize,
    question_opened: Option<Instant>,
    question_deadline: Option<Instant>,
    players: Vec<Player>,
    question_secs: u64,
    epoch: u64,
    question_timer: Option<CancellationToken>,
    advance_timer: Option<CancellationToken>,
}

impl Session {
    /// Create a session in the lobby with an empty roster.
    pub fn new(code: GameCode, host: ConnectionId, bank: QuestionBank, question_secs: u64) -> Self {
        Self {
            code,
            host,
            host_connected: true,
            phase: Phase::Lobby,
            bank,
            current_index: 0,
            question_opened: None,
            question_deadline: None,
            players: Vec::new(),
            question_secs,
            epoch: 0,
            question_timer: None,
            advance_timer: None,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    /// The game code.
    pub fn code(&self) -> &GameCode {
        &self.code
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether this connection is the recognized host.
    pub fn is_host(&self, connection: &ConnectionId) -> bool {
        self.host == *connection
    }

    /// Whether the host currently has a live connection.
    pub fn host_connected(&self) -> bool {
        self.host_connected
    }

    /// Active question index. Only meaningful once the game has started.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// The roster, in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Question bank length.
    pub fn total_questions(&self) -> usize {
        self.bank.len()
    }

    /// Live timer epoch. Bumped on every transition.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The active question, if phase is Question.
    pub fn current_question(&self) -> Option<&Question> {
        if self.phase == Phase::Question {
            self.bank.get(self.current_index)
        } else {
            None
        }
    }

    /// Client-facing view of the active question.
    pub fn question_view(&self) -> Option<QuestionView> {
        self.current_question().map(|q| QuestionView {
            question: q.text.clone(),
            options: q.options.clone(),
            question_number: self.current_index + 1,
            total_questions: self.bank.len(),
            duration: self.question_secs,
        })
    }

    /// Whole seconds until the active question closes.
    pub fn seconds_remaining(&self) -> Option<u64> {
        self.question_deadline
            .map(|d| d.saturating_duration_since(Instant::now()).as_secs())
    }

    /// Whether the active question's deadline has been reached.
    ///
    /// `seconds_remaining` truncates, so it reads 0 for the better part of a
    /// second before the deadline; closing the question keys off this check.
    pub fn deadline_passed(&self) -> bool {
        self.question_deadline
            .is_some_and(|d| Instant::now() >= d)
    }

    /// The player attached to `connection`, if any.
    pub fn player_by_connection(&self, connection: &ConnectionId) -> Option<&Player> {
        self.players
            .iter()
            .find(|p| p.connected && p.connection == *connection)
    }

    /// The roster entry with `name`, if any.
    pub fn player_by_name(&self, name: &PlayerName) -> Option<&Player> {
        self.players.iter().find(|p| p.name.matches(name))
    }

    /// Number of players with a live connection.
    pub fn connected_player_count(&self) -> usize {
        self.players.iter().filter(|p| p.connected).count()
    }

    /// Whether every connected player has answered the active question.
    ///
    /// Vacuously true with zero connected players — the check mirrors an
    /// `every()` over the connected roster, so the departure of the last
    /// outstanding answerer closes the question.
    pub fn all_connected_answered(&self) -> bool {
        self.players
            .iter()
            .filter(|p| p.connected)
            .all(|p| p.answered(self.current_index))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Roster
    // ─────────────────────────────────────────────────────────────────────

    /// Add a player, or reclaim a disconnected slot with the same name.
    ///
    /// Rejects with [`TriviaError::DuplicateName`] if the name is attached
    /// to a live connection.
    pub fn join(
        &mut self,
        connection: ConnectionId,
        name: PlayerName,
    ) -> Result<JoinOutcome, TriviaError> {
        if let Some(existing) = self.players.iter_mut().find(|p| p.name.matches(&name)) {
            if existing.connected {
                return Err(TriviaError::DuplicateName(name.as_str().to_string()));
            }
            existing.connection = connection;
            existing.connected = true;
            return Ok(JoinOutcome::Reclaimed);
        }
        self.players.push(Player {
            name,
            connection,
            connected: true,
            score: 0,
            answered_index: None,
            answer_elapsed_secs: None,
        });
        Ok(JoinOutcome::Joined)
    }

    /// Rebind the host seat to a new connection.
    pub fn rebind_host(&mut self, connection: ConnectionId) {
        self.host = connection;
        self.host_connected = true;
    }

    /// Rebind a player's identity after a reconnect. Score and answer
    /// history are untouched.
    pub fn rebind_player(
        &mut self,
        name: &PlayerName,
        connection: ConnectionId,
    ) -> Result<&Player, TriviaError> {
        let player = self
            .players
            .iter_mut()
            .find(|p| p.name.matches(name))
            .ok_or_else(|| TriviaError::PlayerNotFound(name.as_str().to_string()))?;
        player.connection = connection;
        player.connected = true;
        Ok(player)
    }

    /// Mark whichever identity owns `connection` as disconnected.
    pub fn mark_disconnected(&mut self, connection: &ConnectionId) -> Option<DroppedRole> {
        if self.host_connected && self.host == *connection {
            self.host_connected = false;
            return Some(DroppedRole::Host);
        }
        if let Some(player) = self
            .players
            .iter_mut()
            .find(|p| p.connected && p.connection == *connection)
        {
            player.connected = false;
            return Some(DroppedRole::Player(player.name.clone()));
        }
        None
    }

    /// Remove a player from the roster entirely (grace period expired).
    pub fn remove_player(&mut self, name: &PlayerName) -> Option<Player> {
        let index = self.players.iter().position(|p| p.name.matches(name))?;
        Some(self.players.remove(index))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Transitions
    // ─────────────────────────────────────────────────────────────────────

    /// Lobby → Question: open the first question.
    ///
    /// Host-only; silently refused otherwise. Stale outside the lobby.
    pub fn start(&mut self, by: &ConnectionId) -> Result<(), TriviaError> {
        if !self.is_host(by) {
            return Err(TriviaError::Unauthorized);
        }
        if self.phase != Phase::Lobby {
            return Err(TriviaError::Stale);
        }
        for player in &mut self.players {
            player.answered_index = None;
            player.answer_elapsed_secs = None;
        }
        self.current_index = 0;
        self.open_question();
        Ok(())
    }

    /// Record the first answer `connection` submits for the active question.
    pub fn submit_answer(
        &mut self,
        connection: &ConnectionId,
        answer: &str,
    ) -> Result<AnswerRecord, TriviaError> {
        if self.phase != Phase::Question {
            return Err(TriviaError::Stale);
        }
        let opened = self.question_opened.ok_or(TriviaError::Stale)?;
        let question = self
            .bank
            .get(self.current_index)
            .ok_or(TriviaError::Stale)?;
        let correct = answer == question.correct_option;
        let correct_answer = question.correct_option.clone();
        let elapsed = opened.elapsed().as_secs_f64();
        let current_index = self.current_index;
        let question_secs = self.question_secs;

        let player = self
            .players
            .iter_mut()
            .find(|p| p.connected && p.connection == *connection)
            .ok_or(TriviaError::Unauthorized)?;
        if player.answered(current_index) {
            return Err(TriviaError::Stale);
        }

        let points = trivia_core::scoring::score(
            correct,
            elapsed,
            question_secs as f64,
            FAST_ANSWER_SECONDS as f64,
            MAX_POINTS,
        );
        player.answered_index = Some(current_index);
        player.answer_elapsed_secs = Some(elapsed);
        player.score += points;

        let record = AnswerRecord {
            player_name: player.name.as_str().to_string(),
            correct,
            points,
            score: player.score,
            correct_answer,
            all_answered: false,
        };
        let all_answered = self.all_connected_answered();
        Ok(AnswerRecord {
            all_answered,
            ..record
        })
    }

    /// Question → Leaderboard.
    ///
    /// Backfills every missing answer as zero points at max elapsed so the
    /// leaderboard is complete, and cancels the question timer.
    pub fn close_question(&mut self) -> Result<(), TriviaError> {
        if self.phase != Phase::Question {
            return Err(TriviaError::Stale);
        }
        let index = self.current_index;
        let max_elapsed = self.question_secs as f64;
        for player in &mut self.players {
            if !player.answered(index) {
                player.answered_index = Some(index);
                player.answer_elapsed_secs = Some(max_elapsed);
            }
        }
        self.phase = Phase::Leaderboard;
        self.question_opened = None;
        self.question_deadline = None;
        self.bump_epoch();
        self.clear_question_timer();
        Ok(())
    }

    /// Leaderboard → {Question | GameOver}.
    pub fn advance(&mut self) -> Result<Advance, TriviaError> {
        if self.phase != Phase::Leaderboard {
            return Err(TriviaError::Stale);
        }
        self.current_index += 1;
        if self.bank.get(self.current_index).is_some() {
            self.open_question();
            Ok(Advance::NextQuestion)
        } else {
            self.phase = Phase::GameOver;
            self.bump_epoch();
            self.cancel_timers();
            Ok(Advance::Finished)
        }
    }

    fn open_question(&mut self) {
        let now = Instant::now();
        self.phase = Phase::Question;
        self.question_opened = Some(now);
        self.question_deadline = Some(now + Duration::from_secs(self.question_secs));
        self.bump_epoch();
        self.cancel_timers();
    }

    fn bump_epoch(&mut self) {
        self.epoch += 1;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Timer handles — at most one of each per session
    // ─────────────────────────────────────────────────────────────────────

    /// Install the question countdown token, cancelling any previous one.
    pub fn set_question_timer(&mut self, token: CancellationToken) {
        if let Some(old) = self.question_timer.replace(token) {
            old.cancel();
        }
    }

    /// Install the leaderboard auto-advance token, cancelling any previous one.
    pub fn set_advance_timer(&mut self, token: CancellationToken) {
        if let Some(old) = self.advance_timer.replace(token) {
            old.cancel();
        }
    }

    fn clear_question_timer(&mut self) {
        if let Some(token) = self.question_timer.take() {
            token.cancel();
        }
    }

    fn clear_advance_timer(&mut self) {
        if let Some(token) = self.advance_timer.take() {
            token.cancel();
        }
    }

    /// Cancel both timers. Called on every transition and at teardown.
    pub fn cancel_timers(&mut self) {
        self.clear_question_timer();
        self.clear_advance_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use trivia_core::errors::TriviaError;

    use crate::question::sample_questions;

    fn make_session() -> (Session, ConnectionId) {
        let host = ConnectionId::new();
        let session = Session::new(
            GameCode::normalize("AB12CD"),
            host.clone(),
            QuestionBank::ordered(sample_questions()),
            60,
        );
        (session, host)
    }

    fn join(session: &mut Session, name: &str) -> ConnectionId {
        let conn = ConnectionId::new();
        session
            .join(conn.clone(), PlayerName::new(name))
            .unwrap();
        conn
    }

    // --- Roster ---

    #[test]
    fn join_adds_players_in_order() {
        let (mut session, _host) = make_session();
        let _ana = join(&mut session, "Ana");
        let _bo = join(&mut session, "Bo");
        assert_eq!(session.players().len(), 2);
        assert_eq!(session.players()[0].name.as_str(), "Ana");
        assert_eq!(session.players()[1].name.as_str(), "Bo");
    }

    #[test]
    fn join_rejects_connected_duplicate_case_insensitively() {
        let (mut session, _host) = make_session();
        let _ana = join(&mut session, "Ana");
        let err = session
            .join(ConnectionId::new(), PlayerName::new("ANA"))
            .unwrap_err();
        assert_matches!(err, TriviaError::DuplicateName(_));
    }

    #[test]
    fn join_reclaims_disconnected_slot_with_score() {
        let (mut session, host) = make_session();
        let ana = join(&mut session, "Ana");
        session.start(&host).unwrap();
        let _ = session.submit_answer(&ana, "Paris").unwrap();
        assert_matches!(session.mark_disconnected(&ana), Some(DroppedRole::Player(_)));

        let fresh = ConnectionId::new();
        let outcome = session
            .join(fresh.clone(), PlayerName::new("ana"))
            .unwrap();
        assert_eq!(outcome, JoinOutcome::Reclaimed);
        let player = session.player_by_connection(&fresh).unwrap();
        assert_eq!(player.score, 1000);
    }

    #[test]
    fn removed_name_joins_fresh_at_zero() {
        let (mut session, host) = make_session();
        let ana = join(&mut session, "Ana");
        session.start(&host).unwrap();
        let _ = session.submit_answer(&ana, "Paris").unwrap();
        let _ = session.mark_disconnected(&ana);
        let _ = session.remove_player(&PlayerName::new("Ana")).unwrap();

        let outcome = session
            .join(ConnectionId::new(), PlayerName::new("Ana"))
            .unwrap();
        assert_eq!(outcome, JoinOutcome::Joined);
        assert_eq!(session.players()[0].score, 0);
    }

    // --- Start ---

    #[test]
    fn only_host_starts() {
        let (mut session, _host) = make_session();
        let ana = join(&mut session, "Ana");
        assert_matches!(session.start(&ana), Err(TriviaError::Unauthorized));
        assert_eq!(session.phase(), Phase::Lobby);
    }

    #[test]
    fn start_opens_first_question() {
        let (mut session, host) = make_session();
        let _ana = join(&mut session, "Ana");
        session.start(&host).unwrap();
        assert_eq!(session.phase(), Phase::Question);
        assert_eq!(session.current_index(), 0);
        let view = session.question_view().unwrap();
        assert_eq!(view.question_number, 1);
        assert_eq!(view.duration, 60);
    }

    #[test]
    fn start_twice_is_stale() {
        let (mut session, host) = make_session();
        session.start(&host).unwrap();
        assert_matches!(session.start(&host), Err(TriviaError::Stale));
    }

    // --- Answers ---

    #[tokio::test(start_paused = true)]
    async fn fast_correct_answer_scores_max() {
        let (mut session, host) = make_session();
        let ana = join(&mut session, "Ana");
        session.start(&host).unwrap();
        tokio::time::advance(std::time::Duration::from_secs(3)).await;

        let record = session.submit_answer(&ana, "Paris").unwrap();
        assert!(record.correct);
        assert_eq!(record.points, 1000);
        assert_eq!(record.score, 1000);
        assert!(record.all_answered);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_correct_answer_decays() {
        let (mut session, host) = make_session();
        let ana = join(&mut session, "Ana");
        session.start(&host).unwrap();
        tokio::time::advance(std::time::Duration::from_secs(35)).await;

        let record = session.submit_answer(&ana, "Paris").unwrap();
        assert_eq!(record.points, 500);
    }

    #[test]
    fn wrong_answer_scores_zero_but_counts() {
        let (mut session, host) = make_session();
        let ana = join(&mut session, "Ana");
        session.start(&host).unwrap();

        let record = session.submit_answer(&ana, "London").unwrap();
        assert!(!record.correct);
        assert_eq!(record.points, 0);
        assert_eq!(record.correct_answer, "Paris");
        assert!(session.players()[0].answered(0));
    }

    #[test]
    fn first_answer_wins_resubmission_is_stale() {
        let (mut session, host) = make_session();
        let ana = join(&mut session, "Ana");
        session.start(&host).unwrap();

        let first = session.submit_answer(&ana, "London").unwrap();
        assert_eq!(first.points, 0);
        assert_matches!(
            session.submit_answer(&ana, "Paris"),
            Err(TriviaError::Stale)
        );
        assert_eq!(session.players()[0].score, 0);
    }

    #[test]
    fn answer_from_unknown_connection_is_unauthorized() {
        let (mut session, host) = make_session();
        let _ana = join(&mut session, "Ana");
        session.start(&host).unwrap();
        assert_matches!(
            session.submit_answer(&ConnectionId::new(), "Paris"),
            Err(TriviaError::Unauthorized)
        );
    }

    #[test]
    fn answer_outside_question_phase_is_stale() {
        let (mut session, _host) = make_session();
        let ana = join(&mut session, "Ana");
        assert_matches!(
            session.submit_answer(&ana, "Paris"),
            Err(TriviaError::Stale)
        );
    }

    #[test]
    fn all_answered_only_counts_connected() {
        let (mut session, host) = make_session();
        let ana = join(&mut session, "Ana");
        let bo = join(&mut session, "Bo");
        session.start(&host).unwrap();

        let record = session.submit_answer(&ana, "Paris").unwrap();
        assert!(!record.all_answered);

        let _ = session.mark_disconnected(&bo);
        assert!(session.all_connected_answered());
    }

    // --- Close / advance ---

    #[test]
    fn close_backfills_missing_answers_with_zero() {
        let (mut session, host) = make_session();
        let ana = join(&mut session, "Ana");
        let _bo = join(&mut session, "Bo");
        session.start(&host).unwrap();
        let _ = session.submit_answer(&ana, "Paris").unwrap();

        session.close_question().unwrap();
        assert_eq!(session.phase(), Phase::Leaderboard);
        let bo = session.player_by_name(&PlayerName::new("Bo")).unwrap();
        assert!(bo.answered(0));
        assert_eq!(bo.score, 0);
        assert_eq!(bo.answer_elapsed_secs, Some(60.0));
    }

    #[test]
    fn score_total_never_decreases_across_transitions() {
        fn total(session: &Session) -> u32 {
            crate::projection::leaderboard(session)
                .iter()
                .map(|entry| entry.score)
                .sum()
        }

        let (mut session, host) = make_session();
        let ana = join(&mut session, "Ana");
        let bo = join(&mut session, "Bo");
        session.start(&host).unwrap();
        let mut previous = total(&session);

        let _ = session.submit_answer(&ana, "Paris").unwrap();
        assert!(total(&session) >= previous);
        previous = total(&session);

        // Bo never answers question 1; the close backfills a zero.
        session.close_question().unwrap();
        assert!(total(&session) >= previous);
        previous = total(&session);

        assert_eq!(session.advance().unwrap(), Advance::NextQuestion);
        let _ = session.submit_answer(&ana, "Venus").unwrap();
        let _ = session.submit_answer(&bo, "Mars").unwrap();
        session.close_question().unwrap();
        assert!(total(&session) >= previous);
        previous = total(&session);

        // Ride the remaining questions out unanswered.
        while session.advance().unwrap() == Advance::NextQuestion {
            session.close_question().unwrap();
            assert!(total(&session) >= previous);
            previous = total(&session);
        }
        assert_eq!(session.phase(), Phase::GameOver);
        assert!(total(&session) >= previous);
    }

    #[test]
    fn close_outside_question_is_stale() {
        let (mut session, _host) = make_session();
        assert_matches!(session.close_question(), Err(TriviaError::Stale));
    }

    #[test]
    fn advance_reopens_question_until_bank_exhausted() {
        let (mut session, host) = make_session();
        let _ana = join(&mut session, "Ana");
        session.start(&host).unwrap();
        let total = session.total_questions();

        for expected_index in 1..total {
            session.close_question().unwrap();
            assert_eq!(session.advance().unwrap(), Advance::NextQuestion);
            assert_eq!(session.current_index(), expected_index);
            assert_eq!(session.phase(), Phase::Question);
        }

        session.close_question().unwrap();
        assert_eq!(session.advance().unwrap(), Advance::Finished);
        assert_eq!(session.phase(), Phase::GameOver);
    }

    #[test]
    fn game_over_is_terminal() {
        let (mut session, host) = make_session();
        session.start(&host).unwrap();
        loop {
            session.close_question().unwrap();
            if session.advance().unwrap() == Advance::Finished {
                break;
            }
        }
        assert_matches!(session.advance(), Err(TriviaError::Stale));
        assert_matches!(session.close_question(), Err(TriviaError::Stale));
        assert_matches!(session.start(&host), Err(TriviaError::Stale));
    }

    // --- Reconnect bookkeeping ---

    #[test]
    fn host_disconnect_and_rebind() {
        let (mut session, host) = make_session();
        assert_matches!(session.mark_disconnected(&host), Some(DroppedRole::Host));
        assert!(!session.host_connected());

        let fresh = ConnectionId::new();
        session.rebind_host(fresh.clone());
        assert!(session.host_connected());
        assert!(session.is_host(&fresh));
        assert!(!session.is_host(&host));
    }

    #[test]
    fn player_rebind_preserves_answer_state() {
        let (mut session, host) = make_session();
        let ana = join(&mut session, "Ana");
        session.start(&host).unwrap();
        let _ = session.submit_answer(&ana, "Paris").unwrap();
        let _ = session.mark_disconnected(&ana);

        let fresh = ConnectionId::new();
        let player = session
            .rebind_player(&PlayerName::new("ana"), fresh.clone())
            .unwrap();
        assert_eq!(player.score, 1000);
        assert!(player.answered(0));
    }

    #[test]
    fn rebind_unknown_player_fails() {
        let (mut session, _host) = make_session();
        assert_matches!(
            session.rebind_player(&PlayerName::new("ghost"), ConnectionId::new()),
            Err(TriviaError::PlayerNotFound(_))
        );
    }

    #[test]
    fn mark_disconnected_unknown_connection_is_none() {
        let (mut session, _host) = make_session();
        assert_eq!(session.mark_disconnected(&ConnectionId::new()), None);
    }

    // --- Epoch / timers ---

    #[test]
    fn transitions_bump_epoch() {
        let (mut session, host) = make_session();
        let e0 = session.epoch();
        session.start(&host).unwrap();
        let e1 = session.epoch();
        assert!(e1 > e0);
        session.close_question().unwrap();
        assert!(session.epoch() > e1);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_holds_through_the_fractional_final_second() {
        let (mut session, host) = make_session();
        let _ana = join(&mut session, "Ana");
        session.start(&host).unwrap();

        tokio::time::advance(Duration::from_millis(59_500)).await;
        assert_eq!(session.seconds_remaining(), Some(0));
        assert!(!session.deadline_passed());

        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(session.deadline_passed());
    }

    #[test]
    fn replacing_a_timer_cancels_the_old_token() {
        let (mut session, _host) = make_session();
        let old = CancellationToken::new();
        session.set_question_timer(old.clone());
        session.set_question_timer(CancellationToken::new());
        assert!(old.is_cancelled());
    }

    #[test]
    fn close_question_cancels_question_timer() {
        let (mut session, host) = make_session();
        session.start(&host).unwrap();
        let token = CancellationToken::new();
        session.set_question_timer(token.clone());
        session.close_question().unwrap();
        assert!(token.is_cancelled());
    }
}
