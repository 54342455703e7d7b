//! The closed wire-event vocabulary.
//!
//! Two event families:
//!
//! - **[`ClientEvent`]**: inbound, connection → orchestrator. Parsed at the
//!   transport boundary; malformed payloads never reach the state machine.
//! - **[`ServerEvent`]**: outbound, orchestrator → connections. Everything a
//!   client can receive, including direct replies and channel broadcasts.
//!
//! Both are internally tagged by event name and use camelCase field names on
//! the wire. Game codes arrive as raw strings and are normalized (uppercased)
//! before lookup, so clients can type codes in any case.

use serde::{Deserialize, Serialize};

use crate::ids::GameCode;

/// Session state-machine phase.
///
/// Transitions only ever follow Lobby → Question → Leaderboard →
/// {Question | GameOver}; GameOver is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Players are joining; the game has not started.
    Lobby,
    /// A question is open and the countdown is running.
    Question,
    /// Standings are displayed between questions.
    Leaderboard,
    /// The final question has closed. Terminal.
    GameOver,
}

/// An open question as presented to clients. Never carries the answer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    /// Question text.
    pub question: String,
    /// Answer options, in authored order.
    pub options: Vec<String>,
    /// 1-based position within the game.
    pub question_number: usize,
    /// Total questions in the game.
    pub total_questions: usize,
    /// Seconds the question stays open.
    pub duration: u64,
}

/// One leaderboard row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// Display name.
    pub name: String,
    /// Running score.
    pub score: u32,
}

/// Per-player line in the monitor projection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorPlayer {
    /// Display name.
    pub name: String,
    /// Running score.
    pub score: u32,
    /// Whether the player currently has a live connection.
    pub is_connected: bool,
    /// Whether the player has answered the active question.
    pub answered_current_question: bool,
}

/// Read-only projection pushed to the monitor channel on every
/// state-affecting event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorSnapshot {
    /// Current phase.
    pub phase: Phase,
    /// Active question index (absent in the lobby).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_index: Option<usize>,
    /// Total questions in the game.
    pub total_questions: usize,
    /// Players sorted by score descending.
    pub players: Vec<MonitorPlayer>,
}

/// Resync payload for a host that reconnected within its grace window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostResync {
    /// The game being rejoined.
    pub game_id: GameCode,
    /// Current phase.
    pub phase: Phase,
    /// The open question, if one is active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
    /// Seconds left on the active question.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds_remaining: Option<u64>,
    /// Current standings.
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Resync payload for a player that reconnected within its grace window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResync {
    /// The game being rejoined.
    pub game_id: GameCode,
    /// Current phase.
    pub phase: Phase,
    /// The open question, if one is active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
    /// Seconds left on the active question.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds_remaining: Option<u64>,
    /// The player's preserved score.
    pub score: u32,
    /// Whether the player already answered the active question.
    pub answered_current_question: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// ClientEvent — inbound
// ─────────────────────────────────────────────────────────────────────────────

/// Events a connection may send to the orchestrator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Create a new game; the sender becomes its host.
    #[serde(rename = "createGame")]
    CreateGame,

    /// Reclaim the host seat of an existing game.
    #[serde(rename = "reconnectHost")]
    ReconnectHost {
        /// Target game code (any case).
        #[serde(rename = "gameId")]
        game_id: String,
    },

    /// Join a game as a player.
    #[serde(rename = "joinGame")]
    JoinGame {
        /// Target game code (any case).
        #[serde(rename = "gameId")]
        game_id: String,
        /// Display name; unique case-insensitively among connected players.
        #[serde(rename = "playerName")]
        player_name: String,
    },

    /// Reclaim an existing roster slot after a disconnect.
    #[serde(rename = "reconnectPlayer")]
    ReconnectPlayer {
        /// Target game code (any case).
        #[serde(rename = "gameId")]
        game_id: String,
        /// The name originally joined under.
        #[serde(rename = "playerName")]
        player_name: String,
    },

    /// Start the game (host only, lobby only).
    #[serde(rename = "startGame")]
    StartGame {
        /// Target game code.
        #[serde(rename = "gameId")]
        game_id: String,
    },

    /// Answer the active question. First answer per question counts.
    #[serde(rename = "submitAnswer")]
    SubmitAnswer {
        /// Target game code.
        #[serde(rename = "gameId")]
        game_id: String,
        /// The chosen option, matched exactly against the correct one.
        answer: String,
    },

    /// Advance past the leaderboard (host only).
    #[serde(rename = "nextQuestion")]
    NextQuestion {
        /// Target game code.
        #[serde(rename = "gameId")]
        game_id: String,
    },

    /// Force the active question closed (host only).
    #[serde(rename = "showLeaderboard")]
    ShowLeaderboard {
        /// Target game code.
        #[serde(rename = "gameId")]
        game_id: String,
    },

    /// Observe a game read-only on the monitor channel.
    #[serde(rename = "monitorGame")]
    MonitorGame {
        /// Target game code.
        #[serde(rename = "gameId")]
        game_id: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// ServerEvent — outbound
// ─────────────────────────────────────────────────────────────────────────────

/// Events the orchestrator emits to connections.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Reply to `createGame`.
    #[serde(rename = "gameCreated")]
    GameCreated {
        /// The new game's code.
        #[serde(rename = "gameId")]
        game_id: GameCode,
    },

    /// Reply to `joinGame`.
    #[serde(rename = "gameJoined")]
    GameJoined {
        /// The joined game's code.
        #[serde(rename = "gameId")]
        game_id: GameCode,
    },

    /// The game left the lobby.
    #[serde(rename = "gameStarted")]
    GameStarted,

    /// A question opened.
    #[serde(rename = "newQuestion")]
    NewQuestion(QuestionView),

    /// Once-per-second countdown while a question is open.
    #[serde(rename = "questionTimerUpdate")]
    QuestionTimerUpdate {
        /// Whole seconds left before the question closes.
        #[serde(rename = "secondsRemaining")]
        seconds_remaining: u64,
    },

    /// Private reply to `submitAnswer`.
    #[serde(rename = "answerResult")]
    AnswerResult {
        /// Whether the submitted option was correct.
        correct: bool,
        /// The correct option, revealed to the answerer.
        #[serde(rename = "correctAnswer")]
        correct_answer: String,
        /// Points awarded.
        points: u32,
    },

    /// Live host update when any player answers.
    #[serde(rename = "playerAnswered")]
    PlayerAnswered {
        /// Who answered.
        #[serde(rename = "playerName")]
        player_name: String,
        /// Whether they were correct.
        correct: bool,
        /// Their running score after this answer.
        score: u32,
    },

    /// Standings shown between questions.
    #[serde(rename = "leaderboardUpdate")]
    LeaderboardUpdate {
        /// Rows sorted by score descending, ties in join order.
        leaderboard: Vec<LeaderboardEntry>,
    },

    /// Final standings; the session is over.
    #[serde(rename = "gameOver")]
    GameOver {
        /// Final rows sorted by score descending.
        leaderboard: Vec<LeaderboardEntry>,
    },

    /// Host notification: a player joined the lobby.
    #[serde(rename = "playerJoined")]
    PlayerJoined {
        /// The new player's display name.
        #[serde(rename = "playerName")]
        player_name: String,
    },

    /// A player's grace period expired and they were removed.
    #[serde(rename = "playerLeft")]
    PlayerLeft {
        /// The removed player's display name.
        #[serde(rename = "playerName")]
        player_name: String,
    },

    /// The host's grace period expired; the game is being torn down.
    #[serde(rename = "hostLeft")]
    HostLeft,

    /// Monitor-channel state snapshot.
    #[serde(rename = "monitoringData")]
    MonitoringData(MonitorSnapshot),

    /// Reply to `reconnectHost`.
    #[serde(rename = "reconnectedAsHost")]
    ReconnectedAsHost(HostResync),

    /// Reply to `reconnectPlayer`.
    #[serde(rename = "reconnectedAsPlayer")]
    ReconnectedAsPlayer(PlayerResync),

    /// Surfaced failure (unknown game, duplicate name).
    #[serde(rename = "error")]
    Error {
        /// Human-readable message.
        message: String,
    },
}

impl ServerEvent {
    /// Wire name of this event, for logging.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::GameCreated { .. } => "gameCreated",
            Self::GameJoined { .. } => "gameJoined",
            Self::GameStarted => "gameStarted",
            Self::NewQuestion(_) => "newQuestion",
            Self::QuestionTimerUpdate { .. } => "questionTimerUpdate",
            Self::AnswerResult { .. } => "answerResult",
            Self::PlayerAnswered { .. } => "playerAnswered",
            Self::LeaderboardUpdate { .. } => "leaderboardUpdate",
            Self::GameOver { .. } => "gameOver",
            Self::PlayerJoined { .. } => "playerJoined",
            Self::PlayerLeft { .. } => "playerLeft",
            Self::HostLeft => "hostLeft",
            Self::MonitoringData(_) => "monitoringData",
            Self::ReconnectedAsHost(_) => "reconnectedAsHost",
            Self::ReconnectedAsPlayer(_) => "reconnectedAsPlayer",
            Self::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_events_parse_from_wire_format() {
        let event: ClientEvent = serde_json::from_value(json!({
            "type": "joinGame",
            "gameId": "ab12cd",
            "playerName": "Ana",
        }))
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::JoinGame {
                game_id: "ab12cd".into(),
                player_name: "Ana".into(),
            }
        );
    }

    #[test]
    fn create_game_needs_no_payload() {
        let event: ClientEvent = serde_json::from_value(json!({"type": "createGame"})).unwrap();
        assert_eq!(event, ClientEvent::CreateGame);
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        let result: Result<ClientEvent, _> =
            serde_json::from_value(json!({"type": "dropTables", "gameId": "X"}));
        assert!(result.is_err());
    }

    #[test]
    fn missing_field_is_rejected() {
        let result: Result<ClientEvent, _> =
            serde_json::from_value(json!({"type": "submitAnswer", "gameId": "AB12CD"}));
        assert!(result.is_err());
    }

    #[test]
    fn new_question_serializes_flat() {
        let event = ServerEvent::NewQuestion(QuestionView {
            question: "Capital of France?".into(),
            options: vec!["Paris".into(), "London".into()],
            question_number: 1,
            total_questions: 3,
            duration: 60,
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "newQuestion");
        assert_eq!(value["question"], "Capital of France?");
        assert_eq!(value["questionNumber"], 1);
        assert_eq!(value["totalQuestions"], 3);
        assert_eq!(value["duration"], 60);
    }

    #[test]
    fn answer_result_uses_camel_case() {
        let event = ServerEvent::AnswerResult {
            correct: true,
            correct_answer: "Paris".into(),
            points: 1000,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "answerResult");
        assert_eq!(value["correctAnswer"], "Paris");
        assert_eq!(value["points"], 1000);
    }

    #[test]
    fn monitor_snapshot_round_trips() {
        let event = ServerEvent::MonitoringData(MonitorSnapshot {
            phase: Phase::Question,
            question_index: Some(2),
            total_questions: 5,
            players: vec![MonitorPlayer {
                name: "Ana".into(),
                score: 1000,
                is_connected: true,
                answered_current_question: false,
            }],
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "monitoringData");
        assert_eq!(value["phase"], "question");
        assert_eq!(value["players"][0]["isConnected"], true);

        let back: ServerEvent = serde_json::from_value(value).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn phase_wire_names_are_camel_case() {
        assert_eq!(serde_json::to_value(Phase::Lobby).unwrap(), "lobby");
        assert_eq!(serde_json::to_value(Phase::GameOver).unwrap(), "gameOver");
    }

    #[test]
    fn lobby_resync_omits_question_fields() {
        let event = ServerEvent::ReconnectedAsHost(HostResync {
            game_id: GameCode::normalize("AB12CD"),
            phase: Phase::Lobby,
            question: None,
            seconds_remaining: None,
            leaderboard: vec![],
        });
        let value = serde_json::to_value(&event).unwrap();
        assert!(value.get("question").is_none());
        assert!(value.get("secondsRemaining").is_none());
    }
}
