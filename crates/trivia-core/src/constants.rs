//! Timing windows and scoring defaults.

/// Seconds a question stays open before it auto-closes.
pub const QUESTION_SECONDS: u64 = 60;

/// Answers at or under this many seconds earn full points.
pub const FAST_ANSWER_SECONDS: u64 = 10;

/// Maximum points for a single question.
pub const MAX_POINTS: u32 = 1000;

/// Seconds the leaderboard is shown before auto-advancing.
pub const LEADERBOARD_SECONDS: u64 = 10;

/// Seconds a disconnected host or player may reconnect before removal.
pub const GRACE_SECONDS: u64 = 10;

/// Length of a generated game code.
pub const GAME_CODE_LEN: usize = 6;
