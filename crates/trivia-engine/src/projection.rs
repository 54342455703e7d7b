//! Read models derived from session state.
//!
//! Both projections sort by score descending. The sort is stable and the
//! roster iterates in join order, so ties resolve deterministically to the
//! earlier joiner — no hidden tiebreak key.

use trivia_core::events::{LeaderboardEntry, MonitorPlayer, MonitorSnapshot, Phase};

use crate::session::Session;

/// Standings over every player currently in the roster.
pub fn leaderboard(session: &Session) -> Vec<LeaderboardEntry> {
    let mut rows: Vec<LeaderboardEntry> = session
        .players()
        .iter()
        .map(|p| LeaderboardEntry {
            name: p.name.as_str().to_string(),
            score: p.score,
        })
        .collect();
    rows.sort_by(|a, b| b.score.cmp(&a.score));
    rows
}

/// The read-only snapshot pushed to the monitor channel.
pub fn monitor_snapshot(session: &Session) -> MonitorSnapshot {
    let current = session.current_index();
    let mut players: Vec<MonitorPlayer> = session
        .players()
        .iter()
        .map(|p| MonitorPlayer {
            name: p.name.as_str().to_string(),
            score: p.score,
            is_connected: p.connected,
            answered_current_question: p.answered(current),
        })
        .collect();
    players.sort_by(|a, b| b.score.cmp(&a.score));

    MonitorSnapshot {
        phase: session.phase(),
        question_index: (session.phase() != Phase::Lobby).then_some(current),
        total_questions: session.total_questions(),
        players,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trivia_core::ids::{ConnectionId, GameCode, PlayerName};

    use crate::question::{sample_questions, QuestionBank};

    fn session_with(names: &[&str]) -> (Session, Vec<ConnectionId>) {
        let host = ConnectionId::new();
        let mut session = Session::new(
            GameCode::normalize("AB12CD"),
            host.clone(),
            QuestionBank::ordered(sample_questions()),
            60,
        );
        let conns: Vec<ConnectionId> = names
            .iter()
            .map(|name| {
                let conn = ConnectionId::new();
                session.join(conn.clone(), PlayerName::new(name)).unwrap();
                conn
            })
            .collect();
        session.start(&host).unwrap();
        (session, conns)
    }

    #[test]
    fn leaderboard_sorts_by_score_descending() {
        let (mut session, conns) = session_with(&["Ana", "Bo", "Cy"]);
        let _ = session.submit_answer(&conns[1], "Paris").unwrap();
        let _ = session.submit_answer(&conns[0], "London").unwrap();

        let rows = leaderboard(&session);
        assert_eq!(rows[0].name, "Bo");
        assert_eq!(rows[0].score, 1000);
        assert_eq!(rows[1].score, 0);
    }

    #[test]
    fn leaderboard_ties_keep_join_order() {
        let (session, _conns) = session_with(&["Ana", "Bo", "Cy"]);
        let rows = leaderboard(&session);
        assert_eq!(rows[0].name, "Ana");
        assert_eq!(rows[1].name, "Bo");
        assert_eq!(rows[2].name, "Cy");
    }

    #[test]
    fn snapshot_reflects_connection_and_answer_state() {
        let (mut session, conns) = session_with(&["Ana", "Bo"]);
        let _ = session.submit_answer(&conns[0], "Paris").unwrap();
        let _ = session.mark_disconnected(&conns[1]);

        let snapshot = monitor_snapshot(&session);
        assert_eq!(snapshot.phase, Phase::Question);
        assert_eq!(snapshot.question_index, Some(0));
        let ana = snapshot.players.iter().find(|p| p.name == "Ana").unwrap();
        assert!(ana.answered_current_question);
        assert!(ana.is_connected);
        let bo = snapshot.players.iter().find(|p| p.name == "Bo").unwrap();
        assert!(!bo.is_connected);
        assert!(!bo.answered_current_question);
    }

    #[test]
    fn lobby_snapshot_has_no_question_index() {
        let host = ConnectionId::new();
        let session = Session::new(
            GameCode::normalize("AB12CD"),
            host,
            QuestionBank::ordered(sample_questions()),
            60,
        );
        let snapshot = monitor_snapshot(&session);
        assert_eq!(snapshot.phase, Phase::Lobby);
        assert_eq!(snapshot.question_index, None);
    }
}
