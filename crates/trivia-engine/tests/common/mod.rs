//! Shared test harness: a transport that records every outbound event.

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;

use trivia_core::events::{QuestionView, ServerEvent};
use trivia_core::ids::ConnectionId;
use trivia_engine::broadcast::{Channel, Transport};
use trivia_engine::question::sample_questions;

/// Records every publish/send as a `(target, event)` pair. Channel publishes
/// are keyed by channel name, direct sends by `conn:<id>`.
pub struct RecordingTransport {
    events: Mutex<Vec<(String, ServerEvent)>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }

    pub fn all(&self) -> Vec<(String, ServerEvent)> {
        self.events.lock().clone()
    }

    /// Events delivered to one target, in order.
    pub fn events_for(&self, target: &str) -> Vec<ServerEvent> {
        self.events
            .lock()
            .iter()
            .filter(|(t, _)| t == target)
            .map(|(_, e)| e.clone())
            .collect()
    }

    /// Direct replies sent to one connection, in order.
    pub fn replies_to(&self, connection: &ConnectionId) -> Vec<ServerEvent> {
        self.events_for(&format!("conn:{connection}"))
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// The code from the first `gameCreated` reply.
    pub fn created_code(&self) -> String {
        self.events
            .lock()
            .iter()
            .find_map(|(_, e)| match e {
                ServerEvent::GameCreated { game_id } => Some(game_id.as_str().to_string()),
                _ => None,
            })
            .expect("gameCreated reply")
    }

    /// The most recent question broadcast to a channel.
    pub fn last_question(&self, target: &str) -> QuestionView {
        self.events
            .lock()
            .iter()
            .rev()
            .find_map(|(t, e)| match e {
                ServerEvent::NewQuestion(view) if t == target => Some(view.clone()),
                _ => None,
            })
            .expect("newQuestion broadcast")
    }
}

impl Transport for RecordingTransport {
    fn publish(&self, channel: &Channel, event: &ServerEvent) {
        self.events.lock().push((channel.name(), event.clone()));
    }

    fn send(&self, connection: &ConnectionId, event: &ServerEvent) {
        self.events
            .lock()
            .push((format!("conn:{connection}"), event.clone()));
    }

    fn subscribe(&self, _connection: &ConnectionId, _channel: &Channel) {}

    fn unsubscribe(&self, _connection: &ConnectionId, _channel: &Channel) {}
}

/// Look up the authored correct option for a question the engine dealt.
/// The bank is shuffled per game, so tests resolve answers by text.
pub fn correct_answer_for(question_text: &str) -> String {
    sample_questions()
        .into_iter()
        .find(|q| q.text == question_text)
        .map(|q| q.correct_option)
        .expect("question from the sample bank")
}
