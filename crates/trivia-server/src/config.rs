//! Server configuration.

/// Bind address and runtime tunables.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host to bind.
    pub host: String,
    /// Port to bind (0 for auto-assign).
    pub port: u16,
    /// Per-connection outbound message buffer.
    pub send_buffer: usize,
    /// Seconds a question stays open.
    pub question_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            send_buffer: 256,
            question_secs: trivia_core::constants::QUESTION_SECONDS,
        }
    }
}
