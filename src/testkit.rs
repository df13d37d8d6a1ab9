//! Scripted transport doubles for exercising the synchronization
//! protocol without a server.

use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::transport::{Reply, Transport};

/// A [`Transport`] that records every command sent and answers from a
/// queue of scripted replies.
///
/// With no scripted reply queued, an empty array reply is returned,
/// which decodes as an empty [`QueryResult`](crate::QueryResult).
/// A scripted failure can be armed for a specific call to drive
/// error-path tests; the failing call is not recorded as sent.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Vec<(String, Vec<String>)>,
    replies: VecDeque<Reply>,
    fail_at: Option<usize>,
}

impl RecordingTransport {
    /// Creates an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply for a future `execute` call.
    pub fn enqueue(&mut self, reply: Reply) {
        self.replies.push_back(reply);
    }

    /// Arms a one-shot transport failure for the zero-based `nth`
    /// successful call position. The failure disarms once it fires, so
    /// a retry afterwards goes through.
    pub fn fail_on_call(&mut self, nth: usize) {
        self.fail_at = Some(nth);
    }

    /// Every `(command, args)` pair sent so far.
    pub fn sent(&self) -> &[(String, Vec<String>)] {
        &self.sent
    }

    /// The query texts of the graph-query commands sent so far.
    pub fn queries(&self) -> Vec<&str> {
        self.sent
            .iter()
            .filter(|(command, _)| command == "GRAPH.QUERY")
            .filter_map(|(_, args)| args.get(1))
            .map(String::as_str)
            .collect()
    }
}

impl Transport for RecordingTransport {
    fn execute(&mut self, command: &str, args: &[String]) -> Result<Reply> {
        if self.fail_at == Some(self.sent.len()) {
            self.fail_at = None;
            return Err(Error::Transport(format!(
                "scripted failure on call {}",
                self.sent.len()
            )));
        }
        self.sent.push((command.to_owned(), args.to_vec()));
        Ok(self.replies.pop_front().unwrap_or(Reply::Array(Vec::new())))
    }
}
