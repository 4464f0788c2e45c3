//! In-memory channel doubles driven by a shared script

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use super::transport::{Connector, ControlSink, Lobby, StateFeed, StateMessage};
use super::TransportError;

#[derive(Default)]
struct Script {
    replies: VecDeque<Bytes>,
    feeds: VecDeque<ScriptedFeed>,
    requests: Vec<Bytes>,
    subscriptions: Vec<String>,
    sent: Vec<String>,
    feeds_closed: usize,
    controls_closed: usize,
    lobby_connects: usize,
    /// Lobby requests block instead of closing once replies run out
    silent_lobby: bool,
    /// Lobby connects never complete
    stalled_lobby: bool,
}

struct ScriptedFeed {
    messages: VecDeque<StateMessage>,
    /// Block instead of reporting a closed channel once drained
    hang: bool,
}

/// Connector whose lobby replies and state broadcasts are queued up front
#[derive(Clone, Default)]
pub struct MemoryConnector {
    script: Arc<Mutex<Script>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, reply: &str) {
        self.script
            .lock()
            .unwrap()
            .replies
            .push_back(Bytes::copy_from_slice(reply.as_bytes()));
    }

    /// Queue the broadcasts seen by the next subscription; the feed closes
    /// once they are drained
    pub fn push_feed(&self, messages: &[(&str, &str)]) {
        self.push(messages, false);
    }

    /// Like [`push_feed`](Self::push_feed) but the feed blocks forever once
    /// drained
    pub fn push_hanging_feed(&self, messages: &[(&str, &str)]) {
        self.push(messages, true);
    }

    fn push(&self, messages: &[(&str, &str)], hang: bool) {
        let messages = messages
            .iter()
            .map(|(tag, payload)| StateMessage {
                tag: Bytes::copy_from_slice(tag.as_bytes()),
                payload: Bytes::copy_from_slice(payload.as_bytes()),
            })
            .collect();
        self.script
            .lock()
            .unwrap()
            .feeds
            .push_back(ScriptedFeed { messages, hang });
    }

    /// Leave lobby requests unanswered once the queued replies are used up
    pub fn silence_lobby(&self) {
        self.script.lock().unwrap().silent_lobby = true;
    }

    /// Make every lobby connect hang
    pub fn stall_lobby(&self) {
        self.script.lock().unwrap().stalled_lobby = true;
    }

    pub fn lobby_connects(&self) -> usize {
        self.script.lock().unwrap().lobby_connects
    }

    pub fn requests(&self) -> Vec<serde_json::Value> {
        self.script
            .lock()
            .unwrap()
            .requests
            .iter()
            .map(|r| serde_json::from_slice(r).unwrap())
            .collect()
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.script.lock().unwrap().subscriptions.clone()
    }

    pub fn sent(&self) -> Vec<String> {
        self.script.lock().unwrap().sent.clone()
    }

    /// (feeds closed, control channels closed)
    pub fn closed(&self) -> (usize, usize) {
        let script = self.script.lock().unwrap();
        (script.feeds_closed, script.controls_closed)
    }
}

pub struct MemoryLobby {
    script: Arc<Mutex<Script>>,
}

impl Lobby for MemoryLobby {
    async fn request(&mut self, payload: Bytes) -> Result<Bytes, TransportError> {
        let (reply, silent) = {
            let mut script = self.script.lock().unwrap();
            script.requests.push(payload);
            (script.replies.pop_front(), script.silent_lobby)
        };
        match reply {
            Some(reply) => Ok(reply),
            None if silent => std::future::pending().await,
            None => Err(TransportError::Closed),
        }
    }
}

pub struct MemoryFeed {
    script: Arc<Mutex<Script>>,
    filter: String,
    feed: ScriptedFeed,
}

impl StateFeed for MemoryFeed {
    async fn recv(&mut self) -> Result<StateMessage, TransportError> {
        while let Some(msg) = self.feed.messages.pop_front() {
            if msg.tag.starts_with(self.filter.as_bytes()) {
                return Ok(msg);
            }
        }
        if self.feed.hang {
            std::future::pending::<()>().await;
        }
        Err(TransportError::Closed)
    }

    async fn close(&mut self) {
        self.script.lock().unwrap().feeds_closed += 1;
    }
}

pub struct MemoryControl {
    script: Arc<Mutex<Script>>,
}

impl ControlSink for MemoryControl {
    async fn send(&mut self, line: &str) -> Result<(), TransportError> {
        self.script.lock().unwrap().sent.push(line.to_string());
        Ok(())
    }

    async fn close(&mut self) {
        self.script.lock().unwrap().controls_closed += 1;
    }
}

impl Connector for MemoryConnector {
    type Lobby = MemoryLobby;
    type Feed = MemoryFeed;
    type Control = MemoryControl;

    async fn lobby(&self) -> Result<MemoryLobby, TransportError> {
        let stalled = {
            let mut script = self.script.lock().unwrap();
            script.lobby_connects += 1;
            script.stalled_lobby
        };
        if stalled {
            std::future::pending::<()>().await;
        }
        Ok(MemoryLobby {
            script: self.script.clone(),
        })
    }

    async fn subscribe(&self, filter: &str) -> Result<MemoryFeed, TransportError> {
        let mut script = self.script.lock().unwrap();
        script.subscriptions.push(filter.to_string());
        let feed = script.feeds.pop_front().ok_or(TransportError::Closed)?;
        Ok(MemoryFeed {
            script: self.script.clone(),
            filter: filter.to_string(),
            feed,
        })
    }

    async fn control(&self) -> Result<MemoryControl, TransportError> {
        Ok(MemoryControl {
            script: self.script.clone(),
        })
    }
}
