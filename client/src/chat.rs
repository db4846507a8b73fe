//! Bounded, self-expiring chat history.

use shared::MAX_CHAT_LEN;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub struct ChatLine {
    pub sender: String,
    pub text: String,
    pub received_at: Instant,
}

#[derive(Debug)]
pub struct ChatLog {
    lines: VecDeque<ChatLine>,
    capacity: usize,
    lifetime: Duration,
}

impl ChatLog {
    pub fn new(capacity: usize, lifetime: Duration) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
            lifetime,
        }
    }

    pub fn push(&mut self, sender: String, text: String, now: Instant) {
        if self.capacity == 0 {
            return;
        }
        self.lines.push_back(ChatLine {
            sender,
            text,
            received_at: now,
        });
        while self.lines.len() > self.capacity {
            self.lines.pop_front();
        }
    }

    /// Drops lines older than the lifetime.
    pub fn prune(&mut self, now: Instant) {
        let lifetime = self.lifetime;
        self.lines
            .retain(|line| now.saturating_duration_since(line.received_at) < lifetime);
    }

    pub fn lines(&self) -> impl Iterator<Item = &ChatLine> {
        self.lines.iter()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

pub fn sender_name(player_name: Option<&str>, player_id: Option<&str>) -> String {
    player_name
        .filter(|name| !name.is_empty())
        .or(player_id.filter(|id| !id.is_empty()))
        .unwrap_or("Anonymous")
        .to_string()
}

/// Trims and caps outgoing text. `None` means there is nothing to send.
pub fn prepare_outgoing(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_CHAT_LEN).collect())
}
