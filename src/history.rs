//! Bounded log of answered questions.
//!
//! The engine appends one record per accepted question. The log is a
//! ring buffer: once `capacity` is reached, the oldest record is
//! evicted. Rejected questions (empty, oversized) are never recorded.

use std::collections::VecDeque;
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::intent::Intent;

/// One answered question.
#[derive(Debug, Clone, Serialize)]
pub struct InteractionRecord {
    pub question: String,
    pub intent: Intent,
    pub confidence: f32,
    pub domain: String,
    /// Unix timestamp (seconds).
    pub answered_at: u64,
}

impl InteractionRecord {
    pub fn new(
        question: impl Into<String>,
        intent: Intent,
        confidence: f32,
        domain: impl Into<String>,
    ) -> Self {
        let answered_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            question: question.into(),
            intent,
            confidence,
            domain: domain.into(),
            answered_at,
        }
    }
}

/// Ring buffer of recent interactions, shared across queries.
#[derive(Debug)]
pub struct InteractionLog {
    records: RwLock<VecDeque<InteractionRecord>>,
    capacity: usize,
}

impl InteractionLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append a record, evicting the oldest once full.
    pub fn record(&self, record: InteractionRecord) {
        let mut records = self.records.write().expect("history lock poisoned");
        records.push_back(record);
        while records.len() > self.capacity {
            records.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().expect("history lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().expect("history lock poisoned").is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest-first copy of the current records.
    pub fn snapshot(&self) -> Vec<InteractionRecord> {
        self.records
            .read()
            .expect("history lock poisoned")
            .iter()
            .cloned()
            .collect()
    }
}
