//! In-memory collaborators for notification tests.

use super::{DeliveryChannel, DeliveryError, Message, StoreError, SubscriptionStore};
use crate::entities::{DeliveryAttempt, Subscription};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

pub(crate) const A: &str = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";
pub(crate) const B: &str = "7GCihgDB8fe6KNjn2MYtkzZcRjQy3t9GHdC8uHYmW2hr";

#[derive(Default)]
pub(crate) struct MemoryStore {
    pub(crate) subscriptions: Vec<Subscription>,
    pub(crate) failing_addresses: Vec<String>,
    pub(crate) failing_log_inserts: bool,
    pub(crate) logs: Mutex<Vec<DeliveryAttempt>>,
}

impl MemoryStore {
    pub(crate) fn with(mut self, id: i64, address: &str, target: &str, prefs: &[(&str, bool)]) -> Self {
        self.subscriptions.push(Subscription {
            id,
            address: address.to_string(),
            target: target.to_string(),
            preferences: prefs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        });
        self
    }

    pub(crate) fn logs(&self) -> Vec<DeliveryAttempt> {
        self.logs.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn find_by_address(&self, address: &str) -> Result<Vec<Subscription>, StoreError> {
        if self.failing_addresses.iter().any(|a| a == address) {
            return Err(StoreError::Backend("connection reset".to_string()));
        }
        Ok(self
            .subscriptions
            .iter()
            .filter(|s| s.address == address)
            .cloned()
            .collect())
    }

    async fn insert_delivery_log(&self, attempt: DeliveryAttempt) -> Result<(), StoreError> {
        if self.failing_log_inserts {
            return Err(StoreError::Backend("disk full".to_string()));
        }
        self.logs.lock().unwrap().push(attempt);
        Ok(())
    }
}

/// Replays scripted results per target, succeeding once a script runs out.
#[derive(Default)]
pub(crate) struct ScriptedChannel {
    scripts: Mutex<HashMap<String, VecDeque<Result<(), DeliveryError>>>>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedChannel {
    pub(crate) fn script(self, target: &str, results: Vec<Result<(), DeliveryError>>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(target.to_string(), results.into());
        self
    }

    pub(crate) fn calls_to(&self, target: &str) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == target)
            .map(|(_, at)| *at)
            .collect()
    }
}

#[async_trait]
impl DeliveryChannel for ScriptedChannel {
    async fn send_to_target(&self, target: &str, _: &Message) -> Result<(), DeliveryError> {
        self.calls
            .lock()
            .unwrap()
            .push((target.to_string(), Instant::now()));
        self.scripts
            .lock()
            .unwrap()
            .get_mut(target)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Ok(()))
    }
}

/// Succeeds after `latency`, recording the peak number of concurrent sends.
pub(crate) struct SlowChannel {
    latency: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    sent: AtomicUsize,
}

impl SlowChannel {
    pub(crate) fn new(latency: Duration) -> Self {
        Self {
            latency,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            sent: AtomicUsize::new(0),
        }
    }

    pub(crate) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub(crate) fn sent(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeliveryChannel for SlowChannel {
    async fn send_to_target(&self, _: &str, _: &Message) -> Result<(), DeliveryError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
