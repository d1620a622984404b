//! Supervisor statistics
//!
//! Mutex-guarded counters updated by the scanner loop and the workers. The
//! status publisher takes a consistent snapshot under the lock and does its
//! file IO outside it.

use chrono::{DateTime, Utc};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct Counters {
    discovered: u64,
    completed: u64,
    failed: u64,
    retried: u64,
    last_activity: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct StatsCollector {
    counters: Mutex<Counters>,
    start_time: DateTime<Utc>,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub uptime_seconds: u64,
    pub tasks_discovered: u64,
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    pub tasks_retried: u64,
    pub success_rate: f64,
    pub last_activity: Option<DateTime<Utc>>,
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(Counters::default()),
            start_time: Utc::now(),
        }
    }

    pub fn record_discovery(&self) {
        let mut counters = self.counters.lock().unwrap();
        counters.discovered += 1;
        counters.last_activity = Some(Utc::now());
    }

    pub fn record_completion(&self) {
        let mut counters = self.counters.lock().unwrap();
        counters.completed += 1;
        counters.last_activity = Some(Utc::now());
    }

    pub fn record_failure(&self) {
        let mut counters = self.counters.lock().unwrap();
        counters.failed += 1;
        counters.last_activity = Some(Utc::now());
    }

    pub fn record_retry(&self) {
        let mut counters = self.counters.lock().unwrap();
        counters.retried += 1;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let counters = self.counters.lock().unwrap();
        let uptime = (Utc::now() - self.start_time).num_seconds().max(0) as u64;
        let success_rate =
            (counters.completed as f64 / counters.discovered.max(1) as f64) * 100.0;

        StatsSnapshot {
            uptime_seconds: uptime,
            tasks_discovered: counters.discovered,
            tasks_completed: counters.completed,
            tasks_failed: counters.failed,
            tasks_retried: counters.retried,
            success_rate,
            last_activity: counters.last_activity,
        }
    }
}
