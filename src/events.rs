//! Fan-out event stream for test lifecycle and live metrics.
use serde::Serialize;
use tokio::sync::broadcast;

use crate::config::LoadTestConfig;
use crate::metrics::{LiveSnapshot, Phase};
use crate::report::TestResult;

pub type EventSender = broadcast::Sender<TestEvent>;
pub type EventReceiver = broadcast::Receiver<TestEvent>;

/// Every test yields exactly one terminal event, `Complete` or `Error`.
/// A user stop emits `Stopped` immediately before its `Complete`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TestEvent {
    Started {
        #[serde(rename = "testId")]
        test_id: String,
        config: Box<LoadTestConfig>,
    },
    Metrics {
        #[serde(rename = "testId")]
        test_id: String,
        #[serde(flatten)]
        snapshot: LiveSnapshot,
    },
    Progress {
        #[serde(rename = "testId")]
        test_id: String,
        progress: u8,
        phase: Phase,
        elapsed: u64,
        concurrency: u64,
    },
    Complete {
        #[serde(rename = "testId")]
        test_id: String,
        results: Box<TestResult>,
    },
    Error {
        #[serde(rename = "testId")]
        test_id: String,
        error: String,
    },
    Stopped {
        #[serde(rename = "testId")]
        test_id: String,
    },
}

impl TestEvent {
    #[must_use]
    pub fn test_id(&self) -> &str {
        match self {
            TestEvent::Started { test_id, .. }
            | TestEvent::Metrics { test_id, .. }
            | TestEvent::Progress { test_id, .. }
            | TestEvent::Complete { test_id, .. }
            | TestEvent::Error { test_id, .. }
            | TestEvent::Stopped { test_id } => test_id,
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, TestEvent::Complete { .. } | TestEvent::Error { .. })
    }
}

#[must_use]
pub fn event_channel(capacity: usize) -> EventSender {
    let (sender, _receiver) = broadcast::channel(capacity.max(1));
    sender
}

/// Publishes an event. Having no subscribers is not an error.
pub fn publish(sender: &EventSender, event: TestEvent) {
    if sender.send(event).is_err() {
        tracing::trace!("No event subscribers");
    }
}
