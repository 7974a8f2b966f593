//! Append-only activity log for one pipeline run, with pluggable observers.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::curriculum::models::AgentLogEntry;

/// Observer notified of every entry as it is appended.
pub trait LogSink: Send + Sync {
    fn record(&self, entry: &AgentLogEntry);
}

/// Default sink: one structured tracing event per entry.
pub struct TracingSink;

impl LogSink for TracingSink {
    fn record(&self, entry: &AgentLogEntry) {
        info!(agent = %entry.agent_name, "{}", entry.action);
    }
}

/// Entries in emission order plus the sinks that observe them.
pub struct ActivityLog {
    entries: Vec<AgentLogEntry>,
    sinks: Vec<Arc<dyn LogSink>>,
}

impl ActivityLog {
    pub fn new(sinks: Vec<Arc<dyn LogSink>>) -> Self {
        Self {
            entries: Vec::new(),
            sinks,
        }
    }

    pub fn log(&mut self, agent: &str, action: impl Into<String>) {
        let entry = AgentLogEntry {
            agent_name: agent.to_string(),
            action: action.into(),
            timestamp: Utc::now(),
        };
        for sink in &self.sinks {
            sink.record(&entry);
        }
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[AgentLogEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<AgentLogEntry> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectingSink(Mutex<Vec<String>>);

    impl LogSink for CollectingSink {
        fn record(&self, entry: &AgentLogEntry) {
            self.0.lock().unwrap().push(entry.agent_name.clone());
        }
    }

    #[test]
    fn test_entries_keep_emission_order() {
        let mut log = ActivityLog::new(vec![]);
        log.log("Market Analyst", "one");
        log.log("Architect", "two");
        let entries = log.into_entries();
        assert_eq!(entries[0].action, "one");
        assert_eq!(entries[1].agent_name, "Architect");
        assert!(entries[0].timestamp <= entries[1].timestamp);
    }

    #[test]
    fn test_every_sink_sees_every_entry() {
        let sink = Arc::new(CollectingSink::default());
        let sinks: Vec<Arc<dyn LogSink>> = vec![sink.clone() as Arc<dyn LogSink>, Arc::new(TracingSink)];
        let mut log = ActivityLog::new(sinks);
        log.log("Curator", "a");
        log.log("Critic", "b");
        assert_eq!(*sink.0.lock().unwrap(), vec!["Curator", "Critic"]);
        assert_eq!(log.entries().len(), 2);
    }
}
