//! Serves recorded interactions back in order.

use std::collections::HashMap;

use super::format::{Cassette, Interaction};

#[derive(Debug, Clone, Hash, Eq, PartialEq)]
struct PortMethodKey {
    port: String,
    method: String,
}

/// Replays a cassette, one queue per port/method pair.
#[derive(Debug)]
pub struct CassetteReplayer {
    queues: HashMap<PortMethodKey, Vec<Interaction>>,
    cursors: HashMap<PortMethodKey, usize>,
}

impl CassetteReplayer {
    /// Index a loaded cassette by port and method.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<PortMethodKey, Vec<Interaction>> = HashMap::new();
        for interaction in &cassette.interactions {
            let key = PortMethodKey { port: interaction.port.clone(), method: interaction.method.clone() };
            queues.entry(key).or_default().push(interaction.clone());
        }
        let cursors = queues.keys().map(|k| (k.clone(), 0)).collect();
        Self { queues, cursors }
    }

    /// Next unconsumed interaction for `port`/`method`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pair was never recorded or its queue is used up.
    pub fn next_interaction(&mut self, port: &str, method: &str) -> Result<&Interaction, String> {
        let key = PortMethodKey { port: port.to_string(), method: method.to_string() };

        let Some(queue) = self.queues.get(&key) else {
            let mut available: Vec<String> = self.queues.keys().map(|k| format!("{}::{}", k.port, k.method)).collect();
            available.sort();
            return Err(format!(
                "Cassette has no interactions recorded for {port}::{method}. Available: [{}]",
                available.join(", ")
            ));
        };

        let cursor = self.cursors.entry(key).or_insert(0);
        let interaction = queue.get(*cursor).ok_or_else(|| {
            format!("Cassette exhausted: all {} interactions for {port}::{method} have been consumed", queue.len())
        })?;
        *cursor += 1;
        Ok(interaction)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;

    fn interaction(seq: u64, method: &str) -> Interaction {
        Interaction {
            seq,
            port: "http_transport".into(),
            method: method.into(),
            input: json!({}),
            output: json!({"Ok": {"status": 200, "body": {}}}),
        }
    }

    fn cassette(interactions: Vec<Interaction>) -> Cassette {
        Cassette { name: "test".into(), recorded_at: Utc::now(), commit: "abc".into(), interactions }
    }

    #[test]
    fn replays_each_method_in_order() {
        let mut replayer = CassetteReplayer::new(&cassette(vec![
            interaction(0, "send"),
            interaction(1, "download"),
            interaction(2, "download"),
        ]));

        assert_eq!(replayer.next_interaction("http_transport", "download").unwrap().seq, 1);
        assert_eq!(replayer.next_interaction("http_transport", "send").unwrap().seq, 0);
        assert_eq!(replayer.next_interaction("http_transport", "download").unwrap().seq, 2);
    }

    #[test]
    fn exhausted_queue_is_an_error() {
        let mut replayer = CassetteReplayer::new(&cassette(vec![interaction(0, "send")]));
        replayer.next_interaction("http_transport", "send").unwrap();
        let err = replayer.next_interaction("http_transport", "send").unwrap_err();
        assert!(err.contains("Cassette exhausted"));
    }

    #[test]
    fn unknown_method_lists_available_pairs() {
        let mut replayer = CassetteReplayer::new(&cassette(vec![interaction(0, "send")]));
        let err = replayer.next_interaction("http_transport", "download").unwrap_err();
        assert!(err.contains("no interactions recorded"));
        assert!(err.contains("http_transport::send"));
    }
}
