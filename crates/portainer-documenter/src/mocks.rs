//! Mock collector for driving runs without a Portainer instance.
//!
//! Enabled with the `test-support` feature:
//!
//! ```toml
//! [dev-dependencies]
//! portainer-documenter = { path = "...", features = ["test-support"] }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::{document::Document, error::CollectError, targets::Target, traits::Collector};

#[derive(Debug, Clone)]
enum Scripted {
    Auth,
    Connectivity,
    Partial(Vec<String>),
}

#[derive(Default)]
struct State {
    scripted: HashMap<String, Scripted>,
    calls: Vec<String>,
}

/// Succeeds for every target unless told otherwise, and records each call.
///
/// A successful document carries one endpoint and one stack so rendered
/// reports are not empty.
#[derive(Clone, Default)]
pub struct MockCollector {
    state: Arc<Mutex<State>>,
    delay: Option<Duration>,
}

impl MockCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `collect` sleeps for `delay` on the tokio timer first.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fail_auth(&self, target: &str) {
        self.script(target, Scripted::Auth);
    }

    pub fn fail_connectivity(&self, target: &str) {
        self.script(target, Scripted::Connectivity);
    }

    pub fn partial(&self, target: &str, missing: &[&str]) {
        let missing = missing.iter().map(|s| s.to_string()).collect();
        self.script(target, Scripted::Partial(missing));
    }

    /// Clears any scripted failure for `target`.
    pub fn succeed(&self, target: &str) {
        self.state.lock().unwrap().scripted.remove(target);
    }

    /// Target names in the order `collect` was entered.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    fn script(&self, target: &str, scripted: Scripted) {
        self.state
            .lock()
            .unwrap()
            .scripted
            .insert(target.to_string(), scripted);
    }
}

fn sample_document(target: &Target) -> Document {
    let mut document = Document::empty(
        target.name(),
        target.base_url().as_str(),
        DateTime::<Utc>::UNIX_EPOCH,
    );
    document.data.status = Some(json!({"Version": "2.19.4"}));
    document.data.endpoints = vec![json!({"Id": 1, "Name": "local", "Type": 1})];
    document.data.stacks = vec![json!({"Id": 1, "Name": "web", "EndpointId": 1})];
    document
}

impl Collector for MockCollector {
    async fn collect(&self, target: &Target) -> Result<Document, CollectError> {
        let scripted = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(target.name().to_string());
            state.scripted.get(target.name()).cloned()
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match scripted {
            None => Ok(sample_document(target)),
            Some(Scripted::Auth) => Err(CollectError::Auth(format!(
                "token rejected by {}",
                target.base_url()
            ))),
            Some(Scripted::Connectivity) => Err(CollectError::Connectivity(format!(
                "{} unreachable",
                target.base_url()
            ))),
            Some(Scripted::Partial(missing)) => Err(CollectError::PartialData {
                document: Box::new(sample_document(target)),
                missing,
            }),
        }
    }
}
