//! Scripted renderer for orchestrator tests
//!
//! Serves canned responses per URL and counts every render call, so tests
//! can assert not just what ended up in the dataset but which pages were
//! fetched, and how often.

use crate::render::{PageRenderer, RenderError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Shared render-call counter
///
/// Cloned out of the renderer before it moves into a harvester, so the
/// test can inspect counts after the run.
#[derive(Clone, Default)]
pub(crate) struct CallLog {
    counts: Arc<Mutex<HashMap<String, u32>>>,
}

impl CallLog {
    pub fn count(&self, url: &str) -> u32 {
        *self.counts.lock().unwrap().get(url).unwrap_or(&0)
    }

    pub fn total(&self) -> u32 {
        self.counts.lock().unwrap().values().sum()
    }

    fn bump(&self, url: &str) {
        *self
            .counts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_insert(0) += 1;
    }
}

enum Script {
    Always(String),
    AlwaysFail(String),
    /// Responses served in order; the last entry repeats
    Sequence(Vec<Result<String, String>>),
}

pub(crate) struct ScriptedRenderer {
    scripts: HashMap<String, Script>,
    served: HashMap<String, usize>,
    pub log: CallLog,
}

impl ScriptedRenderer {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            served: HashMap::new(),
            log: CallLog::default(),
        }
    }

    /// Always answer `url` with `body`
    pub fn on(mut self, url: &str, body: &str) -> Self {
        self.scripts
            .insert(url.to_string(), Script::Always(body.to_string()));
        self
    }

    /// Always fail `url` with a navigation error
    pub fn on_failing(mut self, url: &str, message: &str) -> Self {
        self.scripts
            .insert(url.to_string(), Script::AlwaysFail(message.to_string()));
        self
    }

    /// Answer `url` with the given responses in order; `Err` entries
    /// become navigation errors
    pub fn on_sequence(mut self, url: &str, responses: Vec<Result<String, String>>) -> Self {
        assert!(!responses.is_empty(), "sequence needs at least one response");
        self.scripts
            .insert(url.to_string(), Script::Sequence(responses));
        self
    }
}

#[async_trait]
impl PageRenderer for ScriptedRenderer {
    async fn render(&mut self, url: &str) -> Result<String, RenderError> {
        self.log.bump(url);
        match self.scripts.get(url) {
            Some(Script::Always(body)) => Ok(body.clone()),
            Some(Script::AlwaysFail(message)) => Err(RenderError::Navigation {
                url: url.to_string(),
                message: message.clone(),
            }),
            Some(Script::Sequence(responses)) => {
                let index = self.served.entry(url.to_string()).or_insert(0);
                let response = responses
                    .get(*index)
                    .or_else(|| responses.last())
                    .cloned()
                    .unwrap();
                *index += 1;
                response.map_err(|message| RenderError::Navigation {
                    url: url.to_string(),
                    message,
                })
            }
            None => Err(RenderError::Navigation {
                url: url.to_string(),
                message: "no scripted response".to_string(),
            }),
        }
    }
}
