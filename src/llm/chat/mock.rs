use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use super::{ChatClient, ChatError, CompletionRequest, CompletionResponse};

pub(crate) enum Step {
    Reply(String),
    Fail(ChatError),
    /// Sleeps before replying, so a short enough attempt timeout fires first.
    Stall(Duration, String),
}

/// Backend that plays a fixed script and records every call it receives.
pub(crate) struct ScriptedClient {
    script: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<(Instant, CompletionRequest)>>,
}

impl ScriptedClient {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self {
            script: Mutex::new(steps.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn replying(text: &str) -> Self {
        Self::new(vec![Step::Reply(text.to_string())])
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(_, req)| req.prompt.clone()).collect()
    }

    pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().iter().map(|(_, req)| req.clone()).collect()
    }

    /// Time between consecutive calls.
    pub(crate) fn gaps(&self) -> Vec<Duration> {
        let calls = self.calls.lock().unwrap();
        calls.windows(2).map(|pair| pair[1].0 - pair[0].0).collect()
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, ChatError> {
        self.calls.lock().unwrap().push((Instant::now(), request.clone()));
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(text)) => Ok(CompletionResponse { response: text }),
            Some(Step::Fail(err)) => Err(err),
            Some(Step::Stall(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(CompletionResponse { response: text })
            }
            None => Err(ChatError::Other("script exhausted".into())),
        }
    }

    fn get_model(&self) -> String {
        "scripted".to_string()
    }

    fn get_base_url(&self) -> Option<String> {
        None
    }
}
