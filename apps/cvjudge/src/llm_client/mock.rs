//! In-memory `TextGenerator` for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{LlmError, TextGenerator};

type Responder = Box<dyn Fn(&str) -> String + Send + Sync>;

enum Script {
    Queue(Mutex<VecDeque<String>>),
    Responder(Responder),
}

/// Answers from a fixed queue or a prompt-driven closure, and records every prompt.
/// `fail_on_call(n)` makes the n-th call (0-based) return an API error.
pub struct MockGenerator {
    script: Script,
    fail_on: Option<usize>,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn scripted<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Script::Queue(Mutex::new(responses.into_iter().map(Into::into).collect())),
            fail_on: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn responding(responder: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self {
            script: Script::Responder(Box::new(responder)),
            fail_on: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_on_call(mut self, call: usize) -> Self {
        self.fail_on = Some(call);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &str, _temperature: f32) -> Result<String, LlmError> {
        let call = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len() - 1
        };

        if self.fail_on == Some(call) {
            return Err(LlmError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }

        match &self.script {
            Script::Queue(queue) => queue
                .lock()
                .unwrap()
                .pop_front()
                .ok_or(LlmError::EmptyContent),
            Script::Responder(responder) => Ok(responder(prompt)),
        }
    }

    fn model(&self) -> &str {
        "mock"
    }
}
