//! In-process completer for tests.

use super::client::{Completer, CompletionError, Prompt};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Responder = Box<dyn Fn(&Prompt) -> Result<String, CompletionError> + Send + Sync>;

/// Answers prompts with a closure, optionally after a delay, and counts calls.
pub(crate) struct ScriptedCompleter {
    responder: Responder,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl ScriptedCompleter {
    pub(crate) fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&Prompt) -> Result<String, CompletionError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            delay: Mutex::new(None),
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn reply(response: &str) -> Arc<Self> {
        let response = response.to_string();
        Self::new(move |_| Ok(response.clone()))
    }

    pub(crate) fn failing(err: CompletionError) -> Arc<Self> {
        Self::new(move |_| Err(err.clone()))
    }

    pub(crate) fn set_delay(&self, delay: Duration) {
        if let Ok(mut d) = self.delay.lock() {
            *d = Some(delay);
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Completer for ScriptedCompleter {
    fn complete<'a>(
        &'a self,
        prompt: &'a Prompt,
    ) -> Pin<Box<dyn Future<Output = Result<String, CompletionError>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = self.delay.lock().ok().and_then(|d| *d);
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            (self.responder)(prompt)
        })
    }
}
