//! Test utilities for Diagchat
//!
//! Provides a scripted in-process diagnosis service and a focus handle that
//! records calls, for exercising the conversation controller without HTTP.

use crate::error::{DiagchatError, Result};
use crate::service::{DiagnosisService, ExchangeRequest, ExchangeResponse, Prompt};
use crate::session::TextFocus;
use crate::step::Step;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// One scripted outcome of `exchange`
pub enum Scripted {
    /// Reply immediately
    Reply(ExchangeResponse),
    /// Fail with `ExchangeFailed`
    Fail(String),
    /// Fail with an arbitrary error
    Error(DiagchatError),
    /// Reply once the gate is notified
    Gated(Arc<Notify>, ExchangeResponse),
}

/// Diagnosis service answering from a fixed script and recording requests
pub struct ScriptedService {
    script: Mutex<VecDeque<Scripted>>,
    requests: Arc<Mutex<Vec<ExchangeRequest>>>,
}

impl ScriptedService {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<ExchangeRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl DiagnosisService for ScriptedService {
    async fn exchange(&self, request: &ExchangeRequest) -> Result<ExchangeResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();

        match next {
            Some(Scripted::Reply(response)) => Ok(response),
            Some(Scripted::Fail(message)) => Err(DiagchatError::ExchangeFailed(message).into()),
            Some(Scripted::Error(error)) => Err(error.into()),
            Some(Scripted::Gated(gate, response)) => {
                gate.notified().await;
                Ok(response)
            }
            None => Err(DiagchatError::ExchangeFailed("script exhausted".to_string()).into()),
        }
    }
}

/// Focus handle counting `focus()` calls
#[derive(Debug, Default)]
pub struct RecordingFocus {
    pub count: AtomicUsize,
}

impl TextFocus for RecordingFocus {
    fn focus(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Response with only the required fields set
pub fn response(session_id: &str, step: Step, prompt: Prompt) -> ExchangeResponse {
    ExchangeResponse::new(session_id, step, prompt)
}
