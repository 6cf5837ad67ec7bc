//! Scripted transport and solver doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Url;

use crate::error::TransportError;
use crate::identity::Identity;
use crate::payload::RawPayload;
use crate::transport::{CaptchaChallenge, CaptchaSolver, Transport};

#[derive(Debug, Clone, Copy)]
pub(crate) enum Step {
    Succeed,
    FailProxy,
    Captcha,
    Status(u16),
}

/// Replays `script` one step per GET, then repeats `tail` forever.
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Step>>,
    tail: Step,
    success: RawPayload,
    visit_ok: bool,
    pub(crate) sends: Mutex<Vec<(Url, Identity)>>,
    pub(crate) submissions: Mutex<Vec<String>>,
    pub(crate) visits: Mutex<Vec<Url>>,
}

impl ScriptedTransport {
    pub(crate) fn new(script: &[Step], tail: Step) -> Self {
        Self {
            script: Mutex::new(script.iter().copied().collect()),
            tail,
            success: html_payload(),
            visit_ok: true,
            sends: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
            visits: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn always(step: Step) -> Self {
        Self::new(&[], step)
    }

    pub(crate) fn with_success(mut self, payload: RawPayload) -> Self {
        self.success = payload;
        self
    }

    pub(crate) fn with_failing_visits(mut self) -> Self {
        self.visit_ok = false;
        self
    }

    pub(crate) fn send_count(&self) -> usize {
        self.sends.lock().unwrap().len()
    }

    pub(crate) fn identities(&self) -> Vec<Identity> {
        self.sends
            .lock()
            .unwrap()
            .iter()
            .map(|(_, identity)| identity.clone())
            .collect()
    }

    pub(crate) fn urls(&self) -> Vec<Url> {
        self.sends
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }
}

pub(crate) fn html_payload() -> RawPayload {
    RawPayload::Html {
        text: "<html>ok</html>".to_string(),
        final_url: "https://shop.test/dp/B000000001".to_string(),
    }
}

pub(crate) fn challenge() -> CaptchaChallenge {
    CaptchaChallenge {
        image_url: Some("https://shop.test/captcha/1.jpg".to_string()),
        form_action: Some("https://shop.test/validateCaptcha".to_string()),
        hidden_fields: Vec::new(),
    }
}

impl Transport for ScriptedTransport {
    async fn send(
        &self,
        url: &Url,
        identity: &Identity,
        _timeout: Duration,
    ) -> Result<RawPayload, TransportError> {
        self.sends
            .lock()
            .unwrap()
            .push((url.clone(), identity.clone()));
        let step = self.script.lock().unwrap().pop_front().unwrap_or(self.tail);
        match step {
            Step::Succeed => Ok(self.success.clone()),
            Step::FailProxy => Err(TransportError::Proxy {
                proxy: identity.proxy.clone().unwrap_or_default(),
                reason: "connection refused".to_string(),
            }),
            Step::Captcha => Err(TransportError::Captcha(challenge())),
            Step::Status(status) => Err(TransportError::Http { status }),
        }
    }

    async fn submit_captcha(
        &self,
        _challenge: &CaptchaChallenge,
        solution: &str,
        _identity: &Identity,
        _timeout: Duration,
    ) -> Result<(), TransportError> {
        self.submissions.lock().unwrap().push(solution.to_string());
        Ok(())
    }

    async fn visit(
        &self,
        url: &Url,
        _identity: &Identity,
        _timeout: Duration,
    ) -> Result<(), TransportError> {
        self.visits.lock().unwrap().push(url.clone());
        if self.visit_ok {
            Ok(())
        } else {
            Err(TransportError::Network("connection reset".to_string()))
        }
    }
}

/// Solver that always returns the same answer (or gives up).
pub(crate) struct FixedSolver {
    answer: Option<&'static str>,
    calls: AtomicU32,
}

impl FixedSolver {
    pub(crate) fn new(answer: Option<&'static str>) -> Self {
        Self {
            answer,
            calls: AtomicU32::new(0),
        }
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CaptchaSolver for FixedSolver {
    fn solve<'a>(&'a self, _image_url: &'a str) -> BoxFuture<'a, Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move { self.answer.map(str::to_string) })
    }
}
