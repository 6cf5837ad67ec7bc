//! Request transport: one HTTP attempt with a given identity.
//!
//! [`Transport`] is the seam the retry controller drives. [`HttpTransport`]
//! is the reqwest implementation; tests plug in scripted stubs.

mod captcha;
mod http;

use std::future::Future;
use std::time::Duration;

use reqwest::Url;

use crate::error::TransportError;
use crate::identity::Identity;
use crate::payload::RawPayload;

pub use captcha::{contains_captcha_marker, parse_challenge, CaptchaChallenge, CaptchaSolver};
pub use http::HttpTransport;

pub trait Transport {
    /// Issues one GET for `url` and classifies the outcome.
    fn send(
        &self,
        url: &Url,
        identity: &Identity,
        timeout: Duration,
    ) -> impl Future<Output = Result<RawPayload, TransportError>> + Send;

    /// Posts a solved CAPTCHA back to the challenge form.
    fn submit_captcha(
        &self,
        challenge: &CaptchaChallenge,
        solution: &str,
        identity: &Identity,
        timeout: Duration,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Plain GET whose body is discarded. Used to seed session cookies.
    fn visit(
        &self,
        url: &Url,
        identity: &Identity,
        timeout: Duration,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}
