use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, USER_AGENT};
use reqwest::{Client, StatusCode, Url};

use super::captcha::{contains_captcha_marker, parse_challenge, CaptchaChallenge};
use super::Transport;
use crate::error::{ScraperError, TransportError};
use crate::identity::Identity;
use crate::payload::{PayloadKind, RawPayload};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// reqwest-backed [`Transport`].
///
/// One direct client plus one client per proxy endpoint, all sharing a
/// single cookie jar so a session survives proxy rotation.
pub struct HttpTransport {
    direct: Client,
    via_proxy: HashMap<String, Client>,
    headers: HeaderMap,
    payload_kind: PayloadKind,
}

impl HttpTransport {
    /// Builds the client set for a site.
    ///
    /// `headers` are sent with every request alongside the per-attempt
    /// user agent. `payload_kind` decides how successful bodies decode.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidProxy`] if a proxy endpoint cannot
    /// be parsed, or [`ScraperError::ClientBuild`] if a client cannot be
    /// constructed.
    pub fn new(
        headers: HeaderMap,
        payload_kind: PayloadKind,
        proxies: &[String],
    ) -> Result<Self, ScraperError> {
        let jar = Arc::new(Jar::default());
        let direct = base_builder(&jar).no_proxy().build()?;

        let mut via_proxy = HashMap::with_capacity(proxies.len());
        for endpoint in proxies {
            let proxy =
                reqwest::Proxy::all(endpoint.as_str()).map_err(|e| ScraperError::InvalidProxy {
                    proxy: endpoint.clone(),
                    reason: e.to_string(),
                })?;
            let client = base_builder(&jar).proxy(proxy).build()?;
            via_proxy.insert(endpoint.clone(), client);
        }

        Ok(Self {
            direct,
            via_proxy,
            headers,
            payload_kind,
        })
    }

    fn client_for(&self, identity: &Identity) -> Result<&Client, TransportError> {
        match &identity.proxy {
            None => Ok(&self.direct),
            Some(proxy) => self
                .via_proxy
                .get(proxy)
                .ok_or_else(|| TransportError::Proxy {
                    proxy: proxy.clone(),
                    reason: "proxy not configured on this transport".to_string(),
                }),
        }
    }
}

fn base_builder(jar: &Arc<Jar>) -> reqwest::ClientBuilder {
    Client::builder()
        .cookie_provider(Arc::clone(jar))
        .connect_timeout(CONNECT_TIMEOUT)
        .gzip(true)
        .brotli(true)
}

/// Connection failures and timeouts are blamed on the proxy when one was
/// used; everything else is a plain network error.
fn classify_request_error(err: &reqwest::Error, identity: &Identity) -> TransportError {
    match &identity.proxy {
        Some(proxy) if err.is_connect() || err.is_timeout() => TransportError::Proxy {
            proxy: proxy.clone(),
            reason: err.to_string(),
        },
        _ => TransportError::Network(err.to_string()),
    }
}

fn proxy_auth_rejected(status: StatusCode, identity: &Identity) -> Option<TransportError> {
    if status != StatusCode::PROXY_AUTHENTICATION_REQUIRED {
        return None;
    }
    identity.proxy.as_ref().map(|proxy| TransportError::Proxy {
        proxy: proxy.clone(),
        reason: "proxy authentication required".to_string(),
    })
}

impl Transport for HttpTransport {
    async fn send(
        &self,
        url: &Url,
        identity: &Identity,
        timeout: Duration,
    ) -> Result<RawPayload, TransportError> {
        let client = self.client_for(identity)?;
        let response = client
            .get(url.clone())
            .headers(self.headers.clone())
            .header(USER_AGENT, identity.user_agent.as_str())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_request_error(&e, identity))?;

        let status = response.status();
        if let Some(err) = proxy_auth_rejected(status, identity) {
            return Err(err);
        }
        let final_url = response.url().to_string();
        let text = response
            .text()
            .await
            .map_err(|e| classify_request_error(&e, identity))?;

        if contains_captcha_marker(&text) {
            return Err(TransportError::Captcha(parse_challenge(&text, &final_url)));
        }
        if status != StatusCode::OK {
            return Err(TransportError::Http {
                status: status.as_u16(),
            });
        }

        match self.payload_kind {
            PayloadKind::Html => Ok(RawPayload::Html { text, final_url }),
            PayloadKind::Json => match serde_json::from_str(&text) {
                Ok(value) => Ok(RawPayload::Json { value, final_url }),
                Err(e) => Err(TransportError::Decode {
                    url: final_url,
                    reason: e.to_string(),
                }),
            },
        }
    }

    async fn submit_captcha(
        &self,
        challenge: &CaptchaChallenge,
        solution: &str,
        identity: &Identity,
        timeout: Duration,
    ) -> Result<(), TransportError> {
        let Some(action) = challenge.form_action.as_deref() else {
            return Err(TransportError::Captcha(challenge.clone()));
        };
        let mut form: Vec<(&str, &str)> = challenge
            .hidden_fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        form.push(("captchaCharacters", solution));

        let client = self.client_for(identity)?;
        let response = client
            .post(action)
            .headers(self.headers.clone())
            .header(USER_AGENT, identity.user_agent.as_str())
            .timeout(timeout)
            .form(&form)
            .send()
            .await
            .map_err(|e| classify_request_error(&e, identity))?;

        let status = response.status();
        if let Some(err) = proxy_auth_rejected(status, identity) {
            return Err(err);
        }
        if !status.is_success() && !status.is_redirection() {
            return Err(TransportError::Http {
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    async fn visit(
        &self,
        url: &Url,
        identity: &Identity,
        timeout: Duration,
    ) -> Result<(), TransportError> {
        let client = self.client_for(identity)?;
        let response = client
            .get(url.clone())
            .headers(self.headers.clone())
            .header(USER_AGENT, identity.user_agent.as_str())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_request_error(&e, identity))?;

        let status = response.status();
        if let Some(err) = proxy_auth_rejected(status, identity) {
            return Err(err);
        }
        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
            });
        }
        // Drain so the connection can be reused.
        let _ = response.bytes().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(proxy: Option<&str>) -> Identity {
        Identity {
            user_agent: "test-agent".to_string(),
            proxy: proxy.map(str::to_string),
        }
    }

    #[test]
    fn rejects_unparseable_proxy_endpoint() {
        let result = HttpTransport::new(
            HeaderMap::new(),
            PayloadKind::Html,
            &["::not a proxy::".to_string()],
        );
        assert!(
            matches!(result, Err(ScraperError::InvalidProxy { ref proxy, .. }) if proxy == "::not a proxy::"),
            "expected InvalidProxy"
        );
    }

    #[test]
    fn unknown_proxy_is_a_proxy_error() {
        let transport = HttpTransport::new(HeaderMap::new(), PayloadKind::Html, &[]).unwrap();
        let err = transport
            .client_for(&identity(Some("http://10.9.9.9:3128")))
            .unwrap_err();
        assert!(matches!(err, TransportError::Proxy { .. }));
    }

    #[test]
    fn direct_identity_uses_direct_client() {
        let transport = HttpTransport::new(
            HeaderMap::new(),
            PayloadKind::Json,
            &["http://10.0.0.1:8080".to_string()],
        )
        .unwrap();
        assert!(transport.client_for(&identity(None)).is_ok());
        assert!(transport
            .client_for(&identity(Some("http://10.0.0.1:8080")))
            .is_ok());
    }

    #[test]
    fn proxy_auth_status_only_counts_with_a_proxy() {
        let status = StatusCode::PROXY_AUTHENTICATION_REQUIRED;
        assert!(proxy_auth_rejected(status, &identity(None)).is_none());
        assert!(matches!(
            proxy_auth_rejected(status, &identity(Some("http://p:1"))),
            Some(TransportError::Proxy { .. })
        ));
        assert!(proxy_auth_rejected(StatusCode::OK, &identity(Some("http://p:1"))).is_none());
    }
}
