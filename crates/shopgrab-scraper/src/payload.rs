use shopgrab_core::Region;

/// Response body handed from a transport to the matching extractor.
///
/// Consumed by value: each payload is extracted exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    Html {
        text: String,
        final_url: String,
    },
    Json {
        value: serde_json::Value,
        final_url: String,
    },
}

impl RawPayload {
    /// URL the response was served from, after redirects.
    #[must_use]
    pub fn final_url(&self) -> &str {
        match self {
            RawPayload::Html { final_url, .. } | RawPayload::Json { final_url, .. } => final_url,
        }
    }

    #[must_use]
    pub fn kind(&self) -> PayloadKind {
        match self {
            RawPayload::Html { .. } => PayloadKind::Html,
            RawPayload::Json { .. } => PayloadKind::Json,
        }
    }
}

/// Body format a site serves product data in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Html,
    Json,
}

/// One logical fetch: which product, optionally which region, and an
/// optional cache-buster overriding the generated one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub resource_id: String,
    pub region: Option<Region>,
    pub query_nonce: Option<String>,
}

impl FetchRequest {
    #[must_use]
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            region: None,
            query_nonce: None,
        }
    }

    #[must_use]
    pub fn with_region(mut self, region: Option<Region>) -> Self {
        self.region = region;
        self
    }

    #[must_use]
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.query_nonce = Some(nonce.into());
        self
    }
}
