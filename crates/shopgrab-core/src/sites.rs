use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The storefronts the scraper knows how to fetch and extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteKind {
    Amazon,
    Flipkart,
    Myntra,
}

impl SiteKind {
    pub const ALL: [SiteKind; 3] = [SiteKind::Amazon, SiteKind::Flipkart, SiteKind::Myntra];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SiteKind::Amazon => "amazon",
            SiteKind::Flipkart => "flipkart",
            SiteKind::Myntra => "myntra",
        }
    }
}

impl std::fmt::Display for SiteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SiteKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "amazon" => Ok(SiteKind::Amazon),
            "flipkart" => Ok(SiteKind::Flipkart),
            "myntra" => Ok(SiteKind::Myntra),
            other => Err(format!("unknown site \"{other}\"")),
        }
    }
}

/// Storefront region. Only region-aware sites (Amazon) change their base
/// URL per region; the others ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Us,
    In,
    Uk,
    Ca,
    De,
    Jp,
}

impl Region {
    pub const ALL: [Region; 6] = [
        Region::Us,
        Region::In,
        Region::Uk,
        Region::Ca,
        Region::De,
        Region::Jp,
    ];

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Region::Us => "us",
            Region::In => "in",
            Region::Uk => "uk",
            Region::Ca => "ca",
            Region::De => "de",
            Region::Jp => "jp",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Region::ALL
            .into_iter()
            .find(|r| r.code() == lower)
            .ok_or_else(|| format!("unknown region \"{lower}\""))
    }
}
