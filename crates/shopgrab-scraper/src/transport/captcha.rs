use std::sync::LazyLock;

use futures::future::BoxFuture;
use reqwest::Url;
use scraper::{Html, Selector};

static CAPTCHA_IMAGE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"img[src*="captcha"]"#).expect("valid selector"));

static CHALLENGE_FORM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("form[action]").expect("valid selector"));

static HIDDEN_INPUT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"input[type="hidden"][name]"#).expect("valid selector"));

/// What a challenge page asked for.
///
/// URLs are absolute, resolved against the URL the challenge was served
/// from. Hidden form fields are echoed back when the solution is posted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptchaChallenge {
    pub image_url: Option<String>,
    pub form_action: Option<String>,
    pub hidden_fields: Vec<(String, String)>,
}

/// External CAPTCHA-solving service.
///
/// Returns `None` when the image could not be solved.
pub trait CaptchaSolver: Send + Sync {
    fn solve<'a>(&'a self, image_url: &'a str) -> BoxFuture<'a, Option<String>>;
}

/// Case-insensitive check for the challenge marker in a response body.
#[must_use]
pub fn contains_captcha_marker(body: &str) -> bool {
    body.to_ascii_lowercase().contains("captcha")
}

/// Pulls the challenge image and form out of a challenge page.
///
/// Missing pieces are left as `None`; this never fails.
#[must_use]
pub fn parse_challenge(body: &str, page_url: &str) -> CaptchaChallenge {
    let document = Html::parse_document(body);
    let base = Url::parse(page_url).ok();
    let absolute = |raw: &str| -> String {
        base.as_ref()
            .and_then(|b| b.join(raw).ok())
            .map_or_else(|| raw.to_owned(), String::from)
    };

    let image_url = document
        .select(&CAPTCHA_IMAGE)
        .find_map(|img| img.value().attr("src"))
        .map(&absolute);

    let form = document.select(&CHALLENGE_FORM).next();
    let form_action = form
        .and_then(|f| f.value().attr("action"))
        .map(&absolute);
    let hidden_fields = form
        .map(|f| {
            f.select(&HIDDEN_INPUT)
                .filter_map(|input| {
                    let name = input.value().attr("name")?;
                    let value = input.value().attr("value").unwrap_or_default();
                    Some((name.to_owned(), value.to_owned()))
                })
                .collect()
        })
        .unwrap_or_default();

    CaptchaChallenge {
        image_url,
        form_action,
        hidden_fields,
    }
}
