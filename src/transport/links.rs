/// Outbound links that carry a session key to another device
use std::time::Duration;

use serde::Serialize;
use url::Url;

use super::{KEY_PARAM, RATE_PARAM};
use crate::encoder::Identifier;
use crate::error::LinkError;

fn parse_base(base: &str) -> Result<Url, LinkError> {
    Url::parse(base).map_err(|source| LinkError::BaseUrl {
        base: base.to_string(),
        source,
    })
}

fn with_query(base: &str, pairs: &[(&str, &str)]) -> Result<Url, LinkError> {
    let mut url = parse_base(base)?;
    url.query_pairs_mut().clear().extend_pairs(pairs);
    Ok(url)
}

/// Link to the blink page: `?key=<key>&rate=<ms>`.
pub fn blink_url(base: &str, key: &Identifier, rate: Duration) -> Result<Url, LinkError> {
    let rate = rate.as_millis().to_string();
    with_query(base, &[(KEY_PARAM, key.as_str()), (RATE_PARAM, rate.as_str())])
}

/// Verification link: `?sessionKey=<key>&blinkRate=<ms>`.
pub fn verification_url(base: &str, key: &Identifier, rate: Duration) -> Result<Url, LinkError> {
    let rate = rate.as_millis().to_string();
    with_query(
        base,
        &[("sessionKey", key.as_str()), ("blinkRate", rate.as_str())],
    )
}

/// `sms:` deep link whose body is `body_prefix` followed by the link.
pub fn sms_link(recipient: &str, body_prefix: &str, link: &Url) -> String {
    let body = if body_prefix.is_empty() {
        link.to_string()
    } else {
        format!("{} {}", body_prefix, link)
    };
    // SMS apps expect %20 rather than form-style '+'; literal '+' is already %2B.
    let encoded: String = url::form_urlencoded::byte_serialize(body.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    format!("sms:{}?body={}", recipient, encoded)
}

/// Fields submitted with the email verification form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailForm {
    pub session_key: Identifier,
    pub blink_rate: u64,
}

impl EmailForm {
    /// Rates past `u64::MAX` milliseconds saturate.
    pub fn new(session_key: Identifier, rate: Duration) -> Self {
        Self {
            session_key,
            blink_rate: u64::try_from(rate.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn hidden_fields(&self) -> String {
        format!(
            "<input type=\"hidden\" name=\"sessionKey\" value=\"{}\">\n\
             <input type=\"hidden\" name=\"blinkRate\" value=\"{}\">",
            self.session_key, self.blink_rate
        )
    }

    pub fn to_urlencoded(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("sessionKey", self.session_key.as_str())
            .append_pair("blinkRate", &self.blink_rate.to_string())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> Identifier {
        Identifier::parse("ABCDE").unwrap()
    }

    #[test]
    fn test_blink_url() {
        let url = blink_url("https://example.com/blink/index.html", &key(), Duration::from_millis(200)).unwrap();
        assert_eq!(url.as_str(), "https://example.com/blink/index.html?key=abcde&rate=200");
    }

    #[test]
    fn test_verification_url_replaces_existing_query() {
        let url = verification_url("https://example.com/verify?old=1", &key(), Duration::from_millis(150)).unwrap();
        assert_eq!(url.as_str(), "https://example.com/verify?sessionKey=abcde&blinkRate=150");
    }

    #[test]
    fn test_bad_base_url() {
        assert!(matches!(
            blink_url("not a url", &key(), Duration::from_millis(200)),
            Err(LinkError::BaseUrl { .. })
        ));
    }

    #[test]
    fn test_sms_link_encodes_body() {
        let link = Url::parse("https://example.com/v?sessionKey=abcde&blinkRate=200").unwrap();
        assert_eq!(
            sms_link("", "Verify me:", &link),
            "sms:?body=Verify%20me%3A%20https%3A%2F%2Fexample.com%2Fv%3FsessionKey%3Dabcde%26blinkRate%3D200"
        );
    }

    #[test]
    fn test_email_form() {
        let form = EmailForm::new(key(), Duration::from_millis(200));
        assert_eq!(form.to_urlencoded(), "sessionKey=abcde&blinkRate=200");
        assert!(form.hidden_fields().contains("name=\"sessionKey\" value=\"abcde\""));
        assert_eq!(
            serde_json::to_string(&form).unwrap(),
            r#"{"sessionKey":"abcde","blinkRate":200}"#
        );
    }

    #[test]
    fn test_email_form_saturates_huge_rate() {
        let form = EmailForm::new(key(), Duration::MAX);
        assert_eq!(form.blink_rate, u64::MAX);
    }
}
