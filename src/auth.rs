//! Access token helpers for the VK implicit OAuth flow.
//!
//! The user opens [`authorize_url`] in a browser, approves access and lands on
//! `blank.html` with the token in the URL fragment. [`token_from_redirect`]
//! pulls it back out of the pasted address.

use reqwest::Url;

use crate::{Error, Result};

pub const AUTHORIZE_URL: &str = "https://oauth.vk.com/authorize";
pub const BLANK_REDIRECT_URI: &str = "https://oauth.vk.com/blank.html";

/// Client id of the official VK app, which is allowed to request `messages`.
pub const DEFAULT_CLIENT_ID: u64 = 6121396;
pub const DEFAULT_SCOPE: &str = "messages,offline";

/// Token grant parsed from the redirect fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub user_id: Option<i64>,
    /// Seconds; `0` means the token does not expire (`offline` scope).
    pub expires_in: Option<u64>,
}

/// Build the authorization URL for the implicit flow.
pub fn authorize_url(client_id: u64, scope: &str) -> Result<Url> {
    if scope.trim().is_empty() {
        return Err(Error::InvalidArgument("scope must not be empty".to_string()));
    }

    let client_id = client_id.to_string();
    Url::parse_with_params(
        AUTHORIZE_URL,
        &[
            ("client_id", client_id.as_str()),
            ("display", "page"),
            ("redirect_uri", BLANK_REDIRECT_URI),
            ("scope", scope.trim()),
            ("response_type", "token"),
        ],
    )
    .map_err(|e| Error::InvalidArgument(format!("failed to build authorize URL: {}", e)))
}

/// Extract the token from the redirect address.
///
/// VK puts the grant in the fragment; the query string is also accepted for
/// addresses mangled by copy-paste.
pub fn token_from_redirect(redirect: &str) -> Result<TokenGrant> {
    let url = Url::parse(redirect.trim())
        .map_err(|e| Error::InvalidArgument(format!("not a URL: {}", e)))?;

    let params = url.fragment().or_else(|| url.query()).unwrap_or_default();

    // Reuse the query parser for the fragment.
    let mut carrier = Url::parse("http://localhost/")
        .map_err(|e| Error::InvalidArgument(e.to_string()))?;
    carrier.set_query(Some(params));

    let mut access_token = None;
    let mut user_id = None;
    let mut expires_in = None;
    let mut error = None;

    for (key, value) in carrier.query_pairs() {
        match key.as_ref() {
            "access_token" => access_token = Some(value.into_owned()),
            "user_id" => user_id = value.parse().ok(),
            "expires_in" => expires_in = value.parse().ok(),
            "error_description" => error = Some(value.into_owned()),
            "error" if error.is_none() => error = Some(value.into_owned()),
            _ => {}
        }
    }

    match access_token.filter(|t| !t.is_empty()) {
        Some(access_token) => Ok(TokenGrant {
            access_token,
            user_id,
            expires_in,
        }),
        None => Err(Error::InvalidArgument(match error {
            Some(reason) => format!("authorization was not granted: {}", reason),
            None => "redirect URL has no access_token".to_string(),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_contains_implicit_flow_params() {
        let url = authorize_url(DEFAULT_CLIENT_ID, DEFAULT_SCOPE).unwrap();

        assert_eq!(url.host_str(), Some("oauth.vk.com"));
        assert_eq!(url.path(), "/authorize");

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("client_id"), Some("6121396"));
        assert_eq!(get("display"), Some("page"));
        assert_eq!(get("redirect_uri"), Some(BLANK_REDIRECT_URI));
        assert_eq!(get("scope"), Some("messages,offline"));
        assert_eq!(get("response_type"), Some("token"));
    }

    #[test]
    fn authorize_url_rejects_empty_scope() {
        assert!(authorize_url(1, "  ").is_err());
    }

    #[test]
    fn token_is_read_from_fragment() {
        let grant = token_from_redirect(
            "https://oauth.vk.com/blank.html#access_token=vk1.a.abc123&expires_in=0&user_id=42",
        )
        .unwrap();

        assert_eq!(grant.access_token, "vk1.a.abc123");
        assert_eq!(grant.user_id, Some(42));
        assert_eq!(grant.expires_in, Some(0));
    }

    #[test]
    fn token_is_read_from_query_as_fallback() {
        let grant =
            token_from_redirect("https://oauth.vk.com/blank.html?access_token=tok").unwrap();
        assert_eq!(grant.access_token, "tok");
        assert_eq!(grant.user_id, None);
    }

    #[test]
    fn denied_authorization_reports_reason() {
        let err = token_from_redirect(
            "https://oauth.vk.com/blank.html#error=access_denied&error_description=User+denied+your+request",
        )
        .unwrap_err();
        assert!(err.to_string().contains("User denied your request"));
    }

    #[test]
    fn missing_token_is_an_error() {
        let err = token_from_redirect("https://oauth.vk.com/blank.html").unwrap_err();
        assert!(err.to_string().contains("no access_token"));

        assert!(token_from_redirect("not a url").is_err());
    }
}
