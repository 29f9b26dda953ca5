//! Access token helpers for the CLI.

use crate::auth::{authorize_url, token_from_redirect, TokenGrant};
use crate::error::Result;

/// Instructions for obtaining a token in the browser.
pub fn auth_url(client_id: u64, scope: &str) -> Result<String> {
    let url = authorize_url(client_id, scope)?;
    Ok(format!(
        "Open this address and allow access:\n\n{}\n\n\
         The browser then lands on a blank page. Copy its full address and run\n\
         `vk_history_export token '<address>'` to extract the access token.",
        url
    ))
}

/// Token line for a pasted redirect address.
pub fn from_redirect(redirect: &str) -> Result<TokenGrant> {
    let grant = token_from_redirect(redirect)?;
    match grant.expires_in {
        Some(0) | None => tracing::info!(user_id = ?grant.user_id, "Token does not expire"),
        Some(secs) => tracing::info!(user_id = ?grant.user_id, "Token expires in {} s", secs),
    }
    Ok(grant)
}
