//! Cloudflare Authentication
//!
//! Handles the two credential styles the API accepts: scoped API tokens
//! (preferred) and the legacy global API key paired with the account email.

use anyhow::{bail, Result};
use reqwest::RequestBuilder;
use std::fmt;

/// Header carrying the account email for global key authentication
const AUTH_EMAIL_HEADER: &str = "X-Auth-Email";

/// Header carrying the global API key
const AUTH_KEY_HEADER: &str = "X-Auth-Key";

/// Credentials attached to every API request
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Scoped API token, sent as a bearer token
    Token(String),
    /// Global API key plus the email of the account owning it
    GlobalKey { email: String, key: String },
}

impl Credentials {
    pub fn token(token: &str) -> Self {
        Self::Token(token.to_string())
    }

    pub fn global_key(email: &str, key: &str) -> Self {
        Self::GlobalKey {
            email: email.to_string(),
            key: key.to_string(),
        }
    }

    /// Pick credentials from whatever the user supplied.
    ///
    /// A token wins over a key pair. A key without an email (or the reverse)
    /// is rejected rather than silently ignored.
    pub fn resolve(
        token: Option<&str>,
        email: Option<&str>,
        key: Option<&str>,
    ) -> Result<Self> {
        let token = token.filter(|t| !t.trim().is_empty());
        let email = email.filter(|e| !e.trim().is_empty());
        let key = key.filter(|k| !k.trim().is_empty());

        if let Some(token) = token {
            if email.is_some() || key.is_some() {
                tracing::warn!("Both an API token and a global key were given, using the token");
            }
            return Ok(Self::token(token));
        }

        match (email, key) {
            (Some(email), Some(key)) => Ok(Self::global_key(email, key)),
            (Some(_), None) => bail!("--email was given without --key (CLOUDFLARE_API_KEY)"),
            (None, Some(_)) => bail!("--key was given without --email (CLOUDFLARE_EMAIL)"),
            (None, None) => bail!(
                "No credentials configured. Set CLOUDFLARE_API_TOKEN or use --token"
            ),
        }
    }

    /// Attach the credential headers to a request
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Self::Token(token) => request.bearer_auth(token),
            Self::GlobalKey { email, key } => request
                .header(AUTH_EMAIL_HEADER, email)
                .header(AUTH_KEY_HEADER, key),
        }
    }
}

// Secrets stay out of logs and panic messages.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Credentials::Token(***)"),
            Self::GlobalKey { email, .. } => {
                write!(f, "Credentials::GlobalKey {{ email: {email}, key: *** }}")
            }
        }
    }
}
