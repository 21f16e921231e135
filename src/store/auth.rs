use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{StoreError, StoreResult};

pub(crate) const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Tokens this close to expiry are refreshed instead of reused.
const EXPIRY_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The fields of a service-account key file that the token exchange needs.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ServiceAccountKey {
    pub(crate) client_email: String,
    pub(crate) private_key: String,
    #[serde(default = "default_token_uri")]
    pub(crate) token_uri: String,
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: String,
}

/// Bearer token persisted in the token cache file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct CachedToken {
    pub(crate) client_email: String,
    pub(crate) access_token: String,
    /// Unix seconds.
    pub(crate) expires_at: i64,
}

impl CachedToken {
    pub(crate) fn is_fresh(&self, now: i64) -> bool {
        self.expires_at - EXPIRY_MARGIN_SECS > now
    }
}

/// Exchanges a signed service-account assertion for a bearer token and keeps
/// it in memory and in the token cache file until it nears expiry.
pub(crate) struct ServiceAccountAuth {
    key: ServiceAccountKey,
    signing_key: EncodingKey,
    cache_path: Option<PathBuf>,
    cached: Option<CachedToken>,
}

impl ServiceAccountAuth {
    pub(crate) fn from_file(path: &Path, cache_path: Option<PathBuf>) -> StoreResult<Self> {
        let credentials_error = |reason: String| StoreError::Credentials {
            path: path.display().to_string(),
            reason,
        };
        let raw = std::fs::read_to_string(path).map_err(|e| credentials_error(e.to_string()))?;
        let key: ServiceAccountKey =
            serde_json::from_str(&raw).map_err(|e| credentials_error(e.to_string()))?;
        Self::from_key(key, cache_path).map_err(|e| credentials_error(e.to_string()))
    }

    pub(crate) fn from_key(key: ServiceAccountKey, cache_path: Option<PathBuf>) -> StoreResult<Self> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
        let cached = cache_path
            .as_deref()
            .and_then(load_cache)
            .filter(|t| t.client_email == key.client_email);
        Ok(Self {
            key,
            signing_key,
            cache_path,
            cached,
        })
    }

    pub(crate) fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// A valid bearer token, fetching a new one when the cached one is stale.
    pub(crate) fn bearer(&mut self, client: &reqwest::blocking::Client) -> StoreResult<String> {
        let now = chrono::Utc::now().timestamp();
        if let Some(token) = self.cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.access_token.clone());
        }

        let token = self.fetch(client, now)?;
        if let Some(path) = &self.cache_path {
            if let Err(e) = save_cache(path, &token) {
                tracing::warn!(path = %path.display(), error = %e, "could not write token cache");
            }
        }
        let bearer = token.access_token.clone();
        self.cached = Some(token);
        Ok(bearer)
    }

    /// Forget the cached token, e.g. after the API rejects it.
    pub(crate) fn invalidate(&mut self) {
        self.cached = None;
    }

    fn assertion(&self, now: i64) -> StoreResult<String> {
        let claims = Claims {
            iss: &self.key.client_email,
            scope: SCOPES.join(" "),
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &self.signing_key,
        )?)
    }

    fn fetch(&self, client: &reqwest::blocking::Client, now: i64) -> StoreResult<CachedToken> {
        tracing::info!(account = %self.key.client_email, "requesting access token");
        let assertion = self.assertion(now)?;
        let resp = client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()?;

        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            let reason = serde_json::from_str::<TokenErrorResponse>(&body)
                .map(|e| format!("{}: {}", e.error, e.error_description))
                .unwrap_or_else(|_| format!("token endpoint returned {status}"));
            return Err(StoreError::Auth(reason));
        }

        let token: TokenResponse = serde_json::from_str(&body)?;
        Ok(CachedToken {
            client_email: self.key.client_email.clone(),
            access_token: token.access_token,
            expires_at: now + token.expires_in,
        })
    }
}

pub(crate) fn load_cache(path: &Path) -> Option<CachedToken> {
    let raw = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(token) => Some(token),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable token cache");
            None
        }
    }
}

/// Write the token cache readable by the owner only.
pub(crate) fn save_cache(path: &Path, token: &CachedToken) -> StoreResult<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // An existing file keeps its old mode on open
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(serde_json::to_string_pretty(token)?.as_bytes())?;
    Ok(())
}
