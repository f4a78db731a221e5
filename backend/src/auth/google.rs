use std::collections::HashMap;

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;

/// Identity asserted by a verified Google ID token.
#[derive(Debug, Clone)]
pub struct GoogleIdentity {
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum GoogleAuthError {
    #[error("Invalid Google token: {0}")]
    InvalidToken(String),
    #[error("JWKS fetch error: {0}")]
    JwksFetch(String),
    #[error("Key not found for kid: {0}")]
    KeyNotFound(String),
}

#[derive(Debug, Deserialize)]
struct OidcDiscovery {
    jwks_uri: String,
}

/// JWKS key set response.
#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    n: Option<String>,
    e: Option<String>,
}

/// Claims of a Google ID token.
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

/// Verifies Google-issued ID tokens against our OAuth client id.
///
/// Fetches the issuer's OIDC discovery document once at construction to find
/// the JWKS endpoint, then caches the signing keys.
pub struct GoogleTokenVerifier {
    http_client: Client,
    jwks_uri: String,
    keys: RwLock<HashMap<String, DecodingKey>>,
    issuer: String,
    client_id: String,
}

impl GoogleTokenVerifier {
    pub async fn new(issuer: &str, client_id: &str) -> Result<Self, GoogleAuthError> {
        let http_client = Client::new();

        let discovery_url = format!(
            "{}/.well-known/openid-configuration",
            issuer.trim_end_matches('/')
        );
        let discovery: OidcDiscovery = http_client
            .get(&discovery_url)
            .send()
            .await
            .map_err(|e| GoogleAuthError::JwksFetch(e.to_string()))?
            .json()
            .await
            .map_err(|e| GoogleAuthError::JwksFetch(e.to_string()))?;

        let verifier = Self {
            http_client,
            jwks_uri: discovery.jwks_uri,
            keys: RwLock::new(HashMap::new()),
            issuer: issuer.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
        };

        verifier.refresh_keys().await?;

        Ok(verifier)
    }

    async fn refresh_keys(&self) -> Result<(), GoogleAuthError> {
        tracing::info!("Fetching JWKS from {}", self.jwks_uri);

        let response: JwksResponse = self
            .http_client
            .get(&self.jwks_uri)
            .send()
            .await
            .map_err(|e| GoogleAuthError::JwksFetch(e.to_string()))?
            .json()
            .await
            .map_err(|e| GoogleAuthError::JwksFetch(e.to_string()))?;

        let mut keys = self.keys.write().await;
        keys.clear();

        for jwk in response.keys {
            if jwk.kty == "RSA" {
                if let (Some(n), Some(e)) = (&jwk.n, &jwk.e) {
                    match DecodingKey::from_rsa_components(n, e) {
                        Ok(key) => {
                            keys.insert(jwk.kid.clone(), key);
                        }
                        Err(e) => {
                            tracing::warn!("Failed to parse RSA key {}: {}", jwk.kid, e);
                        }
                    }
                }
            }
        }

        tracing::info!("Loaded {} JWKS keys", keys.len());
        Ok(())
    }

    async fn lookup_key(&self, kid: &str) -> Option<DecodingKey> {
        self.keys.read().await.get(kid).cloned()
    }

    /// Verify an ID token and return the identity it asserts.
    pub async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, GoogleAuthError> {
        let header =
            decode_header(id_token).map_err(|e| GoogleAuthError::InvalidToken(e.to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| GoogleAuthError::InvalidToken("Missing kid in token header".to_string()))?;

        let key = match self.lookup_key(&kid).await {
            Some(key) => key,
            None => {
                // Google rotates its signing keys; refetch once before giving up
                self.refresh_keys().await?;
                self.lookup_key(&kid)
                    .await
                    .ok_or_else(|| GoogleAuthError::KeyNotFound(kid.clone()))?
            }
        };

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.client_id.as_str()]);
        // Google issues both the https:// and the bare form
        validation.set_issuer(&[
            self.issuer.as_str(),
            self.issuer.trim_start_matches("https://"),
        ]);

        let token_data = decode::<IdTokenClaims>(id_token, &key, &validation)
            .map_err(|e| GoogleAuthError::InvalidToken(e.to_string()))?;

        Ok(GoogleIdentity {
            sub: token_data.claims.sub,
            email: token_data.claims.email,
            name: token_data.claims.name,
            picture: token_data.claims.picture,
        })
    }
}
