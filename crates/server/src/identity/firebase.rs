//! Firebase Authentication ID token verification.
//!
//! Firebase ID tokens are RS256 JWTs. The `kid` header selects one of the
//! issuer's public keys, published as a JSON Web Key Set. The key set is
//! fetched on every verification; nothing is cached between calls.
//!
//! A token is accepted when:
//! - the signature verifies against the key named by `kid`
//! - `aud` equals the project ID
//! - `iss` equals `https://securetoken.google.com/<project ID>`
//! - `exp` is in the future (default leeway applies)
//! - `sub` is non-empty and an `email` claim is present

use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;
use url::Url;

use volunteer_board_core::{Email, VerifiedIdentity};

use super::{IdentityError, IdentityVerifier};
use crate::config::IdentityConfig;

const JWKS_TIMEOUT: Duration = Duration::from_secs(10);

/// One RSA public key from the issuer's key set.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonWebKey {
    pub kid: String,
    pub kty: String,
    pub n: Option<String>,
    pub e: Option<String>,
}

/// The issuer's published key set.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonWebKeySet {
    pub keys: Vec<JsonWebKey>,
}

impl JsonWebKeySet {
    /// Build the decoding key for `kid`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredential` if no RSA key with that ID exists, and
    /// `Unavailable` if the published key is unusable.
    pub fn decoding_key(&self, kid: &str) -> Result<DecodingKey, IdentityError> {
        let jwk = self
            .keys
            .iter()
            .find(|k| k.kid == kid && k.kty == "RSA")
            .ok_or_else(|| IdentityError::InvalidCredential(format!("unknown signing key {kid}")))?;

        let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
            return Err(IdentityError::Unavailable(format!(
                "signing key {kid} has no RSA components"
            )));
        };

        DecodingKey::from_rsa_components(n, e)
            .map_err(|e| IdentityError::Unavailable(format!("signing key {kid} is malformed: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
    email: Option<String>,
}

impl FirebaseClaims {
    fn into_identity(self) -> Result<VerifiedIdentity, IdentityError> {
        if self.sub.is_empty() {
            return Err(IdentityError::InvalidCredential(
                "token subject is empty".to_string(),
            ));
        }

        let raw = self.email.ok_or_else(|| {
            IdentityError::InvalidCredential("token carries no email claim".to_string())
        })?;
        let email = Email::parse(&raw)
            .map_err(|e| IdentityError::InvalidCredential(format!("token email is invalid: {e}")))?;

        Ok(VerifiedIdentity::new(email, self.sub))
    }
}

/// Verifies Firebase ID tokens against the issuer's public key set.
#[derive(Clone)]
pub struct FirebaseVerifier {
    client: reqwest::Client,
    jwks_url: Url,
    project_id: String,
    issuer: String,
}

impl FirebaseVerifier {
    /// Create a verifier for the configured project.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(JWKS_TIMEOUT)
            .build()
            .map_err(|e| IdentityError::Unavailable(format!("http client: {e}")))?;

        Ok(Self {
            client,
            jwks_url: config.jwks_url.clone(),
            project_id: config.project_id.clone(),
            issuer: config.issuer(),
        })
    }

    /// Fetch the issuer's current key set.
    async fn fetch_keys(&self) -> Result<JsonWebKeySet, IdentityError> {
        let response = self
            .client
            .get(self.jwks_url.clone())
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(format!("fetching key set: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IdentityError::Unavailable(format!(
                "key set endpoint returned {status}"
            )));
        }

        response
            .json::<JsonWebKeySet>()
            .await
            .map_err(|e| IdentityError::Unavailable(format!("parsing key set: {e}")))
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "aud", "iss"]);
        validation
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        // Reject structurally bad tokens before any network traffic.
        let header = decode_header(token)
            .map_err(|e| IdentityError::InvalidCredential(format!("malformed token: {e}")))?;
        if header.alg != Algorithm::RS256 {
            return Err(IdentityError::InvalidCredential(format!(
                "unexpected signing algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| IdentityError::InvalidCredential("token has no key id".to_string()))?;

        let keys = self.fetch_keys().await?;
        let key = keys.decoding_key(&kid)?;

        let data = decode::<FirebaseClaims>(token, &key, &self.validation())
            .map_err(|e| IdentityError::InvalidCredential(e.to_string()))?;

        let identity = data.claims.into_identity()?;
        tracing::debug!(subject = %identity.subject_id, "verified identity token");
        Ok(identity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Json, Router, routing::get};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::{Value, json};

    use super::*;

    const PROJECT: &str = "volunteer-board-test";
    const KID: &str = "test-key-1";
    const PRIVATE_KEY: &[u8] = include_bytes!("../../testdata/issuer_rsa.pem");
    const JWKS: &str = include_str!("../../testdata/issuer_jwks.json");

    /// Serve the test key set on an ephemeral port and return its URL.
    async fn serve_jwks() -> Url {
        let jwks: Value = serde_json::from_str(JWKS).unwrap();
        let app = Router::new().route("/jwks", get(move || async move { Json(jwks) }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/jwks")).unwrap()
    }

    fn verifier(jwks_url: Url) -> FirebaseVerifier {
        FirebaseVerifier::new(&IdentityConfig {
            project_id: PROJECT.to_string(),
            jwks_url,
        })
        .unwrap()
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    fn valid_claims() -> Value {
        json!({
            "iss": format!("https://securetoken.google.com/{PROJECT}"),
            "aud": PROJECT,
            "sub": "uid-123",
            "email": "volunteer@example.org",
            "iat": now() - 10,
            "exp": now() + 3600,
        })
    }

    fn sign(claims: &Value, kid: &str) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(kid.to_string());
        encode(&header, claims, &EncodingKey::from_rsa_pem(PRIVATE_KEY).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_valid_token_yields_identity() {
        let verifier = verifier(serve_jwks().await);

        let identity = verifier.verify(&sign(&valid_claims(), KID)).await.unwrap();
        assert_eq!(identity.email.as_str(), "volunteer@example.org");
        assert_eq!(identity.subject_id, "uid-123");
    }

    #[tokio::test]
    async fn test_wrong_audience_is_rejected() {
        let verifier = verifier(serve_jwks().await);
        let mut claims = valid_claims();
        claims["aud"] = json!("someone-elses-project");

        let err = verifier.verify(&sign(&claims, KID)).await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCredential(_)));
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let verifier = verifier(serve_jwks().await);
        let mut claims = valid_claims();
        claims["exp"] = json!(now() - 3600);

        let err = verifier.verify(&sign(&claims, KID)).await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCredential(_)));
    }

    #[tokio::test]
    async fn test_unknown_key_id_is_rejected() {
        let verifier = verifier(serve_jwks().await);

        let err = verifier
            .verify(&sign(&valid_claims(), "rotated-away"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCredential(_)));
    }

    #[tokio::test]
    async fn test_token_without_email_is_rejected() {
        let verifier = verifier(serve_jwks().await);
        let mut claims = valid_claims();
        claims.as_object_mut().unwrap().remove("email");

        let err = verifier.verify(&sign(&claims, KID)).await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCredential(_)));
    }

    #[tokio::test]
    async fn test_garbage_token_is_rejected_without_fetching() {
        // Unroutable key set URL: a fetch would fail as Unavailable.
        let verifier = verifier(Url::parse("http://127.0.0.1:1/jwks").unwrap());

        let err = verifier.verify("not.a.jwt").await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCredential(_)));
    }

    #[tokio::test]
    async fn test_unreachable_issuer_is_unavailable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let verifier = verifier(Url::parse(&format!("http://{addr}/jwks")).unwrap());

        let err = verifier.verify(&sign(&valid_claims(), KID)).await.unwrap_err();
        assert!(matches!(err, IdentityError::Unavailable(_)));
    }
}
