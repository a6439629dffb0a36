//! Token lifecycle service: issuance, ordered validation, refresh rotation,
//! and revocation, wired to the revocation store and audit sink.

use std::sync::Arc;
use std::time::Instant;

use constant_time_eq::constant_time_eq;
use chrono::Utc;
use serde_json::json;
use serde_json::Value as JsonValue;
use td_shared::types::RequestContext;
use td_shared::utils::hashing;
use tracing::{debug, warn};

use crate::domain::entities::audit::{AuditEvent, AuditEventType, AuditSeverity};
use crate::domain::entities::key::SigningKey;
use crate::domain::entities::metadata::reasons;
use crate::domain::entities::token::{
    AccessClaims, Claims, RefreshClaims, SessionContext, TokenPair,
};
use crate::errors::{DomainError, DomainResult, TokenError};
use crate::repositories::audit::AuditSink;
use crate::repositories::revocation::RevocationStore;
use crate::repositories::secret::SecretProvider;

use super::analytics::{TokenAnalytics, TokenStats};
use super::codec;
use super::config::TokenServiceConfig;
use super::key_store::SigningKeyStore;
use super::registry::RevocationRegistry;
use super::risk::score_usage;

/// Claims every token must carry, checked before typed deserialization
const REQUIRED_CLAIMS: [&str; 6] = ["iss", "sub", "aud", "exp", "iat", "jti"];

/// Per-call issuance options
#[derive(Debug, Clone, Default)]
pub struct IssueOptions {
    /// Bind the access token to the client IP and user agent
    pub bind_to_client: bool,
    /// Stamp a device fingerprint hash into the access token
    pub enable_fingerprint: bool,
    /// Override the configured access token lifetime
    pub custom_expiry_seconds: Option<i64>,
}

/// Per-call validation options
#[derive(Debug, Clone)]
pub struct ValidateOptions {
    /// Require and verify the client-binding hash
    pub require_client_binding: bool,
    /// Reject tokens issued longer ago than this, regardless of `exp`
    pub max_token_age_seconds: Option<i64>,
    /// Consult the revocation blacklist
    pub check_blacklist: bool,
    /// Request IP, for binding checks and risk scoring
    pub client_ip: Option<String>,
    /// Request user agent, for binding checks
    pub user_agent: Option<String>,
    /// Record this validation against the token's usage history
    pub update_usage_stats: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            require_client_binding: false,
            max_token_age_seconds: None,
            check_blacklist: true,
            client_ip: None,
            user_agent: None,
            update_usage_stats: true,
        }
    }
}

/// Result of a successful validation
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    /// Verified, typed claims
    pub claims: Claims,
    /// Key the signature verified under
    pub key_id: String,
    /// Wall time the validation took
    pub validation_time_ms: u64,
    /// Suspicious-use score for this validation attempt
    pub suspicious_score: f64,
}

/// The token engine's front door.
///
/// Generic over the revocation store and audit sink so tests can swap in
/// the in-memory store and the mock sink.
pub struct TokenService<S, A> {
    registry: RevocationRegistry<S>,
    key_store: Arc<SigningKeyStore>,
    audit: Arc<A>,
    analytics: Arc<TokenAnalytics>,
    config: TokenServiceConfig,
}

impl<S: RevocationStore, A: AuditSink> TokenService<S, A> {
    /// Builds the service, fetching signing key material from the provider.
    pub async fn new(
        store: Arc<S>,
        audit: Arc<A>,
        secrets: &dyn SecretProvider,
        config: TokenServiceConfig,
    ) -> DomainResult<Self> {
        let key_store = Arc::new(SigningKeyStore::initialize(secrets, &config).await?);
        Ok(Self {
            registry: RevocationRegistry::new(store),
            key_store,
            audit,
            analytics: Arc::new(TokenAnalytics::new()),
            config,
        })
    }

    pub fn registry(&self) -> &RevocationRegistry<S> {
        &self.registry
    }

    pub fn key_store(&self) -> &Arc<SigningKeyStore> {
        &self.key_store
    }

    pub fn config(&self) -> &TokenServiceConfig {
        &self.config
    }

    /// Counter snapshot for operational dashboards
    pub fn stats(&self) -> TokenStats {
        self.analytics.snapshot()
    }

    /// Public key set for external verifiers
    pub fn jwks(&self) -> JsonValue {
        self.key_store.jwks()
    }

    /// Issues a fresh access/refresh pair for a session.
    pub async fn issue(
        &self,
        session: &SessionContext,
        options: &IssueOptions,
    ) -> DomainResult<TokenPair> {
        self.issue_pair(session, options, 0).await
    }

    async fn issue_pair(
        &self,
        session: &SessionContext,
        options: &IssueOptions,
        rotation_count: u32,
    ) -> DomainResult<TokenPair> {
        let (kid, encoding_key, algorithm) = self.key_store.signing_key()?;
        let expiry_seconds = options
            .custom_expiry_seconds
            .unwrap_or(self.config.access_token_expiry_seconds);

        let mut access = AccessClaims::new(session, expiry_seconds, None);
        access.iss = self.config.issuer.clone();
        if options.bind_to_client {
            access.binding = Some(binding_hash(
                session.client_ip.as_deref(),
                session.user_agent.as_deref(),
                &session.user_id,
            ));
        }
        if options.enable_fingerprint {
            access.fingerprint = Some(fingerprint_hash(
                session.user_agent.as_deref(),
                session.client_ip.as_deref(),
                access.iat,
            ));
        }

        let mut refresh = RefreshClaims::new(
            session,
            self.config.refresh_token_expiry_days,
            access.jti.clone(),
            rotation_count,
        );
        refresh.iss = self.config.issuer.clone();
        access.refresh_jti = Some(refresh.jti.clone());

        let access_claims = Claims::Access(access);
        let refresh_claims = Claims::Refresh(refresh);

        let access_token = codec::encode_token(&access_claims, &kid, algorithm, &encoding_key)?;
        let refresh_token = codec::encode_token(&refresh_claims, &kid, algorithm, &encoding_key)?;

        let ip = session.client_ip.as_deref();
        let ua = session.user_agent.as_deref();
        self.registry
            .record_issued(&access_token, &access_claims, ip, ua)
            .await?;
        self.registry
            .record_issued(&refresh_token, &refresh_claims, ip, ua)
            .await?;

        self.analytics.record_issued();
        self.audit
            .emit(AuditEvent::new(
                AuditEventType::TokenIssued,
                AuditSeverity::Info,
                json!({
                    "subject": session.user_id,
                    "product_key": session.product_key,
                    "session_id": session.session_id,
                    "access_jti": access_claims.jti(),
                    "refresh_jti": refresh_claims.jti(),
                    "key_id": kid,
                    "algorithm": self.config.algorithm.as_str(),
                    "rotation_count": rotation_count,
                }),
            ))
            .await;

        debug!(
            subject = %session.user_id,
            product = %session.product_key,
            "token pair issued"
        );

        Ok(TokenPair::new(
            access_token,
            refresh_token,
            expiry_seconds,
            &session.scopes,
        ))
    }

    /// Validates a token through the full ordered check sequence.
    ///
    /// Checks run cheapest-first and fail closed: format, blacklist,
    /// signature, temporal, claims, maximum age, client binding. A token
    /// that passes then has its usage recorded and scored; a score past the
    /// hard threshold revokes it on the spot.
    pub async fn validate(
        &self,
        token: &str,
        options: &ValidateOptions,
    ) -> DomainResult<ValidationOutcome> {
        let started = Instant::now();
        match self.run_checks(token, options, started).await {
            Ok(outcome) => {
                self.analytics.record_validated();
                self.audit
                    .emit(AuditEvent::new(
                        AuditEventType::TokenValidated,
                        AuditSeverity::Info,
                        json!({
                            "jti": outcome.claims.jti(),
                            "subject": outcome.claims.sub(),
                            "token_kind": outcome.claims.kind(),
                            "key_id": outcome.key_id,
                            "suspicious_score": outcome.suspicious_score,
                        }),
                    ))
                    .await;
                Ok(outcome)
            }
            Err(DomainError::Token(err)) => {
                if err == TokenError::Expired {
                    self.analytics.record_expired();
                }
                self.analytics.record_validation_failure();
                let severity = if matches!(
                    &err,
                    TokenError::Revoked { reason } if reason == reasons::SUSPICIOUS_ACTIVITY
                ) {
                    AuditSeverity::Critical
                } else if err.is_security_relevant() {
                    AuditSeverity::Warning
                } else {
                    AuditSeverity::Info
                };
                self.audit
                    .emit(AuditEvent::new(
                        AuditEventType::TokenValidationFailed,
                        severity,
                        json!({
                            "error": err.to_string(),
                            "client_ip": options.client_ip,
                        }),
                    ))
                    .await;
                Err(DomainError::Token(err))
            }
            Err(other) => Err(other),
        }
    }

    async fn run_checks(
        &self,
        token: &str,
        options: &ValidateOptions,
        started: Instant,
    ) -> DomainResult<ValidationOutcome> {
        // 1. Structure
        let decoded = codec::decode_token(token)?;
        let token_hash = RevocationRegistry::<S>::token_hash(token);

        // 2. Blacklist, before any crypto work
        if options.check_blacklist && self.registry.is_revoked(&token_hash).await? {
            let reason = self
                .registry
                .metadata_for(&token_hash)
                .await?
                .and_then(|m| m.revoked_reason)
                .unwrap_or_else(|| "revoked".to_string());
            return Err(TokenError::Revoked { reason }.into());
        }

        // 3. Signature, resolving the key by header kid. Unknown or evicted
        //    kids fail closed here.
        let (key_id, decoding_key, algorithm) = self
            .key_store
            .verification_key(decoded.header.kid.as_deref())
            .ok_or(TokenError::KeyUnavailable)?;
        let verified = codec::verify_signature(token, &decoding_key, algorithm)?;

        // 4. Temporal bounds
        let now = Utc::now().timestamp();
        if let Some(exp) = verified.get("exp").and_then(JsonValue::as_i64) {
            if now >= exp {
                return Err(TokenError::Expired.into());
            }
        }
        if let Some(nbf) = verified.get("nbf").and_then(JsonValue::as_i64) {
            if now < nbf {
                return Err(TokenError::NotYetValid.into());
            }
        }

        // 5. Required claims and issuer
        for claim in REQUIRED_CLAIMS {
            if verified.get(claim).is_none() {
                return Err(TokenError::MissingClaim {
                    claim: claim.to_string(),
                }
                .into());
            }
        }
        if verified.get("iss").and_then(JsonValue::as_str) != Some(self.config.issuer.as_str()) {
            return Err(TokenError::InvalidClaims.into());
        }

        // 6. Typed claims
        let claims: Claims =
            serde_json::from_value(verified).map_err(|_| TokenError::InvalidClaims)?;

        // 7. Maximum age
        if let Some(max_age) = options.max_token_age_seconds {
            if now - claims.iat() > max_age {
                return Err(TokenError::TokenTooOld.into());
            }
        }

        // 8. Client binding
        if options.require_client_binding {
            self.check_client_binding(&claims, options)?;
        }

        // 9. Usage history and risk scoring. The attempt is scored against
        //    the history as it stood before this validation.
        let suspicious_score = self
            .score_and_record(&token_hash, &claims, options)
            .await?;

        Ok(ValidationOutcome {
            claims,
            key_id,
            validation_time_ms: started.elapsed().as_millis() as u64,
            suspicious_score,
        })
    }

    fn check_client_binding(
        &self,
        claims: &Claims,
        options: &ValidateOptions,
    ) -> Result<(), TokenError> {
        let Claims::Access(access) = claims else {
            return Err(TokenError::BindingMismatch);
        };
        let Some(stored) = access.binding.as_deref() else {
            return Err(TokenError::BindingMismatch);
        };

        let presented = binding_hash(
            options.client_ip.as_deref(),
            options.user_agent.as_deref(),
            &access.sub,
        );
        if !constant_time_eq(stored.as_bytes(), presented.as_bytes()) {
            return Err(TokenError::BindingMismatch);
        }
        Ok(())
    }

    async fn score_and_record(
        &self,
        token_hash: &str,
        claims: &Claims,
        options: &ValidateOptions,
    ) -> DomainResult<f64> {
        let Some(metadata) = self.registry.metadata_for(token_hash).await? else {
            return Ok(0.0);
        };

        let context = RequestContext {
            client_ip: options.client_ip.clone(),
            user_agent: options.user_agent.clone(),
        };
        let assessment = score_usage(&metadata, &context, &self.config.risk);

        if assessment.revoke {
            self.registry
                .revoke_hash(token_hash, reasons::SUSPICIOUS_ACTIVITY, None)
                .await?;
            self.analytics.record_revoked();
            self.analytics.record_suspicious_flag();
            self.audit
                .emit(AuditEvent::new(
                    AuditEventType::SuspiciousActivity,
                    AuditSeverity::Critical,
                    json!({
                        "jti": claims.jti(),
                        "subject": claims.sub(),
                        "score": assessment.score,
                        "signals": assessment.signals,
                        "action": "revoked",
                    }),
                ))
                .await;
            warn!(jti = %claims.jti(), score = assessment.score, "token revoked for suspicious use");
            return Err(TokenError::Revoked {
                reason: reasons::SUSPICIOUS_ACTIVITY.to_string(),
            }
            .into());
        }

        if assessment.flagged {
            self.analytics.record_suspicious_flag();
            self.audit
                .emit(AuditEvent::new(
                    AuditEventType::SuspiciousActivity,
                    AuditSeverity::Warning,
                    json!({
                        "jti": claims.jti(),
                        "subject": claims.sub(),
                        "score": assessment.score,
                        "signals": assessment.signals,
                        "action": "flagged",
                    }),
                ))
                .await;
        }

        if options.update_usage_stats {
            self.registry
                .record_use(token_hash, options.client_ip.as_deref())
                .await?;
        }

        Ok(assessment.score)
    }

    /// Exchanges a refresh token for a new pair, rotating the chain.
    ///
    /// The presented session must match the token's subject and session id,
    /// and the chain depth must stay under the configured limit; a chain at
    /// the limit is revoked permanently.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        session: &SessionContext,
        options: &IssueOptions,
    ) -> DomainResult<TokenPair> {
        let validate_options = ValidateOptions {
            update_usage_stats: false,
            client_ip: session.client_ip.clone(),
            user_agent: session.user_agent.clone(),
            ..ValidateOptions::default()
        };
        let outcome = self.validate(refresh_token, &validate_options).await?;

        let Claims::Refresh(claims) = outcome.claims else {
            self.analytics.record_validation_failure();
            return Err(TokenError::WrongTokenType {
                expected: "refresh",
            }
            .into());
        };

        if claims.sub != session.user_id || claims.session_id != session.session_id {
            return Err(DomainError::Validation {
                message: "session does not match refresh token".to_string(),
            });
        }

        if claims.rotation_count >= self.config.max_rotation_depth {
            self.registry
                .revoke_token(refresh_token, reasons::ROTATION_LIMIT, None)
                .await?;
            self.analytics.record_revoked();
            self.audit
                .emit(AuditEvent::new(
                    AuditEventType::RotationLimitExceeded,
                    AuditSeverity::Critical,
                    json!({
                        "jti": claims.jti,
                        "subject": claims.sub,
                        "rotation_count": claims.rotation_count,
                    }),
                ))
                .await;
            return Err(TokenError::RotationLimitExceeded.into());
        }

        // Old pair dies before the new one is born; a replayed refresh token
        // hits the blacklist from here on.
        self.registry
            .revoke_token(refresh_token, reasons::REFRESH_ROTATED, None)
            .await?;
        self.analytics.record_revoked();
        if self
            .registry
            .revoke_by_id(&claims.access_jti, reasons::ACCESS_ROTATED)
            .await?
        {
            self.analytics.record_revoked();
        }

        let pair = self
            .issue_pair(session, options, claims.rotation_count + 1)
            .await?;

        self.analytics.record_rotated();
        self.audit
            .emit(AuditEvent::new(
                AuditEventType::TokenRefreshed,
                AuditSeverity::Info,
                json!({
                    "old_jti": claims.jti,
                    "subject": claims.sub,
                    "session_id": claims.session_id,
                    "rotation_count": claims.rotation_count + 1,
                }),
            ))
            .await;

        Ok(pair)
    }

    /// Revokes a serialized token. Returns `false` if it was already revoked.
    pub async fn revoke(
        &self,
        token: &str,
        reason: &str,
        revoked_by: Option<&str>,
    ) -> DomainResult<bool> {
        let changed = self.registry.revoke_token(token, reason, revoked_by).await?;
        if changed {
            self.analytics.record_revoked();
            self.audit_revocation(json!({
                "reason": reason,
                "revoked_by": revoked_by,
            }))
            .await;
        }
        Ok(changed)
    }

    /// Revokes a token by its id, e.g. an access token referenced from its
    /// paired refresh token.
    pub async fn revoke_by_id(&self, token_id: &str, reason: &str) -> DomainResult<bool> {
        let changed = self.registry.revoke_by_id(token_id, reason).await?;
        if changed {
            self.analytics.record_revoked();
            self.audit_revocation(json!({
                "token_id": token_id,
                "reason": reason,
            }))
            .await;
        }
        Ok(changed)
    }

    /// Revokes every live token for a subject. Returns how many were revoked.
    pub async fn revoke_all_for_subject(
        &self,
        subject: &str,
        reason: &str,
    ) -> DomainResult<usize> {
        let count = self.registry.revoke_all_for_subject(subject, reason).await?;
        for _ in 0..count {
            self.analytics.record_revoked();
        }
        if count > 0 {
            self.audit_revocation(json!({
                "subject": subject,
                "reason": reason,
                "count": count,
            }))
            .await;
        }
        Ok(count)
    }

    /// Rotates the signing key out of schedule.
    pub async fn rotate_signing_key(&self) -> DomainResult<SigningKey> {
        let key = self.key_store.rotate()?;
        self.audit
            .emit(AuditEvent::new(
                AuditEventType::KeyRotated,
                AuditSeverity::Info,
                json!({ "key_id": key.key_id }),
            ))
            .await;
        Ok(key)
    }

    async fn audit_revocation(&self, payload: JsonValue) {
        self.audit
            .emit(AuditEvent::new(
                AuditEventType::TokenRevoked,
                AuditSeverity::Warning,
                payload,
            ))
            .await;
    }
}

/// Hash binding a token to the client context it was issued to
fn binding_hash(client_ip: Option<&str>, user_agent: Option<&str>, subject: &str) -> String {
    hashing::hash_parts(&[
        client_ip.unwrap_or(""),
        user_agent.unwrap_or(""),
        subject,
    ])
}

/// Device fingerprint hash captured at issuance
fn fingerprint_hash(user_agent: Option<&str>, client_ip: Option<&str>, issued_at: i64) -> String {
    let timestamp = issued_at.to_string();
    hashing::hash_parts(&[
        user_agent.unwrap_or(""),
        client_ip.unwrap_or(""),
        &timestamp,
    ])
}
