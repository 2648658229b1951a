use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, info};

use aidiy_core::now_unix;

use crate::model::{Claims, LoginResult, Session, User};
use crate::service::{AuthError, AuthService};

impl AuthService {
    /// Issue a signed app token for a user.
    ///
    /// Creates a session record; the token's `sid` claim points at it.
    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        let now = now_unix();
        let exp = now + self.config.token_ttl;

        let session = self.sessions.save_new(Session {
            id: String::new(),
            email: user.email.clone(),
            issued_at: String::new(),
            expires_at: exp,
            revoked: false,
        })?;

        let claims = Claims {
            sub: user.email.clone(),
            name: user.name.clone(),
            kind: user.login_type,
            sid: session.id,
            iat: now,
            exp,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(format!("JWT encode failed: {}", e)))
    }

    /// Issue a token and package it with the `{email, name}` summary.
    pub(crate) fn login_result(&self, user: &User) -> Result<LoginResult, AuthError> {
        let app_token = self.issue_token(user)?;
        Ok(LoginResult {
            user: user.summary(),
            app_token,
        })
    }

    /// Verify and decode an app token.
    /// Returns the claims if the signature is valid, the token has not
    /// expired, and its session exists and is not revoked.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| {
            debug!("token rejected: {}", e);
            AuthError::Unauthorized("Token invalid or expired".into())
        })?;

        let claims = token_data.claims;
        match self.sessions.get(&claims.sid)? {
            Some(session) if !session.revoked => Ok(claims),
            _ => Err(AuthError::Unauthorized("Token invalid or expired".into())),
        }
    }

    /// Revoke a session (its token becomes invalid).
    pub fn revoke_session(&self, session_id: &str) -> Result<(), AuthError> {
        let mut session = self.sessions.get_or_err(session_id)?;
        session.revoked = true;
        self.sessions.save(session)?;
        Ok(())
    }

    /// Revoke all live sessions for an account. Returns how many were revoked.
    pub fn revoke_user_sessions(&self, email: &str) -> Result<usize, AuthError> {
        let live: Vec<Session> = self
            .sessions
            .list()?
            .into_iter()
            .filter(|s| s.email == email && !s.revoked)
            .collect();
        let count = live.len();
        for mut session in live {
            session.revoked = true;
            self.sessions.save(session)?;
        }
        if count > 0 {
            info!(email, count, "revoked sessions");
        }
        Ok(count)
    }

    /// List live sessions for an account.
    pub fn list_user_sessions(&self, email: &str) -> Result<Vec<Session>, AuthError> {
        let now = now_unix();
        Ok(self
            .sessions
            .list()?
            .into_iter()
            .filter(|s| s.email == email && !s.revoked && s.expires_at > now)
            .collect())
    }

    /// Drop session records whose token has expired.
    pub fn purge_expired_sessions(&self) -> Result<usize, AuthError> {
        let now = now_unix();
        Ok(self.sessions.delete_where(|s| s.expires_at < now)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LoginType;
    use crate::testing::test_service;

    fn user(email: &str) -> User {
        User {
            email: email.into(),
            first_name: None,
            last_name: None,
            name: "Alice".into(),
            phone_number: None,
            picture: None,
            password_hash: None,
            is_verified: true,
            login_type: LoginType::Email,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_issue_and_verify_token() {
        let h = test_service();
        let token = h.svc.issue_token(&user("alice@example.com")).unwrap();
        assert!(!token.is_empty());

        let claims = h.svc.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(claims.name, "Alice");
        assert_eq!(claims.kind, LoginType::Email);
        assert_eq!(claims.exp - claims.iat, 86400);
    }

    #[test]
    fn test_revoke_session() {
        let h = test_service();
        let token = h.svc.issue_token(&user("a@x.com")).unwrap();
        let claims = h.svc.verify_token(&token).unwrap();

        h.svc.revoke_session(&claims.sid).unwrap();
        assert!(h.svc.verify_token(&token).is_err());
    }

    #[test]
    fn test_revoke_all_user_sessions() {
        let h = test_service();
        let t1 = h.svc.issue_token(&user("a@x.com")).unwrap();
        let t2 = h.svc.issue_token(&user("a@x.com")).unwrap();
        let other = h.svc.issue_token(&user("b@x.com")).unwrap();

        assert_eq!(h.svc.list_user_sessions("a@x.com").unwrap().len(), 2);
        assert_eq!(h.svc.revoke_user_sessions("a@x.com").unwrap(), 2);

        assert!(h.svc.verify_token(&t1).is_err());
        assert!(h.svc.verify_token(&t2).is_err());
        assert!(h.svc.verify_token(&other).is_ok());
        assert_eq!(h.svc.revoke_user_sessions("a@x.com").unwrap(), 0);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let h = test_service();
        let claims = Claims {
            sub: "a@x.com".into(),
            name: "A".into(),
            kind: LoginType::Email,
            sid: "whatever".into(),
            iat: now_unix(),
            exp: now_unix() + 600,
        };
        let forged = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"not-the-secret"),
        )
        .unwrap();
        assert!(matches!(h.svc.verify_token(&forged), Err(AuthError::Unauthorized(_))));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let h = test_service();
        let mut u = user("a@x.com");
        u.name = "Old".into();
        let token = h.svc.issue_token(&u).unwrap();
        let sid = h.svc.verify_token(&token).unwrap().sid;

        let stale = Claims {
            sub: u.email.clone(),
            name: u.name.clone(),
            kind: LoginType::Email,
            sid,
            iat: now_unix() - 7200,
            exp: now_unix() - 3600,
        };
        let stale = encode(
            &Header::default(),
            &stale,
            &EncodingKey::from_secret(h.svc.config().jwt_secret.as_bytes()),
        )
        .unwrap();
        assert!(h.svc.verify_token(&stale).is_err());
    }

    #[test]
    fn test_invalid_token() {
        let h = test_service();
        assert!(h.svc.verify_token("this.is.not.a.valid.jwt").is_err());
    }

    #[test]
    fn test_purge_expired_sessions() {
        let h = test_service();
        h.svc.issue_token(&user("a@x.com")).unwrap();
        let mut s = h.svc.sessions.list().unwrap().remove(0);
        s.expires_at = now_unix() - 10;
        h.svc.sessions.save(s).unwrap();
        h.svc.issue_token(&user("b@x.com")).unwrap();

        assert_eq!(h.svc.purge_expired_sessions().unwrap(), 1);
        assert_eq!(h.svc.sessions.count().unwrap(), 1);
    }
}
