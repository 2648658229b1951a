use tracing::{info, warn};

use aidiy_core::is_digits;

use crate::model::{LoginResult, LoginType, User};
use crate::service::{required, AuthError, AuthService};

/// Digits in a kid login code.
pub const KID_CODE_LEN: usize = 4;

impl AuthService {
    /// Synthetic account email for a kid login code.
    pub fn kid_email(&self, code: &str) -> String {
        format!("kid_{}@{}", code, self.config.kid_email_domain)
    }

    /// `true` for addresses of the form reserved for kid accounts.
    pub fn is_kid_email(&self, email: &str) -> bool {
        match email.split_once('@') {
            Some((local, domain)) => {
                local.starts_with("kid_")
                    && domain.eq_ignore_ascii_case(&self.config.kid_email_domain)
            }
            None => false,
        }
    }

    /// POST /api/auth/kid-login: passwordless sign-in with a 4-digit code.
    ///
    /// The kid account is created on first use. It takes its name from a
    /// child registered under the same login code, if there is one.
    pub fn kid_login(&self, code: &Option<String>) -> Result<LoginResult, AuthError> {
        let code = required(code, "Code required")?;
        if !is_digits(code, KID_CODE_LEN) {
            return Err(AuthError::Validation("Code must be 4 digits".into()));
        }

        let email = self.kid_email(code);
        let user = match self.find_user(&email)? {
            Some(user) if user.login_type == LoginType::Kid => user,
            Some(user) => {
                warn!(email = %user.email, "kid login hit a non-kid account");
                return Err(AuthError::Unauthorized("Invalid login code".into()));
            }
            None => {
                let child = self.children.find(|c| c.login_code == code)?;
                let name = match &child {
                    Some(c) => c.display_name().to_string(),
                    None => format!("Kid {}", code),
                };
                let user = self.users.save_new(User {
                    email: email.clone(),
                    first_name: child.as_ref().map(|c| c.first_name.clone()),
                    last_name: child.as_ref().map(|c| c.last_name.clone()),
                    name,
                    phone_number: None,
                    picture: child.and_then(|c| c.avatar),
                    password_hash: None,
                    is_verified: true,
                    login_type: LoginType::Kid,
                    created_at: String::new(),
                    updated_at: String::new(),
                })?;
                info!(email = %email, "kid account created");
                user
            }
        };

        self.login_result(&user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Child;

    use crate::testing::test_service;

    #[test]
    fn kid_login_creates_account_once() {
        let h = test_service();
        let first = h.svc.kid_login(&Some("0420".into())).unwrap();
        assert_eq!(first.user.email, "kid_0420@aidiy.com");
        assert_eq!(first.user.name, "Kid 0420");

        let claims = h.svc.verify_token(&first.app_token).unwrap();
        assert_eq!(claims.kind, LoginType::Kid);

        h.svc.kid_login(&Some("0420".into())).unwrap();
        assert_eq!(h.svc.users.count().unwrap(), 1);
    }

    #[test]
    fn kid_login_uses_registered_child_name() {
        let h = test_service();
        h.svc
            .children
            .save(Child {
                parent_email: "pat@x.com".into(),
                id: "1234".into(),
                first_name: "Sam".into(),
                last_name: "Doe".into(),
                nick_name: Some("Sammy".into()),
                username: None,
                avatar: None,
                birth_date: "2016-4-9".into(),
                login_code: "1234".into(),
                money_accumulated: 0,
                tasks_assigned: 0,
                tasks_completed: 0,
                created_at: String::new(),
                updated_at: String::new(),
            })
            .unwrap();

        let result = h.svc.kid_login(&Some("1234".into())).unwrap();
        assert_eq!(result.user.name, "Sammy");
    }

    #[test]
    fn kid_login_refuses_non_kid_account_at_kid_address() {
        let h = test_service();
        h.svc
            .users
            .save_new(User {
                email: "kid_1234@aidiy.com".into(),
                first_name: Some("Eve".into()),
                last_name: Some("X".into()),
                name: "Eve X".into(),
                phone_number: None,
                picture: None,
                password_hash: Some("hash".into()),
                is_verified: false,
                login_type: LoginType::Email,
                created_at: String::new(),
                updated_at: String::new(),
            })
            .unwrap();

        let err = h.svc.kid_login(&Some("1234".into())).unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized(_)));
        assert_eq!(h.svc.list_user_sessions("kid_1234@aidiy.com").unwrap().len(), 0);
    }

    #[test]
    fn kid_email_shape() {
        let h = test_service();
        assert!(h.svc.is_kid_email("kid_1234@aidiy.com"));
        assert!(h.svc.is_kid_email("kid_x@AIDIY.com"));
        assert!(!h.svc.is_kid_email("kid_1234@example.com"));
        assert!(!h.svc.is_kid_email("kidd@aidiy.com"));
        assert!(!h.svc.is_kid_email("kid_1234"));
    }

    #[test]
    fn kid_login_rejects_malformed_codes() {
        let h = test_service();
        for bad in ["", "123", "12345", "12a4"] {
            let err = h.svc.kid_login(&Some(bad.into())).unwrap_err();
            assert!(matches!(err, AuthError::Validation(_)), "{bad:?}");
        }
        assert!(h.svc.kid_login(&None).is_err());
    }
}
