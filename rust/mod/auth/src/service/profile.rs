use tracing::debug;

use crate::model::{UpdateProfile, User, UserProfile};
use crate::service::{non_blank, AuthError, AuthService};

impl AuthService {
    /// GET /api/users/profile.
    pub fn get_profile(&self, email: &str) -> Result<UserProfile, AuthError> {
        let user = self
            .find_user(email)?
            .ok_or_else(|| AuthError::NotFound("User not found".into()))?;
        Ok(user.into())
    }

    /// PUT /api/users/profile: partial update of the caller's own profile.
    ///
    /// A name field that is present must not be blank. Email, password,
    /// verification and login type are not editable here.
    pub fn update_profile(&self, email: &str, patch: &UpdateProfile) -> Result<UserProfile, AuthError> {
        let mut user = self
            .find_user(email)?
            .ok_or_else(|| AuthError::NotFound("User not found".into()))?;

        let mut rename = false;
        if patch.first_name.is_some() {
            let first = non_blank(&patch.first_name)
                .ok_or_else(|| AuthError::Validation("First name cannot be empty".into()))?;
            user.first_name = Some(first.to_string());
            rename = true;
        }
        if patch.last_name.is_some() {
            let last = non_blank(&patch.last_name)
                .ok_or_else(|| AuthError::Validation("Last name cannot be empty".into()))?;
            user.last_name = Some(last.to_string());
            rename = true;
        }
        if rename {
            user.name = User::full_name(
                user.first_name.as_deref().unwrap_or_default(),
                user.last_name.as_deref().unwrap_or_default(),
            );
        }
        // Present but blank clears the field.
        if patch.phone_number.is_some() {
            user.phone_number = non_blank(&patch.phone_number).map(str::to_string);
        }
        if patch.picture.is_some() {
            user.picture = non_blank(&patch.picture).map(str::to_string);
        }

        let user = self.users.save(user)?;
        debug!(email, "profile updated");
        Ok(user.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LoginType;
    use crate::testing::test_service;

    fn seed(h: &crate::testing::TestHarness) {
        h.svc
            .users
            .save_new(User {
                email: "pat@x.com".into(),
                first_name: Some("Pat".into()),
                last_name: Some("Doe".into()),
                name: "Pat Doe".into(),
                phone_number: Some("555".into()),
                picture: None,
                password_hash: Some("hash".into()),
                is_verified: true,
                login_type: LoginType::Email,
                created_at: String::new(),
                updated_at: String::new(),
            })
            .unwrap();
    }

    #[test]
    fn get_profile_hides_nothing_but_the_hash() {
        let h = test_service();
        seed(&h);
        let profile = h.svc.get_profile("pat@x.com").unwrap();
        assert_eq!(profile.name, "Pat Doe");
        assert_eq!(profile.phone_number.as_deref(), Some("555"));
        assert!(profile.is_verified);

        assert!(matches!(
            h.svc.get_profile("ghost@x.com"),
            Err(AuthError::NotFound(_))
        ));
    }

    #[test]
    fn update_recomputes_name_and_clears_optional_fields() {
        let h = test_service();
        seed(&h);
        let patch = UpdateProfile {
            last_name: Some("Smith".into()),
            phone_number: Some("".into()),
            picture: Some("https://img/p.png".into()),
            ..Default::default()
        };
        let profile = h.svc.update_profile("pat@x.com", &patch).unwrap();
        assert_eq!(profile.name, "Pat Smith");
        assert_eq!(profile.first_name.as_deref(), Some("Pat"));
        assert!(profile.phone_number.is_none());
        assert_eq!(profile.picture.as_deref(), Some("https://img/p.png"));

        let stored = h.svc.users.get_or_err("pat@x.com").unwrap();
        assert_eq!(stored.password_hash.as_deref(), Some("hash"));
    }

    #[test]
    fn update_rejects_blank_names() {
        let h = test_service();
        seed(&h);
        let patch = UpdateProfile {
            first_name: Some("  ".into()),
            ..Default::default()
        };
        let err = h.svc.update_profile("pat@x.com", &patch).unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert_eq!(h.svc.get_profile("pat@x.com").unwrap().name, "Pat Doe");
    }
}
