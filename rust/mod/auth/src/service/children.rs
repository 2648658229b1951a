use chrono::NaiveDate;
use tracing::info;

use aidiy_core::is_digits;

use crate::model::{AddChildInput, Child, Claims, LoginType};
use crate::service::kid::KID_CODE_LEN;
use crate::service::{non_blank, required, AuthError, AuthService};
use crate::store_impls::child_key;

/// `YYYY-M-D` with one- or two-digit month and day, naming a real date.
pub fn valid_birth_date(s: &str) -> bool {
    let mut parts = s.split('-');
    let (Some(y), Some(m), Some(d), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let digits = |p: &str, min: usize, max: usize| {
        (min..=max).contains(&p.len()) && p.bytes().all(|b| b.is_ascii_digit())
    };
    if !digits(y, 4, 4) || !digits(m, 1, 2) || !digits(d, 1, 2) {
        return false;
    }
    match (y.parse(), m.parse(), d.parse()) {
        (Ok(y), Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(y, m, d).is_some(),
        _ => false,
    }
}

impl AuthService {
    /// GET /api/users/children: the caller's children, oldest entry first.
    pub fn list_children(&self, parent_email: &str) -> Result<Vec<Child>, AuthError> {
        let mut children = self.children.list_under(&format!("{}:", parent_email))?;
        children.retain(|c| c.parent_email == parent_email);
        children.sort_by(|a, b| {
            (a.created_at.as_str(), a.login_code.as_str())
                .cmp(&(b.created_at.as_str(), b.login_code.as_str()))
        });
        Ok(children)
    }

    /// POST /api/users/children: add a child, or update the one that
    /// already has this login code. Counters and creation time survive
    /// an update.
    pub fn add_child(&self, caller: &Claims, input: &AddChildInput) -> Result<Child, AuthError> {
        if caller.kind == LoginType::Kid {
            return Err(AuthError::Forbidden("Kid accounts cannot add children".into()));
        }

        const MISSING: &str = "Missing required fields";
        let first = required(&input.first_name, MISSING)?;
        let last = required(&input.last_name, MISSING)?;
        let birth_date = required(&input.birth_date, MISSING)?;
        let login_code = required(&input.login_code, MISSING)?;

        if !is_digits(login_code, KID_CODE_LEN) {
            return Err(AuthError::Validation("Login code must be 4 digits".into()));
        }
        if !valid_birth_date(birth_date) {
            return Err(AuthError::Validation("Birth date must be YYYY-M-D".into()));
        }

        let parent = caller.sub.as_str();
        let username = non_blank(&input.username).map(str::to_string);
        if let Some(name) = &username {
            let taken = self.children.find(|c| {
                !(c.parent_email == parent && c.login_code == login_code)
                    && c.username
                        .as_deref()
                        .is_some_and(|u| u.eq_ignore_ascii_case(name))
            })?;
            if taken.is_some() {
                return Err(AuthError::Conflict("Username already taken".into()));
            }
        }

        let existing = self.children.get(&child_key(parent, login_code))?;
        let mut child = Child {
            parent_email: parent.to_string(),
            id: login_code.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            nick_name: non_blank(&input.nick_name).map(str::to_string),
            username,
            avatar: non_blank(&input.avatar).map(str::to_string),
            birth_date: birth_date.to_string(),
            login_code: login_code.to_string(),
            money_accumulated: 0,
            tasks_assigned: 0,
            tasks_completed: 0,
            created_at: String::new(),
            updated_at: String::new(),
        };
        if let Some(prev) = existing {
            child.money_accumulated = prev.money_accumulated;
            child.tasks_assigned = prev.tasks_assigned;
            child.tasks_completed = prev.tasks_completed;
            child.created_at = prev.created_at;
        }

        let child = self.children.save(child)?;
        info!(parent, login_code, "child saved");
        Ok(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_service;

    fn parent(email: &str) -> Claims {
        Claims {
            sub: email.into(),
            name: "Parent".into(),
            kind: LoginType::Email,
            sid: "sid".into(),
            iat: 0,
            exp: 0,
        }
    }

    fn input(code: &str, username: Option<&str>) -> AddChildInput {
        AddChildInput {
            first_name: Some("Sam".into()),
            last_name: Some("Doe".into()),
            nick_name: None,
            username: username.map(Into::into),
            avatar: None,
            birth_date: Some("2016-4-9".into()),
            login_code: Some(code.into()),
        }
    }

    #[test]
    fn birth_date_format() {
        assert!(valid_birth_date("2016-4-9"));
        assert!(valid_birth_date("2016-04-09"));
        assert!(valid_birth_date("2016-12-31"));
        assert!(!valid_birth_date("2016-13-1"));
        assert!(!valid_birth_date("2016-2-30"));
        assert!(!valid_birth_date("16-4-9"));
        assert!(!valid_birth_date("2016/4/9"));
        assert!(!valid_birth_date("2016-4-9-1"));
        assert!(!valid_birth_date(""));
    }

    #[test]
    fn add_and_list_children() {
        let h = test_service();
        let p = parent("pat@x.com");
        h.svc.add_child(&p, &input("2222", None)).unwrap();
        h.svc.add_child(&p, &input("1111", Some("sam"))).unwrap();
        h.svc.add_child(&parent("other@x.com"), &input("3333", None)).unwrap();

        let mine = h.svc.list_children("pat@x.com").unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].login_code, "2222");
        assert_eq!(mine[0].id, "2222");
        assert_eq!(mine[1].login_code, "1111");
        assert!(h.svc.list_children("nobody@x.com").unwrap().is_empty());
    }

    #[test]
    fn children_listed_by_creation_time_not_code() {
        let h = test_service();
        let p = parent("pat@x.com");
        for (code, created) in [
            ("1111", "2024-03-01T00:00:00+00:00"),
            ("2222", "2024-01-01T00:00:00+00:00"),
            ("3333", "2024-02-01T00:00:00+00:00"),
        ] {
            let mut child = h.svc.add_child(&p, &input(code, None)).unwrap();
            child.created_at = created.into();
            h.svc.children.save(child).unwrap();
        }

        let codes: Vec<String> = h
            .svc
            .list_children("pat@x.com")
            .unwrap()
            .into_iter()
            .map(|c| c.login_code)
            .collect();
        assert_eq!(codes, ["2222", "3333", "1111"]);
    }

    #[test]
    fn same_code_updates_and_keeps_counters() {
        let h = test_service();
        let p = parent("pat@x.com");
        let first = h.svc.add_child(&p, &input("1111", Some("sam"))).unwrap();

        let mut stored = h.svc.children.get_or_err(&child_key("pat@x.com", "1111")).unwrap();
        stored.money_accumulated = 40;
        stored.tasks_completed = 2;
        h.svc.children.save(stored).unwrap();

        let mut update = input("1111", Some("Sam"));
        update.nick_name = Some("Sammy".into());
        let updated = h.svc.add_child(&p, &update).unwrap();

        assert_eq!(updated.nick_name.as_deref(), Some("Sammy"));
        assert_eq!(updated.money_accumulated, 40);
        assert_eq!(updated.tasks_completed, 2);
        assert_eq!(updated.created_at, first.created_at);
        assert_eq!(h.svc.list_children("pat@x.com").unwrap().len(), 1);
    }

    #[test]
    fn username_is_unique_across_parents() {
        let h = test_service();
        h.svc.add_child(&parent("pat@x.com"), &input("1111", Some("sam"))).unwrap();
        let err = h
            .svc
            .add_child(&parent("other@x.com"), &input("2222", Some("SAM")))
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict(_)));
    }

    #[test]
    fn add_child_validation() {
        let h = test_service();
        let p = parent("pat@x.com");

        let mut kid = parent("kid_1111@aidiy.com");
        kid.kind = LoginType::Kid;
        assert!(matches!(
            h.svc.add_child(&kid, &input("1111", None)),
            Err(AuthError::Forbidden(_))
        ));

        assert!(matches!(
            h.svc.add_child(&p, &input("11", None)),
            Err(AuthError::Validation(_))
        ));

        let mut bad_date = input("1111", None);
        bad_date.birth_date = Some("09/04/2016".into());
        assert!(matches!(
            h.svc.add_child(&p, &bad_date),
            Err(AuthError::Validation(_))
        ));

        let mut missing = input("1111", None);
        missing.first_name = None;
        assert!(matches!(
            h.svc.add_child(&p, &missing),
            Err(AuthError::Validation(_))
        ));
    }
}
