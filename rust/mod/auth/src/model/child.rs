use serde::{Deserialize, Serialize};

/// A child profile owned by a parent account.
///
/// Keyed by `{parentEmail}:{loginCode}`: a parent cannot have two children
/// sharing a login code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Child {
    pub parent_email: String,
    /// Same as `login_code`.
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nick_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// `YYYY-M-D`, as sent by the client.
    pub birth_date: String,
    /// 4-digit kid login code.
    pub login_code: String,
    #[serde(default)]
    pub money_accumulated: u64,
    #[serde(default)]
    pub tasks_assigned: u32,
    #[serde(default)]
    pub tasks_completed: u32,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Child {
    /// Name shown on the kid's account.
    pub fn display_name(&self) -> &str {
        self.nick_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.first_name)
    }
}

/// Input for adding (or re-saving) a child.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChildInput {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub nick_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub login_code: Option<String>,
}

/// Input for kid login.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KidLoginInput {
    #[serde(default)]
    pub code: Option<String>,
}
