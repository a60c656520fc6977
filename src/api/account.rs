use super::{endpoint::Endpoint, models::RoleList};
use serde::{Deserialize, Serialize};

/// 当前登录用户的账户信息。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: i64,
    pub user_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub is_locked: Option<bool>,
    pub has_manageable_rooms: Option<bool>,
    pub language: Option<String>,
    pub must_set_email: Option<bool>,
    pub needs_to_accept_eula: Option<bool>,
    pub expire_at: Option<String>,
    pub is_encryption_enabled: Option<bool>,
    pub last_login_successful_at: Option<String>,
    pub home_room_id: Option<i64>,
    pub user_roles: Option<RoleList>,
}

pub fn get_account() -> Endpoint<UserAccount> {
    Endpoint::get("/user/account")
}
