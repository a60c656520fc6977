//! 用户管理接口（需要 user manager 角色）。

use super::{
    endpoint::{Endpoint, ListQuery},
    models::{Expiration, LastAdminRoomList, Range, RoleList},
};
use crate::error::{DracoonError, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub user_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_locked: Option<bool>,
    pub avatar_uuid: Option<String>,
    pub expire_at: Option<String>,
    pub last_login_success_at: Option<String>,
    pub is_encryption_enabled: Option<bool>,
    pub has_manageable_rooms: Option<bool>,
    pub user_roles: Option<RoleList>,
    pub auth_data: Option<UserAuthData>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserList {
    pub range: Range,
    #[serde(default)]
    pub items: Vec<User>,
}

/// 用户的认证方式：`basic`（本地）、`active_directory`、`openid_connect`。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAuthData {
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub must_change_password: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad_config_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oid_config_id: Option<i64>,
}

impl UserAuthData {
    pub fn basic() -> Self {
        UserAuthData {
            method: "basic".to_string(),
            login: None,
            password: None,
            must_change_password: Some(true),
            ad_config_id: None,
            oid_config_id: None,
        }
    }

    pub fn openid_connect(oid_config_id: i64, login: impl Into<String>) -> Self {
        UserAuthData {
            method: "openid_connect".to_string(),
            login: Some(login.into()),
            password: None,
            must_change_password: None,
            ad_config_id: None,
            oid_config_id: Some(oid_config_id),
        }
    }

    pub fn active_directory(ad_config_id: i64, login: impl Into<String>) -> Self {
        UserAuthData {
            method: "active_directory".to_string(),
            login: Some(login.into()),
            password: None,
            must_change_password: None,
            ad_config_id: Some(ad_config_id),
            oid_config_id: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
    pub email: String,
    pub auth_data: UserAuthData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_user: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<Expiration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl CreateUser {
    /// 本地用户：用户名默认为邮箱，首次登录需要修改密码，并发送通知邮件。
    pub fn local(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        let email = email.into();
        CreateUser {
            first_name: first_name.into(),
            last_name: last_name.into(),
            user_name: email.clone(),
            email,
            auth_data: UserAuthData::basic(),
            receiver_language: None,
            notify_user: Some(true),
            expiration: None,
            phone: None,
        }
    }

    pub fn user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = user_name.into();
        self
    }

    pub fn auth_data(mut self, auth_data: UserAuthData) -> Self {
        self.auth_data = auth_data;
        self
    }

    pub fn receiver_language(mut self, language: impl Into<String>) -> Self {
        self.receiver_language = Some(language.into());
        self
    }

    pub fn notify_user(mut self, notify: bool) -> Self {
        self.notify_user = Some(notify);
        self
    }

    pub fn expiration(mut self, expiration: Expiration) -> Self {
        self.expiration = Some(expiration);
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<Expiration>,
}

impl UpdateUser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn first_name(mut self, value: impl Into<String>) -> Self {
        self.first_name = Some(value.into());
        self
    }

    pub fn last_name(mut self, value: impl Into<String>) -> Self {
        self.last_name = Some(value.into());
        self
    }

    pub fn email(mut self, value: impl Into<String>) -> Self {
        self.email = Some(value.into());
        self
    }

    pub fn locked(mut self, locked: bool) -> Self {
        self.is_locked = Some(locked);
        self
    }

    pub fn expiration(mut self, expiration: Expiration) -> Self {
        self.expiration = Some(expiration);
        self
    }
}

/// 用户所属组的摘要。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGroup {
    pub id: i64,
    pub name: String,
    pub is_member: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGroupList {
    pub range: Range,
    #[serde(default)]
    pub items: Vec<UserGroup>,
}

pub fn get_users(query: &ListQuery) -> Endpoint<UserList> {
    query.apply(Endpoint::get("/users"))
}

pub fn get_user(user_id: i64) -> Endpoint<User> {
    Endpoint::get(format!("/users/{user_id}"))
}

pub fn create_user(user: &CreateUser) -> Result<Endpoint<User>> {
    if user.user_name.trim().is_empty() {
        return Err(DracoonError::InvalidArgument(
            "user name is required".to_string(),
        ));
    }
    if !user.email.contains('@') {
        return Err(DracoonError::InvalidArgument(format!(
            "invalid email address {:?}",
            user.email
        )));
    }
    Endpoint::post("/users").json(user)
}

pub fn update_user(user_id: i64, update: &UpdateUser) -> Result<Endpoint<User>> {
    Endpoint::put(format!("/users/{user_id}")).json(update)
}

pub fn delete_user(user_id: i64) -> Endpoint<()> {
    Endpoint::delete(format!("/users/{user_id}"))
}

pub fn get_user_groups(user_id: i64, query: &ListQuery) -> Endpoint<UserGroupList> {
    query.apply(Endpoint::get(format!("/users/{user_id}/groups")))
}

/// 用户作为最后一名管理员的房间（会阻止删除用户）。
pub fn get_user_last_admin_rooms(user_id: i64) -> Endpoint<LastAdminRoomList> {
    Endpoint::get(format!("/users/{user_id}/last_admin_rooms"))
}

pub fn get_user_roles(user_id: i64) -> Endpoint<RoleList> {
    Endpoint::get(format!("/users/{user_id}/roles"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn local_user_payload() {
        let user = CreateUser::local("Jane", "Doe", "jane@example.com").receiver_language("de-DE");
        let endpoint = create_user(&user).unwrap();
        assert_eq!(endpoint.path(), "/users");
        assert_eq!(
            endpoint.body().unwrap(),
            &json!({
                "firstName": "Jane",
                "lastName": "Doe",
                "userName": "jane@example.com",
                "email": "jane@example.com",
                "authData": { "method": "basic", "mustChangePassword": true },
                "receiverLanguage": "de-DE",
                "notifyUser": true
            })
        );
    }

    #[test]
    fn oidc_user_carries_login() {
        let user = CreateUser::local("Jo", "Roe", "jo@example.com")
            .auth_data(UserAuthData::openid_connect(2, "jo"));
        let body = create_user(&user).unwrap().body().cloned().unwrap();
        assert_eq!(
            body["authData"],
            json!({ "method": "openid_connect", "login": "jo", "oidConfigId": 2 })
        );
    }

    #[test]
    fn invalid_email_is_rejected() {
        let user = CreateUser::local("Jo", "Roe", "not-an-email");
        assert!(matches!(
            create_user(&user),
            Err(DracoonError::InvalidArgument(_))
        ));
    }

    #[test]
    fn lock_user_update() {
        let endpoint = update_user(12, &UpdateUser::new().locked(true)).unwrap();
        assert_eq!(endpoint.path(), "/users/12");
        assert_eq!(endpoint.body().unwrap(), &json!({ "isLocked": true }));
    }

    #[test]
    fn user_sub_resources() {
        assert_eq!(get_user_roles(5).path(), "/users/5/roles");
        assert_eq!(get_user_last_admin_rooms(5).path(), "/users/5/last_admin_rooms");
        assert_eq!(
            get_user_groups(5, &ListQuery::new()).query_value("offset"),
            Some("0")
        );
    }

    #[test]
    fn parses_user_list() {
        let raw = json!({
            "range": { "offset": 0, "limit": 500, "total": 2 },
            "items": [
                { "id": 1, "userName": "admin", "firstName": "Admin", "isLocked": false },
                { "id": 2, "userName": "jane@example.com", "email": "jane@example.com" }
            ]
        });
        let list: UserList = serde_json::from_value(raw).unwrap();
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.items[1].email.as_deref(), Some("jane@example.com"));
    }
}
