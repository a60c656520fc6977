//! 组管理接口（需要 group manager 角色）。

use super::{
    endpoint::{Endpoint, ListQuery},
    models::{Expiration, IdList, LastAdminRoomList, Range, RoleList, UserInfo},
};
use crate::error::{DracoonError, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub created_at: Option<String>,
    pub created_by: Option<UserInfo>,
    pub updated_at: Option<String>,
    pub updated_by: Option<UserInfo>,
    pub expire_at: Option<String>,
    pub cnt_users: Option<i64>,
    pub group_roles: Option<RoleList>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupList {
    pub range: Range,
    #[serde(default)]
    pub items: Vec<Group>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupUser {
    pub user_info: UserInfo,
    pub is_member: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupUserList {
    pub range: Range,
    #[serde(default)]
    pub items: Vec<GroupUser>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroup {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<Expiration>,
}

impl CreateGroup {
    pub fn new(name: impl Into<String>) -> Self {
        CreateGroup {
            name: name.into(),
            expiration: None,
        }
    }

    pub fn expiration(mut self, expiration: Expiration) -> Self {
        self.expiration = Some(expiration);
        self
    }
}

/// 只序列化被设置的字段，未设置的字段保持服务端原值。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<Expiration>,
}

impl UpdateGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn expiration(mut self, expiration: Expiration) -> Self {
        self.expiration = Some(expiration);
        self
    }
}

pub fn create_group(group: &CreateGroup) -> Result<Endpoint<Group>> {
    if group.name.trim().is_empty() {
        return Err(DracoonError::InvalidArgument(
            "group name is required".to_string(),
        ));
    }
    Endpoint::post("/groups").json(group)
}

pub fn get_groups(query: &ListQuery) -> Endpoint<GroupList> {
    query.apply(Endpoint::get("/groups"))
}

pub fn get_group(group_id: i64) -> Endpoint<Group> {
    Endpoint::get(format!("/groups/{group_id}"))
}

pub fn update_group(group_id: i64, update: &UpdateGroup) -> Result<Endpoint<Group>> {
    Endpoint::put(format!("/groups/{group_id}")).json(update)
}

pub fn delete_group(group_id: i64) -> Endpoint<()> {
    Endpoint::delete(format!("/groups/{group_id}"))
}

pub fn get_group_users(group_id: i64, query: &ListQuery) -> Endpoint<GroupUserList> {
    query.apply(Endpoint::get(format!("/groups/{group_id}/users")))
}

/// 该组作为最后一名管理员的房间（会阻止删除组）。
pub fn get_group_last_admin_rooms(group_id: i64) -> Endpoint<LastAdminRoomList> {
    Endpoint::get(format!("/groups/{group_id}/last_admin_rooms"))
}

pub fn get_group_roles(group_id: i64) -> Endpoint<RoleList> {
    Endpoint::get(format!("/groups/{group_id}/roles"))
}

pub fn add_group_users(group_id: i64, user_ids: &[i64]) -> Result<Endpoint<Group>> {
    ensure_ids(user_ids)?;
    Endpoint::post(format!("/groups/{group_id}/users")).json(&IdList::new(user_ids.iter().copied()))
}

pub fn delete_group_users(group_id: i64, user_ids: &[i64]) -> Result<Endpoint<Group>> {
    ensure_ids(user_ids)?;
    Endpoint::delete(format!("/groups/{group_id}/users"))
        .json(&IdList::new(user_ids.iter().copied()))
}

fn ensure_ids(user_ids: &[i64]) -> Result<()> {
    if user_ids.is_empty() {
        return Err(DracoonError::InvalidArgument(
            "at least one user id is required".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use serde_json::json;

    #[test]
    fn create_group_payload_omits_unset_expiration() {
        let endpoint = create_group(&CreateGroup::new("Sales")).unwrap();
        assert_eq!(endpoint.path(), "/groups");
        assert_eq!(endpoint.body().unwrap(), &json!({ "name": "Sales" }));
    }

    #[test]
    fn create_group_with_expiration() {
        let group = CreateGroup::new("Temp").expiration(Expiration::at("2027-01-01T00:00:00Z"));
        let endpoint = create_group(&group).unwrap();
        assert_eq!(
            endpoint.body().unwrap(),
            &json!({
                "name": "Temp",
                "expiration": { "enableExpiration": true, "expireAt": "2027-01-01T00:00:00Z" }
            })
        );
    }

    #[test]
    fn empty_group_name_is_rejected() {
        assert!(create_group(&CreateGroup::new("  ")).is_err());
    }

    #[test]
    fn update_only_sends_changed_fields() {
        let endpoint = update_group(3, &UpdateGroup::new().name("Renamed")).unwrap();
        assert_eq!(endpoint.method(), &Method::PUT);
        assert_eq!(endpoint.path(), "/groups/3");
        assert_eq!(endpoint.body().unwrap(), &json!({ "name": "Renamed" }));
    }

    #[test]
    fn group_users_list_carries_paging() {
        let endpoint = get_group_users(9, &ListQuery::new().limit(100).sort("userName:asc"));
        assert_eq!(endpoint.path(), "/groups/9/users");
        assert_eq!(endpoint.query_value("offset"), Some("0"));
        assert_eq!(endpoint.query_value("limit"), Some("100"));
        assert_eq!(endpoint.query_value("sort"), Some("userName:asc"));
    }

    #[test]
    fn removing_users_uses_delete_with_body() {
        let endpoint = delete_group_users(4, &[1, 2]).unwrap();
        assert_eq!(endpoint.method(), &Method::DELETE);
        assert_eq!(endpoint.body().unwrap(), &json!({ "ids": [1, 2] }));
        assert!(add_group_users(4, &[]).is_err());
    }

    #[test]
    fn parses_group_list() {
        let raw = json!({
            "range": { "offset": 0, "limit": 500, "total": 1 },
            "items": [{
                "id": 1,
                "name": "Admins",
                "createdAt": "2021-11-01T10:00:00Z",
                "createdBy": { "id": 2, "userType": "internal", "firstName": "Jane" },
                "cntUsers": 5
            }]
        });
        let list: GroupList = serde_json::from_value(raw).unwrap();
        assert_eq!(list.range.total, 1);
        assert_eq!(list.items[0].cnt_users, Some(5));
        assert_eq!(list.items[0].created_by.as_ref().unwrap().id, 2);
    }
}
