use serde::{Deserialize, Serialize};

/// 列表响应中的分页信息。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub offset: u64,
    pub limit: u64,
    pub total: u64,
}

/// 其他对象中内嵌的用户摘要（createdBy / updatedBy 等）。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: i64,
    pub user_type: Option<String>,
    pub avatar_uuid: Option<String>,
    pub user_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

/// 用户/组的过期设置。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expiration {
    pub enable_expiration: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<String>,
}

impl Expiration {
    pub fn at(expire_at: impl Into<String>) -> Self {
        Expiration {
            enable_expiration: true,
            expire_at: Some(expire_at.into()),
        }
    }

    pub fn never() -> Self {
        Expiration::default()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Right {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub items: Vec<Right>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleList {
    #[serde(default)]
    pub items: Vec<Role>,
}

/// 用户或组作为最后一名管理员的房间。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastAdminRoom {
    pub id: i64,
    pub name: String,
    pub parent_path: Option<String>,
    pub parent_id: Option<i64>,
    pub last_admin_in_group: Option<bool>,
    pub last_admin_in_group_id: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastAdminRoomList {
    #[serde(default)]
    pub items: Vec<LastAdminRoom>,
}

/// 批量操作使用的 `{"ids": [...]}` 请求体。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdList {
    pub ids: Vec<i64>,
}

impl IdList {
    pub fn new(ids: impl IntoIterator<Item = i64>) -> Self {
        IdList {
            ids: ids.into_iter().collect(),
        }
    }
}
