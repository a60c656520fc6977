//! 审计日志接口（需要 auditor 角色）。

use super::{
    endpoint::{Endpoint, ListQuery},
    models::{Range, UserInfo},
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    pub id: i64,
    pub time: String,
    pub user_id: i64,
    pub message: String,
    pub operation_id: Option<i64>,
    pub operation_name: Option<String>,
    pub status: Option<i64>,
    pub user_client: Option<String>,
    pub customer_id: Option<i64>,
    pub user_name: Option<String>,
    pub user_ip: Option<String>,
    pub auth_parent_source: Option<String>,
    pub auth_parent_target: Option<String>,
    pub object_id1: Option<i64>,
    pub object_type1: Option<i64>,
    pub object_name1: Option<String>,
    pub object_id2: Option<i64>,
    pub object_type2: Option<i64>,
    pub object_name2: Option<String>,
    pub attribute1: Option<String>,
    pub attribute2: Option<String>,
    pub attribute3: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEventList {
    pub range: Range,
    #[serde(default)]
    pub items: Vec<LogEvent>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditUserPermission {
    pub user_id: i64,
    pub user_login: Option<String>,
    pub user_first_name: Option<String>,
    pub user_last_name: Option<String>,
    pub permissions: Option<serde_json::Value>,
}

/// 单个房间的权限审计结果。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditNode {
    pub node_id: i64,
    pub node_name: String,
    pub node_parent_path: Option<String>,
    pub node_parent_id: Option<i64>,
    pub node_size: Option<i64>,
    pub node_recycle_bin_retention_period: Option<i64>,
    pub node_is_encrypted: Option<bool>,
    pub node_has_activities_log: Option<bool>,
    pub node_created_at: Option<String>,
    pub node_created_by: Option<UserInfo>,
    pub node_updated_at: Option<String>,
    pub node_updated_by: Option<UserInfo>,
    #[serde(default)]
    pub audit_user_permission_list: Vec<AuditUserPermission>,
}

/// 事件查询参数；`operation_id` 对应 API 的 `type` 参数。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventQuery {
    pub list: ListQuery,
    pub date_start: Option<String>,
    pub date_end: Option<String>,
    pub operation_id: Option<i64>,
    pub user_id: Option<i64>,
}

impl EventQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(mut self, list: ListQuery) -> Self {
        self.list = list;
        self
    }

    pub fn date_start(mut self, value: impl Into<String>) -> Self {
        self.date_start = Some(value.into());
        self
    }

    pub fn date_end(mut self, value: impl Into<String>) -> Self {
        self.date_end = Some(value.into());
        self
    }

    pub fn operation_id(mut self, value: i64) -> Self {
        self.operation_id = Some(value);
        self
    }

    pub fn user_id(mut self, value: i64) -> Self {
        self.user_id = Some(value);
        self
    }
}

/// 所有房间的用户权限。
pub fn get_permissions(query: &ListQuery) -> Endpoint<Vec<AuditNode>> {
    query.apply(Endpoint::get("/eventlog/audits/nodes"))
}

pub fn get_events(query: &EventQuery) -> Endpoint<LogEventList> {
    let endpoint = Endpoint::get("/eventlog/events")
        .query("offset", query.list.offset)
        .query_opt("date_start", query.date_start.as_deref())
        .query_opt("date_end", query.date_end.as_deref())
        .query_opt("type", query.operation_id)
        .query_opt("user_id", query.user_id);

    endpoint
        .query_opt("filter", query.list.filter.as_deref())
        .query_opt("limit", query.list.limit)
        .query_opt("sort", query.list.sort.as_deref())
}
