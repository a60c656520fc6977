//! 节点（房间 / 文件夹 / 文件）接口，以及回收站中已删除节点的查询与恢复。

use super::{
    endpoint::{Endpoint, ListQuery},
    models::{Range, UserInfo},
};
use crate::error::{DracoonError, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Room,
    Folder,
    File,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: i64,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub name: String,
    pub parent_id: Option<i64>,
    pub parent_path: Option<String>,
    pub size: Option<i64>,
    pub quota: Option<i64>,
    pub is_encrypted: Option<bool>,
    pub cnt_children: Option<i64>,
    pub cnt_deleted_versions: Option<i64>,
    pub created_at: Option<String>,
    pub created_by: Option<UserInfo>,
    pub updated_at: Option<String>,
    pub updated_by: Option<UserInfo>,
    pub notes: Option<String>,
    pub media_type: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeList {
    pub range: Range,
    #[serde(default)]
    pub items: Vec<Node>,
}

/// 回收站中同一路径下同名节点的汇总。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedNodeSummary {
    pub parent_id: i64,
    pub parent_path: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub cnt_versions: i64,
    pub first_deleted_at: Option<String>,
    pub last_deleted_at: Option<String>,
    pub last_deleted_node_id: i64,
    pub is_encrypted: Option<bool>,
    pub timestamp_creation: Option<String>,
    pub timestamp_modification: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedNodeSummaryList {
    pub range: Range,
    #[serde(default)]
    pub items: Vec<DeletedNodeSummary>,
}

/// 列出某个父节点下的子节点；`parent_id` 为 0 表示根目录。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeQuery {
    pub list: ListQuery,
    pub parent_id: i64,
    pub depth_level: Option<i64>,
    pub room_manager: Option<bool>,
}

impl NodeQuery {
    pub fn children_of(parent_id: i64) -> Self {
        NodeQuery {
            parent_id,
            ..Self::default()
        }
    }

    pub fn list(mut self, list: ListQuery) -> Self {
        self.list = list;
        self
    }

    pub fn depth_level(mut self, depth: i64) -> Self {
        self.depth_level = Some(depth);
        self
    }

    pub fn room_manager(mut self, room_manager: bool) -> Self {
        self.room_manager = Some(room_manager);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolder {
    pub parent_id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CreateFolder {
    pub fn new(parent_id: i64, name: impl Into<String>) -> Self {
        CreateFolder {
            parent_id,
            name: name.into(),
            notes: None,
        }
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// 恢复冲突时的处理策略。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStrategy {
    #[default]
    Autorename,
    Overwrite,
    Fail,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreNodes {
    pub deleted_node_ids: Vec<i64>,
    pub resolution_strategy: ResolutionStrategy,
    pub keep_share_links: bool,
    /// 为空时恢复到原父节点。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

impl RestoreNodes {
    pub fn new(deleted_node_ids: impl IntoIterator<Item = i64>) -> Self {
        RestoreNodes {
            deleted_node_ids: deleted_node_ids.into_iter().collect(),
            resolution_strategy: ResolutionStrategy::default(),
            keep_share_links: false,
            parent_id: None,
        }
    }

    pub fn into_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn resolution_strategy(mut self, strategy: ResolutionStrategy) -> Self {
        self.resolution_strategy = strategy;
        self
    }

    pub fn keep_share_links(mut self, keep: bool) -> Self {
        self.keep_share_links = keep;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteNodes {
    node_ids: Vec<i64>,
}

pub fn get_nodes(query: &NodeQuery) -> Endpoint<NodeList> {
    let endpoint = Endpoint::get("/nodes")
        .query("parent_id", query.parent_id)
        .query_opt("depth_level", query.depth_level)
        .query_opt("room_manager", query.room_manager);
    query.list.apply(endpoint)
}

pub fn get_node(node_id: i64) -> Endpoint<Node> {
    Endpoint::get(format!("/nodes/{node_id}"))
}

/// 按名称搜索；`depth_level` 为 -1 时搜索整棵子树。
pub fn search_nodes(search_string: &str, query: &NodeQuery) -> Result<Endpoint<NodeList>> {
    if search_string.trim().is_empty() {
        return Err(DracoonError::InvalidArgument(
            "search string is required".to_string(),
        ));
    }
    let endpoint = Endpoint::get("/nodes/search")
        .query("search_string", search_string)
        .query("parent_id", query.parent_id)
        .query_opt("depth_level", query.depth_level);
    Ok(query.list.apply(endpoint))
}

pub fn create_folder(folder: &CreateFolder) -> Result<Endpoint<Node>> {
    let name = folder.name.trim();
    if name.is_empty() {
        return Err(DracoonError::InvalidArgument(
            "folder name is required".to_string(),
        ));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(DracoonError::InvalidArgument(format!(
            "folder name {name:?} must not contain path separators"
        )));
    }
    Endpoint::post("/nodes/folders").json(folder)
}

pub fn delete_node(node_id: i64) -> Endpoint<()> {
    Endpoint::delete(format!("/nodes/{node_id}"))
}

pub fn delete_nodes(node_ids: &[i64]) -> Result<Endpoint<()>> {
    if node_ids.is_empty() {
        return Err(DracoonError::InvalidArgument(
            "at least one node id is required".to_string(),
        ));
    }
    Endpoint::delete("/nodes").json(&DeleteNodes {
        node_ids: node_ids.to_vec(),
    })
}

pub fn get_deleted_nodes(parent_id: i64, query: &ListQuery) -> Endpoint<DeletedNodeSummaryList> {
    query.apply(Endpoint::get(format!("/nodes/{parent_id}/deleted_nodes")))
}

pub fn restore_nodes(restore: &RestoreNodes) -> Result<Endpoint<()>> {
    if restore.deleted_node_ids.is_empty() {
        return Err(DracoonError::InvalidArgument(
            "at least one deleted node id is required".to_string(),
        ));
    }
    Endpoint::post("/nodes/deleted_nodes/actions/restore").json(restore)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn node_listing_query() {
        let endpoint = get_nodes(&NodeQuery::children_of(0).room_manager(true));
        assert_eq!(endpoint.path(), "/nodes");
        assert_eq!(endpoint.query_value("parent_id"), Some("0"));
        assert_eq!(endpoint.query_value("room_manager"), Some("true"));
        assert_eq!(endpoint.query_value("depth_level"), None);
    }

    #[test]
    fn search_requires_text() {
        assert!(search_nodes(" ", &NodeQuery::children_of(1)).is_err());
        let endpoint = search_nodes("report", &NodeQuery::children_of(1).depth_level(-1)).unwrap();
        assert_eq!(endpoint.query_value("search_string"), Some("report"));
        assert_eq!(endpoint.query_value("depth_level"), Some("-1"));
    }

    #[test]
    fn folder_payload() {
        let endpoint = create_folder(&CreateFolder::new(930, "Invoices")).unwrap();
        assert_eq!(endpoint.path(), "/nodes/folders");
        assert_eq!(
            endpoint.body().unwrap(),
            &json!({ "parentId": 930, "name": "Invoices" })
        );
        assert!(create_folder(&CreateFolder::new(930, "a/b")).is_err());
    }

    #[test]
    fn restore_payload() {
        let restore = RestoreNodes::new([11, 12]).into_parent(997);
        let endpoint = restore_nodes(&restore).unwrap();
        assert_eq!(endpoint.path(), "/nodes/deleted_nodes/actions/restore");
        assert_eq!(
            endpoint.body().unwrap(),
            &json!({
                "deletedNodeIds": [11, 12],
                "resolutionStrategy": "autorename",
                "keepShareLinks": false,
                "parentId": 997
            })
        );
        assert!(restore_nodes(&RestoreNodes::new(Vec::new())).is_err());
    }

    #[test]
    fn bulk_delete_payload() {
        let endpoint = delete_nodes(&[1, 2, 3]).unwrap();
        assert_eq!(endpoint.body().unwrap(), &json!({ "nodeIds": [1, 2, 3] }));
    }

    #[test]
    fn parses_deleted_node_summary() {
        let raw = json!({
            "range": { "offset": 0, "limit": 500, "total": 1 },
            "items": [{
                "parentId": 930,
                "parentPath": "/Projects/2021/",
                "name": "plan.docx",
                "type": "file",
                "cntVersions": 2,
                "lastDeletedNodeId": 4711
            }]
        });
        let list: DeletedNodeSummaryList = serde_json::from_value(raw).unwrap();
        assert_eq!(list.items[0].node_type, NodeType::File);
        assert_eq!(list.items[0].last_deleted_node_id, 4711);
    }
}
