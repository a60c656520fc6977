use super::endpoint::Endpoint;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftwareVersion {
    pub rest_api_version: String,
    pub sds_server_version: String,
    pub build_date: Option<String>,
    pub is_dracoon_cloud: Option<bool>,
    pub scm_revision_number: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub language_default: String,
    pub s3_enforce_direct_upload: Option<bool>,
    pub use_s3_storage: Option<bool>,
    pub hide_login_input_fields: Option<bool>,
    pub s3_hosts: Option<Vec<String>>,
    pub is_dracoon_cloud: Option<bool>,
}

/// 公开接口，无需登录即可访问。
pub fn get_software_version() -> Endpoint<SoftwareVersion> {
    Endpoint::get("/public/software/version").anonymous()
}

pub fn get_system_info() -> Endpoint<SystemInfo> {
    Endpoint::get("/public/system/info").anonymous()
}
