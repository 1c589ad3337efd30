//! The evidence envelope returned by a guest's `check` export, before the
//! runtime lifts it into the richer `reglet_types::Evidence` shape (which
//! additionally carries a timestamp stamped by the host).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error_detail::ErrorDetail;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceEnvelope {
    pub status: bool,
    #[serde(default)]
    pub data: serde_json::Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}
