//! Node metadata: version, commit id and service description.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::pipeline::RequestPipeline;
use crate::response::decode_as;
use crate::transport::ApiRequest;

const API_NODE_ENDPOINT: &str = "/api/v2/node";

/// Semantic version of a vault node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl fmt::Display for NodeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Public description of a vault node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeInfo {
    pub service_did: String,
    pub owner_did: String,
    pub ownership_presentation: Value,
    pub name: String,
    pub email: String,
    pub description: String,
    pub version: String,
    pub last_commit_id: String,
    pub user_count: Option<u64>,
    pub vault_count: Option<u64>,
    pub database_size: Option<u64>,
}

#[derive(Deserialize)]
struct CommitIdResponse {
    commit_id: String,
}

/// Reads node metadata.
///
/// Version and commit id are public; node info requires a token.
#[derive(Clone)]
pub struct AboutService {
    pipeline: Arc<RequestPipeline>,
}

impl AboutService {
    pub fn new(pipeline: Arc<RequestPipeline>) -> Self {
        Self { pipeline }
    }

    /// Returns the node's software version.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedResponse` if the version is not numeric.
    pub async fn node_version(&self) -> Result<NodeVersion> {
        let request = ApiRequest::get(format!("{API_NODE_ENDPOINT}/version"));
        decode_as(self.pipeline.send_anonymous(&request).await?)
    }

    /// Returns the source commit the node was built from.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedResponse` if the payload has no `commit_id`.
    pub async fn commit_id(&self) -> Result<String> {
        let request = ApiRequest::get(format!("{API_NODE_ENDPOINT}/commit_id"));
        let response: CommitIdResponse = decode_as(self.pipeline.send_anonymous(&request).await?)?;
        Ok(response.commit_id)
    }

    /// Returns the node's service description.
    ///
    /// # Errors
    ///
    /// Returns `Error::Unauthorized` if no valid token can be obtained.
    pub async fn node_info(&self) -> Result<NodeInfo> {
        let request = ApiRequest::get(format!("{API_NODE_ENDPOINT}/info"));
        decode_as(self.pipeline.send(&request).await?)
    }
}
