use serde::{Deserialize, Serialize};

use crate::common::ApiError;

/// Level of a node in the territorial hierarchy.
///
/// The parent chain is strict: region → department → arrondissement →
/// polling station, with no skips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Region,
    Department,
    Arrondissement,
    PollingStation,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Region => "region",
            NodeKind::Department => "department",
            NodeKind::Arrondissement => "arrondissement",
            NodeKind::PollingStation => "polling_station",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "region" => Ok(NodeKind::Region),
            "department" => Ok(NodeKind::Department),
            "arrondissement" => Ok(NodeKind::Arrondissement),
            "polling_station" => Ok(NodeKind::PollingStation),
            other => Err(ApiError::InvalidPayload(format!(
                "unknown territorial kind '{}'",
                other
            ))),
        }
    }

    /// Depth in the hierarchy, region = 0.
    pub fn rank(&self) -> u8 {
        match self {
            NodeKind::Region => 0,
            NodeKind::Department => 1,
            NodeKind::Arrondissement => 2,
            NodeKind::PollingStation => 3,
        }
    }

    /// The kind a child of this node must have, if children are allowed.
    pub fn child_kind(&self) -> Option<NodeKind> {
        match self {
            NodeKind::Region => Some(NodeKind::Department),
            NodeKind::Department => Some(NodeKind::Arrondissement),
            NodeKind::Arrondissement => Some(NodeKind::PollingStation),
            NodeKind::PollingStation => None,
        }
    }
}

/// One node of the Region→Department→Arrondissement→PollingStation tree.
///
/// Codes are stable external identifiers; nodes are immutable once the
/// reference data is loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerritorialNode {
    pub code: i32,
    pub libelle: String,
    pub kind: NodeKind,
    pub parent_code: Option<i32>,
}

/// Ancestry entry used to enrich gateway responses with territorial labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AncestryLabel {
    pub code: i32,
    pub kind: NodeKind,
    pub libelle: String,
}

impl From<&TerritorialNode> for AncestryLabel {
    fn from(node: &TerritorialNode) -> Self {
        Self {
            code: node.code,
            kind: node.kind,
            libelle: node.libelle.clone(),
        }
    }
}
