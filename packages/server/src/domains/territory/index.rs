use std::collections::{HashMap, HashSet};

use anyhow::{bail, Result};

use crate::common::ApiError;
use crate::domains::territory::models::{AncestryLabel, NodeKind, TerritorialNode};

/// Read-only index over the territorial reference tree.
///
/// Built once at startup from reference data and shared across requests.
/// All lookups are pure; mutation is not exposed.
#[derive(Debug)]
pub struct TerritoryIndex {
    nodes: HashMap<i32, TerritorialNode>,
    children: HashMap<i32, Vec<i32>>,
}

impl TerritoryIndex {
    /// Build the index, validating the tree shape.
    ///
    /// Rejects duplicate codes, dangling parents, parentless non-regions,
    /// regions with parents, and kind-chain skips.
    pub fn build(nodes: Vec<TerritorialNode>) -> Result<Self> {
        let mut by_code: HashMap<i32, TerritorialNode> = HashMap::with_capacity(nodes.len());
        for node in nodes {
            if by_code.insert(node.code, node.clone()).is_some() {
                bail!("duplicate territorial code {}", node.code);
            }
        }

        let mut children: HashMap<i32, Vec<i32>> = HashMap::new();
        for node in by_code.values() {
            match node.parent_code {
                None => {
                    if node.kind != NodeKind::Region {
                        bail!(
                            "node {} ({}) has no parent but is not a region",
                            node.code,
                            node.kind.as_str()
                        );
                    }
                }
                Some(parent_code) => {
                    let parent = match by_code.get(&parent_code) {
                        Some(p) => p,
                        None => bail!(
                            "node {} references unknown parent {}",
                            node.code,
                            parent_code
                        ),
                    };
                    if parent.kind.child_kind() != Some(node.kind) {
                        bail!(
                            "node {} ({}) cannot be a child of {} ({})",
                            node.code,
                            node.kind.as_str(),
                            parent.code,
                            parent.kind.as_str()
                        );
                    }
                    children.entry(parent_code).or_default().push(node.code);
                }
            }
        }

        // Deterministic child ordering
        for list in children.values_mut() {
            list.sort_unstable();
        }

        Ok(Self {
            nodes: by_code,
            children,
        })
    }

    pub fn node(&self, code: i32) -> Result<&TerritorialNode, ApiError> {
        self.nodes
            .get(&code)
            .ok_or_else(|| ApiError::NotFound(format!("territorial node {}", code)))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, code: i32) -> &[i32] {
        self.children.get(&code).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Chain from the node up to its region, node first.
    pub fn parent_chain(&self, code: i32) -> Result<Vec<&TerritorialNode>, ApiError> {
        let mut chain = Vec::with_capacity(4);
        let mut current = self.node(code)?;
        chain.push(current);
        while let Some(parent_code) = current.parent_code {
            current = self.node(parent_code)?;
            chain.push(current);
        }
        Ok(chain)
    }

    /// Codes of the node itself and everything below it.
    pub fn descendants(&self, code: i32) -> Result<HashSet<i32>, ApiError> {
        self.node(code)?;
        let mut out = HashSet::new();
        let mut stack = vec![code];
        while let Some(current) = stack.pop() {
            if out.insert(current) {
                stack.extend(self.children(current).iter().copied());
            }
        }
        Ok(out)
    }

    /// Polling-station codes at and below the node.
    pub fn stations_under(&self, code: i32) -> Result<Vec<i32>, ApiError> {
        let mut stations: Vec<i32> = self
            .descendants(code)?
            .into_iter()
            .filter(|c| {
                self.nodes
                    .get(c)
                    .map(|n| n.kind == NodeKind::PollingStation)
                    .unwrap_or(false)
            })
            .collect();
        stations.sort_unstable();
        Ok(stations)
    }

    /// The department governing a node: the node itself for departments,
    /// the department ancestor for arrondissements and polling stations.
    pub fn department_of(&self, code: i32) -> Result<&TerritorialNode, ApiError> {
        self.parent_chain(code)?
            .into_iter()
            .find(|n| n.kind == NodeKind::Department)
            .ok_or_else(|| {
                ApiError::InvalidPayload(format!("node {} is not under a department", code))
            })
    }

    /// Ancestry labels for display enrichment, region last.
    pub fn ancestry(&self, code: i32) -> Result<Vec<AncestryLabel>, ApiError> {
        Ok(self
            .parent_chain(code)?
            .into_iter()
            .map(AncestryLabel::from)
            .collect())
    }

    /// Expect the node to have the given kind.
    pub fn node_of_kind(&self, code: i32, kind: NodeKind) -> Result<&TerritorialNode, ApiError> {
        let node = self.node(code)?;
        if node.kind != kind {
            return Err(ApiError::InvalidPayload(format!(
                "node {} is a {}, expected a {}",
                code,
                node.kind.as_str(),
                kind.as_str()
            )));
        }
        Ok(node)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    fn node(code: i32, libelle: &str, kind: NodeKind, parent: Option<i32>) -> TerritorialNode {
        TerritorialNode {
            code,
            libelle: libelle.to_string(),
            kind,
            parent_code: parent,
        }
    }

    /// One region, two departments; department 1 has two arrondissements
    /// (11, 12) with stations 111/112 and 121; department 2 has
    /// arrondissement 21 with station 211.
    pub fn small_tree() -> TerritoryIndex {
        TerritoryIndex::build(vec![
            node(100, "Littoral", NodeKind::Region, None),
            node(1, "Wouri", NodeKind::Department, Some(100)),
            node(2, "Moungo", NodeKind::Department, Some(100)),
            node(11, "Douala I", NodeKind::Arrondissement, Some(1)),
            node(12, "Douala II", NodeKind::Arrondissement, Some(1)),
            node(21, "Nkongsamba", NodeKind::Arrondissement, Some(2)),
            node(111, "EP Bonanjo A", NodeKind::PollingStation, Some(11)),
            node(112, "EP Bonanjo B", NodeKind::PollingStation, Some(11)),
            node(121, "Lycee Akwa", NodeKind::PollingStation, Some(12)),
            node(211, "EP Quartier 3", NodeKind::PollingStation, Some(21)),
        ])
        .expect("fixture tree is valid")
    }
}
