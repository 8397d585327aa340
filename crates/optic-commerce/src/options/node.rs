//! Option tree data model and catalog loading.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CommerceError;
use crate::money::{Currency, Money};

const EYEGLASSES_CATALOG: &str = include_str!("eyeglasses.json");

/// One selectable choice under a branch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionChoice {
    /// Key recorded in a configuration path.
    pub key: String,
    pub node: OptionNode,
}

/// Whether a node continues the configuration or ends it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeKind {
    /// Node with further choices. `step` names the choice group shown next.
    Branch {
        step: String,
        children: Vec<OptionChoice>,
    },
    /// Terminal choice.
    Leaf,
}

/// A node in the option tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionNode {
    pub label: String,
    /// Price added when this node is on the path.
    pub price_delta: Money,
    /// Lens requires an addition power (progressive/bifocal).
    pub multifocal: bool,
    pub kind: NodeKind,
}

impl OptionNode {
    /// Create a terminal node.
    pub fn leaf(label: impl Into<String>, price_delta: Money) -> Self {
        Self {
            label: label.into(),
            price_delta,
            multifocal: false,
            kind: NodeKind::Leaf,
        }
    }

    /// Create a node with children. An empty child list yields a leaf.
    pub fn branch(
        label: impl Into<String>,
        price_delta: Money,
        step: impl Into<String>,
        children: Vec<OptionChoice>,
    ) -> Self {
        let kind = if children.is_empty() {
            NodeKind::Leaf
        } else {
            NodeKind::Branch {
                step: step.into(),
                children,
            }
        };
        Self {
            label: label.into(),
            price_delta,
            multifocal: false,
            kind,
        }
    }

    pub fn with_multifocal(mut self, multifocal: bool) -> Self {
        self.multifocal = multifocal;
        self
    }

    pub fn children(&self) -> Option<&[OptionChoice]> {
        match &self.kind {
            NodeKind::Branch { children, .. } => Some(children),
            NodeKind::Leaf => None,
        }
    }

    /// Name of the choice group below this node.
    pub fn step(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Branch { step, .. } => Some(step),
            NodeKind::Leaf => None,
        }
    }

    /// Look up a direct child by key.
    pub fn child(&self, key: &str) -> Option<&OptionNode> {
        self.children()?
            .iter()
            .find(|c| c.key == key)
            .map(|c| &c.node)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf)
    }

    /// Longest number of selections below this node.
    pub fn depth(&self) -> usize {
        match &self.kind {
            NodeKind::Leaf => 0,
            NodeKind::Branch { children, .. } => {
                1 + children.iter().map(|c| c.node.depth()).max().unwrap_or(0)
            }
        }
    }
}

/// Static catalog of sequential lens choices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionTree {
    /// Display name of the configured product.
    pub product: String,
    pub currency: Currency,
    pub root: OptionNode,
}

impl OptionTree {
    /// The eyeglass lens catalog compiled into the binary.
    pub fn eyeglasses() -> Result<Self, CommerceError> {
        Self::from_json(EYEGLASSES_CATALOG)
    }

    /// Parse and validate a catalog definition.
    pub fn from_json(source: &str) -> Result<Self, CommerceError> {
        let raw: RawCatalog = serde_json::from_str(source)
            .map_err(|e| CommerceError::InvalidCatalog(e.to_string()))?;
        let currency = Currency::from_code(&raw.currency)
            .ok_or_else(|| CommerceError::InvalidCatalog(format!("unknown currency {}", raw.currency)))?;

        let builder = TreeBuilder {
            groups: &raw.groups,
            currency,
        };
        let mut visiting = HashSet::new();
        let children = builder.build_children(&raw.children, "root", &mut visiting)?;
        if children.is_empty() {
            return Err(CommerceError::InvalidCatalog("catalog has no choices".to_string()));
        }

        Ok(Self {
            product: raw.product.clone(),
            currency,
            root: OptionNode::branch(raw.product, Money::zero(currency), raw.step, children),
        })
    }

    /// Maximum configuration path length.
    pub fn depth(&self) -> usize {
        self.root.depth()
    }
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    product: String,
    currency: String,
    step: String,
    children: Vec<RawNode>,
    #[serde(default)]
    groups: HashMap<String, RawGroup>,
}

#[derive(Debug, Deserialize)]
struct RawGroup {
    step: String,
    children: Vec<RawNode>,
}

#[derive(Debug, Deserialize)]
struct RawNode {
    key: String,
    label: String,
    price: String,
    #[serde(default)]
    multifocal: bool,
    /// Legacy terminal marker. Children presence decides continuation.
    #[serde(default, rename = "final")]
    final_flag: bool,
    step: Option<String>,
    #[serde(default)]
    children: Vec<RawNode>,
    children_from: Option<String>,
}

struct TreeBuilder<'a> {
    groups: &'a HashMap<String, RawGroup>,
    currency: Currency,
}

impl TreeBuilder<'_> {
    fn build_children(
        &self,
        raw: &[RawNode],
        parent: &str,
        visiting: &mut HashSet<String>,
    ) -> Result<Vec<OptionChoice>, CommerceError> {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(raw.len());
        for node in raw {
            if !seen.insert(node.key.as_str()) {
                return Err(CommerceError::InvalidCatalog(format!(
                    "duplicate key '{}' under '{}'",
                    node.key, parent
                )));
            }
            out.push(OptionChoice {
                key: node.key.clone(),
                node: self.build_node(node, visiting)?,
            });
        }
        Ok(out)
    }

    fn build_node(
        &self,
        raw: &RawNode,
        visiting: &mut HashSet<String>,
    ) -> Result<OptionNode, CommerceError> {
        if raw.key.trim().is_empty() || raw.label.trim().is_empty() {
            return Err(CommerceError::InvalidCatalog(
                "option key and label must be non-empty".to_string(),
            ));
        }
        let price_delta = Money::parse_decimal(&raw.price, self.currency)
            .filter(|m| !m.is_negative())
            .ok_or_else(|| {
                CommerceError::InvalidCatalog(format!("bad price '{}' on '{}'", raw.price, raw.key))
            })?;

        let (step, children) = match (&raw.children_from, raw.children.is_empty()) {
            (Some(_), false) => {
                return Err(CommerceError::InvalidCatalog(format!(
                    "'{}' has both children and children_from",
                    raw.key
                )))
            }
            (Some(group_name), true) => {
                let group = self.groups.get(group_name).ok_or_else(|| {
                    CommerceError::InvalidCatalog(format!("unknown group '{}'", group_name))
                })?;
                if !visiting.insert(group_name.clone()) {
                    return Err(CommerceError::InvalidCatalog(format!(
                        "group '{}' includes itself",
                        group_name
                    )));
                }
                let children = self.build_children(&group.children, &raw.key, visiting)?;
                visiting.remove(group_name);
                (group.step.clone(), children)
            }
            (None, false) => {
                let step = raw.step.clone().ok_or_else(|| {
                    CommerceError::InvalidCatalog(format!("'{}' has children but no step", raw.key))
                })?;
                (step, self.build_children(&raw.children, &raw.key, visiting)?)
            }
            (None, true) => (String::new(), Vec::new()),
        };

        if raw.final_flag && !children.is_empty() {
            debug!(key = %raw.key, "ignoring final flag on node with children");
        }

        Ok(OptionNode::branch(raw.label.clone(), price_delta, step, children)
            .with_multifocal(raw.multifocal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_loads() {
        let tree = OptionTree::eyeglasses().unwrap();
        assert_eq!(tree.currency, Currency::USD);
        assert_eq!(tree.root.step(), Some("Lens Type"));
        assert_eq!(tree.depth(), 5);
    }

    #[test]
    fn test_final_flag_does_not_stop_traversal() {
        let tree = OptionTree::eyeglasses().unwrap();
        let light = tree
            .root
            .child("single-vision")
            .and_then(|n| n.child("standard"))
            .and_then(|n| n.child("light-responsive"))
            .unwrap();
        assert!(!light.is_leaf());
        assert_eq!(light.step(), Some("Light-responsive Lens"));
        let xtractive = light.child("transitions-xtractive").unwrap();
        assert_eq!(xtractive.step(), Some("Final Option"));
        assert!(xtractive.child("grey").unwrap().is_leaf());
    }

    #[test]
    fn test_group_children_are_shared() {
        let tree = OptionTree::eyeglasses().unwrap();
        let a = tree.root.child("single-vision").unwrap().children().unwrap().len();
        let b = tree.root.child("progressive").unwrap().children().unwrap().len();
        assert_eq!(a, b);
        assert!(tree.root.child("progressive").unwrap().multifocal);
    }

    #[test]
    fn test_empty_children_is_leaf() {
        let json = r#"{"product":"P","currency":"USD","step":"S","children":[
            {"key":"a","label":"A","price":"0","children":[]}
        ]}"#;
        let tree = OptionTree::from_json(json).unwrap();
        assert!(tree.root.child("a").unwrap().is_leaf());
    }

    #[test]
    fn test_rejects_duplicate_keys() {
        let json = r#"{"product":"P","currency":"USD","step":"S","children":[
            {"key":"a","label":"A","price":"0"},
            {"key":"a","label":"B","price":"0"}
        ]}"#;
        assert!(matches!(
            OptionTree::from_json(json),
            Err(CommerceError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn test_rejects_negative_price_and_self_reference() {
        let negative = r#"{"product":"P","currency":"USD","step":"S","children":[
            {"key":"a","label":"A","price":"-5"}
        ]}"#;
        assert!(OptionTree::from_json(negative).is_err());

        let cyclic = r#"{"product":"P","currency":"USD","step":"S","children":[
            {"key":"a","label":"A","price":"0","children_from":"g"}
        ],"groups":{"g":{"step":"G","children":[
            {"key":"b","label":"B","price":"0","children_from":"g"}
        ]}}}"#;
        assert!(OptionTree::from_json(cyclic).is_err());
    }
}
