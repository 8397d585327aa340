//! Walks the option tree and prices a configuration path.

use std::sync::Arc;

use serde::Serialize;

use crate::error::{CommerceError, ValidationErrors};
use crate::money::Money;
use crate::options::{OptionNode, OptionTree};

/// Ordered keys selected from the root down to the current node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConfigurationPath(Vec<String>);

impl ConfigurationPath {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ConfigurationPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// A choice offered at a step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceView {
    pub key: String,
    pub label: String,
    pub price_delta: Money,
}

/// The next decision the buyer has to make.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    /// Zero-based position in the path this step fills.
    pub index: usize,
    pub name: String,
    pub choices: Vec<ChoiceView>,
}

/// Result of a selection: the new path, its price, and what comes next.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub path: ConfigurationPath,
    pub total: Money,
    /// `None` once the path ends on a leaf.
    pub next: Option<Step>,
}

impl Selection {
    pub fn is_complete(&self) -> bool {
        self.next.is_none()
    }
}

/// One resolved selection along a path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedStep {
    /// Name of the choice group (e.g. "Lens Material").
    pub step: String,
    pub key: String,
    pub label: String,
    pub price_delta: Money,
}

/// A complete lens configuration ready to be serialized into cart attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfiguredLens {
    pub path: ConfigurationPath,
    pub steps: Vec<ResolvedStep>,
    pub total: Money,
    pub multifocal: bool,
}

/// Traversal and pricing over a shared option tree.
#[derive(Debug, Clone)]
pub struct ConfiguratorEngine {
    tree: Arc<OptionTree>,
    base_price: Money,
}

impl ConfiguratorEngine {
    /// Create an engine for a product whose catalog price is `base_price`.
    pub fn new(tree: Arc<OptionTree>, base_price: Money) -> Self {
        Self { tree, base_price }
    }

    pub fn tree(&self) -> &OptionTree {
        &self.tree
    }

    pub fn base_price(&self) -> Money {
        self.base_price
    }

    pub fn depth(&self) -> usize {
        self.tree.depth()
    }

    /// Follow `path` from the root.
    pub fn resolve(&self, path: &ConfigurationPath) -> Option<&OptionNode> {
        path.keys()
            .iter()
            .try_fold(&self.tree.root, |node, key| node.child(key))
    }

    /// The step offered after `path`, or `None` when `path` ends on a leaf
    /// or does not resolve.
    pub fn step_after(&self, path: &ConfigurationPath) -> Option<Step> {
        let node = self.resolve(path)?;
        let children = node.children()?;
        Some(Step {
            index: path.len(),
            name: node.step().unwrap_or_default().to_string(),
            choices: children
                .iter()
                .map(|c| ChoiceView {
                    key: c.key.clone(),
                    label: c.node.label.clone(),
                    price_delta: c.node.price_delta,
                })
                .collect(),
        })
    }

    /// Choices available after `path`; empty once the path is complete.
    pub fn choices(&self, path: &ConfigurationPath) -> Vec<ChoiceView> {
        self.step_after(path).map(|s| s.choices).unwrap_or_default()
    }

    /// Select `key` at `step_index`, discarding any later selections.
    pub fn select(
        &self,
        path: &ConfigurationPath,
        step_index: usize,
        key: &str,
    ) -> Result<Selection, CommerceError> {
        if step_index > path.len() {
            return Err(CommerceError::UnknownOption {
                step: step_index,
                key: key.to_string(),
            });
        }

        let mut keys = path.keys()[..step_index].to_vec();
        let parent = self
            .resolve(&ConfigurationPath(keys.clone()))
            .ok_or_else(|| CommerceError::UnknownOption {
                step: step_index,
                key: key.to_string(),
            })?;
        if parent.child(key).is_none() {
            return Err(CommerceError::UnknownOption {
                step: step_index,
                key: key.to_string(),
            });
        }

        keys.push(key.to_string());
        let path = ConfigurationPath(keys);
        let total = self.price(&path)?;
        let next = self.step_after(&path);
        Ok(Selection { path, total, next })
    }

    /// Base price plus every delta along `path`, summed from scratch.
    pub fn price(&self, path: &ConfigurationPath) -> Result<Money, CommerceError> {
        let mut node = &self.tree.root;
        let mut total = self.base_price;
        for (step, key) in path.keys().iter().enumerate() {
            node = node.child(key).ok_or_else(|| CommerceError::UnknownOption {
                step,
                key: key.clone(),
            })?;
            total = total.try_add(&node.price_delta).ok_or(CommerceError::Overflow)?;
        }
        Ok(total)
    }

    /// Labels and deltas of every selection on `path`.
    pub fn describe(&self, path: &ConfigurationPath) -> Result<Vec<ResolvedStep>, CommerceError> {
        let mut node = &self.tree.root;
        let mut steps = Vec::with_capacity(path.len());
        for (index, key) in path.keys().iter().enumerate() {
            let step = node.step().unwrap_or_default().to_string();
            node = node.child(key).ok_or_else(|| CommerceError::UnknownOption {
                step: index,
                key: key.clone(),
            })?;
            steps.push(ResolvedStep {
                step,
                key: key.clone(),
                label: node.label.clone(),
                price_delta: node.price_delta,
            });
        }
        Ok(steps)
    }

    /// Freeze a complete path into a [`ConfiguredLens`].
    pub fn finish(&self, path: &ConfigurationPath) -> Result<ConfiguredLens, CommerceError> {
        let node = self.resolve(path).ok_or_else(|| CommerceError::UnknownOption {
            step: path.len().saturating_sub(1),
            key: path.keys().last().cloned().unwrap_or_default(),
        })?;
        if let Some(step) = node.step() {
            let mut errors = ValidationErrors::new();
            errors.push("lens", format!("choose a {}", step));
            return Err(CommerceError::Validation(errors));
        }

        let steps = self.describe(path)?;
        let multifocal = self.is_multifocal(path);
        Ok(ConfiguredLens {
            path: path.clone(),
            steps,
            total: self.price(path)?,
            multifocal,
        })
    }

    /// Whether any node on `path` requires an addition power.
    pub fn is_multifocal(&self, path: &ConfigurationPath) -> bool {
        let mut node = &self.tree.root;
        for key in path.keys() {
            match node.child(key) {
                Some(child) => node = child,
                None => return false,
            }
            if node.multifocal {
                return true;
            }
        }
        false
    }
}
