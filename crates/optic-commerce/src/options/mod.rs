//! Lens option catalog and configurator.
//!
//! The catalog is a fixed tree of sequential choices (lens type, material,
//! treatment, color). Each node adds a price delta; a configuration is
//! complete once its path ends on a leaf.

mod configurator;
mod node;

pub use configurator::{
    ChoiceView, ConfigurationPath, ConfiguredLens, ConfiguratorEngine, ResolvedStep, Selection,
    Step,
};
pub use node::{NodeKind, OptionChoice, OptionNode, OptionTree};
