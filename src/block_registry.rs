//! Catalog of known block names and their default property bags.
//!
//! The store only needs two things from a registry: turning a name into a full
//! [`BlockState`] (with default properties filled in), and recovering the
//! canonical name of a state. Anything richer lives outside this crate.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::collections::BTreeMap;

use crate::block_state::{BlockState, AIR};

pub trait BlockRegistry: Send + Sync {
    /// Default state for `name`, or `None` if the registry does not know it.
    fn resolve_by_name(&self, name: &str) -> Option<BlockState>;

    /// Canonical name of `block`.
    fn identify(&self, block: &BlockState) -> SmolStr {
        block.name.clone()
    }
}

const NO_PROPERTIES: [(&str, &str); 0] = [];

/// In-memory registry seeded with a handful of vanilla blocks.
#[derive(Debug, Clone)]
pub struct StaticBlockRegistry {
    templates: FxHashMap<SmolStr, BTreeMap<SmolStr, SmolStr>>,
}

impl Default for StaticBlockRegistry {
    fn default() -> Self {
        let mut registry = StaticBlockRegistry::empty();
        registry.register(AIR, NO_PROPERTIES);
        registry.register("minecraft:stone", NO_PROPERTIES);
        registry.register("minecraft:dirt", NO_PROPERTIES);
        registry.register("minecraft:cobblestone", NO_PROPERTIES);
        registry.register("minecraft:oak_planks", NO_PROPERTIES);
        registry.register("minecraft:glass", NO_PROPERTIES);
        registry.register("minecraft:oak_log", [("axis", "y")]);
        registry.register(
            "minecraft:lever",
            [("face", "wall"), ("facing", "north"), ("powered", "false")],
        );
        registry.register(
            "minecraft:redstone_wire",
            [
                ("east", "none"),
                ("north", "none"),
                ("power", "0"),
                ("south", "none"),
                ("west", "none"),
            ],
        );
        registry
    }
}

impl StaticBlockRegistry {
    pub fn empty() -> Self {
        StaticBlockRegistry {
            templates: FxHashMap::default(),
        }
    }

    pub fn register<'a>(
        &mut self,
        name: impl Into<SmolStr>,
        defaults: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) {
        let properties = defaults
            .into_iter()
            .map(|(k, v)| (SmolStr::from(k), SmolStr::from(v)))
            .collect();
        self.templates.insert(name.into(), properties);
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl BlockRegistry for StaticBlockRegistry {
    fn resolve_by_name(&self, name: &str) -> Option<BlockState> {
        let name = if name.contains(':') {
            SmolStr::from(name)
        } else {
            SmolStr::from(format!("minecraft:{}", name))
        };
        self.templates.get(&name).map(|properties| BlockState {
            properties: properties.clone(),
            name,
        })
    }
}
