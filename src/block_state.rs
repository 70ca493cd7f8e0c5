use quartz_nbt::{NbtCompound, NbtTag};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, SchematicError};

pub const AIR: &str = "minecraft:air";

/// A block name plus its property bag. Properties are kept sorted by key, so two
/// states with the same pairs compare equal regardless of insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockState {
    pub name: SmolStr,
    pub properties: BTreeMap<SmolStr, SmolStr>,
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.properties.is_empty() {
            write!(f, "[")?;
            for (i, (key, value)) in self.properties.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}={}", key, value)?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

impl BlockState {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        BlockState {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn air() -> Self {
        BlockState::new(AIR)
    }

    pub fn is_air(&self) -> bool {
        self.name == AIR
    }

    pub fn get_name(&self) -> &str {
        self.name.as_str()
    }

    pub fn with_property(mut self, key: impl Into<SmolStr>, value: impl Into<SmolStr>) -> Self {
        self.set_property(key, value);
        self
    }

    pub fn with_properties<I, K, V>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<SmolStr>,
        V: Into<SmolStr>,
    {
        for (k, v) in properties {
            self.set_property(k, v);
        }
        self
    }

    pub fn set_property(&mut self, key: impl Into<SmolStr>, value: impl Into<SmolStr>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn remove_property(&mut self, key: &str) {
        self.properties.remove(key);
    }

    pub fn get_property(&self, key: &str) -> Option<&SmolStr> {
        self.properties.get(key)
    }

    /// Palette entry compound: `{Name, Properties?}`.
    pub fn to_nbt(&self) -> NbtTag {
        let mut compound = NbtCompound::new();
        compound.insert("Name", self.name.to_string());

        if !self.properties.is_empty() {
            let mut properties = NbtCompound::new();
            for (key, value) in &self.properties {
                properties.insert(key.to_string(), value.to_string());
            }
            compound.insert("Properties", properties);
        }

        NbtTag::Compound(compound)
    }

    pub fn from_nbt(compound: &NbtCompound) -> Result<Self> {
        let name: SmolStr = compound
            .get::<_, &str>("Name")
            .map_err(|e| SchematicError::decode(format!("palette entry Name: {}", e)))?
            .into();

        let mut properties = BTreeMap::new();
        if compound.contains_key("Properties") {
            let props = compound
                .get::<_, &NbtCompound>("Properties")
                .map_err(|e| SchematicError::decode(format!("{} Properties: {}", name, e)))?;
            for (key, value) in props.inner() {
                match value {
                    NbtTag::String(value_str) => {
                        properties.insert(SmolStr::from(key.as_str()), SmolStr::from(value_str.as_str()));
                    }
                    other => {
                        return Err(SchematicError::decode(format!(
                            "{} property {} is not a string: {:?}",
                            name, key, other
                        )))
                    }
                }
            }
        }

        Ok(BlockState { name, properties })
    }
}

impl From<&str> for BlockState {
    fn from(name: &str) -> Self {
        BlockState::new(name)
    }
}
