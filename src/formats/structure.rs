//! Vanilla structure-block `.nbt` documents.
//!
//! Only non-air voxels are listed, each as a position plus an index into a
//! palette that leaves air out. Air therefore shifts every index down by one
//! relative to the in-memory palette.

use log::debug;
use quartz_nbt::{NbtCompound, NbtList, NbtTag};

use crate::block_state::BlockState;
use crate::config::RegionConfig;
use crate::entity::EntityRegistry;
use crate::error::{Result, SchematicError};
use crate::formats::manager::{RegionExporter, RegionImporter};
use crate::formats::{read_compressed, write_compressed};
use crate::region::{Region, Vec3D};

pub const EXTENSION: &str = "nbt";

/// Name given to regions read from bytes alone.
pub const DEFAULT_NAME: &str = "structure";

const DEFAULT_COMPRESSION: flate2::Compression = flate2::Compression::new(3);

fn int_list(values: [i32; 3]) -> NbtTag {
    NbtTag::List(NbtList::from(
        values.iter().map(|&v| NbtTag::Int(v)).collect::<Vec<NbtTag>>(),
    ))
}

fn read_triple(tag: &NbtTag, what: &str) -> Result<[i32; 3]> {
    let values: Vec<i32> = match tag {
        NbtTag::List(list) => list
            .iter()
            .map(|v| match v {
                NbtTag::Int(i) => Ok(*i),
                other => Err(SchematicError::decode(format!(
                    "{} component is not an int: {:?}",
                    what, other
                ))),
            })
            .collect::<Result<_>>()?,
        NbtTag::IntArray(values) => values.clone(),
        other => {
            return Err(SchematicError::decode(format!(
                "{} is not an int list: {:?}",
                what, other
            )))
        }
    };
    match values.as_slice() {
        &[x, y, z] => Ok([x, y, z]),
        _ => Err(SchematicError::decode(format!(
            "{} has {} components, expected 3",
            what,
            values.len()
        ))),
    }
}

fn field<'a>(compound: &'a NbtCompound, key: &str) -> Result<&'a NbtTag> {
    compound
        .inner()
        .get(key)
        .ok_or_else(|| SchematicError::decode(format!("missing field {}", key)))
}

fn list_field<'a>(compound: &'a NbtCompound, key: &str) -> Result<&'a NbtList> {
    compound
        .get::<_, &NbtList>(key)
        .map_err(|e| SchematicError::decode(format!("{}: {}", key, e)))
}

pub fn is_structure(data: &[u8]) -> bool {
    read_compressed(data).is_ok_and(|root| is_structure_nbt(&root))
}

pub fn is_structure_nbt(root: &NbtCompound) -> bool {
    root.get::<_, &NbtList>("size").is_ok()
        && root.get::<_, &NbtList>("palette").is_ok()
        && root.get::<_, &NbtList>("blocks").is_ok()
}

pub fn to_structure(region: &Region) -> Result<Vec<u8>> {
    write_compressed(&to_nbt(region)?, DEFAULT_COMPRESSION)
}

/// Reads a structure document into a region called [`DEFAULT_NAME`].
pub fn from_structure(data: &[u8]) -> Result<Region> {
    from_structure_named(data, DEFAULT_NAME, &EntityRegistry::default())
}

pub fn from_structure_named(data: &[u8], name: &str, entities: &EntityRegistry) -> Result<Region> {
    from_nbt(&read_compressed(data)?, name, entities)
}

/// Builds the document tree. Voxels are visited x outermost, then y, then z.
pub fn to_nbt(region: &Region) -> Result<NbtCompound> {
    let size = region.extent();
    let mut blocks = Vec::new();
    for x in 0..size.x {
        for y in 0..size.y {
            for z in 0..size.z {
                let index = region.get_palette_index(x, y, z)?;
                if index == 0 {
                    continue;
                }
                let mut block = NbtCompound::new();
                block.insert("pos", int_list([x, y, z]));
                block.insert("state", NbtTag::Int(index as i32 - 1));
                blocks.push(NbtTag::Compound(block));
            }
        }
    }

    let palette: Vec<NbtTag> = region
        .palette()
        .iter()
        .skip(1)
        .map(BlockState::to_nbt)
        .collect();
    let entities: Vec<NbtTag> = region.entities().iter().map(|e| e.to_nbt()).collect();

    debug!(
        "encoded structure '{}' with {} blocks and {} palette entries",
        region.name(),
        blocks.len(),
        palette.len()
    );

    let mut root = NbtCompound::new();
    root.insert("blocks", NbtTag::List(NbtList::from(blocks)));
    root.insert("entities", NbtTag::List(NbtList::from(entities)));
    root.insert("palette", NbtTag::List(NbtList::from(palette)));
    root.insert("size", int_list([size.x, size.y, size.z]));
    root.insert("author", NbtTag::String(region.author().to_string()));
    root.insert("DataVersion", NbtTag::Int(region.minecraft_data_version()));
    Ok(root)
}

/// Rebuilds a region named `name` by replaying every listed block.
pub fn from_nbt(root: &NbtCompound, name: &str, entities: &EntityRegistry) -> Result<Region> {
    from_nbt_with_config(root, name, entities, &RegionConfig::default())
}

/// Like [`from_nbt`], with metadata the document doesn't carry (description,
/// schema version) taken from `config`. A document `author` or `DataVersion`
/// still wins over the config.
pub fn from_nbt_with_config(
    root: &NbtCompound,
    name: &str,
    entities: &EntityRegistry,
    config: &RegionConfig,
) -> Result<Region> {
    let [sx, sy, sz] = read_triple(field(root, "size")?, "size")?;
    if sx < 0 || sy < 0 || sz < 0 {
        return Err(SchematicError::decode(format!(
            "negative structure size ({}, {}, {})",
            sx, sy, sz
        )));
    }
    let size = Vec3D::new(sx, sy, sz);
    if size.checked_volume().is_none() {
        return Err(SchematicError::decode(format!(
            "structure size {} is too large",
            size
        )));
    }

    let mut palette = Vec::new();
    for tag in list_field(root, "palette")?.iter() {
        match tag {
            NbtTag::Compound(compound) => palette.push(BlockState::from_nbt(compound)?),
            other => {
                return Err(SchematicError::decode(format!(
                    "palette entry is not a compound: {:?}",
                    other
                )))
            }
        }
    }

    let mut region = Region::with_config(name, size, config);

    for tag in list_field(root, "blocks")?.iter() {
        let NbtTag::Compound(block) = tag else {
            return Err(SchematicError::decode(format!(
                "block entry is not a compound: {:?}",
                tag
            )));
        };
        let [x, y, z] = read_triple(field(block, "pos")?, "pos")?;
        let state = block
            .get::<_, i32>("state")
            .map_err(|e| SchematicError::decode(format!("state: {}", e)))?;
        let state = usize::try_from(state)
            .ok()
            .and_then(|i| palette.get(i))
            .ok_or_else(|| SchematicError::IndexOutOfBounds {
                index: state.max(0) as usize,
                len: palette.len(),
            })?;
        region.set_block(x, y, z, state)?;
    }

    match root.inner().get("entities") {
        None => {}
        Some(NbtTag::List(list)) => {
            for tag in list.iter() {
                let NbtTag::Compound(compound) = tag else {
                    return Err(SchematicError::decode(format!(
                        "entity entry is not a compound: {:?}",
                        tag
                    )));
                };
                region.add_entity(entities.decode(compound)?);
            }
        }
        Some(other) => {
            return Err(SchematicError::decode(format!(
                "entities is not a list: {:?}",
                other
            )))
        }
    }

    if let Ok(author) = root.get::<_, &str>("author") {
        region.set_author(author);
    }
    if let Ok(data_version) = root.get::<_, i32>("DataVersion") {
        region.set_minecraft_data_version(data_version);
    }

    debug!(
        "decoded structure '{}' size {} palette {}",
        name,
        region.size(),
        region.palette_len()
    );
    Ok(region)
}

/// Codec for structure-block `.nbt` files.
#[derive(Debug, Clone, Default)]
pub struct StructureFormat {
    pub entities: EntityRegistry,
    pub config: RegionConfig,
}

impl RegionImporter for StructureFormat {
    fn name(&self) -> String {
        "structure".to_string()
    }

    fn extensions(&self) -> Vec<String> {
        vec![EXTENSION.to_string()]
    }

    fn detect(&self, root: &NbtCompound) -> bool {
        is_structure_nbt(root)
    }

    fn read(&self, name: &str, root: &NbtCompound) -> Result<Region> {
        from_nbt_with_config(root, name, &self.entities, &self.config)
    }
}

impl RegionExporter for StructureFormat {
    fn name(&self) -> String {
        "structure".to_string()
    }

    fn extensions(&self) -> Vec<String> {
        vec![EXTENSION.to_string()]
    }

    fn write(&self, region: &Region) -> Result<Vec<u8>> {
        to_structure(region)
    }
}
