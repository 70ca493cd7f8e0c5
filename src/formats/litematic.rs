//! Litematica `.litematic` documents.
//!
//! The palette is stored with air at index 0 and the voxel data as the packed
//! long array itself, at a width derived from the palette length. Reading wraps
//! the longs directly, writing emits them as they sit in memory.

use log::{debug, warn};
use quartz_nbt::{NbtCompound, NbtList, NbtTag};

use crate::block_state::BlockState;
use crate::entity::EntityRegistry;
use crate::error::{Result, SchematicError};
use crate::formats::manager::{RegionExporter, RegionImporter};
use crate::formats::{read_compressed, write_compressed};
use crate::packed_array::{bit_length, PackedArray};
use crate::palette::Palette;
use crate::region::{now_millis, Metadata, Region, RegionParts, Vec3D};

pub const EXTENSION: &str = "litematic";

/// Default compression level for litematic serialization.
const DEFAULT_COMPRESSION: flate2::Compression = flate2::Compression::new(3);

/// Bits per entry a reader derives for a palette of `palette_len` states.
pub fn bits_for_palette(palette_len: usize) -> u32 {
    bit_length(palette_len as u32).max(1)
}

pub fn is_litematic(data: &[u8]) -> bool {
    read_compressed(data).is_ok_and(|root| is_litematic_nbt(&root))
}

pub fn is_litematic_nbt(root: &NbtCompound) -> bool {
    root.get::<_, i32>("Version").is_ok()
        && root.get::<_, &NbtCompound>("Metadata").is_ok()
        && root.get::<_, &NbtCompound>("Regions").is_ok()
}

pub fn to_litematic(region: &Region) -> Result<Vec<u8>> {
    to_litematic_with_compression(region, DEFAULT_COMPRESSION)
}

pub fn to_litematic_with_compression(
    region: &Region,
    compression: flate2::Compression,
) -> Result<Vec<u8>> {
    write_compressed(&to_nbt(region), compression)
}

pub fn from_litematic(data: &[u8]) -> Result<Region> {
    from_litematic_with_registry(data, &EntityRegistry::default())
}

pub fn from_litematic_with_registry(data: &[u8], entities: &EntityRegistry) -> Result<Region> {
    from_nbt(&read_compressed(data)?, entities)
}

/// Builds the document tree for `region`. The written `TimeModified` is the
/// current time; the region itself is left untouched.
pub fn to_nbt(region: &Region) -> NbtCompound {
    let mut root = NbtCompound::new();
    root.insert("Metadata", NbtTag::Compound(create_metadata(region)));
    root.insert(
        "MinecraftDataVersion",
        NbtTag::Int(region.minecraft_data_version()),
    );
    root.insert("Version", NbtTag::Int(region.version()));

    let mut regions = NbtCompound::new();
    regions.insert(region.region_name(), NbtTag::Compound(create_region(region)));
    root.insert("Regions", NbtTag::Compound(regions));

    debug!(
        "encoded litematic region '{}' size {} palette {} bits {}",
        region.region_name(),
        region.size(),
        region.palette_len(),
        bits_for_palette(region.palette_len())
    );
    root
}

fn create_metadata(region: &Region) -> NbtCompound {
    let meta = region.metadata();
    let mut metadata = NbtCompound::new();

    metadata.insert("Author", NbtTag::String(meta.author.clone()));
    metadata.insert("Description", NbtTag::String(meta.description.clone()));
    metadata.insert("EnclosingSize", NbtTag::Compound(region.extent().to_nbt()));
    metadata.insert("Name", NbtTag::String(meta.name.clone()));
    metadata.insert("RegionCount", NbtTag::Int(meta.region_count));
    metadata.insert("TimeCreated", NbtTag::Long(meta.time_created));
    metadata.insert("TimeModified", NbtTag::Long(now_millis()));
    metadata.insert("TotalBlocks", NbtTag::Int(meta.total_blocks));
    metadata.insert("TotalVolume", NbtTag::Int(region.volume() as i32));

    metadata
}

fn create_region(region: &Region) -> NbtCompound {
    let mut region_nbt = NbtCompound::new();

    let palette = NbtList::from(
        region
            .palette()
            .iter()
            .map(BlockState::to_nbt)
            .collect::<Vec<NbtTag>>(),
    );
    region_nbt.insert("BlockStatePalette", NbtTag::List(palette));

    let tile_entities = NbtList::from(
        region
            .tile_entities()
            .iter()
            .cloned()
            .map(NbtTag::Compound)
            .collect::<Vec<NbtTag>>(),
    );
    region_nbt.insert("TileEntities", NbtTag::List(tile_entities));

    let entities = NbtList::from(
        region
            .entities()
            .iter()
            .map(|entity| entity.to_nbt())
            .collect::<Vec<NbtTag>>(),
    );
    region_nbt.insert("Entities", NbtTag::List(entities));

    region_nbt.insert("Position", NbtTag::Compound(region.position().to_nbt()));
    // signed, Litematica keeps the region's direction in it
    region_nbt.insert("Size", NbtTag::Compound(region.size().to_nbt()));

    // Readers derive the width from the palette length, so the live array is
    // repacked whenever it is narrower than that.
    let bits = bits_for_palette(region.palette_len());
    let packed = region.packed();
    let words = if packed.bits_per_entry() == bits {
        packed.words().to_vec()
    } else {
        packed.resized(bits).into_words()
    };
    region_nbt.insert(
        "BlockStates",
        NbtTag::LongArray(words.into_iter().map(|w| w as i64).collect()),
    );

    region_nbt
}

fn decode_err(what: &str, e: impl std::fmt::Display) -> SchematicError {
    SchematicError::decode(format!("{}: {}", what, e))
}

/// Rebuilds a region from a document tree. Only the first region is loaded.
pub fn from_nbt(root: &NbtCompound, registry: &EntityRegistry) -> Result<Region> {
    let metadata_nbt = root
        .get::<_, &NbtCompound>("Metadata")
        .map_err(|e| decode_err("Metadata", e))?;
    let metadata = parse_metadata(metadata_nbt)?;

    let minecraft_data_version = root
        .get::<_, i32>("MinecraftDataVersion")
        .map_err(|e| decode_err("MinecraftDataVersion", e))?;
    let version = root
        .get::<_, i32>("Version")
        .map_err(|e| decode_err("Version", e))?;

    let regions = root
        .get::<_, &NbtCompound>("Regions")
        .map_err(|e| decode_err("Regions", e))?;
    let mut iter = regions.inner().iter();
    let Some((region_name, region_tag)) = iter.next() else {
        return Err(SchematicError::decode("document has no regions"));
    };
    let skipped = iter.count();
    if skipped > 0 {
        warn!(
            "litematic holds {} regions, loading only '{}'",
            skipped + 1,
            region_name
        );
    }
    let NbtTag::Compound(region_nbt) = region_tag else {
        return Err(SchematicError::decode(format!(
            "region '{}' is not a compound",
            region_name
        )));
    };

    let position = Vec3D::from_nbt(
        region_nbt
            .get::<_, &NbtCompound>("Position")
            .map_err(|e| decode_err("Position", e))?,
    )?;
    let size = Vec3D::from_nbt(
        region_nbt
            .get::<_, &NbtCompound>("Size")
            .map_err(|e| decode_err("Size", e))?,
    )?;
    let volume = size.checked_volume().ok_or_else(|| {
        SchematicError::decode(format!(
            "region '{}' size {} is too large",
            region_name, size
        ))
    })?;

    if let Ok(enclosing) = metadata_nbt.get::<_, &NbtCompound>("EnclosingSize") {
        if Vec3D::from_nbt(enclosing).ok() != Some(size.abs()) {
            warn!(
                "EnclosingSize disagrees with region '{}' size {}",
                region_name, size
            );
        }
    }

    let palette_list = region_nbt
        .get::<_, &NbtList>("BlockStatePalette")
        .map_err(|e| decode_err("BlockStatePalette", e))?;
    let mut states = Vec::with_capacity(palette_list.len());
    for tag in palette_list.iter() {
        match tag {
            NbtTag::Compound(compound) => states.push(BlockState::from_nbt(compound)?),
            other => {
                return Err(SchematicError::decode(format!(
                    "palette entry is not a compound: {:?}",
                    other
                )))
            }
        }
    }
    if states.is_empty() {
        return Err(SchematicError::decode("BlockStatePalette is empty"));
    }

    let words: Vec<u64> = region_nbt
        .get::<_, &[i64]>("BlockStates")
        .map_err(|e| decode_err("BlockStates", e))?
        .iter()
        .map(|&w| w as u64)
        .collect();
    let bits = bits_for_palette(states.len());
    let blocks = PackedArray::from_words(bits, volume, words)?;

    let tile_entities = match region_nbt.inner().get("TileEntities") {
        None => Vec::new(),
        Some(NbtTag::List(list)) => compounds(list, "TileEntities")?,
        Some(other) => return Err(decode_err("TileEntities", format!("{:?}", other))),
    };

    let entity_records = match region_nbt.inner().get("Entities") {
        None => Vec::new(),
        Some(NbtTag::List(list)) => compounds(list, "Entities")?,
        Some(other) => return Err(decode_err("Entities", format!("{:?}", other))),
    };
    let entities = entity_records
        .iter()
        .map(|record| registry.decode(record))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "decoded litematic region '{}' size {} palette {} bits {}",
        region_name,
        size,
        states.len(),
        bits
    );

    Ok(Region::from_parts(RegionParts {
        metadata,
        minecraft_data_version,
        version,
        region_name: region_name.clone(),
        position,
        size,
        blocks,
        palette: Palette::from_states(states),
        entities,
        tile_entities,
    }))
}

fn compounds(list: &NbtList, what: &str) -> Result<Vec<NbtCompound>> {
    list.iter()
        .map(|tag| match tag {
            NbtTag::Compound(compound) => Ok(compound.clone()),
            other => Err(decode_err(what, format!("expected compound, got {:?}", other))),
        })
        .collect()
}

fn parse_metadata(metadata: &NbtCompound) -> Result<Metadata> {
    let string = |key: &str| {
        metadata
            .get::<_, &str>(key)
            .map(String::from)
            .map_err(|e| decode_err(key, e))
    };
    let long = |key: &str| metadata.get::<_, i64>(key).map_err(|e| decode_err(key, e));

    Ok(Metadata {
        author: string("Author")?,
        description: metadata
            .get::<_, &str>("Description")
            .map(String::from)
            .unwrap_or_default(),
        name: string("Name")?,
        region_count: metadata.get::<_, i32>("RegionCount").unwrap_or(1),
        time_created: long("TimeCreated")?,
        time_modified: long("TimeModified")?,
        total_blocks: metadata
            .get::<_, i32>("TotalBlocks")
            .map_err(|e| decode_err("TotalBlocks", e))?,
    })
}

/// Codec for `.litematic` files.
#[derive(Debug, Clone, Default)]
pub struct LitematicFormat {
    pub entities: EntityRegistry,
}

impl RegionImporter for LitematicFormat {
    fn name(&self) -> String {
        "litematic".to_string()
    }

    fn extensions(&self) -> Vec<String> {
        vec![EXTENSION.to_string()]
    }

    fn detect(&self, root: &NbtCompound) -> bool {
        is_litematic_nbt(root)
    }

    fn read(&self, _name: &str, root: &NbtCompound) -> Result<Region> {
        from_nbt(root, &self.entities)
    }
}

impl RegionExporter for LitematicFormat {
    fn name(&self) -> String {
        "litematic".to_string()
    }

    fn extensions(&self) -> Vec<String> {
        vec![EXTENSION.to_string()]
    }

    fn write(&self, region: &Region) -> Result<Vec<u8>> {
        to_litematic(region)
    }
}
