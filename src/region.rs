use chrono::Utc;
use quartz_nbt::{NbtCompound, NbtTag};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::block_registry::BlockRegistry;
use crate::block_state::BlockState;
use crate::config::RegionConfig;
use crate::entity::Entity;
use crate::error::{Result, SchematicError};
use crate::packed_array::PackedArray;
use crate::palette::Palette;

/// Largest grid a document may declare. `TotalVolume` is stored as an `Int`.
pub const MAX_VOLUME: usize = i32::MAX as usize;

/// Three signed extents or coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec3D {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl fmt::Display for Vec3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl From<(i32, i32, i32)> for Vec3D {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Vec3D { x, y, z }
    }
}

impl Vec3D {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Vec3D { x, y, z }
    }

    /// Component-wise absolute value. A Litematica region size carries its
    /// direction in the signs; the grid it spans is the absolute extent.
    pub fn abs(&self) -> Vec3D {
        Vec3D::new(
            self.x.saturating_abs(),
            self.y.saturating_abs(),
            self.z.saturating_abs(),
        )
    }

    /// Number of cells spanned by a box of this size, saturating on overflow.
    pub fn volume(&self) -> usize {
        let e = self.abs();
        (e.x as usize)
            .saturating_mul(e.y as usize)
            .saturating_mul(e.z as usize)
    }

    /// Like [`volume`](Self::volume), but `None` past [`MAX_VOLUME`].
    pub fn checked_volume(&self) -> Option<usize> {
        let e = self.abs();
        (e.x as usize)
            .checked_mul(e.y as usize)?
            .checked_mul(e.z as usize)
            .filter(|&volume| volume <= MAX_VOLUME)
    }

    #[inline(always)]
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        x >= 0 && y >= 0 && z >= 0 && x < self.x && y < self.y && z < self.z
    }

    /// Linear index of a cell: `y * X * Z + z * X + x`.
    #[inline(always)]
    pub fn index(&self, x: i32, y: i32, z: i32) -> usize {
        let (sx, sz) = (self.x as usize, self.z as usize);
        y as usize * sx * sz + z as usize * sx + x as usize
    }

    pub fn to_nbt(&self) -> NbtCompound {
        let mut compound = NbtCompound::new();
        compound.insert("x", NbtTag::Int(self.x));
        compound.insert("y", NbtTag::Int(self.y));
        compound.insert("z", NbtTag::Int(self.z));
        compound
    }

    pub fn from_nbt(compound: &NbtCompound) -> Result<Self> {
        let axis = |key: &str| {
            compound
                .get::<_, i32>(key)
                .map_err(|e| SchematicError::decode(format!("vector component {}: {}", key, e)))
        };
        Ok(Vec3D::new(axis("x")?, axis("y")?, axis("z")?))
    }
}

/// Document-level metadata kept alongside the voxel data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub author: String,
    pub description: String,
    pub name: String,
    pub region_count: i32,
    pub time_created: i64,
    pub time_modified: i64,
    /// Running non-air counter, see [`Region::set_block`].
    pub total_blocks: i32,
}

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// One named voxel grid: packed palette indices, the palette, entities and
/// pass-through tile entity records.
#[derive(Debug, Clone)]
pub struct Region {
    metadata: Metadata,
    minecraft_data_version: i32,
    version: i32,
    region_name: String,
    position: Vec3D,
    size: Vec3D,
    blocks: PackedArray,
    palette: Palette,
    entities: Vec<Entity>,
    tile_entities: Vec<NbtCompound>,
}

/// Everything a codec reconstructs before handing a region over.
pub(crate) struct RegionParts {
    pub metadata: Metadata,
    pub minecraft_data_version: i32,
    pub version: i32,
    pub region_name: String,
    pub position: Vec3D,
    pub size: Vec3D,
    pub blocks: PackedArray,
    pub palette: Palette,
    pub entities: Vec<Entity>,
    pub tile_entities: Vec<NbtCompound>,
}

impl Region {
    /// Empty all-air region using [`RegionConfig::default`].
    pub fn new(name: impl Into<String>, size: impl Into<Vec3D>) -> Self {
        Self::with_config(name, size, &RegionConfig::default())
    }

    pub fn with_config(
        name: impl Into<String>,
        size: impl Into<Vec3D>,
        config: &RegionConfig,
    ) -> Self {
        let name = name.into();
        let size = size.into();
        let now = now_millis();
        Region {
            metadata: Metadata {
                author: config.author.clone(),
                description: config.description.clone(),
                name: name.clone(),
                region_count: 1,
                time_created: now,
                time_modified: now,
                total_blocks: 0,
            },
            minecraft_data_version: config.minecraft_data_version,
            version: config.version,
            region_name: name,
            position: Vec3D::default(),
            size,
            blocks: PackedArray::new(size.volume()),
            palette: Palette::new(),
            entities: Vec::new(),
            tile_entities: Vec::new(),
        }
    }

    pub(crate) fn from_parts(parts: RegionParts) -> Self {
        Region {
            metadata: parts.metadata,
            minecraft_data_version: parts.minecraft_data_version,
            version: parts.version,
            region_name: parts.region_name,
            position: parts.position,
            size: parts.size,
            blocks: parts.blocks,
            palette: parts.palette,
            entities: parts.entities,
            tile_entities: parts.tile_entities,
        }
    }

    #[inline]
    fn checked_index(&self, x: i32, y: i32, z: i32) -> Result<usize> {
        let extent = self.size.abs();
        if !extent.contains(x, y, z) {
            return Err(SchematicError::OutOfRange {
                x,
                y,
                z,
                size: self.size,
            });
        }
        Ok(extent.index(x, y, z))
    }

    /// Raw palette index stored at a position.
    pub fn get_palette_index(&self, x: i32, y: i32, z: i32) -> Result<u32> {
        let index = self.checked_index(x, y, z)?;
        self.blocks.get(index)
    }

    pub fn get_block(&self, x: i32, y: i32, z: i32) -> Result<BlockState> {
        let palette_index = self.get_palette_index(x, y, z)?;
        self.palette.lookup(palette_index)
    }

    /// Writes `block` at a position, interning it into the palette.
    ///
    /// The block counter goes up when the previous block was air or the new
    /// one is not, and down otherwise. Replacing one solid block with another
    /// therefore counts again, and so does writing air over air.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: &BlockState) -> Result<()> {
        let index = self.checked_index(x, y, z)?;
        let previous = self.palette.lookup(self.blocks.get(index)?)?;

        if previous.is_air() || !block.is_air() {
            self.metadata.total_blocks += 1;
        } else {
            self.metadata.total_blocks -= 1;
        }

        let palette_index = self.palette.intern(block);
        self.blocks.set(index, palette_index)
    }

    /// Resolves `name` through `registry` (default properties) and writes it.
    pub fn set_block_by_name(
        &mut self,
        x: i32,
        y: i32,
        z: i32,
        name: &str,
        registry: &dyn BlockRegistry,
    ) -> Result<()> {
        let block = registry
            .resolve_by_name(name)
            .ok_or_else(|| SchematicError::UnknownBlock(name.to_string()))?;
        self.set_block(x, y, z, &block)
    }

    pub fn contains_block_state(&self, block: &BlockState) -> bool {
        self.palette.contains(block)
    }

    /// Swaps every voxel holding `from` to `to` by rewriting the palette entry.
    /// Returns false if `from` is not in the palette.
    pub fn change_material(&mut self, from: &BlockState, to: &BlockState) -> bool {
        self.palette.substitute(from, to)
    }

    pub fn add_entity(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    pub fn add_tile_entity(&mut self, tile_entity: NbtCompound) {
        self.tile_entities.push(tile_entity);
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn tile_entities(&self) -> &[NbtCompound] {
        &self.tile_entities
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Size as stored, signs included.
    pub fn size(&self) -> Vec3D {
        self.size
    }

    /// Grid dimensions; coordinates run over `0..extent` on each axis.
    pub fn extent(&self) -> Vec3D {
        self.size.abs()
    }

    pub fn x_range(&self) -> i32 {
        self.extent().x
    }

    pub fn y_range(&self) -> i32 {
        self.extent().y
    }

    pub fn z_range(&self) -> i32 {
        self.extent().z
    }

    pub fn position(&self) -> Vec3D {
        self.position
    }

    pub fn volume(&self) -> usize {
        self.size.volume()
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn region_name(&self) -> &str {
        &self.region_name
    }

    pub fn author(&self) -> &str {
        &self.metadata.author
    }

    pub fn description(&self) -> &str {
        &self.metadata.description
    }

    pub fn minecraft_data_version(&self) -> i32 {
        self.minecraft_data_version
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn total_blocks(&self) -> i32 {
        self.metadata.total_blocks
    }

    /// Snapshot of the palette in index order.
    pub fn palette(&self) -> Vec<BlockState> {
        self.palette.states()
    }

    pub fn palette_len(&self) -> usize {
        self.palette.len()
    }

    pub fn bits_per_entry(&self) -> u32 {
        self.blocks.bits_per_entry()
    }

    /// Packed backing words.
    pub fn data(&self) -> &[u64] {
        self.blocks.words()
    }

    pub(crate) fn packed(&self) -> &PackedArray {
        &self.blocks
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.metadata.author = author.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.metadata.description = description.into();
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.metadata.name = name.into();
    }

    pub fn set_region_name(&mut self, name: impl Into<String>) {
        self.region_name = name.into();
    }

    pub fn set_position(&mut self, position: impl Into<Vec3D>) {
        self.position = position.into();
    }

    pub fn set_minecraft_data_version(&mut self, version: i32) {
        self.minecraft_data_version = version;
    }

    pub fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    pub fn set_time_created(&mut self, millis: i64) {
        self.metadata.time_created = millis;
    }
}
