use quartz_nbt::{NbtCompound, NbtList, NbtTag};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{Result, SchematicError};

pub const GLOW_ITEM_FRAME: &str = "minecraft:glow_item_frame";

/// Free-form NBT value. Boolean flags are carried as `Byte`, as NBT stores them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NbtValue {
    String(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Byte(i8),
    Short(i16),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
    ByteArray(Vec<i8>),
    List(Vec<NbtValue>),
    Compound(HashMap<String, NbtValue>),
}

impl NbtValue {
    pub fn from_tag(tag: &NbtTag) -> NbtValue {
        match tag {
            NbtTag::String(s) => NbtValue::String(s.clone()),
            NbtTag::Int(i) => NbtValue::Int(*i),
            NbtTag::Long(l) => NbtValue::Long(*l),
            NbtTag::Float(f) => NbtValue::Float(*f),
            NbtTag::Double(d) => NbtValue::Double(*d),
            NbtTag::Byte(b) => NbtValue::Byte(*b),
            NbtTag::Short(s) => NbtValue::Short(*s),
            NbtTag::IntArray(arr) => NbtValue::IntArray(arr.clone()),
            NbtTag::LongArray(arr) => NbtValue::LongArray(arr.clone()),
            NbtTag::ByteArray(arr) => NbtValue::ByteArray(arr.clone()),
            NbtTag::List(list) => NbtValue::List(list.iter().map(NbtValue::from_tag).collect()),
            NbtTag::Compound(compound) => NbtValue::Compound(
                compound
                    .inner()
                    .iter()
                    .map(|(key, value)| (key.clone(), NbtValue::from_tag(value)))
                    .collect(),
            ),
        }
    }

    pub fn to_tag(&self) -> NbtTag {
        match self {
            NbtValue::String(s) => NbtTag::String(s.clone()),
            NbtValue::Int(i) => NbtTag::Int(*i),
            NbtValue::Long(l) => NbtTag::Long(*l),
            NbtValue::Float(f) => NbtTag::Float(*f),
            NbtValue::Double(d) => NbtTag::Double(*d),
            NbtValue::Byte(b) => NbtTag::Byte(*b),
            NbtValue::Short(s) => NbtTag::Short(*s),
            NbtValue::IntArray(arr) => NbtTag::IntArray(arr.clone()),
            NbtValue::LongArray(arr) => NbtTag::LongArray(arr.clone()),
            NbtValue::ByteArray(arr) => NbtTag::ByteArray(arr.clone()),
            NbtValue::List(list) => {
                NbtTag::List(NbtList::from(list.iter().map(NbtValue::to_tag).collect::<Vec<_>>()))
            }
            NbtValue::Compound(map) => {
                let mut compound = NbtCompound::new();
                for (key, value) in map {
                    compound.insert(key, value.to_tag());
                }
                NbtTag::Compound(compound)
            }
        }
    }
}

/// Item shown in a frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameItem {
    pub count: i32,
    pub id: String,
    /// Map id from the item's `tag.map`, for filled maps.
    pub map: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GlowItemFrame {
    pub air: i16,
    pub facing: i8,
    pub fall_distance: f32,
    pub fire: i16,
    pub fixed: bool,
    pub invisible: bool,
    pub invulnerable: bool,
    pub item: Option<FrameItem>,
    pub item_drop_chance: Option<f32>,
    pub item_rotation: Option<i8>,
    pub motion: Vec<f64>,
    pub on_ground: bool,
    pub portal_cooldown: i32,
    pub rotation: Vec<f32>,
    pub tile: (i32, i32, i32),
    pub uuid: Vec<i32>,
}

impl GlowItemFrame {
    fn decode(nbt: &NbtCompound) -> Result<EntityData> {
        let item = match nbt.inner().get("Item") {
            None => None,
            Some(NbtTag::Compound(item)) => Some(FrameItem {
                count: int_field(item, "Count")?.unwrap_or(0) as i32,
                id: string_field(item, "id")?.unwrap_or_default(),
                map: match item.inner().get("tag") {
                    Some(NbtTag::Compound(tag)) => int_field(tag, "map")?.map(|m| m as i32),
                    Some(other) => return Err(wrong_type("tag", "compound", other)),
                    None => None,
                },
            }),
            Some(other) => return Err(wrong_type("Item", "compound", other)),
        };

        Ok(EntityData::GlowItemFrame(GlowItemFrame {
            air: int_field(nbt, "Air")?.unwrap_or(0) as i16,
            facing: int_field(nbt, "Facing")?.unwrap_or(0) as i8,
            fall_distance: float_field(nbt, "FallDistance")?.unwrap_or(0.0) as f32,
            fire: int_field(nbt, "Fire")?.unwrap_or(0) as i16,
            fixed: int_field(nbt, "Fixed")?.unwrap_or(0) != 0,
            invisible: int_field(nbt, "Invisible")?.unwrap_or(0) != 0,
            invulnerable: int_field(nbt, "Invulnerable")?.unwrap_or(0) != 0,
            item,
            item_drop_chance: float_field(nbt, "ItemDropChance")?.map(|v| v as f32),
            item_rotation: int_field(nbt, "ItemRotation")?.map(|v| v as i8),
            motion: float_list(nbt, "Motion")?,
            on_ground: int_field(nbt, "OnGround")?.unwrap_or(0) != 0,
            portal_cooldown: int_field(nbt, "PortalCooldown")?.unwrap_or(0) as i32,
            rotation: float_list(nbt, "Rotation")?
                .into_iter()
                .map(|v| v as f32)
                .collect(),
            tile: (
                int_field(nbt, "TileX")?.unwrap_or(0) as i32,
                int_field(nbt, "TileY")?.unwrap_or(0) as i32,
                int_field(nbt, "TileZ")?.unwrap_or(0) as i32,
            ),
            uuid: int_list(nbt, "UUID")?,
        }))
    }

    fn write_fields(&self, compound: &mut NbtCompound) {
        compound.insert("Air", NbtTag::Short(self.air));
        compound.insert("Facing", NbtTag::Byte(self.facing));
        compound.insert("FallDistance", NbtTag::Float(self.fall_distance));
        compound.insert("Fire", NbtTag::Short(self.fire));
        compound.insert("Fixed", NbtTag::Byte(i8::from(self.fixed)));
        compound.insert("Invisible", NbtTag::Byte(i8::from(self.invisible)));
        compound.insert("Invulnerable", NbtTag::Byte(i8::from(self.invulnerable)));
        if let Some(item) = &self.item {
            let mut item_nbt = NbtCompound::new();
            item_nbt.insert("Count", NbtTag::Int(item.count));
            item_nbt.insert("id", NbtTag::String(item.id.clone()));
            if let Some(map) = item.map {
                let mut tag = NbtCompound::new();
                tag.insert("map", NbtTag::Int(map));
                item_nbt.insert("tag", NbtTag::Compound(tag));
            }
            compound.insert("Item", NbtTag::Compound(item_nbt));
        }
        if let Some(chance) = self.item_drop_chance {
            compound.insert("ItemDropChance", NbtTag::Float(chance));
        }
        if let Some(rotation) = self.item_rotation {
            compound.insert("ItemRotation", NbtTag::Byte(rotation));
        }
        compound.insert("Motion", double_list(&self.motion));
        compound.insert("OnGround", NbtTag::Byte(i8::from(self.on_ground)));
        compound.insert("PortalCooldown", NbtTag::Int(self.portal_cooldown));
        compound.insert(
            "Rotation",
            NbtTag::List(NbtList::from(
                self.rotation
                    .iter()
                    .map(|&r| NbtTag::Float(r))
                    .collect::<Vec<NbtTag>>(),
            )),
        );
        compound.insert("TileX", NbtTag::Int(self.tile.0));
        compound.insert("TileY", NbtTag::Int(self.tile.1));
        compound.insert("TileZ", NbtTag::Int(self.tile.2));
        compound.insert(
            "UUID",
            NbtTag::List(NbtList::from(
                self.uuid
                    .iter()
                    .map(|&v| NbtTag::Int(v))
                    .collect::<Vec<NbtTag>>(),
            )),
        );
    }
}

/// Type-specific payload of an entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EntityData {
    GlowItemFrame(GlowItemFrame),
    /// Fields of a registered type without a dedicated shape, kept verbatim.
    Fields(HashMap<String, NbtValue>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub position: (f64, f64, f64),
    pub data: EntityData,
}

impl Entity {
    pub fn new(id: impl Into<String>, position: (f64, f64, f64), data: EntityData) -> Self {
        Entity {
            id: id.into(),
            position,
            data,
        }
    }

    pub fn glow_item_frame(position: (f64, f64, f64), frame: GlowItemFrame) -> Self {
        Entity::new(GLOW_ITEM_FRAME, position, EntityData::GlowItemFrame(frame))
    }

    /// Entity with a free-form field map.
    pub fn with_fields(id: impl Into<String>, position: (f64, f64, f64)) -> Self {
        Entity::new(id, position, EntityData::Fields(HashMap::new()))
    }

    pub fn with_nbt_data(mut self, key: impl Into<String>, value: NbtValue) -> Self {
        if let EntityData::Fields(fields) = &mut self.data {
            fields.insert(key.into(), value);
        }
        self
    }

    pub fn to_nbt(&self) -> NbtTag {
        let mut compound = NbtCompound::new();
        compound.insert("id", NbtTag::String(self.id.clone()));
        compound.insert(
            "Pos",
            double_list(&[self.position.0, self.position.1, self.position.2]),
        );

        match &self.data {
            EntityData::GlowItemFrame(frame) => frame.write_fields(&mut compound),
            EntityData::Fields(fields) => {
                for (key, value) in fields {
                    compound.insert(key, value.to_tag());
                }
            }
        }

        NbtTag::Compound(compound)
    }
}

/// Decodes the payload of one entity type from its compound.
pub type EntityDecoder = fn(&NbtCompound) -> Result<EntityData>;

/// Maps an entity type name to the decoder for its record shape.
#[derive(Clone)]
pub struct EntityRegistry {
    decoders: FxHashMap<String, EntityDecoder>,
}

impl fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.decoders.keys()).finish()
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        let mut registry = EntityRegistry::empty();
        registry.register(GLOW_ITEM_FRAME, GlowItemFrame::decode);
        registry
    }
}

impl EntityRegistry {
    pub fn empty() -> Self {
        EntityRegistry {
            decoders: FxHashMap::default(),
        }
    }

    pub fn register(&mut self, id: impl Into<String>, decoder: EntityDecoder) {
        self.decoders.insert(id.into(), decoder);
    }

    /// Registers `id` with a decoder that keeps every field as an [`NbtValue`].
    pub fn register_fields(&mut self, id: impl Into<String>) {
        self.register(id, decode_fields);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.decoders.contains_key(id)
    }

    /// Decodes one entity record. Unregistered type names are an error.
    pub fn decode(&self, nbt: &NbtCompound) -> Result<Entity> {
        let id = string_field(nbt, "id")?
            .ok_or_else(|| SchematicError::decode("entity record has no id"))?;
        let decoder = self
            .decoders
            .get(&id)
            .ok_or_else(|| SchematicError::UnknownEntity(id.clone()))?;

        let pos = float_list(nbt, "Pos")?;
        let position = match pos.as_slice() {
            [x, y, z] => (*x, *y, *z),
            _ => {
                return Err(SchematicError::decode(format!(
                    "entity {} has {} position components",
                    id,
                    pos.len()
                )))
            }
        };

        Ok(Entity {
            position,
            data: decoder(nbt)?,
            id,
        })
    }
}

fn decode_fields(nbt: &NbtCompound) -> Result<EntityData> {
    Ok(EntityData::Fields(
        nbt.inner()
            .iter()
            .filter(|(key, _)| !matches!(key.as_str(), "id" | "Pos"))
            .map(|(key, value)| (key.clone(), NbtValue::from_tag(value)))
            .collect(),
    ))
}

fn wrong_type(key: &str, expected: &str, tag: &NbtTag) -> SchematicError {
    SchematicError::decode(format!("field {} should be {}, got {:?}", key, expected, tag))
}

fn double_list(values: &[f64]) -> NbtTag {
    NbtTag::List(NbtList::from(
        values.iter().map(|&v| NbtTag::Double(v)).collect::<Vec<NbtTag>>(),
    ))
}

fn string_field(nbt: &NbtCompound, key: &str) -> Result<Option<String>> {
    match nbt.inner().get(key) {
        None => Ok(None),
        Some(NbtTag::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(wrong_type(key, "string", other)),
    }
}

fn int_field(nbt: &NbtCompound, key: &str) -> Result<Option<i64>> {
    match nbt.inner().get(key) {
        None => Ok(None),
        Some(NbtTag::Byte(v)) => Ok(Some(*v as i64)),
        Some(NbtTag::Short(v)) => Ok(Some(*v as i64)),
        Some(NbtTag::Int(v)) => Ok(Some(*v as i64)),
        Some(NbtTag::Long(v)) => Ok(Some(*v)),
        Some(other) => Err(wrong_type(key, "integer", other)),
    }
}

fn float_field(nbt: &NbtCompound, key: &str) -> Result<Option<f64>> {
    match nbt.inner().get(key) {
        None => Ok(None),
        Some(NbtTag::Float(v)) => Ok(Some(*v as f64)),
        Some(NbtTag::Double(v)) => Ok(Some(*v)),
        Some(other) => Err(wrong_type(key, "float", other)),
    }
}

fn float_list(nbt: &NbtCompound, key: &str) -> Result<Vec<f64>> {
    match nbt.inner().get(key) {
        None => Ok(Vec::new()),
        Some(NbtTag::List(list)) => list
            .iter()
            .map(|tag| match tag {
                NbtTag::Float(v) => Ok(*v as f64),
                NbtTag::Double(v) => Ok(*v),
                other => Err(wrong_type(key, "float list", other)),
            })
            .collect(),
        Some(other) => Err(wrong_type(key, "list", other)),
    }
}

fn int_list(nbt: &NbtCompound, key: &str) -> Result<Vec<i32>> {
    match nbt.inner().get(key) {
        None => Ok(Vec::new()),
        Some(NbtTag::IntArray(values)) => Ok(values.clone()),
        Some(NbtTag::List(list)) => list
            .iter()
            .map(|tag| match tag {
                NbtTag::Int(v) => Ok(*v),
                other => Err(wrong_type(key, "int list", other)),
            })
            .collect(),
        Some(other) => Err(wrong_type(key, "int array", other)),
    }
}
