//! In-memory store for a single Minecraft voxel region, with codecs for the
//! Litematica `.litematic` format and the vanilla structure-block `.nbt`
//! format.
//!
//! A [`Region`] keeps one palette index per voxel in a [`PackedArray`] whose
//! width grows as the [`Palette`] grows. Entities are decoded through an
//! [`EntityRegistry`]; block names can be resolved through a
//! [`BlockRegistry`].

pub mod block_registry;
pub mod block_state;
pub mod config;
pub mod entity;
pub mod error;
pub mod formats;
pub mod packed_array;
pub mod palette;
pub mod region;

pub use block_registry::{BlockRegistry, StaticBlockRegistry};
pub use block_state::BlockState;
pub use config::RegionConfig;
pub use entity::{Entity, EntityData, EntityRegistry, GlowItemFrame};
pub use error::{Result, SchematicError};
pub use formats::FormatManager;
pub use packed_array::PackedArray;
pub use palette::Palette;
pub use region::{Metadata, Region, Vec3D};
