use thiserror::Error;

use crate::region::Vec3D;

/// Errors produced by the voxel store and the format codecs.
#[derive(Debug, Error)]
pub enum SchematicError {
    #[error("position ({x}, {y}, {z}) is outside region of size {size}")]
    OutOfRange { x: i32, y: i32, z: i32, size: Vec3D },

    #[error("index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("unregistered entity type: {0}")]
    UnknownEntity(String),

    #[error("unknown block: {0}")]
    UnknownBlock(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("NBT error: {0}")]
    Nbt(#[from] quartz_nbt::io::NbtIoError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchematicError {
    pub(crate) fn decode(msg: impl Into<String>) -> Self {
        SchematicError::Decode(msg.into())
    }

    /// True for the kinds that abort a document load.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            SchematicError::Decode(_) | SchematicError::UnknownEntity(_) | SchematicError::Nbt(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SchematicError>;
