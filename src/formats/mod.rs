use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use quartz_nbt::io::Flavor;
use quartz_nbt::NbtCompound;

use crate::error::Result;

pub mod litematic;
pub mod manager;
pub mod structure;

pub use litematic::LitematicFormat;
pub use manager::{FormatManager, RegionExporter, RegionImporter};
pub use structure::StructureFormat;

/// Gunzips and parses a whole document. The decoder reads the slice directly.
pub(crate) fn read_compressed(data: &[u8]) -> Result<NbtCompound> {
    let mut gz = GzDecoder::new(data);
    let (root, _) = quartz_nbt::io::read_nbt(&mut gz, Flavor::Uncompressed)?;
    Ok(root)
}

pub(crate) fn write_compressed(
    root: &NbtCompound,
    compression: flate2::Compression,
) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), compression);
    quartz_nbt::io::write_nbt(&mut encoder, None, root, Flavor::Uncompressed)?;
    Ok(encoder.finish()?)
}
