use log::debug;
use quartz_nbt::NbtCompound;
use std::path::Path;

use crate::error::{Result, SchematicError};
use crate::formats::read_compressed;
use crate::formats::litematic::LitematicFormat;
use crate::formats::structure::{StructureFormat, DEFAULT_NAME};
use crate::region::Region;

/// Decoder for one document schema. Both methods see the already parsed
/// root, so the manager gunzips and parses a document once.
pub trait RegionImporter: Send + Sync {
    fn name(&self) -> String;
    fn extensions(&self) -> Vec<String>;
    fn detect(&self, root: &NbtCompound) -> bool;
    /// `name` is used by formats whose documents carry no name of their own.
    fn read(&self, name: &str, root: &NbtCompound) -> Result<Region>;
}

pub trait RegionExporter: Send + Sync {
    fn name(&self) -> String;
    fn extensions(&self) -> Vec<String>;
    fn write(&self, region: &Region) -> Result<Vec<u8>>;
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Routes reads and writes to the registered codecs, by extension or by
/// sniffing the content.
#[derive(Default)]
pub struct FormatManager {
    importers: Vec<Box<dyn RegionImporter>>,
    exporters: Vec<Box<dyn RegionExporter>>,
}

impl FormatManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager with the litematic and structure codecs registered.
    pub fn with_defaults() -> Self {
        let mut manager = Self::new();
        manager.register_importer(LitematicFormat::default());
        manager.register_importer(StructureFormat::default());
        manager.register_exporter(LitematicFormat::default());
        manager.register_exporter(StructureFormat::default());
        manager
    }

    pub fn register_importer<I: RegionImporter + 'static>(&mut self, importer: I) {
        self.importers.push(Box::new(importer));
    }

    pub fn register_exporter<E: RegionExporter + 'static>(&mut self, exporter: E) {
        self.exporters.push(Box::new(exporter));
    }

    pub fn list_importers(&self) -> Vec<String> {
        self.importers.iter().map(|i| i.name()).collect()
    }

    pub fn list_exporters(&self) -> Vec<String> {
        self.exporters.iter().map(|e| e.name()).collect()
    }

    fn detect_root(&self, root: &NbtCompound) -> Option<&dyn RegionImporter> {
        self.importers
            .iter()
            .map(|importer| importer.as_ref())
            .find(|importer| importer.detect(root))
    }

    pub fn detect_format(&self, data: &[u8]) -> Option<String> {
        let root = read_compressed(data).ok()?;
        self.detect_root(&root).map(|importer| importer.name())
    }

    /// Reads bytes of unknown format. Nameless formats get [`DEFAULT_NAME`].
    pub fn read(&self, data: &[u8]) -> Result<Region> {
        let unsupported = || {
            SchematicError::UnsupportedFormat("unknown or unsupported schematic format".to_string())
        };
        let root = read_compressed(data).map_err(|_| unsupported())?;
        let importer = self.detect_root(&root).ok_or_else(unsupported)?;
        debug!("detected {} document", importer.name());
        importer.read(DEFAULT_NAME, &root)
    }

    /// Reads `data` with the codec owning the extension of `path`. The file
    /// stem becomes the name for nameless formats.
    pub fn read_auto(&self, path: impl AsRef<Path>, data: &[u8]) -> Result<Region> {
        let path = path.as_ref();
        let extension = extension_of(path);
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(DEFAULT_NAME);

        let Some(importer) = self
            .importers
            .iter()
            .find(|i| i.extensions().contains(&extension))
        else {
            return Err(SchematicError::UnsupportedFormat(format!(
                "no reader for extension .{}",
                extension
            )));
        };
        importer.read(name, &read_compressed(data)?)
    }

    /// Loads a region from disk, choosing the codec by extension.
    pub fn load_from_file(&self, path: impl AsRef<Path>) -> Result<Region> {
        let path = path.as_ref();
        // reject before touching the filesystem
        let extension = extension_of(path);
        if !self
            .importers
            .iter()
            .any(|i| i.extensions().contains(&extension))
        {
            return Err(SchematicError::UnsupportedFormat(format!(
                "no reader for extension .{}",
                extension
            )));
        }
        let data = std::fs::read(path)?;
        self.read_auto(path, &data)
    }

    pub fn write(&self, format: &str, region: &Region) -> Result<Vec<u8>> {
        for exporter in &self.exporters {
            if exporter.name().eq_ignore_ascii_case(format) {
                return exporter.write(region);
            }
        }
        Err(SchematicError::UnsupportedFormat(format!(
            "unsupported export format: {}",
            format
        )))
    }

    pub fn write_auto(&self, path: impl AsRef<Path>, region: &Region) -> Result<Vec<u8>> {
        let extension = extension_of(path.as_ref());

        for exporter in &self.exporters {
            if exporter.extensions().contains(&extension) {
                return exporter.write(region);
            }
        }
        Err(SchematicError::UnsupportedFormat(format!(
            "could not determine format from extension: .{}",
            extension
        )))
    }

    /// Encodes `region` and writes it to `path`, choosing the codec by extension.
    pub fn save_to_file(&self, path: impl AsRef<Path>, region: &Region) -> Result<()> {
        let path = path.as_ref();
        let data = self.write_auto(path, region)?;
        std::fs::write(path, data)?;
        Ok(())
    }
}
