//! Reading models from files.

use base64::Engine;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use strata_core::{Entities, ImportError, Model, Result, SourceError, Texture};

/// A reader for one model file format.
pub trait ModelReader {
    /// Format name, e.g. "JSON".
    fn name(&self) -> &'static str;

    /// File extensions handled by this reader, without the dot.
    fn extensions(&self) -> &[&'static str];

    /// Fast check whether `data` looks like this format.
    fn can_read(&self, data: &[u8]) -> bool;

    /// Parse and validate a model.
    fn read(&self, data: &[u8]) -> Result<Model>;
}

/// Reads the JSON model document.
///
/// Texture data comes either inline as base64 or from a file path relative
/// to `base_dir`. A texture file that cannot be read leaves the texture
/// without bytes; the importer reports it as missing.
#[derive(Debug, Clone, Default)]
pub struct JsonModelReader {
    base_dir: Option<PathBuf>,
}

impl JsonModelReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve texture paths relative to `dir`.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    fn load_texture(&self, texture: &mut Texture) -> Result<()> {
        if texture.bytes.is_some() {
            return Ok(());
        }
        if let Some(data) = &texture.data {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(data.trim())
                .map_err(SourceError::from)?;
            texture.bytes = Some(bytes);
            return Ok(());
        }
        if let Some(path) = &texture.path {
            let full = match &self.base_dir {
                Some(dir) => dir.join(path),
                None => PathBuf::from(path),
            };
            match std::fs::read(&full) {
                Ok(bytes) => texture.bytes = Some(bytes),
                Err(err) => log::warn!("Texture {} not loaded from {}: {err}", texture.name, full.display()),
            }
        }
        Ok(())
    }
}

impl ModelReader for JsonModelReader {
    fn name(&self) -> &'static str {
        "JSON"
    }

    fn extensions(&self) -> &[&'static str] {
        &["json"]
    }

    fn can_read(&self, data: &[u8]) -> bool {
        data.iter()
            .find(|byte| !byte.is_ascii_whitespace())
            .is_some_and(|&byte| byte == b'{')
    }

    fn read(&self, data: &[u8]) -> Result<Model> {
        let mut model: Model = serde_json::from_slice(data).map_err(SourceError::from)?;

        for material in &mut model.materials {
            if let Some(texture) = &mut material.texture {
                self.load_texture(texture)?;
            }
        }

        validate_entities(&model, &model.entities, "root")?;
        for definition in &model.definitions {
            validate_entities(&model, &definition.entities, &definition.name)?;
        }

        if model.definitions.iter().all(|def| def.instance_count == 0) {
            model.count_instances();
        }

        log::debug!(
            "Read model {:?}: {} definitions, {} materials, {} scenes",
            model.name,
            model.definitions.len(),
            model.materials.len(),
            model.scenes.len()
        );
        Ok(model)
    }
}

/// Check instance references and triangle indices below `entities`.
fn validate_entities(model: &Model, entities: &Entities, owner: &str) -> Result<()> {
    let mut stack = vec![entities];
    while let Some(entities) = stack.pop() {
        for instance in &entities.instances {
            if model.definition(&instance.definition).is_none() {
                return Err(ImportError::UndefinedComponent {
                    name: instance.definition.clone(),
                });
            }
        }
        for (index, face) in entities.faces.iter().enumerate() {
            let count = face.vertices.len();
            if let Some(bad) = face.triangles.iter().flatten().find(|&&i| i as usize >= count) {
                return Err(SourceError::read_context(
                    format!("triangle index {bad} out of range for {count} vertices"),
                    format!("face {index} of {owner}"),
                )
                .into());
            }
        }
        stack.extend(entities.groups.iter().map(|group| &group.entities));
    }
    Ok(())
}

/// Readers by extension.
pub struct ReaderRegistry {
    readers: Vec<Box<dyn ModelReader>>,
    by_extension: IndexMap<String, usize>,
}

impl Default for ReaderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ReaderRegistry {
    pub fn new() -> Self {
        Self {
            readers: Vec::new(),
            by_extension: IndexMap::new(),
        }
    }

    /// A registry with the JSON reader.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(JsonModelReader::new());
        registry
    }

    pub fn register<R: ModelReader + 'static>(&mut self, reader: R) {
        let index = self.readers.len();
        for ext in reader.extensions() {
            self.by_extension.insert(ext.to_lowercase(), index);
        }
        self.readers.push(Box::new(reader));
    }

    pub fn reader_for_extension(&self, ext: &str) -> Option<&dyn ModelReader> {
        let ext = ext.trim_start_matches('.').to_lowercase();
        let index = *self.by_extension.get(&ext)?;
        self.readers.get(index).map(|reader| reader.as_ref())
    }

    /// Read with the reader for the extension, or the first reader that
    /// recognizes the data.
    pub fn read(&self, data: &[u8], extension: Option<&str>) -> Result<Model> {
        if let Some(reader) = extension.and_then(|ext| self.reader_for_extension(ext)) {
            return reader.read(data);
        }
        self.readers
            .iter()
            .find(|reader| reader.can_read(data))
            .ok_or_else(|| SourceError::read("no reader recognized this format"))?
            .read(data)
    }
}

/// Read a model file, resolving texture paths next to it.
pub fn read_model_file(path: impl AsRef<Path>) -> Result<Model> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(SourceError::from)?;
    let mut registry = ReaderRegistry::new();
    let mut reader = JsonModelReader::new();
    if let Some(dir) = path.parent() {
        reader = reader.with_base_dir(dir);
    }
    registry.register(reader);
    registry.read(&data, path.extension().and_then(|ext| ext.to_str()))
}
