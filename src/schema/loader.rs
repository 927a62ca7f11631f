//! Entity definition registry
//!
//! - Definitions stored at <data_dir>/entities/entity_<uuid>.json
//! - One file per entity
//! - Malformed definition files fail the load (FATAL)

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use uuid::Uuid;

use super::errors::{SchemaError, SchemaResult};
use super::types::{EntityDefinition, FieldDefinition};

/// Read-only access to entity definitions.
///
/// Validation and query compilation only ever need this view; whatever sits
/// behind it (files, a database, a cache) is the implementor's business.
pub trait SchemaLookup {
    /// Gets an entity by id.
    fn entity(&self, entity_id: Uuid) -> Option<&EntityDefinition>;

    /// Gets an entity by its name. Matching is exact.
    fn entity_by_name(&self, name: &str) -> Option<&EntityDefinition>;

    /// Returns the entity's fields in display order.
    fn field_definitions(&self, entity_id: Uuid) -> SchemaResult<Vec<FieldDefinition>> {
        self.entity(entity_id)
            .map(EntityDefinition::ordered_fields)
            .ok_or_else(|| SchemaError::unknown_entity(entity_id))
    }
}

/// Entity registry that reads definition files from disk.
pub struct SchemaLoader {
    /// Directory containing entity definition files
    entity_dir: PathBuf,
    entities: HashMap<Uuid, EntityDefinition>,
}

impl SchemaLoader {
    /// Creates a loader for the given data directory.
    ///
    /// Definition files are expected at `<data_dir>/entities/`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            entity_dir: data_dir.join("entities"),
            entities: HashMap::new(),
        }
    }

    pub fn entity_dir(&self) -> &Path {
        &self.entity_dir
    }

    /// Loads every `*.json` file in the entity directory.
    ///
    /// A missing directory is created and treated as empty.
    pub fn load_all(&mut self) -> SchemaResult<()> {
        if !self.entity_dir.exists() {
            fs::create_dir_all(&self.entity_dir).map_err(|e| {
                SchemaError::malformed_definition(
                    self.entity_dir.display().to_string(),
                    format!("Failed to create entity directory: {}", e),
                )
            })?;
            return Ok(());
        }

        let entries = fs::read_dir(&self.entity_dir).map_err(|e| {
            SchemaError::malformed_definition(
                self.entity_dir.display().to_string(),
                format!("Failed to read entity directory: {}", e),
            )
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| {
                SchemaError::malformed_definition(
                    self.entity_dir.display().to_string(),
                    format!("Failed to read directory entry: {}", e),
                )
            })?;

            let path = entry.path();
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }

            self.load_entity_file(&path)?;
        }

        info!(
            dir = %self.entity_dir.display(),
            count = self.entities.len(),
            "Loaded entity definitions"
        );
        Ok(())
    }

    fn load_entity_file(&mut self, path: &Path) -> SchemaResult<()> {
        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::malformed_definition(
                path.display().to_string(),
                format!("Failed to read file: {}", e),
            )
        })?;

        let entity: EntityDefinition = serde_json::from_str(&content).map_err(|e| {
            SchemaError::malformed_definition(path.display().to_string(), format!("Invalid JSON: {}", e))
        })?;

        entity
            .validate_structure()
            .map_err(|e| SchemaError::malformed_definition(path.display().to_string(), e))?;

        if self.entities.contains_key(&entity.id) {
            return Err(SchemaError::duplicate_entity(entity.id));
        }

        debug!(entity = %entity.name, id = %entity.id, "Loaded entity definition");
        self.entities.insert(entity.id, entity);
        Ok(())
    }

    /// Registers an entity directly, without touching disk.
    pub fn register(&mut self, entity: EntityDefinition) -> SchemaResult<()> {
        entity
            .validate_structure()
            .map_err(|e| SchemaError::malformed_definition("<in-memory>", e))?;

        if self.entities.contains_key(&entity.id) {
            return Err(SchemaError::duplicate_entity(entity.id));
        }

        self.entities.insert(entity.id, entity);
        Ok(())
    }

    pub fn exists(&self, entity_id: Uuid) -> bool {
        self.entities.contains_key(&entity_id)
    }

    pub fn all_entities(&self) -> impl Iterator<Item = &EntityDefinition> {
        self.entities.values()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Writes an entity definition file. Existing files are never overwritten.
    pub fn save_entity(&self, entity: &EntityDefinition) -> SchemaResult<PathBuf> {
        let path = self.entity_dir.join(format!("entity_{}.json", entity.id));

        if path.exists() {
            return Err(SchemaError::duplicate_entity(entity.id));
        }

        fs::create_dir_all(&self.entity_dir).map_err(|e| {
            SchemaError::malformed_definition(
                self.entity_dir.display().to_string(),
                format!("Failed to create entity directory: {}", e),
            )
        })?;

        let content = serde_json::to_string_pretty(entity).map_err(|e| {
            SchemaError::malformed_definition(
                path.display().to_string(),
                format!("Failed to serialize entity: {}", e),
            )
        })?;

        fs::write(&path, content).map_err(|e| {
            SchemaError::malformed_definition(
                path.display().to_string(),
                format!("Failed to write file: {}", e),
            )
        })?;

        Ok(path)
    }
}

impl SchemaLookup for SchemaLoader {
    fn entity(&self, entity_id: Uuid) -> Option<&EntityDefinition> {
        self.entities.get(&entity_id)
    }

    fn entity_by_name(&self, name: &str) -> Option<&EntityDefinition> {
        self.entities.values().find(|e| e.name == name)
    }
}
