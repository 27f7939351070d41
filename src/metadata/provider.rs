//! Alias registry.
//!
//! Maps each entity type to the alias used for it in rendered statements.
//! Aliases are derived lazily from the first two characters of the table
//! name, or taken from an explicit table (`initialize`) or from settings.
//! Entries are never removed; `initialize` replaces the whole map at once.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tracing::{debug, info};

use super::alias::Alias;
use super::entity::{Entity, EntityMeta};
use crate::config::{Settings, SettingsError};
use crate::error::{SqlError, SqlResult};

/// Placeholder prefix used when no settings are supplied (`@p0`, `@p1`, ...).
pub const DEFAULT_PARAMETER_PREFIX: &str = "p";

static GLOBAL: OnceLock<Arc<MetadataProvider>> = OnceLock::new();

/// Process-scoped alias container.
///
/// Builders capture an `Arc<MetadataProvider>` when they are created and use
/// it for every alias they resolve afterwards.
#[derive(Debug)]
pub struct MetadataProvider {
    aliases: Mutex<HashMap<TypeId, Alias>>,
    /// Table name -> alias, consulted before the two-letter derivation.
    table_aliases: HashMap<String, String>,
    parameter_prefix: Arc<str>,
}

impl Default for MetadataProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataProvider {
    pub fn new() -> Self {
        Self {
            aliases: Mutex::new(HashMap::new()),
            table_aliases: HashMap::new(),
            parameter_prefix: Arc::from(DEFAULT_PARAMETER_PREFIX),
        }
    }

    /// Build a provider from validated settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, SettingsError> {
        settings.validate()?;
        info!(
            table_aliases = settings.aliases.len(),
            parameter_prefix = %settings.render.parameter_prefix,
            "metadata provider configured from settings"
        );
        Ok(Self {
            aliases: Mutex::new(HashMap::new()),
            table_aliases: settings
                .aliases
                .iter()
                .map(|(table, alias)| (table.clone(), alias.clone()))
                .collect(),
            parameter_prefix: Arc::from(settings.render.parameter_prefix.as_str()),
        })
    }

    /// The process-wide provider, default-constructed on first use.
    pub fn global() -> Arc<MetadataProvider> {
        GLOBAL
            .get_or_init(|| Arc::new(MetadataProvider::new()))
            .clone()
    }

    /// Install the process-wide provider. Must run before the first `global()` call.
    pub fn install_global(provider: MetadataProvider) -> SqlResult<Arc<MetadataProvider>> {
        let provider = Arc::new(provider);
        GLOBAL
            .set(provider.clone())
            .map_err(|_| SqlError::argument("the global metadata provider is already initialized"))?;
        Ok(provider)
    }

    /// Prefix new filters use for parameter placeholders.
    pub fn parameter_prefix(&self) -> &str {
        &self.parameter_prefix
    }

    pub(crate) fn shared_prefix(&self) -> Arc<str> {
        self.parameter_prefix.clone()
    }

    /// Alias for entity `E`, registering a derived one on first use.
    pub fn alias_for<E: Entity>(&self) -> SqlResult<Alias> {
        self.alias_of(EntityMeta::of::<E>())
    }

    /// Alias for an entity known at runtime.
    ///
    /// Lookup and insertion happen under one lock, so concurrent callers
    /// resolving the same entity observe the same alias.
    pub fn alias_of(&self, entity: EntityMeta) -> SqlResult<Alias> {
        let mut entries = self.lock();
        if let Some(alias) = entries.get(&entity.type_id()) {
            return Ok(alias.clone());
        }

        let name = self.derive_name(entity)?;
        let taken = entries
            .values()
            .find(|alias| alias.value().eq_ignore_ascii_case(&name));
        if let Some(owner) = taken {
            return Err(SqlError::DuplicateAlias {
                alias: name,
                existing: owner
                    .entity()
                    .map(|meta| meta.type_name())
                    .unwrap_or("<untyped>")
                    .to_string(),
                requested: entity.type_name().to_string(),
            });
        }

        let alias = Alias::for_entity(entity, &name)?;
        debug!(alias = %alias, entity = entity.type_name(), "registered table alias");
        entries.insert(entity.type_id(), alias.clone());
        Ok(alias)
    }

    /// Replace every registered alias with `aliases`.
    ///
    /// Each alias must be bound to an entity; names and entities must be unique.
    pub fn initialize(&self, aliases: impl IntoIterator<Item = Alias>) -> SqlResult<()> {
        let mut entries: HashMap<TypeId, Alias> = HashMap::new();
        for alias in aliases {
            let entity = alias.entity().ok_or_else(|| {
                SqlError::argument(format!("alias '{}' is not bound to an entity type", alias))
            })?;
            if let Some(owner) = entries.values().find(|existing| **existing == alias) {
                return Err(SqlError::DuplicateAlias {
                    alias: alias.value().to_string(),
                    existing: owner
                        .entity()
                        .map(|meta| meta.type_name())
                        .unwrap_or("<untyped>")
                        .to_string(),
                    requested: entity.type_name().to_string(),
                });
            }
            if entries.insert(entity.type_id(), alias).is_some() {
                return Err(SqlError::argument(format!(
                    "entity '{}' is registered more than once",
                    entity.type_name()
                )));
            }
        }
        if entries.is_empty() {
            return Err(SqlError::argument("explicit alias table must not be empty"));
        }

        info!(count = entries.len(), "alias registry initialized");
        *self.lock() = entries;
        Ok(())
    }

    /// Snapshot of the registered aliases, ordered by name.
    pub fn registered(&self) -> Vec<Alias> {
        let mut aliases: Vec<Alias> = self.lock().values().cloned().collect();
        aliases.sort_by(|a, b| a.value().cmp(b.value()));
        aliases
    }

    fn derive_name(&self, entity: EntityMeta) -> SqlResult<String> {
        let table = entity.table_name();
        if let Some(explicit) = self.table_aliases.get(table) {
            return Ok(explicit.clone());
        }
        if table.is_empty() {
            return Err(SqlError::argument(format!(
                "entity '{}' has an empty table name",
                entity.type_name()
            )));
        }
        Ok(table.chars().take(2).flat_map(char::to_lowercase).collect())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TypeId, Alias>> {
        // The map is only ever replaced wholesale or appended to.
        self.aliases.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
