//! VaultStore — the hierarchy manager.
//!
//! Holds the in-memory vault cache, persists whole-vault snapshots through
//! the storage provider after every non-transient mutation, keeps the
//! inverted index in step, and applies the ownership filter to every read.
//!
//! Single-writer per vault id: the embedding application serializes
//! concurrent mutations to the same vault.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;

use super::query::{entry_matches, QueryMatch, SectionRef, VaultQuery};
use crate::config::defaults;
use crate::errors::{StoreError, StoreResult};
use crate::index::InvertedIndex;
use crate::models::{
    Entry, EntryMetadata, Item, Metric, Profile, Section, SectionType, Vault,
};
use crate::storage::{join_path, StorageProvider};

/// Options accepted by every mutating call.
#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    /// Re-persist the owning vault immediately.
    pub persist: bool,
    /// Bump the vault's `updated_at` timestamp.
    pub touch: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            persist: true,
            touch: true,
        }
    }
}

impl WriteOptions {
    /// Mutate in memory only; the vault is not re-persisted.
    pub fn transient() -> Self {
        Self {
            persist: false,
            touch: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SectionPatch {
    pub label: Option<String>,
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
    /// Replacement metadata; must still match the owning section's type.
    pub metadata: Option<EntryMetadata>,
    pub tags: Option<Vec<String>>,
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct ItemDraft {
    pub content: String,
    pub tags: Vec<String>,
    pub metric: Option<Metric>,
}

impl ItemDraft {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub metric: Option<Metric>,
    pub display_order: Option<i32>,
}

pub struct VaultStore {
    provider: Arc<dyn StorageProvider>,
    index: Arc<InvertedIndex>,
    cache: RwLock<HashMap<String, Vault>>,
    vaults_dir: String,
}

fn effective_user(caller: Option<&str>) -> &str {
    caller.unwrap_or(defaults::DEFAULT_USER)
}

/// Vaults with no stored owner stay visible to every caller.
fn owned_by(vault: &Vault, user: &str) -> bool {
    vault
        .metadata
        .owner_id
        .as_deref()
        .is_none_or(|owner| owner == user)
}

fn vault_not_found(vault_id: &str) -> StoreError {
    StoreError::not_found(format!("vault {vault_id}"))
}

impl VaultStore {
    pub fn new(provider: Arc<dyn StorageProvider>, index: Arc<InvertedIndex>) -> Self {
        Self {
            provider,
            index,
            cache: RwLock::new(HashMap::new()),
            vaults_dir: defaults::VAULTS_DIR.to_string(),
        }
    }

    fn snapshot_path(&self, vault_id: &str) -> String {
        join_path(&self.vaults_dir, &format!("{vault_id}.json"))
    }

    fn load_snapshot(&self, vault_id: &str) -> StoreResult<Vault> {
        let path = self.snapshot_path(vault_id);
        let bytes = self.provider.read(&path).map_err(|e| {
            if e.is_not_found() {
                vault_not_found(vault_id)
            } else {
                e
            }
        })?;
        Vault::from_snapshot(&bytes).map_err(|e| StoreError::decode(&path, e))
    }

    fn persist(&self, vault: &Vault) -> StoreResult<()> {
        let path = self.snapshot_path(&vault.id);
        let bytes = vault
            .to_snapshot()
            .map_err(|e| StoreError::decode(&path, format!("encode: {e}")))?;
        self.provider.write(&path, &bytes)?;
        let tags = vault.collect_tags();
        self.index.insert(&path, tags.iter(), &vault.search_text());
        Ok(())
    }

    /// Load-or-cache, ownership-check, mutate, bump version, touch, persist.
    fn with_vault_mut<T>(
        &self,
        caller: Option<&str>,
        vault_id: &str,
        opts: &WriteOptions,
        f: impl FnOnce(&mut Vault) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let user = effective_user(caller).to_string();
        let mut cache = self.cache.write();
        if !cache.contains_key(vault_id) {
            let loaded = self.load_snapshot(vault_id)?;
            cache.insert(vault_id.to_string(), loaded);
        }
        let Some(vault) = cache.get_mut(vault_id) else {
            return Err(vault_not_found(vault_id));
        };
        if !owned_by(vault, &user) {
            return Err(vault_not_found(vault_id));
        }
        let result = f(vault)?;
        vault.version += 1;
        if opts.touch {
            vault.metadata.updated_at = Utc::now();
        }
        if opts.persist {
            self.persist(vault)?;
        }
        Ok(result)
    }

    // --- Vault operations ---

    /// New vaults are stamped with the effective creator identity.
    pub fn create_vault(
        &self,
        caller: Option<&str>,
        profile: Profile,
        opts: &WriteOptions,
    ) -> StoreResult<Vault> {
        let user = effective_user(caller);
        let vault = Vault::new(profile, Some(user.to_string()));
        if opts.persist {
            self.persist(&vault)?;
        }
        self.cache.write().insert(vault.id.clone(), vault.clone());
        log::info!("[VAULT] Created vault {} for {}", vault.id, user);
        Ok(vault)
    }

    pub fn get_vault(&self, caller: Option<&str>, vault_id: &str) -> StoreResult<Vault> {
        let user = effective_user(caller);
        if let Some(vault) = self.cache.read().get(vault_id) {
            if owned_by(vault, user) {
                return Ok(vault.clone());
            }
            return Err(vault_not_found(vault_id));
        }
        let vault = self.load_snapshot(vault_id)?;
        if !owned_by(&vault, user) {
            return Err(vault_not_found(vault_id));
        }
        self.cache.write().insert(vault_id.to_string(), vault.clone());
        Ok(vault)
    }

    /// Bulk scan: undecodable snapshots are skipped and logged, never fatal.
    pub fn get_all_vaults(&self, caller: Option<&str>) -> StoreResult<Vec<Vault>> {
        let user = effective_user(caller);
        let mut found: HashMap<String, Vault> = HashMap::new();
        for entry in self.provider.list(&self.vaults_dir)? {
            if entry.ends_with('/') || !entry.ends_with(".json") {
                continue;
            }
            let path = join_path(&self.vaults_dir, &entry);
            let bytes = match self.provider.read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::warn!("[VAULT] Skipping unreadable snapshot {}: {}", path, e);
                    continue;
                }
            };
            match Vault::from_snapshot(&bytes) {
                Ok(vault) => {
                    found.insert(vault.id.clone(), vault);
                }
                Err(e) => log::warn!("[VAULT] Skipping undecodable snapshot {}: {}", path, e),
            }
        }
        // cached copies are fresher than disk for transient mutations
        for (id, vault) in self.cache.read().iter() {
            found.insert(id.clone(), vault.clone());
        }
        let mut vaults: Vec<Vault> = found
            .into_values()
            .filter(|v| owned_by(v, user))
            .collect();
        vaults.sort_by(|a, b| {
            a.metadata
                .created_at
                .cmp(&b.metadata.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(vaults)
    }

    pub fn update_vault_profile(
        &self,
        caller: Option<&str>,
        vault_id: &str,
        profile: Profile,
        opts: &WriteOptions,
    ) -> StoreResult<Vault> {
        self.with_vault_mut(caller, vault_id, opts, |vault| {
            vault.profile = profile;
            Ok(vault.clone())
        })
    }

    pub fn delete_vault(&self, caller: Option<&str>, vault_id: &str) -> StoreResult<()> {
        // ownership gate: absent and non-owned get the same outcome
        self.get_vault(caller, vault_id)?;
        self.cache.write().remove(vault_id);
        let path = self.snapshot_path(vault_id);
        self.provider.delete(&path)?;
        self.index.remove(&path);
        log::info!("[VAULT] Deleted vault {}", vault_id);
        Ok(())
    }

    // --- Section operations ---

    pub fn add_section(
        &self,
        caller: Option<&str>,
        vault_id: &str,
        section_type: SectionType,
        label: &str,
        opts: &WriteOptions,
    ) -> StoreResult<Section> {
        self.with_vault_mut(caller, vault_id, opts, |vault| {
            let order = vault.next_section_order();
            let section = Section::new(&vault.id, section_type, label, order);
            vault.sections.push(section.clone());
            Ok(section)
        })
    }

    pub fn get_section(
        &self,
        caller: Option<&str>,
        vault_id: &str,
        section_id: &str,
    ) -> StoreResult<Section> {
        let vault = self.get_vault(caller, vault_id)?;
        vault
            .find_section(section_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("section {section_id}")))
    }

    pub fn get_sections_by_type(
        &self,
        caller: Option<&str>,
        vault_id: &str,
        section_type: SectionType,
    ) -> StoreResult<Vec<Section>> {
        let vault = self.get_vault(caller, vault_id)?;
        Ok(vault
            .sections_of_type(section_type)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Section type is immutable; only label and ordering can change.
    pub fn update_section(
        &self,
        caller: Option<&str>,
        vault_id: &str,
        section_id: &str,
        patch: SectionPatch,
        opts: &WriteOptions,
    ) -> StoreResult<Section> {
        self.with_vault_mut(caller, vault_id, opts, |vault| {
            let Some(section) = vault.find_section_mut(section_id) else {
                return Err(StoreError::not_found(format!("section {section_id}")));
            };
            if let Some(label) = patch.label {
                section.label = label;
            }
            if let Some(order) = patch.display_order {
                section.display_order = order;
            }
            Ok(section.clone())
        })
    }

    pub fn delete_section(
        &self,
        caller: Option<&str>,
        vault_id: &str,
        section_id: &str,
        opts: &WriteOptions,
    ) -> StoreResult<()> {
        self.with_vault_mut(caller, vault_id, opts, |vault| {
            let before = vault.sections.len();
            vault.sections.retain(|s| s.id != section_id);
            if vault.sections.len() == before {
                return Err(StoreError::not_found(format!("section {section_id}")));
            }
            Ok(())
        })
    }

    // --- Entry operations ---

    pub fn add_entry(
        &self,
        caller: Option<&str>,
        vault_id: &str,
        section_id: &str,
        metadata: EntryMetadata,
        tags: Vec<String>,
        opts: &WriteOptions,
    ) -> StoreResult<Entry> {
        self.with_vault_mut(caller, vault_id, opts, |vault| {
            let Some(section) = vault.find_section_mut(section_id) else {
                return Err(StoreError::not_found(format!("section {section_id}")));
            };
            if !metadata.matches_section(section.section_type) {
                return Err(StoreError::invalid(format!(
                    "metadata kind '{}' does not belong in a '{}' section",
                    metadata.kind_str(),
                    section.section_type.as_ref()
                )));
            }
            metadata.validate()?;
            let order = section.next_entry_order();
            let mut entry = Entry::new(&section.id, metadata, order);
            entry.tags = tags;
            section.entries.push(entry.clone());
            Ok(entry)
        })
    }

    pub fn get_entry(
        &self,
        caller: Option<&str>,
        vault_id: &str,
        section_id: &str,
        entry_id: &str,
    ) -> StoreResult<Entry> {
        let section = self.get_section(caller, vault_id, section_id)?;
        section
            .find_entry(entry_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("entry {entry_id}")))
    }

    pub fn update_entry(
        &self,
        caller: Option<&str>,
        vault_id: &str,
        section_id: &str,
        entry_id: &str,
        patch: EntryPatch,
        opts: &WriteOptions,
    ) -> StoreResult<Entry> {
        self.with_vault_mut(caller, vault_id, opts, |vault| {
            let Some(section) = vault.find_section_mut(section_id) else {
                return Err(StoreError::not_found(format!("section {section_id}")));
            };
            let section_type = section.section_type;
            let Some(entry) = section.find_entry_mut(entry_id) else {
                return Err(StoreError::not_found(format!("entry {entry_id}")));
            };
            if let Some(metadata) = patch.metadata {
                if !metadata.matches_section(section_type) {
                    return Err(StoreError::invalid(format!(
                        "metadata kind '{}' does not belong in a '{}' section",
                        metadata.kind_str(),
                        section_type.as_ref()
                    )));
                }
                metadata.validate()?;
                entry.metadata = metadata;
            }
            if let Some(tags) = patch.tags {
                entry.tags = tags;
            }
            if let Some(order) = patch.display_order {
                entry.display_order = order;
            }
            Ok(entry.clone())
        })
    }

    pub fn delete_entry(
        &self,
        caller: Option<&str>,
        vault_id: &str,
        section_id: &str,
        entry_id: &str,
        opts: &WriteOptions,
    ) -> StoreResult<()> {
        self.with_vault_mut(caller, vault_id, opts, |vault| {
            let Some(section) = vault.find_section_mut(section_id) else {
                return Err(StoreError::not_found(format!("section {section_id}")));
            };
            let before = section.entries.len();
            section.entries.retain(|e| e.id != entry_id);
            if section.entries.len() == before {
                return Err(StoreError::not_found(format!("entry {entry_id}")));
            }
            Ok(())
        })
    }

    // --- Item operations ---

    pub fn add_item(
        &self,
        caller: Option<&str>,
        vault_id: &str,
        section_id: &str,
        entry_id: &str,
        draft: ItemDraft,
        opts: &WriteOptions,
    ) -> StoreResult<Item> {
        self.with_vault_mut(caller, vault_id, opts, |vault| {
            let Some(section) = vault.find_section_mut(section_id) else {
                return Err(StoreError::not_found(format!("section {section_id}")));
            };
            let Some(entry) = section.find_entry_mut(entry_id) else {
                return Err(StoreError::not_found(format!("entry {entry_id}")));
            };
            let order = entry.next_item_order();
            let mut item = Item::new(&entry.id, draft.content, order);
            item.tags = draft.tags;
            item.metric = draft.metric;
            entry.items.push(item.clone());
            Ok(item)
        })
    }

    pub fn get_item(
        &self,
        caller: Option<&str>,
        vault_id: &str,
        section_id: &str,
        entry_id: &str,
        item_id: &str,
    ) -> StoreResult<Item> {
        let entry = self.get_entry(caller, vault_id, section_id, entry_id)?;
        entry
            .find_item(item_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("item {item_id}")))
    }

    pub fn update_item(
        &self,
        caller: Option<&str>,
        vault_id: &str,
        section_id: &str,
        entry_id: &str,
        item_id: &str,
        patch: ItemPatch,
        opts: &WriteOptions,
    ) -> StoreResult<Item> {
        self.with_vault_mut(caller, vault_id, opts, |vault| {
            let Some(section) = vault.find_section_mut(section_id) else {
                return Err(StoreError::not_found(format!("section {section_id}")));
            };
            let Some(entry) = section.find_entry_mut(entry_id) else {
                return Err(StoreError::not_found(format!("entry {entry_id}")));
            };
            let Some(item) = entry.find_item_mut(item_id) else {
                return Err(StoreError::not_found(format!("item {item_id}")));
            };
            if let Some(content) = patch.content {
                item.content = content;
            }
            if let Some(tags) = patch.tags {
                item.tags = tags;
            }
            if let Some(metric) = patch.metric {
                item.metric = Some(metric);
            }
            if let Some(order) = patch.display_order {
                item.display_order = order;
            }
            Ok(item.clone())
        })
    }

    pub fn delete_item(
        &self,
        caller: Option<&str>,
        vault_id: &str,
        section_id: &str,
        entry_id: &str,
        item_id: &str,
        opts: &WriteOptions,
    ) -> StoreResult<()> {
        self.with_vault_mut(caller, vault_id, opts, |vault| {
            let Some(section) = vault.find_section_mut(section_id) else {
                return Err(StoreError::not_found(format!("section {section_id}")));
            };
            let Some(entry) = section.find_entry_mut(entry_id) else {
                return Err(StoreError::not_found(format!("entry {entry_id}")));
            };
            let before = entry.items.len();
            entry.items.retain(|i| i.id != item_id);
            if entry.items.len() == before {
                return Err(StoreError::not_found(format!("item {item_id}")));
            }
            Ok(())
        })
    }

    // --- Queries ---

    /// Evaluate tag/date/text filters over one vault. Index candidates gate
    /// the work; decoded entries are re-verified before inclusion.
    pub fn query_vault(
        &self,
        caller: Option<&str>,
        vault_id: &str,
        query: &VaultQuery,
    ) -> StoreResult<Vec<QueryMatch>> {
        let vault = self.get_vault(caller, vault_id)?;

        if self.index.is_empty() {
            self.index.rebuild(self.provider.as_ref())?;
        }
        if let Some(candidates) = self
            .index
            .candidates(query.tags.as_deref(), query.text.as_deref())
        {
            if !candidates.contains(&self.snapshot_path(vault_id)) {
                return Ok(Vec::new());
            }
        }

        let mut matches = Vec::new();
        for section in vault.sections_sorted() {
            for entry in section.entries_sorted() {
                if !entry_matches(section, entry, query) {
                    continue;
                }
                let mut entry = entry.clone();
                if query.include_items {
                    entry.items.sort_by_key(|i| i.display_order);
                } else {
                    entry.items.clear();
                }
                matches.push(QueryMatch {
                    vault_id: vault.id.clone(),
                    section: SectionRef::from(section),
                    entry,
                });
            }
        }
        Ok(matches)
    }

    pub fn get_experience_entries(
        &self,
        caller: Option<&str>,
        vault_id: &str,
    ) -> StoreResult<Vec<Entry>> {
        let vault = self.get_vault(caller, vault_id)?;
        Ok(vault
            .sections_of_type(SectionType::Experience)
            .into_iter()
            .flat_map(|s| s.entries_sorted().into_iter().cloned().collect::<Vec<_>>())
            .collect())
    }

    pub fn get_all_items(&self, caller: Option<&str>, vault_id: &str) -> StoreResult<Vec<Item>> {
        let vault = self.get_vault(caller, vault_id)?;
        Ok(vault.all_items().into_iter().cloned().collect())
    }
}
