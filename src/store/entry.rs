use std::path::{Path, PathBuf};

use pakforge_formats::common::AssetId;
use pakforge_formats::res_type::ResourceType;
use pakforge_formats::resource::Resource;

/// Per-asset record owned by the store. Carries the metadata needed to find
/// and identify the cooked file plus the lazily loaded payload slot.
#[derive(Debug, Clone)]
pub struct ResourceEntry {
    id: AssetId,
    resource_type: ResourceType,
    /// Virtual directory path, '/'-separated, without the file name. Empty
    /// for the database root.
    directory: String,
    name: String,
    needs_recook: bool,
    marked_for_deletion: bool,
    /// External holders of the loaded payload. The payload itself stays in
    /// the entry; holders register through the store.
    ref_count: u32,
    /// Flat dependency list persisted in the database cache so dependency
    /// walks do not have to parse every cooked file.
    dependency_summary: Vec<AssetId>,
    payload: Option<Resource>,
}

impl ResourceEntry {
    pub fn new(id: AssetId, resource_type: ResourceType, directory: &str, name: &str) -> Self {
        ResourceEntry {
            id,
            resource_type,
            directory: directory.trim_matches('/').to_string(),
            name: name.to_string(),
            needs_recook: false,
            marked_for_deletion: false,
            ref_count: 0,
            dependency_summary: Vec::new(),
            payload: None,
        }
    }

    pub fn id(&self) -> AssetId {
        self.id
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Path of the entry inside the virtual directory tree, including the
    /// cooked extension.
    pub fn virtual_path(&self) -> String {
        if self.directory.is_empty() {
            format!("{}.{}", self.name, self.resource_type.fourcc())
        } else {
            format!("{}/{}.{}", self.directory, self.name, self.resource_type.fourcc())
        }
    }

    /// On-disk location of the cooked file under the store's resources
    /// directory. Mirrors the virtual path.
    pub fn cooked_path(&self, resources_dir: &Path) -> PathBuf {
        let mut path = resources_dir.to_path_buf();
        for component in self.directory.split('/').filter(|c| !c.is_empty()) {
            path.push(component);
        }
        path.push(format!("{}.{}", self.name, self.resource_type.fourcc()));
        path
    }

    pub fn needs_recook(&self) -> bool {
        self.needs_recook
    }

    pub fn set_needs_recook(&mut self, needs_recook: bool) {
        self.needs_recook = needs_recook;
    }

    pub fn is_marked_for_deletion(&self) -> bool {
        self.marked_for_deletion
    }

    pub(crate) fn mark_for_deletion(&mut self) {
        self.marked_for_deletion = true;
    }

    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    pub(crate) fn add_ref(&mut self) {
        self.ref_count += 1;
    }

    pub(crate) fn release_ref(&mut self) {
        debug_assert!(self.ref_count > 0);
        self.ref_count = self.ref_count.saturating_sub(1);
    }

    pub fn dependency_summary(&self) -> &[AssetId] {
        &self.dependency_summary
    }

    pub fn set_dependency_summary(&mut self, summary: Vec<AssetId>) {
        self.dependency_summary = summary;
    }

    pub fn payload(&self) -> Option<&Resource> {
        self.payload.as_ref()
    }

    pub(crate) fn set_payload(&mut self, payload: Resource) {
        debug_assert!(self.payload.is_none());
        self.payload = Some(payload);
    }

    pub(crate) fn drop_payload(&mut self) {
        self.payload = None;
    }
}
