//! Dependency list builders: recursive walkers producing the transitive,
//! duplicate-free closure of asset references for a package or a single
//! asset. Cycle safety comes from a cumulative already-added set, so
//! mutually referencing assets terminate.

use std::collections::{HashMap, HashSet};

use log::{error, warn};

use pakforge_formats::FormatError;
use pakforge_formats::common::{AssetId, FourCC};
use pakforge_formats::res_type::ResourceType;
use pakforge_formats::resource::Resource;
use pakforge_formats::scly::types::ScriptLayer;
use pakforge_formats::world::cooker::WorldCookSupport;

use crate::store::ResourceStore;

/// Closure builder over whole packages or single root assets. Emits in
/// post-order, so every asset appears after the assets it references; the
/// pak writer relies on that ordering.
pub struct PackageDependencyListBuilder<'s> {
    store: &'s mut ResourceStore,
    added: HashSet<AssetId>,
}

impl<'s> PackageDependencyListBuilder<'s> {
    pub fn new(store: &'s mut ResourceStore) -> Self {
        PackageDependencyListBuilder { store, added: HashSet::new() }
    }

    pub fn build(&mut self, roots: impl IntoIterator<Item = AssetId>) -> Vec<AssetId> {
        let mut out = Vec::new();
        for root in roots {
            self.add_dependency(root, &mut out);
        }
        out
    }

    fn add_dependency(&mut self, id: AssetId, out: &mut Vec<AssetId>) {
        if !id.is_valid() || self.added.contains(&id) {
            return;
        }
        let Some(entry) = self.store.find_entry(id) else {
            warn!("Skipping unregistered dependency {id}");
            return;
        };
        let resource_type = entry.resource_type();

        // Inserted before recursing; this is the cycle guard.
        self.added.insert(id);

        for dep in self.store.entry_dependencies(id) {
            self.add_dependency(dep, out);
        }

        // World headers only reference their own tables; the areas hang off
        // the area records.
        if resource_type == ResourceType::World {
            let areas: Vec<AssetId> = match self.store.load_resource(id) {
                Some(Resource::World(world)) => {
                    world.areas.iter().map(|area| area.area_res_id).collect()
                }
                _ => Vec::new(),
            };
            for area in areas {
                self.add_dependency(area, out);
            }
        }

        out.push(id);
    }
}

/// Script data of one area, as far as dependency building is concerned.
/// Supplied by whoever parsed the area's script section; the cooked area
/// format itself stays opaque to the store.
#[derive(Debug, Clone, Default)]
pub struct AreaScriptData {
    /// Geometry-level references: materials, collision, path meshes.
    pub base_dependencies: Vec<AssetId>,
    pub layers: Vec<ScriptLayer>,
}

/// Area closure builder with per-script-layer partitioning. The older titles
/// cook a per-layer offset table into the world file, so the list records
/// where each layer's dependencies begin.
pub struct AreaDependencyListBuilder<'s> {
    store: &'s mut ResourceStore,
    added: HashSet<AssetId>,
}

impl<'s> AreaDependencyListBuilder<'s> {
    pub fn new(store: &'s mut ResourceStore) -> Self {
        AreaDependencyListBuilder { store, added: HashSet::new() }
    }

    /// Returns the closure plus one offset per layer, each an index into the
    /// returned list. Base dependencies come first, then the layers in
    /// order; an asset claimed by an earlier layer is not repeated.
    pub fn build(&mut self, area: &AreaScriptData) -> (Vec<AssetId>, Vec<u32>) {
        let mut out = Vec::new();
        for dep in &area.base_dependencies {
            self.add_dependency(*dep, &mut out);
        }

        let mut layer_offsets = Vec::with_capacity(area.layers.len());
        for layer in &area.layers {
            layer_offsets.push(out.len() as u32);
            for dep in layer.dependencies() {
                self.add_dependency(dep, &mut out);
            }
        }

        (out, layer_offsets)
    }

    fn add_dependency(&mut self, id: AssetId, out: &mut Vec<AssetId>) {
        if !id.is_valid() || self.added.contains(&id) {
            return;
        }
        if self.store.find_entry(id).is_none() {
            warn!("Skipping unregistered dependency {id}");
            return;
        }

        self.added.insert(id);
        for dep in self.store.entry_dependencies(id) {
            self.add_dependency(dep, out);
        }
        out.push(id);
    }
}

/// World cook support backed by the resource store. Script data per area is
/// registered by the caller; areas without registered script data fall back
/// to their persisted dependency summary and cook an empty layer offset
/// table.
pub struct StoreCookSupport<'s> {
    store: &'s mut ResourceStore,
    area_scripts: HashMap<AssetId, AreaScriptData>,
}

impl<'s> StoreCookSupport<'s> {
    pub fn new(store: &'s mut ResourceStore) -> Self {
        StoreCookSupport { store, area_scripts: HashMap::new() }
    }

    pub fn register_area_scripts(&mut self, area: AssetId, data: AreaScriptData) {
        self.area_scripts.insert(area, data);
    }

    fn area_script_data(&mut self, area: AssetId) -> AreaScriptData {
        match self.area_scripts.get(&area) {
            Some(data) => data.clone(),
            None => AreaScriptData {
                base_dependencies: self.store.entry_dependencies(area),
                layers: Vec::new(),
            },
        }
    }
}

impl WorldCookSupport for StoreCookSupport<'_> {
    fn area_dependencies(
        &mut self,
        area: AssetId,
    ) -> Result<(Vec<(AssetId, FourCC)>, Vec<u32>), FormatError> {
        let data = self.area_script_data(area);
        let (ids, layer_offsets) = AreaDependencyListBuilder::new(self.store).build(&data);

        let mut typed = Vec::with_capacity(ids.len());
        for id in ids {
            match self.store.find_entry(id) {
                Some(entry) => typed.push((id, entry.resource_type().fourcc())),
                // The builder only emits registered IDs.
                None => error!("Dependency {id} vanished from the store mid-cook"),
            }
        }
        Ok((typed, layer_offsets))
    }

    fn module_dependencies(
        &mut self,
        _area: AssetId,
    ) -> Result<(Vec<String>, Vec<u32>), FormatError> {
        // Module (.rel) usage is derived from script object types, which the
        // store does not track for opaque areas.
        Ok((Vec::new(), Vec::new()))
    }

    fn area_audio_groups(&mut self, area: AssetId) -> Result<Vec<(u32, AssetId)>, FormatError> {
        let data = self.area_script_data(area);
        let (ids, _) = AreaDependencyListBuilder::new(self.store).build(&data);

        let audio_ids: Vec<AssetId> = ids
            .into_iter()
            .filter(|id| {
                self.store
                    .find_entry(*id)
                    .is_some_and(|entry| entry.resource_type() == ResourceType::AudioGroup)
            })
            .collect();

        let mut groups = Vec::new();
        for id in audio_ids {
            if let Some(Resource::AudioGroup(group)) = self.store.load_resource(id) {
                groups.push((u32::from(group.group_id), id));
            }
        }
        Ok(groups)
    }
}
