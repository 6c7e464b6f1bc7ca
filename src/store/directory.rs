use std::collections::{BTreeMap, BTreeSet};

use pakforge_formats::common::AssetId;

/// Node of the store's virtual directory tree, mirroring the on-disk layout
/// of the cooked resources directory.
#[derive(Debug, Clone, Default)]
pub struct VirtualDirectory {
    children: BTreeMap<String, VirtualDirectory>,
    resources: BTreeSet<AssetId>,
}

impl VirtualDirectory {
    pub fn subdirectory(&self, path: &str) -> Option<&VirtualDirectory> {
        let mut dir = self;
        for component in path.split('/').filter(|c| !c.is_empty()) {
            dir = dir.children.get(component)?;
        }
        Some(dir)
    }

    /// Descends to `path`, creating missing components on the way.
    pub fn subdirectory_mut(&mut self, path: &str) -> &mut VirtualDirectory {
        let mut dir = self;
        for component in path.split('/').filter(|c| !c.is_empty()) {
            dir = dir.children.entry(component.to_string()).or_default();
        }
        dir
    }

    pub fn register(&mut self, path: &str, id: AssetId) {
        self.subdirectory_mut(path).resources.insert(id);
    }

    pub fn unregister(&mut self, path: &str, id: AssetId) {
        if let Some(dir) = self.lookup_mut(path) {
            dir.resources.remove(&id);
        }
    }

    fn lookup_mut(&mut self, path: &str) -> Option<&mut VirtualDirectory> {
        let mut dir = self;
        for component in path.split('/').filter(|c| !c.is_empty()) {
            dir = dir.children.get_mut(component)?;
        }
        Some(dir)
    }

    pub fn resources(&self) -> impl Iterator<Item = AssetId> + '_ {
        self.resources.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.children.values().all(VirtualDirectory::is_empty)
    }

    /// Removes empty subdirectories. With `recurse`, empties are pruned
    /// bottom-up through the whole subtree.
    pub fn prune_empty(&mut self, recurse: bool) {
        if recurse {
            for child in self.children.values_mut() {
                child.prune_empty(true);
            }
        }
        self.children.retain(|_, child| !child.is_empty());
    }

    pub fn clear(&mut self) {
        self.children.clear();
        self.resources.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_creates_intermediate_directories() {
        let mut root = VirtualDirectory::default();
        root.register("Worlds/Intro", AssetId::new_32(0x1));

        let dir = root.subdirectory("Worlds/Intro").unwrap();
        assert_eq!(dir.resources().collect::<Vec<_>>(), vec![AssetId::new_32(0x1)]);
        assert!(root.subdirectory("Worlds/Missing").is_none());
    }

    #[test]
    fn pruning_removes_emptied_branches() {
        let mut root = VirtualDirectory::default();
        root.register("A/B", AssetId::new_32(0x1));
        root.unregister("A/B", AssetId::new_32(0x1));

        root.prune_empty(true);
        assert!(root.subdirectory("A").is_none());
    }
}
