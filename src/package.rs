//! Package model and the pak writer. A package is an ordered list of named
//! resources; cooking assembles the transitive closure of those resources
//! into the on-disk container the target title expects.

use std::collections::BTreeSet;
use std::io::Cursor;
use std::path::Path;

use log::{debug, info, warn};

use pakforge_formats::common::archive::{TaggedReader, TaggedWriter};
use pakforge_formats::common::{AssetId, BinReader, BinWriter, FourCC, Game};
use pakforge_formats::fourcc;
use pakforge_formats::res_type::ResourceType;

use crate::compress::{compress, padded_size};
use crate::deps::PackageDependencyListBuilder;
use crate::progress::ProgressNotifier;
use crate::store::{ResourceStore, read_id, write_id};

const DEFINITION_MAGIC: FourCC = fourcc!(b"PAKD");
const DEFINITION_VERSION: u32 = 1;

const PARAM_NEEDS_RECOOK: u32 = 0x10;
const PARAM_RESOURCES: u32 = 0x20;

/// Pak entries the game looks up by name rather than by ID: worlds, front
/// end frames, and the like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedResource {
    pub name: String,
    pub id: AssetId,
    pub resource_type: ResourceType,
}

pub struct Package {
    name: String,
    resources: Vec<NamedResource>,
    needs_recook: bool,
    /// Transitive dependency set of all named resources, rebuilt lazily
    /// whenever the resource list changes.
    cached_dependencies: Option<BTreeSet<AssetId>>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Package {
            name: name.into(),
            resources: Vec::new(),
            needs_recook: true,
            cached_dependencies: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn named_resources(&self) -> &[NamedResource] {
        &self.resources
    }

    pub fn needs_recook(&self) -> bool {
        self.needs_recook
    }

    pub fn add_resource(&mut self, name: impl Into<String>, id: AssetId, resource_type: ResourceType) {
        self.resources.push(NamedResource { name: name.into(), id, resource_type });
        self.cached_dependencies = None;
    }

    /// Flags the package for recooking and drops the cached dependency set.
    pub fn mark_dirty(&mut self) {
        self.needs_recook = true;
        self.cached_dependencies = None;
    }

    pub fn contains_asset(&mut self, store: &mut ResourceStore, id: AssetId) -> bool {
        if self.cached_dependencies.is_none() {
            self.update_dependency_cache(store);
        }
        self.cached_dependencies
            .as_ref()
            .is_some_and(|deps| deps.contains(&id))
    }

    pub fn update_dependency_cache(&mut self, store: &mut ResourceStore) {
        let list = PackageDependencyListBuilder::new(store)
            .build(self.resources.iter().map(|res| res.id));
        self.cached_dependencies = Some(list.into_iter().collect());
    }

    // ---- Definition persistence ----------------------------------------

    pub fn save_definition(&self, path: &Path) -> anyhow::Result<()> {
        let out = BinWriter::big_endian(Cursor::new(Vec::new()));
        let mut archive = TaggedWriter::new(out, DEFINITION_MAGIC, DEFINITION_VERSION)?;

        archive.begin_param(PARAM_NEEDS_RECOOK)?;
        archive.inner().write_bool(self.needs_recook)?;
        archive.end_param()?;

        archive.begin_param(PARAM_RESOURCES)?;
        archive.inner().write_u32(self.resources.len() as u32)?;
        for res in &self.resources {
            archive.inner().write_fourcc(res.resource_type.fourcc())?;
            write_id(archive.inner(), res.id)?;
            archive.inner().write_sized_string(&res.name)?;
        }
        archive.end_param()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, archive.finish()?.into_inner())?;
        Ok(())
    }

    pub fn load_definition(name: impl Into<String>, path: &Path) -> anyhow::Result<Package> {
        let bytes = std::fs::read(path)?;
        let rdr = BinReader::big_endian(Cursor::new(bytes));
        let mut archive = TaggedReader::new(rdr, DEFINITION_MAGIC)?;

        let mut package = Package::new(name);

        if archive.find_param(PARAM_NEEDS_RECOOK)? {
            package.needs_recook = archive.inner().read_bool()?;
            archive.end_param()?;
        }

        if archive.find_param(PARAM_RESOURCES)? {
            let count = archive.inner().read_u32()?;
            for _ in 0..count {
                let type_code = archive.inner().read_fourcc()?;
                let resource_type = ResourceType::from_fourcc(type_code).ok_or_else(|| {
                    anyhow::anyhow!("package definition names unknown resource type {type_code}")
                })?;
                let id = read_id(archive.inner())?;
                let res_name = archive.inner().read_sized_string()?;
                package.resources.push(NamedResource { name: res_name, id, resource_type });
            }
            archive.end_param()?;
        }

        Ok(package)
    }

    // ---- Cooking --------------------------------------------------------

    /// Cooks the package to `pak_path`. Returns false when the progress
    /// notifier cancelled the cook; in that case (and on any error) the
    /// partial output file is deleted and the recook flag stays set.
    pub fn cook(
        &mut self,
        store: &mut ResourceStore,
        pak_path: &Path,
        progress: &mut dyn ProgressNotifier,
    ) -> anyhow::Result<bool> {
        progress.report(-1, -1, "Building dependency list");
        let asset_list = PackageDependencyListBuilder::new(store)
            .build(self.resources.iter().map(|res| res.id));
        debug!("{} assets in {}.pak", asset_list.len(), self.name);

        if let Some(parent) = pak_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(pak_path)?;
        let mut pak = BinWriter::big_endian(file);

        let outcome = write_pak(&mut pak, store, &self.resources, &asset_list, progress);
        drop(pak);

        match outcome {
            Ok(true) => {
                self.needs_recook = false;
                store.conditional_save_cache()?;
                info!("Finished writing {}", pak_path.display());
                Ok(true)
            }
            Ok(false) => {
                std::fs::remove_file(pak_path)?;
                self.needs_recook = true;
                warn!("Cook of {}.pak cancelled; partial output deleted", self.name);
                Ok(false)
            }
            Err(err) => {
                let _ = std::fs::remove_file(pak_path);
                self.needs_recook = true;
                Err(err)
            }
        }
    }
}

struct ResourceTableInfo {
    id: AssetId,
    type_code: FourCC,
    offset: u32,
    size: u32,
    compressed: bool,
}

/// Writes the pak body: header, named resources, junk resource table,
/// payloads, then the patched table. Returns false on cancellation.
fn write_pak<W: std::io::Write + std::io::Seek>(
    pak: &mut BinWriter<W>,
    store: &mut ResourceStore,
    named: &[NamedResource],
    asset_list: &[AssetId],
    progress: &mut dyn ProgressNotifier,
) -> anyhow::Result<bool> {
    let game = store.game();
    let alignment = u64::from(game.pak_alignment());

    let mut toc_offset = 0u64;
    let mut names_size = 0u32;

    if game <= Game::CorruptionProto {
        // Fixed header with the named-resource table inline.
        pak.write_u32(0x00030005)?;
        pak.write_u32(0)?;

        pak.write_u32(named.len() as u32)?;
        for res in named {
            pak.write_fourcc(res.resource_type.fourcc())?;
            res.id.write(pak)?;
            pak.write_sized_string(&res.name)?;
        }
    } else {
        // TOC-prefixed layout with named STRG/RSHD/DATA sections.
        pak.write_u32(2)?;
        pak.write_u32(0x40)?;
        // The MD5 slot; the game never checks it.
        pak.write_to_boundary(0x40, 0)?;

        toc_offset = pak.tell()?;
        pak.write_u32(0)?;
        pak.write_to_boundary(0x40, 0)?;

        let names_start = pak.tell()?;
        pak.write_u32(named.len() as u32)?;
        for res in named {
            pak.write_cstring(&res.name)?;
            pak.write_fourcc(res.resource_type.fourcc())?;
            res.id.write(pak)?;
        }
        pak.write_to_boundary(0x40, 0)?;
        names_size = (pak.tell()? - names_start) as u32;
    }

    // Resource table, junk-filled; patched once offsets and sizes are known.
    let table_offset = pak.tell()?;
    pak.write_u32(asset_list.len() as u32)?;
    let dummy = AssetId::invalid(game.id_width());
    for _ in asset_list {
        pak.write_u64(0)?;
        dummy.write(pak)?;
        pak.write_u64(0)?;
    }
    pak.write_to_boundary(alignment, 0)?;
    let table_size = (pak.tell()? - table_offset) as u32;

    let data_offset = pak.tell()?;
    let mut table = Vec::with_capacity(asset_list.len());

    for (index, id) in asset_list.iter().enumerate() {
        if progress.should_cancel() {
            break;
        }

        let asset_offset = pak.tell()?;
        let Some(entry) = store.find_entry(*id) else {
            anyhow::bail!("asset {id} dropped out of the store during cook");
        };
        let resource_type = entry.resource_type();
        let cooked_path = entry.cooked_path(&store.resources_dir());
        let display_name = format!("{}.{}", entry.name(), resource_type.fourcc());

        if entry.needs_recook() {
            progress.report(index as i64, asset_list.len() as i64, &format!("Cooking asset: {display_name}"));
            store.cook_resource(*id)?;
        }

        if index & 1 != 0 || index == asset_list.len() - 1 {
            progress.report(
                index as i64,
                asset_list.len() as i64,
                &format!("Writing asset {}/{}: {display_name}", index + 1, asset_list.len()),
            );
        }

        let data = std::fs::read(&cooked_path)
            .map_err(|err| anyhow::anyhow!("can't open cooked asset {}: {err}", cooked_path.display()))?;
        let uncompressed_size = data.len() as u32;

        let should_compress = resource_type.always_compressed(game)
            || (resource_type.conditionally_compressed()
                && uncompressed_size >= game.compression_threshold());

        let mut compressed = false;
        if should_compress {
            let compressed_data = compress(&data)?;
            let compressed_size = compressed_data.len() as u32;

            // The compressed form is only kept if it is smaller after the
            // size prefix and the alignment padding; the engines trust the
            // compressed flag to match what is actually stored.
            let header_size = if game <= Game::CorruptionProto { 4 } else { 0x10 };
            let padded_uncompressed = padded_size(uncompressed_size, game.pak_alignment());
            let padded_compressed =
                padded_size(compressed_size + header_size, game.pak_alignment());

            if padded_compressed < padded_uncompressed {
                if game <= Game::CorruptionProto {
                    pak.write_u32(uncompressed_size)?;
                } else {
                    // One CMPD block; the shipped paks sometimes split
                    // assets over several, but the games accept one.
                    pak.write_fourcc(fourcc!(b"CMPD"))?;
                    pak.write_u32(1)?;
                    pak.write_u32(0xA000_0000 | compressed_size)?;
                    pak.write_u32(uncompressed_size)?;
                }
                pak.write_bytes(&compressed_data)?;
                compressed = true;
            }
        }
        if !compressed {
            pak.write_bytes(&data)?;
        }

        pak.write_to_boundary(alignment, 0xFF)?;

        let offset = if game <= Game::Echoes {
            asset_offset
        } else {
            asset_offset - data_offset
        };
        table.push(ResourceTableInfo {
            id: *id,
            type_code: resource_type.fourcc(),
            offset: offset as u32,
            size: (pak.tell()? - asset_offset) as u32,
            compressed,
        });
    }
    let data_size = (pak.tell()? - data_offset) as u32;

    if progress.should_cancel() {
        return Ok(false);
    }

    if game >= Game::Corruption {
        pak.seek(toc_offset)?;
        pak.write_u32(3)?;
        pak.write_fourcc(fourcc!(b"STRG"))?;
        pak.write_u32(names_size)?;
        pak.write_fourcc(fourcc!(b"RSHD"))?;
        pak.write_u32(table_size)?;
        pak.write_fourcc(fourcc!(b"DATA"))?;
        pak.write_u32(data_size)?;
    }

    pak.seek(table_offset + 4)?;
    for info in &table {
        pak.write_u32(u32::from(info.compressed))?;
        pak.write_fourcc(info.type_code)?;
        info.id.write(pak)?;
        pak.write_u32(info.size)?;
        pak.write_u32(info.offset)?;
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_round_trip() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("Metroid1.pkd");

        let mut package = Package::new("Metroid1");
        package.add_resource("TestWorld", AssetId::new_32(0x1), ResourceType::World);
        package.add_resource("NoARAM", AssetId::new_32(0x2), ResourceType::AudioGroup);
        package.save_definition(&path)?;

        let loaded = Package::load_definition("Metroid1", &path)?;
        assert_eq!(loaded.named_resources(), package.named_resources());
        assert_eq!(loaded.needs_recook(), package.needs_recook());
        Ok(())
    }

    #[test]
    fn marking_dirty_invalidates_the_dependency_cache() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut store = ResourceStore::new(Game::Prime, dir.path());
        let id = AssetId::new_32(0x5);
        store
            .create_new_resource(id, ResourceType::Texture, "", "00000005", false)
            .unwrap();
        store.track_loaded_resource(
            id,
            pakforge_formats::resource::Resource::Opaque(Vec::new()),
        );

        let mut package = Package::new("test");
        assert!(!package.contains_asset(&mut store, id));

        package.add_resource("tex", id, ResourceType::Texture);
        assert!(package.contains_asset(&mut store, id));

        package.mark_dirty();
        assert!(package.needs_recook());
        assert!(package.contains_asset(&mut store, id));
        Ok(())
    }
}
