//! The resource database: every known asset keyed by ID, with lazily loaded
//! payloads, reference-counted eviction, a virtual directory tree and a
//! persisted cache file that makes full directory rescans unnecessary on
//! normal startup.

pub mod directory;
pub mod entry;

use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use pakforge_formats::common::{AssetId, BinReader, BinWriter, Game, IdWidth};
use pakforge_formats::res_type::ResourceType;
use pakforge_formats::resource::Resource;
use pakforge_formats::unsupported::AssetIdRegistry;
use pakforge_formats::world::cooker::cook_mlvl;
use pakforge_formats::{FormatError, audio, cinf, collision, cskr, dgrp, font, fourcc, frme, hint,
    map, strg, unsupported, world};

use crate::deps::StoreCookSupport;
pub use directory::VirtualDirectory;
pub use entry::ResourceEntry;

const DATABASE_MAGIC: pakforge_formats::common::FourCC = fourcc!(b"RSDB");

/// Cache file layout revision. Bump when the entry record changes; older
/// files are migrated by rewriting on the next save.
const DATABASE_VERSION_INITIAL: u32 = 0;
const DATABASE_VERSION_CURRENT: u32 = DATABASE_VERSION_INITIAL;

pub const DATABASE_CACHE_FILENAME: &str = "ResourceDatabaseCache.bin";

pub struct ResourceStore {
    game: Game,
    /// Root of the store on disk; the cooked files live under `Resources/`.
    database_root: PathBuf,
    entries: BTreeMap<AssetId, ResourceEntry>,
    /// IDs whose entry currently holds a live payload. Subset view of
    /// `entries`, never a source of truth.
    loaded: BTreeSet<AssetId>,
    root_directory: VirtualDirectory,
    cache_dirty: bool,
}

impl ResourceStore {
    pub fn new(game: Game, database_root: impl Into<PathBuf>) -> Self {
        ResourceStore {
            game,
            database_root: database_root.into(),
            entries: BTreeMap::new(),
            loaded: BTreeSet::new(),
            root_directory: VirtualDirectory::default(),
            cache_dirty: false,
        }
    }

    pub fn game(&self) -> Game {
        self.game
    }

    pub fn database_root(&self) -> &Path {
        &self.database_root
    }

    pub fn resources_dir(&self) -> PathBuf {
        self.database_root.join("Resources")
    }

    pub fn database_cache_path(&self) -> PathBuf {
        self.database_root.join(DATABASE_CACHE_FILENAME)
    }

    pub fn root_directory(&self) -> &VirtualDirectory {
        &self.root_directory
    }

    pub fn is_cache_dirty(&self) -> bool {
        self.cache_dirty
    }

    pub fn set_cache_dirty(&mut self) {
        self.cache_dirty = true;
    }

    pub fn num_total_resources(&self) -> usize {
        self.entries.len()
    }

    pub fn num_loaded_resources(&self) -> usize {
        self.loaded.len()
    }

    // ---- Entry management ----------------------------------------------

    pub fn is_registered(&self, id: AssetId) -> bool {
        self.entries
            .get(&id)
            .is_some_and(|entry| !entry.is_marked_for_deletion())
    }

    /// O(log n) map lookup; an unknown ID is `None`, never an error.
    pub fn find_entry(&self, id: AssetId) -> Option<&ResourceEntry> {
        self.entries
            .get(&id)
            .filter(|entry| !entry.is_marked_for_deletion())
    }

    pub fn find_entry_mut(&mut self, id: AssetId) -> Option<&mut ResourceEntry> {
        self.entries
            .get_mut(&id)
            .filter(|entry| !entry.is_marked_for_deletion())
    }

    /// Linear scan by virtual path, for name-based lookups from the driver.
    pub fn find_entry_by_path(&self, path: &str) -> Option<&ResourceEntry> {
        self.all_entries().find(|entry| entry.virtual_path() == path)
    }

    /// Registers a new asset. Fails when the ID is already taken, unless the
    /// caller marks it as a re-registration of an existing resource.
    pub fn create_new_resource(
        &mut self,
        id: AssetId,
        resource_type: ResourceType,
        directory: &str,
        name: &str,
        existing: bool,
    ) -> Option<&mut ResourceEntry> {
        if let Some(entry) = self.entries.get(&id) {
            if !existing {
                error!(
                    "Couldn't create new resource {id}; already registered as {}",
                    entry.virtual_path()
                );
                return None;
            }
            self.root_directory.unregister(entry.directory(), id);
        }

        let entry = ResourceEntry::new(id, resource_type, directory, name);
        self.root_directory.register(entry.directory(), id);
        self.entries.insert(id, entry);
        self.cache_dirty = true;
        self.entries.get_mut(&id)
    }

    /// Marks an entry for deletion. Physical removal is deferred to the next
    /// eviction sweep so that iterators and in-flight holders stay valid.
    pub fn delete_resource_entry(&mut self, id: AssetId) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.mark_for_deletion();
                self.cache_dirty = true;
                true
            }
            None => false,
        }
    }

    /// Live view over all entries not marked for deletion.
    pub fn all_entries(&self) -> impl Iterator<Item = &ResourceEntry> {
        self.entries
            .values()
            .filter(|entry| !entry.is_marked_for_deletion())
    }

    pub fn typed_entries(
        &self,
        resource_type: ResourceType,
    ) -> impl Iterator<Item = &ResourceEntry> {
        self.all_entries()
            .filter(move |entry| entry.resource_type() == resource_type)
    }

    // ---- Payload loading and eviction ----------------------------------

    /// Returns the live payload, parsing the cooked file on first access.
    /// At most one live payload exists per ID; repeated calls return the
    /// cached object. Bad payloads come back as `None` with the failure
    /// logged by the loader.
    pub fn load_resource(&mut self, id: AssetId) -> Option<&Resource> {
        let Some(entry) = self.entries.get(&id).filter(|e| !e.is_marked_for_deletion()) else {
            warn!("Can't load unregistered asset {id}");
            return None;
        };

        if entry.payload().is_none() {
            let path = entry.cooked_path(&self.resources_dir());
            let resource_type = entry.resource_type();

            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(err) => {
                    error!("Failed to open cooked asset {}: {err}", path.display());
                    return None;
                }
            };

            let payload = self.parse_payload(resource_type, bytes)?;
            self.track_loaded_resource(id, payload);
        }

        self.entries.get(&id).and_then(ResourceEntry::payload)
    }

    /// Installs a payload for an entry and records it in the loaded-resource
    /// view. Exposed so that freshly created assets can be populated without
    /// a cooked file on disk.
    pub fn track_loaded_resource(&mut self, id: AssetId, payload: Resource) -> bool {
        let Some(entry) = self.entries.get_mut(&id) else {
            debug_assert!(false, "tracking a payload for an unregistered asset");
            return false;
        };

        let summary = payload.dependencies();
        entry.set_payload(payload);
        entry.set_dependency_summary(summary);
        self.loaded.insert(id);
        self.cache_dirty = true;
        true
    }

    pub fn add_ref(&mut self, id: AssetId) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.add_ref();
        }
    }

    pub fn release_ref(&mut self, id: AssetId) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.release_ref();
        }
    }

    /// Sweep pass: drops payloads with no external holders, then finishes
    /// deferred entry deletions. A sweep rather than immediate destruction
    /// tolerates transient zero-count windows during graph rebuilding.
    pub fn destroy_unreferenced_resources(&mut self) {
        let mut evicted = Vec::new();
        for id in &self.loaded {
            if let Some(entry) = self.entries.get(id) {
                if entry.ref_count() == 0 {
                    evicted.push(*id);
                }
            }
        }

        for id in evicted {
            if let Some(entry) = self.entries.get_mut(&id) {
                entry.drop_payload();
            }
            self.loaded.remove(&id);
        }

        let deleted: Vec<AssetId> = self
            .entries
            .values()
            .filter(|entry| {
                entry.is_marked_for_deletion() && entry.ref_count() == 0 && entry.payload().is_none()
            })
            .map(ResourceEntry::id)
            .collect();

        for id in deleted {
            if let Some(entry) = self.entries.remove(&id) {
                self.root_directory.unregister(entry.directory(), id);
                debug!("Deleted resource entry {id} ({})", entry.virtual_path());
            }
        }
        self.root_directory.prune_empty(true);
    }

    fn parse_payload(&self, resource_type: ResourceType, bytes: Vec<u8>) -> Option<Resource> {
        let game = self.game;
        let mut rdr = BinReader::big_endian(Cursor::new(bytes));

        let result: Result<Resource, FormatError> = match resource_type {
            ResourceType::World => world::reader::load_mlvl(&mut rdr).map(Resource::World),
            ResourceType::StringTable => {
                strg::reader::load_strg(&mut rdr).map(Resource::StringTable)
            }
            ResourceType::Animation => {
                pakforge_formats::anim::reader::load_anim(&mut rdr, Some(game))
                    .map(Resource::Animation)
            }
            ResourceType::Skeleton => {
                cinf::reader::load_cinf(&mut rdr, Some(game)).map(Resource::Skeleton)
            }
            ResourceType::Skin => cskr::load_cskr(&mut rdr).map(Resource::Skin),
            ResourceType::DynamicCollision => {
                collision::reader::load_dcln(&mut rdr).map(Resource::Collision)
            }
            ResourceType::Font => font::load_font(&mut rdr).map(Resource::Font),
            ResourceType::AudioGroup => audio::load_agsc(&mut rdr).map(Resource::AudioGroup),
            ResourceType::AudioLookupTable => {
                audio::load_atbl(&mut rdr).map(Resource::AudioLookupTable)
            }
            ResourceType::StringList => audio::load_stlc(&mut rdr).map(Resource::StringList),
            ResourceType::DependencyGroup => {
                dgrp::load_dgrp(&mut rdr).map(Resource::DependencyGroup)
            }
            ResourceType::MapWorld => map::load_mapw(&mut rdr).map(Resource::DependencyGroup),
            ResourceType::MapUniverse => map::load_mapu(&mut rdr).map(Resource::DependencyGroup),
            ResourceType::GuiFrame => frme::load_frme(&mut rdr).map(Resource::DependencyGroup),
            ResourceType::HintSystem => hint::load_hint(&mut rdr).map(Resource::DependencyGroup),
            ResourceType::AudioMacro => {
                unsupported::load_caud(&mut rdr, self).map(Resource::AudioMacro)
            }
            ResourceType::MidiData => {
                unsupported::load_csng(&mut rdr).map(Resource::DependencyGroup)
            }
            ResourceType::BinaryData => {
                unsupported::load_dumb(&mut rdr, game, self).map(Resource::DependencyGroup)
            }
            ResourceType::StateMachine => {
                unsupported::load_fsm2(&mut rdr, game).map(Resource::DependencyGroup)
            }
            ResourceType::StateMachine2 => {
                unsupported::load_fsmc(&mut rdr, game, self).map(Resource::DependencyGroup)
            }
            ResourceType::RuleSet => {
                unsupported::load_rule(&mut rdr).map(Resource::DependencyGroup)
            }
            // Everything else is carried as an opaque byte payload.
            _ => Ok(Resource::Opaque(rdr.into_inner().into_inner())),
        };

        match result {
            Ok(resource) => Some(resource),
            Err(err) => {
                error!("Failed to load {resource_type} asset: {err}");
                None
            }
        }
    }

    /// Direct references of an asset, from the live payload when one exists
    /// and from the persisted summary otherwise. Loads the payload on demand
    /// when there is no summary yet.
    pub fn entry_dependencies(&mut self, id: AssetId) -> Vec<AssetId> {
        let Some(entry) = self.find_entry(id) else {
            return Vec::new();
        };

        if let Some(payload) = entry.payload() {
            return payload.dependencies();
        }
        if !entry.dependency_summary().is_empty() {
            return entry.dependency_summary().to_vec();
        }

        match self.load_resource(id) {
            Some(payload) => payload.dependencies(),
            None => Vec::new(),
        }
    }

    // ---- Cooking --------------------------------------------------------

    /// Re-cooks an asset's on-disk file from its loaded payload and clears
    /// the recook flag. Types without a cooker keep their existing cooked
    /// file as-is.
    pub fn cook_resource(&mut self, id: AssetId) -> anyhow::Result<()> {
        let Some(entry) = self.find_entry(id) else {
            anyhow::bail!("can't cook unregistered asset {id}");
        };
        let resource_type = entry.resource_type();
        let path = entry.cooked_path(&self.resources_dir());

        let cooked: Option<Vec<u8>> = match resource_type {
            ResourceType::World => {
                let world = match self.load_resource(id) {
                    Some(Resource::World(world)) => world.clone(),
                    _ => anyhow::bail!("world asset {id} has no loadable payload"),
                };

                let mut bytes = Vec::new();
                {
                    let mut out = BinWriter::big_endian(Cursor::new(&mut bytes));
                    let mut support = StoreCookSupport::new(self);
                    cook_mlvl(&world, &mut out, &mut support)?;
                }
                Some(bytes)
            }
            ResourceType::StringTable => {
                let table = match self.load_resource(id) {
                    Some(Resource::StringTable(table)) => table.clone(),
                    _ => anyhow::bail!("string table asset {id} has no loadable payload"),
                };

                let mut bytes = Vec::new();
                strg::cooker::cook_strg(&table, &mut BinWriter::big_endian(Cursor::new(&mut bytes)))?;
                Some(bytes)
            }
            ResourceType::DependencyGroup => {
                let group = match self.load_resource(id) {
                    Some(Resource::DependencyGroup(group)) => group.clone(),
                    _ => anyhow::bail!("dependency group asset {id} has no loadable payload"),
                };

                // The cooked layout stores each dependency's type, which the
                // in-memory group does not carry.
                let mut typed = Vec::with_capacity(group.dependencies.len());
                for dep in &group.dependencies {
                    match self.find_entry(*dep) {
                        Some(dep_entry) => typed.push((dep_entry.resource_type().fourcc(), *dep)),
                        None => {
                            debug_assert!(false, "dependency group references unregistered asset");
                            error!("Dropping unregistered dependency {dep} from group {id}");
                        }
                    }
                }

                let mut bytes = Vec::new();
                dgrp::cook_dgrp(&typed, &mut BinWriter::big_endian(Cursor::new(&mut bytes)))?;
                Some(bytes)
            }
            _ => {
                debug!("No cooker for {resource_type}; keeping cooked file for {id}");
                None
            }
        };

        if let Some(bytes) = cooked {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, bytes)?;
        }

        if let Some(entry) = self.find_entry_mut(id) {
            entry.set_needs_recook(false);
        }
        self.cache_dirty = true;
        Ok(())
    }

    // ---- Database cache -------------------------------------------------

    pub fn conditional_save_cache(&mut self) -> anyhow::Result<()> {
        if self.cache_dirty {
            self.save_database_cache()?;
        }
        Ok(())
    }

    /// Persists the whole entry table so startup can skip the directory
    /// rescan. Payloads are not part of the cache, dependency summaries are.
    pub fn save_database_cache(&mut self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.database_root)?;

        let mut out = BinWriter::big_endian(Cursor::new(Vec::new()));
        out.write_fourcc(DATABASE_MAGIC)?;
        out.write_u32(DATABASE_VERSION_CURRENT)?;
        out.write_u32(game_to_u32(self.game))?;

        let entries: Vec<&ResourceEntry> = self.all_entries().collect();
        out.write_u32(entries.len() as u32)?;

        for entry in entries {
            write_id(&mut out, entry.id())?;
            out.write_fourcc(entry.resource_type().fourcc())?;
            out.write_sized_string(entry.directory())?;
            out.write_sized_string(entry.name())?;
            out.write_bool(entry.needs_recook())?;

            out.write_u32(entry.dependency_summary().len() as u32)?;
            for dep in entry.dependency_summary() {
                write_id(&mut out, *dep)?;
            }
        }

        std::fs::write(self.database_cache_path(), out.into_inner().into_inner())?;
        self.cache_dirty = false;
        Ok(())
    }

    /// Restores the entry table from the cache file. A version behind the
    /// current one is accepted and migrated by marking the cache dirty, so
    /// the next save rewrites it in the current layout.
    pub fn load_database_cache(&mut self) -> anyhow::Result<()> {
        let bytes = std::fs::read(self.database_cache_path())?;
        let mut rdr = BinReader::big_endian(Cursor::new(bytes));

        let magic = rdr.read_fourcc()?;
        if magic != DATABASE_MAGIC {
            anyhow::bail!("not a resource database cache (magic {magic})");
        }

        let version = rdr.read_u32()?;
        if version > DATABASE_VERSION_CURRENT {
            anyhow::bail!("database cache version {version} is newer than this build supports");
        }

        let game = game_from_u32(rdr.read_u32()?)
            .ok_or_else(|| anyhow::anyhow!("database cache names an unknown title"))?;
        if game != self.game {
            anyhow::bail!("database cache was built for a different title");
        }

        self.entries.clear();
        self.loaded.clear();
        self.root_directory.clear();

        let count = rdr.read_u32()?;
        for _ in 0..count {
            let id = read_id(&mut rdr)?;
            let fourcc = rdr.read_fourcc()?;
            let resource_type = ResourceType::from_fourcc(fourcc)
                .ok_or_else(|| anyhow::anyhow!("unknown resource type {fourcc} in cache"))?;
            let directory = rdr.read_sized_string()?;
            let name = rdr.read_sized_string()?;
            let needs_recook = rdr.read_bool()?;

            let num_deps = rdr.read_u32()?;
            let mut summary = Vec::with_capacity(num_deps as usize);
            for _ in 0..num_deps {
                summary.push(read_id(&mut rdr)?);
            }

            let mut entry = ResourceEntry::new(id, resource_type, &directory, &name);
            entry.set_needs_recook(needs_recook);
            entry.set_dependency_summary(summary);
            self.root_directory.register(entry.directory(), id);
            self.entries.insert(id, entry);
        }

        self.cache_dirty = version < DATABASE_VERSION_CURRENT;
        info!("Loaded database cache with {count} entries");
        Ok(())
    }

    // ---- Directory scan -------------------------------------------------

    /// Authoritative slow path: walks the resources directory and registers
    /// every cooked file whose name parses as an asset ID. Used for recovery
    /// when the cache file is missing or corrupt.
    pub fn build_from_directory(&mut self, generate_cache: bool) -> anyhow::Result<usize> {
        let resources_dir = self.resources_dir();
        let mut discovered = 0usize;

        if resources_dir.is_dir() {
            self.scan_directory(&resources_dir, "", &mut discovered)?;
        }

        info!("Discovered {discovered} cooked assets under {}", resources_dir.display());
        if generate_cache {
            self.save_database_cache()?;
        }
        Ok(discovered)
    }

    pub fn rebuild_from_directory(&mut self) -> anyhow::Result<usize> {
        self.entries.clear();
        self.loaded.clear();
        self.root_directory.clear();
        self.cache_dirty = true;
        self.build_from_directory(true)
    }

    fn scan_directory(
        &mut self,
        dir: &Path,
        virtual_path: &str,
        discovered: &mut usize,
    ) -> anyhow::Result<()> {
        for dir_entry in std::fs::read_dir(dir)? {
            let dir_entry = dir_entry?;
            let path = dir_entry.path();
            let file_name = dir_entry.file_name().to_string_lossy().into_owned();

            if path.is_dir() {
                let child_path = if virtual_path.is_empty() {
                    file_name
                } else {
                    format!("{virtual_path}/{file_name}")
                };
                self.scan_directory(&path, &child_path, discovered)?;
                continue;
            }

            let Some((stem, extension)) = file_name.rsplit_once('.') else {
                continue;
            };
            let Some(resource_type) = (extension.len() == 4)
                .then(|| ResourceType::from_fourcc(fourcc_from_str(extension)))
                .flatten()
            else {
                debug!("Skipping non-asset file {}", path.display());
                continue;
            };
            let Some(id) = AssetId::from_hex(stem) else {
                debug!("Skipping asset file without an ID name: {}", path.display());
                continue;
            };

            if self
                .create_new_resource(id, resource_type, virtual_path, stem, true)
                .is_some()
            {
                *discovered += 1;
            }
        }
        Ok(())
    }

    /// Map areas carry no name of their own; the name is derived from the
    /// map world that references them plus the area's index within it.
    pub fn resolve_map_area_name(&mut self, mapa: AssetId) -> Option<String> {
        let worlds: Vec<(AssetId, String)> = self
            .typed_entries(ResourceType::MapWorld)
            .map(|entry| (entry.id(), entry.name().to_string()))
            .collect();

        for (world_id, world_name) in worlds {
            if let Some(Resource::DependencyGroup(group)) = self.load_resource(world_id) {
                if let Some(index) = group.dependencies.iter().position(|dep| *dep == mapa) {
                    return Some(format!("{world_name}_{index}"));
                }
            }
        }
        None
    }
}

impl AssetIdRegistry for ResourceStore {
    fn is_registered(&self, id: AssetId) -> bool {
        ResourceStore::is_registered(self, id)
    }
}

fn fourcc_from_str(text: &str) -> pakforge_formats::common::FourCC {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&text.as_bytes()[..4]);
    pakforge_formats::common::FourCC(bytes)
}

pub(crate) fn game_to_u32(game: Game) -> u32 {
    match game {
        Game::PrimeDemo => 0,
        Game::Prime => 1,
        Game::EchoesDemo => 2,
        Game::Echoes => 3,
        Game::CorruptionProto => 4,
        Game::Corruption => 5,
        Game::DkcReturns => 6,
    }
}

pub(crate) fn game_from_u32(value: u32) -> Option<Game> {
    Some(match value {
        0 => Game::PrimeDemo,
        1 => Game::Prime,
        2 => Game::EchoesDemo,
        3 => Game::Echoes,
        4 => Game::CorruptionProto,
        5 => Game::Corruption,
        6 => Game::DkcReturns,
        _ => return None,
    })
}

/// IDs in the cache and the definition files are width-prefixed; a store may
/// track assets of both widths while a project is being converted between
/// titles.
pub(crate) fn write_id<W: std::io::Write + std::io::Seek>(
    out: &mut BinWriter<W>,
    id: AssetId,
) -> Result<(), FormatError> {
    match id.width() {
        IdWidth::K32 => out.write_u8(4)?,
        IdWidth::K64 => out.write_u8(8)?,
    }
    id.write(out)
}

pub(crate) fn read_id<R: std::io::Read + std::io::Seek>(
    rdr: &mut BinReader<R>,
) -> Result<AssetId, FormatError> {
    let width = match rdr.read_u8()? {
        4 => IdWidth::K32,
        8 => IdWidth::K64,
        _ => return Err(FormatError::Malformed { reason: "bad ID width in database cache" }),
    };
    AssetId::parse(rdr, width)
}
