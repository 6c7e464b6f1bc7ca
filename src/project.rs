//! Project model: one resource store plus an ordered package list and the
//! per-title metadata, persisted as a versioned tagged archive next to the
//! store's database cache.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use itertools::Itertools;
use log::warn;

use pakforge_formats::common::archive::{TaggedReader, TaggedWriter};
use pakforge_formats::common::{AssetId, BinReader, BinWriter, FourCC, Game};
use pakforge_formats::fourcc;
use pakforge_formats::res_type::ResourceType;

use crate::package::Package;
use crate::progress::ProgressNotifier;
use crate::store::{ResourceStore, game_from_u32, game_to_u32};

const PROJECT_MAGIC: FourCC = fourcc!(b"PROJ");
const PROJECT_VERSION: u32 = 1;

const PARAM_NAME: u32 = 0x10;
const PARAM_GAME: u32 = 0x11;
const PARAM_REGION: u32 = 0x12;
const PARAM_GAME_ID: u32 = 0x13;
const PARAM_BUILD_VERSION: u32 = 0x14;
const PARAM_PACKAGES: u32 = 0x20;

pub const PROJECT_FILE_EXTENSION: &str = "prj";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Region {
    Ntsc,
    Pal,
    Japan,
}

impl Region {
    fn to_u8(self) -> u8 {
        match self {
            Region::Ntsc => 0,
            Region::Pal => 1,
            Region::Japan => 2,
        }
    }

    fn from_u8(value: u8) -> Option<Region> {
        Some(match value {
            0 => Region::Ntsc,
            1 => Region::Pal,
            2 => Region::Japan,
            _ => return None,
        })
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ntsc" => Ok(Region::Ntsc),
            "pal" => Ok(Region::Pal),
            "japan" | "jpn" => Ok(Region::Japan),
            other => Err(format!("unknown region '{other}'")),
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Region::Ntsc => "NTSC",
            Region::Pal => "PAL",
            Region::Japan => "Japan",
        };
        write!(f, "{label}")
    }
}

pub struct GameProject {
    name: String,
    region: Region,
    game_id: String,
    build_version: f32,
    project_root: PathBuf,
    store: ResourceStore,
    packages: Vec<Package>,
}

impl GameProject {
    pub fn create(
        name: impl Into<String>,
        game: Game,
        region: Region,
        game_id: impl Into<String>,
        build_version: f32,
        project_root: impl Into<PathBuf>,
    ) -> Self {
        let project_root = project_root.into();
        GameProject {
            name: name.into(),
            region,
            game_id: game_id.into(),
            build_version,
            store: ResourceStore::new(game, project_root.clone()),
            project_root,
            packages: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn game(&self) -> Game {
        self.store.game()
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    pub fn build_version(&self) -> f32 {
        self.build_version
    }

    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ResourceStore {
        &mut self.store
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn add_package(&mut self, package: Package) {
        self.packages.push(package);
    }

    pub fn find_package_mut(&mut self, name: &str) -> Option<&mut Package> {
        self.packages.iter_mut().find(|package| package.name() == name)
    }

    // ---- Paths ----------------------------------------------------------

    pub fn project_path(&self) -> PathBuf {
        self.project_root
            .join(format!("{}.{PROJECT_FILE_EXTENSION}", self.name))
    }

    pub fn packages_dir(&self) -> PathBuf {
        self.project_root.join("Packages")
    }

    pub fn disc_dir(&self) -> PathBuf {
        self.project_root.join("Disc")
    }

    pub fn definition_path(&self, package_name: &str) -> PathBuf {
        self.packages_dir().join(format!("{package_name}.pkd"))
    }

    pub fn cooked_pak_path(&self, package_name: &str) -> PathBuf {
        self.disc_dir().join(format!("{package_name}.pak"))
    }

    // ---- Persistence ----------------------------------------------------

    pub fn save(&mut self) -> anyhow::Result<()> {
        let out = BinWriter::big_endian(Cursor::new(Vec::new()));
        let mut archive = TaggedWriter::new(out, PROJECT_MAGIC, PROJECT_VERSION)?;

        archive.begin_param(PARAM_NAME)?;
        archive.inner().write_sized_string(&self.name)?;
        archive.end_param()?;

        archive.begin_param(PARAM_GAME)?;
        archive.inner().write_u32(game_to_u32(self.game()))?;
        archive.end_param()?;

        archive.begin_param(PARAM_REGION)?;
        archive.inner().write_u8(self.region.to_u8())?;
        archive.end_param()?;

        archive.begin_param(PARAM_GAME_ID)?;
        archive.inner().write_sized_string(&self.game_id)?;
        archive.end_param()?;

        archive.begin_param(PARAM_BUILD_VERSION)?;
        archive.inner().write_f32(self.build_version)?;
        archive.end_param()?;

        archive.begin_param(PARAM_PACKAGES)?;
        archive.inner().write_u32(self.packages.len() as u32)?;
        for package in &self.packages {
            archive.inner().write_sized_string(package.name())?;
        }
        archive.end_param()?;

        std::fs::create_dir_all(&self.project_root)?;
        std::fs::write(self.project_path(), archive.finish()?.into_inner())?;

        for package in &self.packages {
            let path = self.packages_dir().join(format!("{}.pkd", package.name()));
            package.save_definition(&path)?;
        }

        self.store.conditional_save_cache()?;
        Ok(())
    }

    pub fn load(project_path: &Path) -> anyhow::Result<GameProject> {
        let project_root = project_path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("project file has no parent directory"))?
            .to_path_buf();

        let bytes = std::fs::read(project_path)?;
        let rdr = BinReader::big_endian(Cursor::new(bytes));
        let mut archive = TaggedReader::new(rdr, PROJECT_MAGIC)?;
        if archive.version() > PROJECT_VERSION {
            anyhow::bail!(
                "project version {} is newer than this build supports",
                archive.version()
            );
        }

        let mut name = String::new();
        if archive.find_param(PARAM_NAME)? {
            name = archive.inner().read_sized_string()?;
            archive.end_param()?;
        }

        let mut game = Game::Prime;
        if archive.find_param(PARAM_GAME)? {
            let raw = archive.inner().read_u32()?;
            game = game_from_u32(raw)
                .ok_or_else(|| anyhow::anyhow!("project names an unknown title ({raw})"))?;
            archive.end_param()?;
        }

        let mut region = Region::Ntsc;
        if archive.find_param(PARAM_REGION)? {
            let raw = archive.inner().read_u8()?;
            region = Region::from_u8(raw)
                .ok_or_else(|| anyhow::anyhow!("project names an unknown region ({raw})"))?;
            archive.end_param()?;
        }

        let mut game_id = String::new();
        if archive.find_param(PARAM_GAME_ID)? {
            game_id = archive.inner().read_sized_string()?;
            archive.end_param()?;
        }

        let mut build_version = 0.0;
        if archive.find_param(PARAM_BUILD_VERSION)? {
            build_version = archive.inner().read_f32()?;
            archive.end_param()?;
        }

        let mut package_names = Vec::new();
        if archive.find_param(PARAM_PACKAGES)? {
            let count = archive.inner().read_u32()?;
            for _ in 0..count {
                package_names.push(archive.inner().read_sized_string()?);
            }
            archive.end_param()?;
        }

        let mut project = GameProject::create(name, game, region, game_id, build_version, project_root);

        if let Err(err) = project.store.load_database_cache() {
            warn!("Couldn't load the database cache ({err}); rescanning the resources directory");
            project.store.build_from_directory(true)?;
        }

        for package_name in package_names {
            let path = project.definition_path(&package_name);
            project.packages.push(Package::load_definition(package_name, &path)?);
        }

        Ok(project)
    }

    // ---- Queries --------------------------------------------------------

    /// World IDs across all packages, sorted per package by name. Some of
    /// the shipped paks list worlds out of order; the NODEPEND duplicates
    /// are skipped.
    pub fn world_list(&self) -> Vec<AssetId> {
        let mut out = Vec::new();
        for package in &self.packages {
            let worlds = package
                .named_resources()
                .iter()
                .filter(|res| {
                    res.resource_type == ResourceType::World && !res.name.ends_with("NODEPEND")
                })
                .sorted_by_key(|res| res.name.to_uppercase())
                .collect_vec();

            out.extend(worlds.into_iter().map(|res| res.id));
        }
        out
    }

    pub fn find_named_resource(&self, name: &str) -> Option<AssetId> {
        self.packages
            .iter()
            .flat_map(|package| package.named_resources())
            .find(|res| res.name == name)
            .map(|res| res.id)
    }

    /// Cooks one package to its disc path.
    pub fn cook_package(
        &mut self,
        package_name: &str,
        progress: &mut dyn ProgressNotifier,
    ) -> anyhow::Result<bool> {
        let pak_path = self.cooked_pak_path(package_name);
        let store = &mut self.store;
        let Some(package) = self
            .packages
            .iter_mut()
            .find(|package| package.name() == package_name)
        else {
            anyhow::bail!("no package named '{package_name}' in this project");
        };

        package.cook(store, &pak_path, progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_round_trips_through_its_definition_files() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;

        let mut project = GameProject::create(
            "Metroid2",
            Game::Echoes,
            Region::Pal,
            "G2ME01",
            0.0,
            dir.path(),
        );
        let mut package = Package::new("Metroid2");
        package.add_resource("FrontEnd", AssetId::new_32(0x10), ResourceType::World);
        project.add_package(package);
        project.save()?;

        let loaded = GameProject::load(&dir.path().join("Metroid2.prj"))?;
        assert_eq!(loaded.name(), "Metroid2");
        assert_eq!(loaded.game(), Game::Echoes);
        assert_eq!(loaded.region(), Region::Pal);
        assert_eq!(loaded.game_id(), "G2ME01");
        assert_eq!(loaded.packages().len(), 1);
        assert_eq!(loaded.find_named_resource("FrontEnd"), Some(AssetId::new_32(0x10)));
        Ok(())
    }

    #[test]
    fn world_list_sorts_per_package_and_skips_nodepend() {
        let mut project = GameProject::create(
            "sorted",
            Game::Prime,
            Region::Ntsc,
            "GM8E01",
            0.0,
            "unused",
        );

        let mut package = Package::new("Metroid1");
        package.add_resource("ZWorld", AssetId::new_32(0x3), ResourceType::World);
        package.add_resource("AWorld", AssetId::new_32(0x1), ResourceType::World);
        package.add_resource("AWorld_NODEPEND", AssetId::new_32(0x2), ResourceType::World);
        package.add_resource("Audio", AssetId::new_32(0x9), ResourceType::AudioGroup);
        project.add_package(package);

        assert_eq!(project.world_list(), vec![AssetId::new_32(0x1), AssetId::new_32(0x3)]);
    }
}
