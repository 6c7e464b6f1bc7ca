use clap::Parser;

use pakforge::deps::PackageDependencyListBuilder;
use pakforge::progress::ProgressNotifier;
use pakforge::project::GameProject;
use pakforge_formats::common::AssetId;

use crate::settings::{CliArgs, Command};

mod settings;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = CliArgs::parse();
    log::trace!("Starting with args: {:?}", args);

    match args.command {
        Command::Create {
            project_root,
            name,
            game,
            region,
            game_id,
            build_version,
        } => {
            let mut project =
                GameProject::create(name, game, region, game_id, build_version, project_root);
            let discovered = project.store_mut().build_from_directory(true)?;
            project.save()?;
            log::info!(
                "Created {} with {discovered} resources",
                project.project_path().display()
            );
        }
        Command::Cook { project, package } => {
            let mut project = GameProject::load(&project)?;
            let mut progress = LogProgressNotifier;

            let targets: Vec<String> = match package {
                Some(name) => vec![name],
                None => project
                    .packages()
                    .iter()
                    .filter(|package| package.needs_recook())
                    .map(|package| package.name().to_string())
                    .collect(),
            };
            if targets.is_empty() {
                log::info!("Every package is up to date");
            }
            for name in targets {
                project.cook_package(&name, &mut progress)?;
            }
            project.save()?;
        }
        Command::Rescan { project } => {
            let mut project = GameProject::load(&project)?;
            let discovered = project.store_mut().rebuild_from_directory()?;
            log::info!("Rescan registered {discovered} resources");
        }
        Command::Deps { project, asset } => {
            let mut project = GameProject::load(&project)?;
            let id = AssetId::from_hex(&asset)
                .ok_or_else(|| anyhow::anyhow!("'{asset}' is not an 8 or 16 digit hex ID"))?;

            let closure = PackageDependencyListBuilder::new(project.store_mut()).build([id]);
            for dep in closure {
                match project.store().find_entry(dep) {
                    Some(entry) => println!("{dep}  {}", entry.virtual_path()),
                    None => println!("{dep}"),
                }
            }
        }
        Command::Worlds { project } => {
            let project = GameProject::load(&project)?;
            for world in project.world_list() {
                match project.store().find_entry(world) {
                    Some(entry) => println!("{world}  {}", entry.virtual_path()),
                    None => println!("{world}"),
                }
            }
        }
    }

    Ok(())
}

/// Forwards cook progress to the log; never cancels.
struct LogProgressNotifier;

impl ProgressNotifier for LogProgressNotifier {
    fn set_task(&mut self, _task_index: u32, description: &str) {
        log::info!("{description}");
    }

    fn report(&mut self, current: i64, max: i64, description: &str) {
        if current >= 0 && max > 0 {
            log::info!("[{current}/{max}] {description}");
        } else {
            log::info!("{description}");
        }
    }

    fn should_cancel(&self) -> bool {
        false
    }
}
