use std::path::PathBuf;

use clap::{Parser, Subcommand, value_parser};

use pakforge::project::Region;
use pakforge_formats::common::Game;

#[derive(Parser, Debug)]
#[command(name = "pakforge")]
#[command(version = concat!(env!("VERGEN_GIT_BRANCH"), "/",env!("VERGEN_GIT_SHA")))]
#[command(about = "Cooked asset database and pak packaging tool")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a project over an existing resources directory and scan it.
    Create {
        #[arg(long, env = "PAKFORGE_PROJECT_ROOT", default_value_t = default_project_root())]
        project_root: String,
        #[arg(long)]
        name: String,
        #[arg(long, value_parser = parse_game)]
        game: Game,
        #[arg(long, default_value = "ntsc", value_parser = value_parser!(Region))]
        region: Region,
        #[arg(long, default_value = "")]
        game_id: String,
        #[arg(long, default_value_t = 0.0)]
        build_version: f32,
    },
    /// Cook one package, or every package flagged for recooking.
    Cook {
        #[arg(long, env = "PAKFORGE_PROJECT")]
        project: PathBuf,
        package: Option<String>,
    },
    /// Rescan the resources directory and rewrite the database cache.
    Rescan {
        #[arg(long, env = "PAKFORGE_PROJECT")]
        project: PathBuf,
    },
    /// Print the dependency closure of one asset.
    Deps {
        #[arg(long, env = "PAKFORGE_PROJECT")]
        project: PathBuf,
        asset: String,
    },
    /// Print the project's world list in package order.
    Worlds {
        #[arg(long, env = "PAKFORGE_PROJECT")]
        project: PathBuf,
    },
}

pub fn default_project_root() -> String {
    std::env::current_dir()
        .expect("Can't read current working directory!")
        .to_string_lossy()
        .to_string()
}

fn parse_game(input: &str) -> Result<Game, String> {
    match input.to_ascii_lowercase().as_str() {
        "prime-demo" => Ok(Game::PrimeDemo),
        "prime" => Ok(Game::Prime),
        "echoes-demo" => Ok(Game::EchoesDemo),
        "echoes" => Ok(Game::Echoes),
        "corruption-proto" => Ok(Game::CorruptionProto),
        "corruption" => Ok(Game::Corruption),
        "dkc-returns" => Ok(Game::DkcReturns),
        other => Err(format!("unknown title '{other}'")),
    }
}
