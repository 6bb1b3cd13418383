use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};

use distro_state::advisor::{VersionAdvisor, resolve_version_keyword};
use distro_state::config::{self, ToolConfig};
use distro_state::diff::{ArtifactChanges, PlatformChange, PropertyChanges, UpgradeDifferential};
use distro_state::distro::{DistributionDoc, DistributionResolver, parse_distribution_ref};
use distro_state::logging;
use distro_state::model::artifact::ArtifactRef;
use distro_state::model::category::Category;
use distro_state::model::version::Version;
use distro_state::registries::{DirectoryFetcher, MavenRegistry};
use distro_state::registry::Registry;
use distro_state::server::InstalledState;

#[derive(Parser)]
#[command(name = "distro-state")]
#[command(version, about = "Inspect and diff OpenMRS distribution declarations")]
struct Cli {
    /// Also print log lines to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text, global = true)]
    format: Format,

    /// Config file (default: <data dir>/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Show what must change to move an installed server to a distribution
    Diff {
        /// Installed server properties file
        installed: PathBuf,
        /// Distribution properties file, or `group:artifact:version`
        distribution: String,
        /// Placeholder values, on top of the server's own properties
        #[arg(short = 'D', value_parser = parse_key_value)]
        define: Vec<(String, String)>,
    },

    /// Print the effective declarations of a distribution
    Resolve {
        /// Distribution properties file, or `group:artifact:version`
        distribution: String,
        /// Placeholder values
        #[arg(short = 'D', value_parser = parse_key_value)]
        define: Vec<(String, String)>,
    },

    /// Suggest versions of an artifact from the Maven repository
    Suggest {
        /// `group:artifact`
        artifact: String,
        /// Maximum number of suggestions
        #[arg(long)]
        max: Option<usize>,
        /// Resolve `LATEST` or `LATEST-SNAPSHOT` instead of listing
        #[arg(long)]
        keyword: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(config::config_path);
    let tool_config = ToolConfig::load(&config_path)?;
    let _guard = logging::init(&config::log_dir(), &tool_config.log.level, cli.verbose)?;
    debug!("Loaded config from {}", config_path.display());

    match cli.command {
        Command::Diff {
            installed,
            distribution,
            define,
        } => cmd_diff(&tool_config, &installed, &distribution, define, cli.format),
        Command::Resolve {
            distribution,
            define,
        } => cmd_resolve(&tool_config, &distribution, define, cli.format),
        Command::Suggest {
            artifact,
            max,
            keyword,
        } => tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?
            .block_on(cmd_suggest(&tool_config, &artifact, max, keyword, cli.format)),
    }
}

fn parse_key_value(arg: &str) -> Result<(String, String), String> {
    arg.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{arg}`"))
}

fn fetcher(tool_config: &ToolConfig) -> DirectoryFetcher {
    let directory = tool_config
        .distributions
        .directory
        .clone()
        .unwrap_or_else(|| config::data_dir().join("distributions"));
    DirectoryFetcher::new(directory)
}

/// Resolve a distribution given as a file path or as coordinates
fn load_distribution(tool_config: &ToolConfig, distribution: &str) -> Result<DistributionDoc> {
    let fetcher = fetcher(tool_config);
    let resolver = DistributionResolver::new(&fetcher);

    let path = Path::new(distribution);
    let resolved = if path.is_file() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let document = DistributionDoc::parse(&content)
            .with_context(|| format!("Invalid distribution {}", path.display()))?;
        resolver.resolve(&document)?
    } else {
        resolver.resolve_artifact(&parse_distribution_ref(distribution)?)?
    };

    for ancestor in resolved.ancestors() {
        if let Some(artifact) = &ancestor.artifact {
            info!("Inherits from {}", artifact);
        }
    }
    Ok(resolved.effective)
}

fn cmd_diff(
    tool_config: &ToolConfig,
    installed: &Path,
    distribution: &str,
    define: Vec<(String, String)>,
    format: Format,
) -> Result<()> {
    let content = std::fs::read_to_string(installed)
        .with_context(|| format!("Failed to read {}", installed.display()))?;
    let installed = InstalledState::parse(&content)
        .with_context(|| format!("Invalid server properties {}", installed.display()))?;

    let mut lookup = installed.placeholder_lookup();
    lookup.extend(define);
    let target = load_distribution(tool_config, distribution)?.resolve_placeholders(&lookup)?;

    let differential = UpgradeDifferential::compute(&installed, &target)?;
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&differential)?),
        Format::Text => print_differential(&differential),
    }
    Ok(())
}

fn cmd_resolve(
    tool_config: &ToolConfig,
    distribution: &str,
    define: Vec<(String, String)>,
    format: Format,
) -> Result<()> {
    let mut effective = load_distribution(tool_config, distribution)?;
    if !define.is_empty() {
        let lookup: HashMap<String, String> = define.into_iter().collect();
        effective = effective.resolve_placeholders(&lookup)?;
    }

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(effective.config().entries())?),
        Format::Text => print!("{}", effective.config().to_properties_string()),
    }
    Ok(())
}

async fn cmd_suggest(
    tool_config: &ToolConfig,
    artifact: &str,
    max: Option<usize>,
    keyword: Option<String>,
    format: Format,
) -> Result<()> {
    let Some((group_id, artifact_id)) = artifact.split_once(':') else {
        bail!("expected group:artifact, got `{artifact}`");
    };
    // Registry lookups only use the group and artifact ids
    let artifact = ArtifactRef::new(Category::Module, group_id, artifact_id, Version::parse("0")?);

    let registry = MavenRegistry::new(&tool_config.repository.url)?;
    let advisor = VersionAdvisor::new(max.unwrap_or(tool_config.advisor.max_suggestions));

    let versions: Vec<Version> = match keyword {
        Some(keyword) => {
            let published = registry.fetch_all_versions(&artifact).await?;
            vec![resolve_version_keyword(&keyword, &published)?]
        }
        None => advisor.suggest(&registry, &artifact).await?,
    };

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&versions)?),
        Format::Text => {
            for version in &versions {
                println!("{version}");
            }
        }
    }
    Ok(())
}

fn print_differential(differential: &UpgradeDifferential) {
    if !differential.has_changes() {
        println!("Up to date");
        return;
    }

    match &differential.platform {
        PlatformChange::Unchanged => {}
        PlatformChange::Added(to) => println!("platform\n  + {to}"),
        PlatformChange::Upgraded { from, to } => println!("platform\n  ^ {from} -> {}", to.version),
        PlatformChange::Downgraded { from, to } => println!("platform\n  v {from} -> {}", to.version),
    }

    print_artifact_changes("modules", &differential.modules);
    print_artifact_changes("owas", &differential.owas);
    print_artifact_changes("frontend", &differential.spa_artifacts);
    print_property_changes("frontend build", &differential.spa_build_properties);
    print_artifact_changes("config", &differential.config);
    print_artifact_changes("content", &differential.content);
}

fn print_artifact_changes(title: &str, changes: &ArtifactChanges) {
    if !changes.has_changes() {
        return;
    }
    println!("{title}");
    for artifact in &changes.added {
        println!("  + {artifact}");
    }
    for artifact in &changes.removed {
        println!("  - {artifact}");
    }
    for (from, to) in &changes.upgraded {
        println!("  ^ {from} -> {}", to.version);
    }
    for (from, to) in &changes.downgraded {
        println!("  v {from} -> {}", to.version);
    }
}

fn print_property_changes(title: &str, changes: &PropertyChanges) {
    if !changes.has_changes() {
        return;
    }
    println!("{title}");
    for (key, value) in &changes.added {
        println!("  + {key}={value}");
    }
    for key in changes.removed.keys() {
        println!("  - {key}");
    }
    for (key, value) in &changes.changed {
        println!("  ~ {key}={value}");
    }
}
