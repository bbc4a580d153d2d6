mod cache;
mod config;
mod db;
mod logging;
mod posts;
mod render;
mod section;
mod site;
mod template;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::io::Write;
use std::path::PathBuf;

use cache::{FragmentStore, KeyRegistry, NoopStorage, OptionStore, SiteCache, SqliteStorage};
use config::Config;
use posts::{Network, QueryParams};
use render::{Renderer, TemplateSpec};
use section::SectionDisplay;
use template::Templates;

#[derive(Parser, Debug)]
#[command(name = "cpn")]
#[command(about = "Curated post sections for multisite networks, with fragment caching")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./cpn.yaml or $XDG_CONFIG_HOME/cpn/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Render the posts of a group/section to stdout
  Show {
    group: String,
    section: String,
    /// Template slug, resolved as <slug>[-<name>].hbs
    #[arg(short, long)]
    template: String,
    /// Optional template name suffix
    #[arg(short, long)]
    name: Option<String>,
    #[arg(long)]
    offset: Option<usize>,
    #[arg(long)]
    limit: Option<usize>,
    /// Extra KEY=VALUE parameters (part of the fragment key)
    #[arg(short, long = "param", value_parser = parse_param)]
    params: Vec<(String, String)>,
  },
  /// Flush cached output for a group/section
  Invalidate { group: String, section: String },
  /// List the fragment keys recorded for a group/section
  Keys { group: String, section: String },
  /// Print the URL of the site living at <site>.<network host>
  SiteUrl { site: String },
}

fn parse_param(s: &str) -> Result<(String, String), String> {
  s.split_once('=')
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))
}

fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let config = Config::load(args.config.as_deref())?;
  let _log_guard = logging::init(config.log_dir.as_deref())?;

  let network = Network::load(&config.network_file)?;

  if config.is_cache_active() {
    let db = db::Database::open(config.database.as_deref())?;
    let storage = SqliteStorage::new(db);
    run(&config, &network, &storage, args.command)
  } else {
    run(&config, &network, &NoopStorage, args.command)
  }
}

fn run<S>(config: &Config, network: &Network, storage: &S, command: Command) -> Result<()>
where
  S: OptionStore + FragmentStore + SiteCache,
{
  let stdout = std::io::stdout();
  let mut out = stdout.lock();

  match command {
    Command::Show {
      group,
      section,
      template,
      name,
      offset,
      limit,
      params,
    } => {
      let templates = Templates::new(config.templates.clone());
      let renderer = Renderer::new(network, &templates);
      let display = SectionDisplay {
        cache: config.cache.as_ref(),
        source: network,
        renderer: &renderer,
        storage,
      };

      let params = QueryParams {
        offset,
        limit,
        extra: params.into_iter().collect(),
      };
      let template = TemplateSpec::new(template, name);

      let outcome = display.show_posts_section(&group, &section, &template, &params, &mut out)?;
      writeln!(out).map_err(|e| eyre!("Failed to write output: {}", e))?;
      tracing::info!(group = %group, section = %section, outcome = ?outcome, "section shown");
    }
    Command::Invalidate { group, section } => {
      cache::invalidation::for_config(config.cache.as_ref(), storage).invalidate(&group, &section)?;
    }
    Command::Keys { group, section } => {
      for key in KeyRegistry::new(storage).get_keys(&group, &section) {
        writeln!(out, "{}", key).map_err(|e| eyre!("Failed to write output: {}", e))?;
      }
    }
    Command::SiteUrl { site } => {
      writeln!(out, "{}", network.site_url(&site, &config.network_url))
        .map_err(|e| eyre!("Failed to write output: {}", e))?;
    }
  }

  out
    .flush()
    .map_err(|e| eyre!("Failed to flush output: {}", e))
}
