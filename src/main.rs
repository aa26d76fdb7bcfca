use campushub::api::{ApiClient, CachedApi, ResourceQuery};
use campushub::app::App;
use campushub::cache::{CacheLayer, ResourceCache};
use campushub::config::Config;
use campushub::prefs::{Personalization, Preferences};
use campushub::storage::{LocalStorage, MemoryStorage, SqliteStorage};
use campushub::logging;
use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "campushub")]
#[command(about = "A terminal client for the campus community platform")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/campushub/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Browse the resource feed (default)
  Feed {
    /// Only show resources matching this text
    #[arg(short, long)]
    search: Option<String>,
  },
  /// Log in; the password is read from CAMPUSHUB_PASSWORD
  Login {
    #[arg(short, long)]
    email: String,
  },
  /// Forget the stored session
  Logout,
  /// Manage the response cache
  Cache {
    #[command(subcommand)]
    action: CacheAction,
  },
  /// Show or change the faculty/major the feed is filtered by
  Prefs {
    #[arg(long)]
    faculty: Option<String>,
    #[arg(long)]
    faculty_id: Option<i64>,
    #[arg(long)]
    major: Option<String>,
    #[arg(long)]
    major_id: Option<i64>,
  },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
  /// Drop every cached response
  Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let config = Config::load(args.config.as_deref())?;
  let _log_guard = logging::init()?;

  let storage: Arc<dyn LocalStorage> = Arc::new(SqliteStorage::open()?);
  let cache_storage: Arc<dyn LocalStorage> = if config.cache.persist {
    storage.clone()
  } else {
    Arc::new(MemoryStorage::new())
  };
  let cache = CacheLayer::new(Arc::new(ResourceCache::load(
    cache_storage,
    config.cache.ttl(),
  )?));
  let api = CachedApi::new(ApiClient::new(&config.api, storage.clone())?, cache);
  let prefs = Preferences::new(storage);

  let command = args.command.unwrap_or(Command::Feed { search: None });
  api
    .session(
      config.cache.clear_on_exit,
      run(command, &config, &api, &prefs),
    )
    .await
}

async fn run(command: Command, config: &Config, api: &CachedApi, prefs: &Preferences) -> Result<()> {
  match command {
    Command::Feed { search } => {
      let mut query = ResourceQuery::personalized(&prefs.personalization()?, config.feed.page_size);
      if let Some(search) = search {
        query = query.with_search(search);
      }

      let mut app = App::new(api.clone(), query);
      app.run().await?;
    }
    Command::Login { email } => {
      let password = Config::get_password()?;
      let user = api.client().login(&email, &password).await?;
      match user {
        Some(user) => println!("Logged in as {}", user.name),
        None => println!("Logged in as {}", email),
      }
    }
    Command::Logout => {
      api.logout()?;
      println!("Logged out");
    }
    Command::Cache {
      action: CacheAction::Clear,
    } => {
      api.cache().invalidate_all();
      println!("Cache cleared");
    }
    Command::Prefs {
      faculty,
      faculty_id,
      major,
      major_id,
    } => {
      let current = prefs.personalization()?;
      let updated = Personalization {
        faculty: faculty.or(current.faculty.clone()),
        faculty_id: faculty_id.or(current.faculty_id),
        major: major.or(current.major.clone()),
        major_id: major_id.or(current.major_id),
      };
      if updated != current {
        prefs.set_personalization(&updated)?;
        // Cached listings were filtered by the old values
        api.cache().invalidate_all();
      }
      print_prefs(&updated);
    }
  }

  Ok(())
}

fn print_prefs(prefs: &Personalization) {
  let show = |name: Option<&str>, id: Option<i64>| match (name, id) {
    (Some(name), Some(id)) => format!("{} ({})", name, id),
    (Some(name), None) => name.to_string(),
    (None, Some(id)) => id.to_string(),
    (None, None) => "-".to_string(),
  };
  println!("Faculty: {}", show(prefs.faculty.as_deref(), prefs.faculty_id));
  println!("Major:   {}", show(prefs.major.as_deref(), prefs.major_id));
}
