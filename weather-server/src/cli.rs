use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Select, Text};
use std::{path::PathBuf, sync::Arc};
use weather_core::{
    CacheBackend, Config, PlaceRegistry, WeatherObservation, WeatherQuery, WeatherService,
    cache::cache_from_config, provider::provider_from_config,
};
use weather_server::http;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Cached weather lookup service")]
pub struct Cli {
    /// Config file; defaults to the platform config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP service.
    Serve {
        /// Listen address, overriding the config file.
        #[arg(long)]
        listen: Option<String>,
    },

    /// Look up weather once and print it.
    Show {
        /// Known place name, e.g. "Chicago".
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        location: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        lat: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        lon: Option<String>,
    },

    /// Interactively write a config file.
    Configure {
        /// Where to write it; defaults to the platform config file.
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve { listen } => {
                let config = Config::load(self.config.as_deref())?;
                let service = build_service(&config).await?;
                let addr = listen.unwrap_or_else(|| config.server.listen_addr.clone());

                http::run_http_server(&addr, service).await?;
            }
            Command::Show { location, lat, lon } => {
                let query =
                    WeatherQuery::from_params(location.as_deref(), lat.as_deref(), lon.as_deref())?;

                let config = Config::load(self.config.as_deref())?;
                let service = build_service(&config).await?;

                let observation = service.lookup(&query).await?;
                print_observation(&query, &observation);
            }
            Command::Configure { path } => {
                let path = match path.or(self.config) {
                    Some(p) => p,
                    None => Config::config_file_path()?,
                };
                configure(path)?;
            }
        }

        Ok(())
    }
}

/// Load places and build the cache, provider and service from config.
async fn build_service(config: &Config) -> anyhow::Result<Arc<WeatherService>> {
    let places = PlaceRegistry::load(&config.places_path)?;
    let cache = cache_from_config(&config.cache).await?;
    let provider = provider_from_config(&config.upstream)?;

    Ok(Arc::new(WeatherService::new(places, cache, provider)))
}

fn print_observation(query: &WeatherQuery, obs: &WeatherObservation) {
    println!("Weather for {query}");
    println!("  Temperature: {}", obs.temperature);
    println!("  Humidity:    {}", obs.humidity);
    println!("  Wind speed:  {}", obs.wind_speed);
    println!("  Conditions:  {}", obs.conditions);
}

fn configure(path: PathBuf) -> anyhow::Result<()> {
    let mut cfg = if path.exists() { Config::load(Some(&path))? } else { Config::default() };

    cfg.server.listen_addr = Text::new("Listen address:")
        .with_default(&cfg.server.listen_addr)
        .prompt()?;

    let places_path = cfg.places_path.display().to_string();
    cfg.places_path = Text::new("Places file (JSON):")
        .with_default(&places_path)
        .prompt()?
        .into();

    let backend = Select::new("Cache backend:", CacheBackend::all().to_vec()).prompt()?;
    cfg.cache.backend = backend.as_str().to_string();

    if backend == CacheBackend::Redis {
        cfg.cache.redis_url = Text::new("Redis URL:")
            .with_default(&cfg.cache.redis_url)
            .prompt()?;
    }

    cfg.upstream.user_agent = Text::new("User-Agent sent to api.weather.gov:")
        .with_help_message("weather.gov asks for contact details, e.g. \"myapp (me@example.com)\"")
        .with_default(&cfg.upstream.user_agent)
        .prompt()?;

    cfg.save(&path)
        .with_context(|| format!("Failed to save configuration to {}", path.display()))?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}
