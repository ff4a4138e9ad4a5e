use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use skyview_core::{
    Config, Coordinates, CredentialStatus, FixedLocation, IpLocationSource, LocationResolver,
    LocationSource, OpenWeatherClient, WeatherError, WeatherService,
};

use crate::display;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skyview", version, about = "Current weather and 5-day forecast")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store your OpenWeatherMap API key.
    Configure {
        /// Remove the stored key instead of prompting for one.
        #[arg(long)]
        clear: bool,
    },

    /// Show weather for a city.
    Show {
        /// City name, e.g. "Paris" or "Paris,FR".
        city: String,
    },

    /// Show weather for the current location.
    Here {
        /// Latitude; when set together with --lon, skips location lookup.
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// Show which API key source is active.
    Status,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;

        match self.command {
            Command::Configure { clear } => {
                if clear {
                    config.clear_api_key();
                } else {
                    let key = Password::new("OpenWeatherMap API key:")
                        .with_display_mode(PasswordDisplayMode::Masked)
                        .without_confirmation()
                        .prompt()
                        .context("Failed to read API key")?;
                    if key.trim().is_empty() {
                        bail!("API key must not be empty");
                    }
                    config.set_api_key(key);
                }

                config.save()?;
                println!("Saved configuration to {}", Config::config_file_path()?.display());
            }
            Command::Show { city } => {
                let service = WeatherService::new(OpenWeatherClient::from_config(&config)?);
                let report = service.weather_for_city(&city).await?;

                print!("{}", display::report(&report));
                demo_hint(service.client().credential_status());
            }
            Command::Here { lat, lon } => {
                let source: Arc<dyn LocationSource> = match lat.zip(lon) {
                    Some((lat, lon)) => Arc::new(FixedLocation(Coordinates::new(lat, lon))),
                    None => Arc::new(IpLocationSource::new()),
                };
                let resolver = LocationResolver::new(Some(source), config.location_options());

                let service = WeatherService::new(OpenWeatherClient::from_config(&config)?);
                let report = service.weather_for_location(&resolver).await?;

                print!("{}", display::report(&report));
                demo_hint(service.client().credential_status());
            }
            Command::Status => {
                let status = config.credential().status();
                println!("API key: {status}");
                demo_hint(status);
                if status == CredentialStatus::None {
                    println!("Hint: run `skyview configure` or set OPENWEATHER_API_KEY.");
                }
            }
        }

        Ok(())
    }
}

/// One line for stderr. Weather failures are already display-ready; other
/// failures (config, prompts) keep their context chain on a single line.
pub fn error_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<WeatherError>() {
        Some(weather) => weather.user_message(),
        None => format!("Error: {err:#}"),
    }
}

fn demo_hint(status: CredentialStatus) {
    if status == CredentialStatus::Demo {
        eprintln!(
            "Note: using the shared demo API key (1,000 calls/day). Run `skyview configure` to add your own."
        );
    }
}
