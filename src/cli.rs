//! Command Line Interface (CLI) arguments.

use crate::aggregate::spatial::ZoomThresholds;
use crate::dataset::Encoding;

use clap::{error::ErrorKind, CommandFactory, Parser};

/// Incident Atlas command line interface
#[derive(Clone, Debug, Parser)]
pub struct CommandLineArgs {
    /// The IP address on which the server should listen (IPv4 or IPv6)
    #[arg(long, default_value = "0.0.0.0", env = "INCIDENT_ATLAS_HOST")]
    pub host: String,
    /// The port to which the server should bind
    #[arg(long, default_value_t = 8080, env = "INCIDENT_ATLAS_PORT")]
    pub port: u16,
    /// Maximum time in seconds to wait for requests to complete upon receiving `ctrl+c` signal.
    #[arg(long, default_value_t = 60, env = "INCIDENT_ATLAS_SHUTDOWN_TIMEOUT")]
    pub graceful_shutdown_timeout: u64,
    /// Whether to enable sending traces to Jaeger.
    #[arg(long, default_value_t = false, env = "INCIDENT_ATLAS_ENABLE_JAEGER")]
    pub enable_jaeger: bool,
    /// Whether to use Rayon for execution of aggregations.
    #[arg(long, default_value_t = false, env = "INCIDENT_ATLAS_USE_RAYON")]
    pub use_rayon: bool,
    /// Maximum number of concurrent aggregations. Defaults to the number of CPUs minus one.
    #[arg(long, env = "INCIDENT_ATLAS_THREAD_LIMIT")]
    pub thread_limit: Option<usize>,
    /// Path to the incident dataset
    #[arg(long, default_value = "GTD-suicide.csv", env = "INCIDENT_ATLAS_DATA_FILE")]
    pub data_file: String,
    /// Text encoding of the incident dataset
    #[arg(long, value_enum, default_value_t = Encoding::Latin1, env = "INCIDENT_ATLAS_DATA_ENCODING")]
    pub data_encoding: Encoding,
    /// Directory containing the `index.html` page
    #[arg(long, default_value = "templates", env = "INCIDENT_ATLAS_STATIC_DIR")]
    pub static_dir: String,
    /// Minimum zoom level at which incidents are grouped by city
    #[arg(long, default_value_t = 6, env = "INCIDENT_ATLAS_CITY_ZOOM")]
    pub city_zoom: i32,
    /// Minimum zoom level at which incidents are grouped by country
    #[arg(long, default_value_t = 3, env = "INCIDENT_ATLAS_COUNTRY_ZOOM")]
    pub country_zoom: i32,
}

impl CommandLineArgs {
    /// Returns the zoom thresholds for spatial aggregation.
    pub fn zoom_thresholds(&self) -> ZoomThresholds {
        ZoomThresholds {
            country: self.country_zoom,
            city: self.city_zoom,
        }
    }

    /// Check relationships between arguments that clap cannot express.
    fn validate(&self) -> Result<(), String> {
        if self.country_zoom > self.city_zoom {
            return Err(format!(
                "--country-zoom ({}) must not exceed --city-zoom ({})",
                self.country_zoom, self.city_zoom
            ));
        }
        Ok(())
    }
}

/// Returns parsed command line arguments.
///
/// Exits with a usage error if the arguments are inconsistent.
pub fn parse() -> CommandLineArgs {
    let args = CommandLineArgs::parse();
    if let Err(message) = args.validate() {
        CommandLineArgs::command()
            .error(ErrorKind::ArgumentConflict, message)
            .exit()
    }
    args
}
