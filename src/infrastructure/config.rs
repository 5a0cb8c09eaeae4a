// Configuration resolution and dashboard layout
use crate::domain::scoring::{Calibration, ScoreWeights};
use anyhow::{Context, anyhow};
use serde::Deserialize;

/// One source of configuration values. Providers are consulted in order;
/// the first one that knows a key wins.
pub trait ConfigProvider: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// TOML file source (`config/settings.toml`), read through the `config`
/// crate. A missing file is fine; the provider just answers nothing.
pub struct FileProvider {
    settings: Option<config::Config>,
}

impl FileProvider {
    pub fn new(path: &str) -> Self {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .build()
            .ok();
        Self { settings }
    }
}

impl ConfigProvider for FileProvider {
    fn get(&self, key: &str) -> Option<String> {
        // File keys are lowercase TOML; chain keys use the env spelling.
        self.settings.as_ref()?.get_string(&key.to_lowercase()).ok()
    }
}

pub struct EnvProvider;

impl ConfigProvider for EnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Hardcoded fallbacks, last in the chain. The auth token deliberately has
/// no default.
pub struct Defaults;

impl ConfigProvider for Defaults {
    fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "INFLUX_URL" => "https://us-east-1-1.aws.cloud2.influxdata.com",
            "INFLUX_ORG" => "PlantPet",
            "INFLUX_BUCKET" => "PlantPet",
            "INFLUX_MEASUREMENT" => "plant_status",
            "LOCAL_TZ" => "America/Los_Angeles",
            "DATA_SOURCE" => "influx",
            _ => return None,
        };
        Some(value.to_string())
    }
}

/// Ordered provider list: settings file, then environment, then defaults.
pub struct ConfigChain {
    providers: Vec<Box<dyn ConfigProvider>>,
}

impl ConfigChain {
    pub fn standard() -> Self {
        Self::from_providers(vec![
            Box::new(FileProvider::new("config/settings")),
            Box::new(EnvProvider),
            Box::new(Defaults),
        ])
    }

    pub fn from_providers(providers: Vec<Box<dyn ConfigProvider>>) -> Self {
        Self { providers }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.providers.iter().find_map(|p| p.get(key))
    }

    pub fn require(&self, key: &str) -> anyhow::Result<String> {
        self.get(key)
            .ok_or_else(|| anyhow!("{key} must be set in config/settings.toml or the environment"))
    }
}

/// Connection settings for the live time-series source.
#[derive(Debug, Clone)]
pub struct InfluxSettings {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
    pub measurement: String,
}

pub fn load_influx_settings(chain: &ConfigChain) -> anyhow::Result<InfluxSettings> {
    Ok(InfluxSettings {
        url: chain.require("INFLUX_URL")?,
        token: chain.require("INFLUX_TOKEN")?,
        org: chain.require("INFLUX_ORG")?,
        bucket: chain.require("INFLUX_BUCKET")?,
        measurement: chain.require("INFLUX_MEASUREMENT")?,
    })
}

/// Which repository implementation a deployment runs. One per process;
/// the variants are never composed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Influx,
    Synthetic,
}

pub fn load_source_kind(chain: &ConfigChain) -> anyhow::Result<SourceKind> {
    let raw = chain.require("DATA_SOURCE")?;
    match raw.as_str() {
        "influx" => Ok(SourceKind::Influx),
        "synthetic" => Ok(SourceKind::Synthetic),
        other => Err(anyhow!(
            "DATA_SOURCE must be \"influx\" or \"synthetic\", got \"{other}\""
        )),
    }
}

/// Display timezone for timestamps; stored values are UTC and converted
/// once at ingestion.
pub fn load_local_tz(chain: &ConfigChain) -> anyhow::Result<chrono_tz::Tz> {
    let name = chain.require("LOCAL_TZ")?;
    name.parse::<chrono_tz::Tz>()
        .map_err(|e| anyhow!("LOCAL_TZ \"{name}\" is not a known timezone: {e}"))
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    pub title: String,
    pub calibration: Calibration,
    pub weights: ScoreWeights,
    pub charts: Vec<ChartConfig>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "Plant Health Dashboard".to_string(),
            calibration: Calibration::default(),
            weights: ScoreWeights::default(),
            charts: default_charts(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartConfig {
    pub id: String,
    pub title: String,
    pub unit: Option<String>,
    pub kind: String,
    pub y_min: Option<f64>,
    pub y_max: Option<f64>,
    /// Draw the shaded ideal soil band behind this chart.
    #[serde(default)]
    pub ideal_band: bool,
    #[serde(default)]
    pub series: Vec<SeriesConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeriesConfig {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
    /// Reading column this series plots: soil_pct, light_pct or happiness.
    pub field: String,
}

fn default_charts() -> Vec<ChartConfig> {
    vec![
        ChartConfig {
            id: "soil".to_string(),
            title: "Soil Moisture (Last 7 Days)".to_string(),
            unit: Some("Moisture (%)".to_string()),
            kind: "line".to_string(),
            y_min: None,
            y_max: None,
            ideal_band: true,
            series: vec![SeriesConfig {
                id: "soil_pct".to_string(),
                name: "Soil (%)".to_string(),
                color: Some("#38bdf8".to_string()),
                field: "soil_pct".to_string(),
            }],
        },
        ChartConfig {
            id: "light".to_string(),
            title: "Ambient Light (Last 7 Days)".to_string(),
            unit: Some("Light (%)".to_string()),
            kind: "line".to_string(),
            y_min: None,
            y_max: None,
            ideal_band: false,
            series: vec![SeriesConfig {
                id: "light_pct".to_string(),
                name: "Light (%)".to_string(),
                color: Some("#facc15".to_string()),
                field: "light_pct".to_string(),
            }],
        },
        ChartConfig {
            id: "analysis".to_string(),
            title: "Happiness Score with Soil Moisture & Ambient Light".to_string(),
            unit: Some("Percentage (%)".to_string()),
            kind: "multiLine".to_string(),
            y_min: Some(0.0),
            y_max: Some(100.0),
            ideal_band: false,
            series: vec![
                SeriesConfig {
                    id: "happiness".to_string(),
                    name: "Happiness (%)".to_string(),
                    color: Some("#22c55e".to_string()),
                    field: "happiness".to_string(),
                },
                SeriesConfig {
                    id: "soil_pct".to_string(),
                    name: "Soil (%)".to_string(),
                    color: Some("#38bdf8".to_string()),
                    field: "soil_pct".to_string(),
                },
                SeriesConfig {
                    id: "light_pct".to_string(),
                    name: "Light (%)".to_string(),
                    color: Some("#facc15".to_string()),
                    field: "light_pct".to_string(),
                },
            ],
        },
    ]
}

/// Load the dashboard layout (`config/dashboard.toml`), falling back to the
/// built-in layout when the file is absent.
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .build()
        .context("failed to read config/dashboard.toml")?;

    settings
        .try_deserialize()
        .context("config/dashboard.toml is malformed")
}
