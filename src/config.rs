//! Dashboard Configuration
//! Label maps, indicator groups and source options, loadable from JSON.

use crate::data::labels::{
    IndicatorGroup, LabelMap, DEPENDENCY_COLUMN, LOCATION_COLUMN, REGION_COLUMN,
    RENEWABLE_ENERGY_COLUMN,
};
use crate::data::LoadOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV_VAR: &str = "CENSO_DASHBOARD_CONFIG";

/// Default source file name of the 2022 census release.
pub const DEFAULT_SOURCE: &str = "microdados_ed_basica_2022.csv";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Indicator group {group}: {columns} columns but {labels} labels")]
    LengthMismatch {
        group: String,
        columns: usize,
        labels: usize,
    },
    #[error("Indicator group {0} has no columns")]
    EmptyGroup(String),
    #[error("Label map for {0} has no entries")]
    EmptyLabelMap(String),
    #[error("Label map for {column} repeats code {code}")]
    DuplicateCode { column: String, code: i64 },
    #[error("Label map for {found} used where {expected} is required")]
    WrongColumn { expected: String, found: String },
    #[error("Correlation needs at least 2 columns, got {0}")]
    TooFewCorrelationColumns(usize),
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything the dashboard needs to know about the census layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub title: String,
    pub source: String,
    pub load: LoadOptions,
    pub region_column: String,
    pub dependency: LabelMap,
    pub location: LabelMap,
    pub renewable_energy: LabelMap,
    pub water_supply: IndicatorGroup,
    pub waste_treatment: IndicatorGroup,
    pub race_color: IndicatorGroup,
    pub correlation_columns: Vec<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let water = IndicatorGroup::water_supply();
        let waste = IndicatorGroup::waste_treatment();

        let mut correlation_columns = vec![
            DEPENDENCY_COLUMN.to_string(),
            LOCATION_COLUMN.to_string(),
            RENEWABLE_ENERGY_COLUMN.to_string(),
        ];
        correlation_columns.extend(water.columns().iter().cloned());
        correlation_columns.extend(waste.columns().iter().cloned());

        Self {
            title: "Dashboard - Censo Escolar 2022".to_string(),
            source: DEFAULT_SOURCE.to_string(),
            load: LoadOptions::default(),
            region_column: REGION_COLUMN.to_string(),
            dependency: LabelMap::dependency(),
            location: LabelMap::location(),
            renewable_energy: LabelMap::renewable_energy(),
            water_supply: water,
            waste_treatment: waste,
            race_color: IndicatorGroup::race_color_enrollment(),
            correlation_columns,
        }
    }
}

impl DashboardConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: DashboardConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Config from `CENSO_DASHBOARD_CONFIG` if set, defaults otherwise.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => {
                log::info!("Reading dashboard config from {}", Path::new(&path).display());
                Self::from_file(Path::new(&path))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (map, expected) in [
            (&self.dependency, DEPENDENCY_COLUMN),
            (&self.location, LOCATION_COLUMN),
            (&self.renewable_energy, RENEWABLE_ENERGY_COLUMN),
        ] {
            map.validate()?;
            // The filter always reads the dependency column
            if expected == DEPENDENCY_COLUMN && map.column != expected {
                return Err(ConfigError::WrongColumn {
                    expected: expected.to_string(),
                    found: map.column.clone(),
                });
            }
        }
        if self.correlation_columns.len() < 2 {
            return Err(ConfigError::TooFewCorrelationColumns(
                self.correlation_columns.len(),
            ));
        }
        Ok(())
    }
}
