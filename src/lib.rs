//! Censo Dashboard - School Census Microdata Dashboard
//!
//! Loads the census microdata file, filters schools by administrative
//! dependency and summarizes them into pie, bar, map and heatmap charts.

pub mod charts;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod geo;
pub mod gui;
pub mod stats;

pub use config::{ConfigError, DashboardConfig};
pub use dashboard::{DashboardSession, DashboardSnapshot, Section, SectionData, SectionId};
pub use data::{DataLoader, DataSource, Dataset, FilterSelection, LoadError, Pipeline, SchemaError};
