//! Dashboard Session
//! Holds the shared dataset and current selection; recomputes every section
//! on demand with per-section error isolation.

use crate::config::DashboardConfig;
use crate::data::{
    Dataset, FilterSelection, FilteredView, IndicatorGroup, LabelMap, Pipeline, SchemaError,
    SummaryTable,
};
use crate::geo::{RegionLookup, RegionMarker};
use crate::stats::{CorrelationCalculator, CorrelationMatrix};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Pie,
    Bar,
    Map,
    Heatmap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionId {
    Location,
    RenewableEnergy,
    Dependency,
    RaceColor,
    WaterSupply,
    WasteTreatment,
    Regions,
    Correlation,
}

impl SectionId {
    pub const ALL: [SectionId; 8] = [
        SectionId::Location,
        SectionId::RenewableEnergy,
        SectionId::Dependency,
        SectionId::RaceColor,
        SectionId::WaterSupply,
        SectionId::WasteTreatment,
        SectionId::Regions,
        SectionId::Correlation,
    ];

    pub fn title(self) -> &'static str {
        match self {
            SectionId::Location => "Localização das Escolas",
            SectionId::RenewableEnergy => "Uso de Energia Renovável",
            SectionId::Dependency => "Dependência Administrativa",
            SectionId::RaceColor => "Matrículas por Cor/Raça",
            SectionId::WaterSupply => "Abastecimento de Água nas Escolas",
            SectionId::WasteTreatment => "Tratamento de Lixo",
            SectionId::Regions => "Escolas por Região",
            SectionId::Correlation => "Correlação entre Indicadores",
        }
    }

    pub fn kind(self) -> ChartKind {
        match self {
            SectionId::Location | SectionId::RenewableEnergy => ChartKind::Pie,
            SectionId::Dependency
            | SectionId::RaceColor
            | SectionId::WaterSupply
            | SectionId::WasteTreatment => ChartKind::Bar,
            SectionId::Regions => ChartKind::Map,
            SectionId::Correlation => ChartKind::Heatmap,
        }
    }

    /// File-name friendly identifier.
    pub fn slug(self) -> &'static str {
        match self {
            SectionId::Location => "location",
            SectionId::RenewableEnergy => "renewable_energy",
            SectionId::Dependency => "dependency",
            SectionId::RaceColor => "race_color",
            SectionId::WaterSupply => "water_supply",
            SectionId::WasteTreatment => "waste_treatment",
            SectionId::Regions => "regions",
            SectionId::Correlation => "correlation",
        }
    }
}

#[derive(Debug, Clone)]
pub enum SectionData {
    Table(SummaryTable),
    Map {
        counts: SummaryTable,
        markers: Vec<RegionMarker>,
    },
    Heatmap(CorrelationMatrix),
}

#[derive(Debug, Clone)]
pub struct Section {
    pub id: SectionId,
    pub result: Result<SectionData, SchemaError>,
}

impl Section {
    pub fn title(&self) -> &'static str {
        self.id.title()
    }

    pub fn kind(&self) -> ChartKind {
        self.id.kind()
    }

    pub fn table(&self) -> Option<&SummaryTable> {
        match &self.result {
            Ok(SectionData::Table(t)) => Some(t),
            Ok(SectionData::Map { counts, .. }) => Some(counts),
            _ => None,
        }
    }
}

/// Output of one recomputation pass.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub row_count: usize,
    pub total_rows: usize,
    pub sections: Vec<Section>,
}

impl DashboardSnapshot {
    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// One message per section that could not be computed.
    pub fn warnings(&self) -> Vec<String> {
        self.sections
            .iter()
            .filter_map(|s| match &s.result {
                Err(e) => Some(format!("{}: {}", s.title(), e)),
                Ok(_) => None,
            })
            .collect()
    }
}

/// One user's view over a shared, read-only dataset.
pub struct DashboardSession {
    dataset: Arc<Dataset>,
    config: DashboardConfig,
    regions: RegionLookup,
    selection: FilterSelection,
    correlation: Option<Result<CorrelationMatrix, SchemaError>>,
}

impl DashboardSession {
    pub fn new(dataset: Arc<Dataset>, config: DashboardConfig, regions: RegionLookup) -> Self {
        let selection = FilterSelection::all(&config.dependency);
        Self {
            dataset,
            config,
            regions,
            selection,
            correlation: None,
        }
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn regions(&self) -> &RegionLookup {
        &self.regions
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: FilterSelection) {
        self.selection = selection;
    }

    /// Filter once, then build every section. Failures stay local to their section.
    pub fn recompute(&mut self) -> DashboardSnapshot {
        let view = Pipeline::filter(&self.dataset, &self.selection);
        let row_count = view.as_ref().map(FilteredView::row_count).unwrap_or(0);
        log::debug!(
            "Recomputing dashboard: {} dependency codes selected, {} rows",
            self.selection.len(),
            row_count
        );

        let sections = SectionId::ALL
            .iter()
            .map(|&id| Section {
                id,
                result: match &view {
                    Ok(view) => self.compute_section(id, view),
                    Err(_) if id == SectionId::Correlation => self.correlation_section(),
                    Err(e) => Err(e.clone()),
                },
            })
            .collect::<Vec<_>>();

        for section in &sections {
            if let Err(e) = &section.result {
                log::warn!("Section {:?} unavailable: {}", section.id, e);
            }
        }

        DashboardSnapshot {
            row_count,
            total_rows: self.dataset.row_count(),
            sections,
        }
    }

    fn compute_section(&mut self, id: SectionId, view: &FilteredView) -> Result<SectionData, SchemaError> {
        let config = &self.config;
        let categorical = |map: &LabelMap| Pipeline::categorical_summary(view, map).map(SectionData::Table);
        let indicators = |group: &IndicatorGroup| Pipeline::indicator_sums(view, group).map(SectionData::Table);

        match id {
            SectionId::Location => categorical(&config.location),
            SectionId::RenewableEnergy => categorical(&config.renewable_energy),
            SectionId::Dependency => categorical(&config.dependency),
            SectionId::RaceColor => indicators(&config.race_color),
            SectionId::WaterSupply => indicators(&config.water_supply),
            SectionId::WasteTreatment => indicators(&config.waste_treatment),
            SectionId::Regions => {
                let counts =
                    Pipeline::region_counts(view, &config.region_column, &self.regions.names())?;
                let markers = self.regions.markers_for(&counts);
                Ok(SectionData::Map { counts, markers })
            }
            SectionId::Correlation => self.correlation_section(),
        }
    }

    /// The matrix covers the full dataset, so it is computed once per session.
    fn correlation_section(&mut self) -> Result<SectionData, SchemaError> {
        let dataset = &self.dataset;
        let columns = &self.config.correlation_columns;
        self.correlation
            .get_or_insert_with(|| CorrelationCalculator::compute(dataset, columns))
            .clone()
            .map(SectionData::Heatmap)
    }
}
