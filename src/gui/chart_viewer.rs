//! Chart Viewer Widget
//! Tabbed central panel showing every dashboard section.

use crate::charts::ChartPlotter;
use crate::dashboard::{ChartKind, DashboardSnapshot, Section, SectionData, SectionId};
use crate::geo::RegionLookup;
use egui::{Color32, RichText, ScrollArea};

const CARD_SPACING: f32 = 12.0;
const CHART_HEIGHT: f32 = 280.0;
const WIDE_CHART_HEIGHT: f32 = 520.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Overview,
    Indicators,
    Map,
    Correlation,
}

impl Tab {
    const ALL: [Tab; 4] = [Tab::Overview, Tab::Indicators, Tab::Map, Tab::Correlation];

    fn label(self) -> &'static str {
        match self {
            Tab::Overview => "Visão Geral",
            Tab::Indicators => "Infraestrutura",
            Tab::Map => "Mapa",
            Tab::Correlation => "Correlação",
        }
    }

    /// Sections laid out in this tab, in column order.
    pub fn sections(self) -> &'static [SectionId] {
        match self {
            Tab::Overview => &[
                SectionId::Location,
                SectionId::RenewableEnergy,
                SectionId::Dependency,
            ],
            Tab::Indicators => &[
                SectionId::RaceColor,
                SectionId::WaterSupply,
                SectionId::WasteTreatment,
            ],
            Tab::Map => &[SectionId::Regions],
            Tab::Correlation => &[SectionId::Correlation],
        }
    }
}

/// Central panel drawing the latest snapshot.
#[derive(Default)]
pub struct ChartViewer {
    pub snapshot: Option<DashboardSnapshot>,
    pub tab: Tab,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.snapshot = None;
    }

    pub fn set_snapshot(&mut self, snapshot: DashboardSnapshot) {
        self.snapshot = Some(snapshot);
    }

    pub fn show(&mut self, ui: &mut egui::Ui, lookup: &RegionLookup) {
        ui.horizontal(|ui| {
            for tab in Tab::ALL {
                ui.selectable_value(&mut self.tab, tab, RichText::new(tab.label()).size(15.0));
            }
        });
        ui.separator();

        let Some(snapshot) = &self.snapshot else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("Nenhum dado carregado").size(20.0));
            });
            return;
        };

        let sections: Vec<&Section> = self
            .tab
            .sections()
            .iter()
            .filter_map(|id| snapshot.section(*id))
            .collect();

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                if sections.len() > 1 {
                    ui.columns(sections.len(), |columns| {
                        for (ui, section) in columns.iter_mut().zip(&sections) {
                            Self::draw_card(ui, section, lookup, CHART_HEIGHT);
                        }
                    });
                } else {
                    for section in &sections {
                        Self::draw_card(ui, section, lookup, WIDE_CHART_HEIGHT);
                    }
                }
                ui.add_space(CARD_SPACING);
            });
    }

    fn draw_card(ui: &mut egui::Ui, section: &Section, lookup: &RegionLookup, height: f32) {
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(10.0)
            .show(ui, |ui| {
                ui.label(RichText::new(section.title()).size(16.0).strong());
                ui.add_space(6.0);

                let id = section.id.slug();
                match (&section.result, section.kind()) {
                    (Ok(SectionData::Table(table)), ChartKind::Pie) => {
                        ChartPlotter::draw_pie_chart(ui, id, table, height)
                    }
                    (Ok(SectionData::Table(table)), _) => {
                        ChartPlotter::draw_bar_chart(ui, id, table, height)
                    }
                    (Ok(SectionData::Map { markers, .. }), _) => {
                        ChartPlotter::draw_region_map(ui, id, lookup, markers, height)
                    }
                    (Ok(SectionData::Heatmap(matrix)), _) => {
                        if !matrix.skipped.is_empty() {
                            ui.label(
                                RichText::new(format!(
                                    "Colunas ausentes ignoradas: {}",
                                    matrix.skipped.join(", ")
                                ))
                                .size(11.0)
                                .color(Color32::from_rgb(243, 156, 18)),
                            );
                        }
                        ChartPlotter::draw_heatmap(ui, id, matrix, height)
                    }
                    (Err(e), _) => {
                        ui.label(
                            RichText::new(format!("⚠ Seção indisponível: {}", e))
                                .color(Color32::from_rgb(220, 53, 69)),
                        );
                    }
                }
            });
    }
}
