//! Control Panel Widget
//! Left side panel with source selection, the dependency filter and export.

use crate::data::{FilterSelection, LabelMap};
use egui::{Color32, RichText};

/// Left side control panel with file selection and filter controls.
pub struct ControlPanel {
    pub source_text: String,
    dependency_domain: LabelMap,
    /// (label, checked) for every dependency category
    pub dependency_options: Vec<(String, bool)>,
    pub row_count: Option<(usize, usize)>,
    pub status: String,
    pub warnings: Vec<String>,
    pub busy: bool,
    pub export_enabled: bool,
}

impl ControlPanel {
    /// All dependency categories start selected.
    pub fn new(domain: &LabelMap, source_text: String) -> Self {
        Self {
            source_text,
            dependency_options: domain
                .labels()
                .into_iter()
                .map(|label| (label.to_string(), true))
                .collect(),
            dependency_domain: domain.clone(),
            row_count: None,
            status: "Ready".to_string(),
            warnings: Vec::new(),
            busy: false,
            export_enabled: false,
        }
    }

    /// Current selection from the checkboxes.
    pub fn selection(&self) -> FilterSelection {
        let checked: Vec<&str> = self
            .dependency_options
            .iter()
            .filter(|(_, checked)| *checked)
            .map(|(label, _)| label.as_str())
            .collect();
        FilterSelection::from_labels(&self.dependency_domain, &checked)
    }

    pub fn set_all(&mut self, checked: bool) {
        self.dependency_options
            .iter_mut()
            .for_each(|(_, c)| *c = checked);
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui, title: &str) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new(format!("📊 {}", title))
                    .size(18.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Fonte de Dados").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.add(
                    egui::TextEdit::singleline(&mut self.source_text)
                        .hint_text("arquivo .csv ou URL")
                        .desired_width(f32::INFINITY),
                );
                ui.horizontal(|ui| {
                    ui.add_enabled_ui(!self.busy, |ui| {
                        if ui.button("📂 Procurar").clicked() {
                            action = ControlPanelAction::BrowseCsv;
                        }
                        if ui.button("⟳ Carregar").clicked() {
                            action = ControlPanelAction::LoadSource;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Filter Section =====
        ui.label(RichText::new("🔧 Tipo de Escola").size(14.0).strong());
        ui.add_space(5.0);

        let mut changed = false;
        for (label, checked) in self.dependency_options.iter_mut() {
            changed |= ui.checkbox(checked, label.as_str()).changed();
        }

        ui.add_space(5.0);
        ui.horizontal(|ui| {
            if ui.small_button("Selecionar todos").clicked() {
                self.set_all(true);
                changed = true;
            }
            if ui.small_button("Limpar").clicked() {
                self.set_all(false);
                changed = true;
            }
        });
        if changed {
            action = ControlPanelAction::SelectionChanged;
        }

        if let Some((shown, total)) = self.row_count {
            ui.add_space(5.0);
            ui.label(
                RichText::new(format!("{} de {} escolas", shown, total))
                    .size(12.0)
                    .color(Color32::GRAY),
            );
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.export_enabled && !self.busy, |ui| {
                let button = egui::Button::new(RichText::new("🖼 Exportar PNG").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportPng;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status Section =====
        if self.busy {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(RichText::new(&self.status).size(11.0));
            });
        } else {
            let status_color = if self.status.contains("Erro") {
                Color32::from_rgb(220, 53, 69)
            } else {
                Color32::GRAY
            };
            ui.label(RichText::new(&self.status).size(11.0).color(status_color));
        }

        for warning in &self.warnings {
            ui.label(
                RichText::new(format!("⚠ {}", warning))
                    .size(11.0)
                    .color(Color32::from_rgb(243, 156, 18)),
            );
        }

        action
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
    LoadSource,
    SelectionChanged,
    ExportPng,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_all_selected() {
        let map = LabelMap::dependency();
        let panel = ControlPanel::new(&map, String::new());
        assert_eq!(panel.selection(), FilterSelection::all(&map));
    }

    #[test]
    fn test_clear_gives_empty_selection() {
        let mut panel = ControlPanel::new(&LabelMap::dependency(), String::new());
        panel.set_all(false);
        assert!(panel.selection().is_empty());
    }

    #[test]
    fn test_selection_maps_checked_labels_to_codes() {
        let mut panel = ControlPanel::new(&LabelMap::dependency(), String::new());
        panel.set_all(false);
        for (label, checked) in panel.dependency_options.iter_mut() {
            *checked = label == "Estadual" || label == "Privada";
        }

        let selection = panel.selection();
        assert_eq!(selection.codes().collect::<Vec<_>>(), vec![2, 4]);
    }
}
