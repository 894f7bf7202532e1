//! Censo Dashboard Main Application
//! Main window with control panel and chart viewer.

use crate::charts::StaticChartRenderer;
use crate::config::DashboardConfig;
use crate::dashboard::DashboardSession;
use crate::data::{DataLoader, DataSource, Dataset};
use crate::geo::RegionLookup;
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use egui::SidePanel;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::thread;

/// Size of exported section images
const EXPORT_SIZE: (u32, u32) = (1200, 800);

/// Loading result from background thread
enum LoadResult {
    Complete {
        source: DataSource,
        dataset: Arc<Dataset>,
    },
    Error(String),
}

/// Main application window.
pub struct DashboardApp {
    config: DashboardConfig,
    regions: RegionLookup,
    loader: DataLoader,
    session: Option<DashboardSession>,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    // Async loading
    load_rx: Option<Receiver<LoadResult>>,
}

impl DashboardApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: DashboardConfig,
        regions: RegionLookup,
        initial_source: Option<DataSource>,
    ) -> Self {
        let source_text = initial_source
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| config.source.clone());

        let mut app = Self {
            loader: DataLoader::new(config.load.clone()),
            control_panel: ControlPanel::new(&config.dependency, source_text),
            chart_viewer: ChartViewer::new(),
            session: None,
            config,
            regions,
            load_rx: None,
        };

        if let Some(source) = initial_source {
            app.start_loading(source);
        }
        app
    }

    /// Handle file selection
    fn handle_browse_csv(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.control_panel.source_text = path.to_string_lossy().to_string();
            self.start_loading(DataSource::Path(path));
        }
    }

    /// Load in a background thread so the window keeps painting.
    fn start_loading(&mut self, source: DataSource) {
        if self.load_rx.is_some() {
            return; // Already loading
        }

        if let Some(dataset) = self.loader.cached(&source) {
            self.start_session(dataset);
            return;
        }

        self.chart_viewer.clear();
        self.session = None;
        self.control_panel.busy = true;
        self.control_panel.export_enabled = false;
        self.control_panel.set_status(&format!("Carregando {}...", source));

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        let options = self.loader.options().clone();

        thread::spawn(move || {
            let result = match DataLoader::read_source(&source, &options) {
                Ok(dataset) => LoadResult::Complete {
                    source,
                    dataset: Arc::new(dataset),
                },
                Err(e) => LoadResult::Error(e.to_string()),
            };
            let _ = tx.send(result);
        });
    }

    /// Check for loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(LoadResult::Complete { source, dataset }) => {
                self.control_panel.busy = false;
                self.loader.set_dataset(source, Arc::clone(&dataset));
                self.start_session(dataset);
            }
            Ok(LoadResult::Error(error)) => {
                log::error!("Load failed: {}", error);
                self.control_panel.busy = false;
                self.control_panel.set_status(&format!("Erro: {}", error));
            }
            Err(std::sync::mpsc::TryRecvError::Empty) => {
                self.load_rx = Some(rx);
            }
            Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                self.control_panel.busy = false;
                self.control_panel.set_status("Erro: carregamento interrompido");
            }
        }
    }

    fn start_session(&mut self, dataset: Arc<Dataset>) {
        self.control_panel.set_status(&format!(
            "{} linhas, {} colunas",
            dataset.row_count(),
            dataset.columns().len()
        ));
        self.session = Some(DashboardSession::new(
            dataset,
            self.config.clone(),
            self.regions.clone(),
        ));
        self.recompute();
    }

    /// One full synchronous pass for the current checkbox state.
    fn recompute(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.set_selection(self.control_panel.selection());
        let snapshot = session.recompute();

        self.control_panel.row_count = Some((snapshot.row_count, snapshot.total_rows));
        self.control_panel.warnings = snapshot.warnings();
        self.control_panel.export_enabled = true;
        self.chart_viewer.set_snapshot(snapshot);
    }

    fn handle_export_png(&mut self) {
        let Some(snapshot) = &self.chart_viewer.snapshot else {
            self.control_panel.set_status("Nada para exportar");
            return;
        };

        let Some(dir) = rfd::FileDialog::new().pick_folder() else {
            return; // User cancelled
        };

        match StaticChartRenderer::export_snapshot(snapshot, &self.regions, &dir, EXPORT_SIZE) {
            Ok(report) => {
                self.control_panel.set_status(&format!(
                    "{} gráficos exportados, {} ignorados",
                    report.written.len(),
                    report.skipped.len()
                ));
                if let Err(e) = open::that(&dir) {
                    log::warn!("Could not open {}: {}", dir.display(), e);
                }
            }
            Err(e) => {
                log::error!("Export failed: {}", e);
                self.control_panel
                    .set_status(&format!("Erro ao exportar: {}", e));
            }
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        // Request repaint while loading
        if self.load_rx.is_some() {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(260.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui, &self.config.title);

                    match action {
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                        ControlPanelAction::LoadSource => {
                            let source = DataSource::parse(&self.control_panel.source_text);
                            self.start_loading(source);
                        }
                        ControlPanelAction::SelectionChanged => self.recompute(),
                        ControlPanelAction::ExportPng => self.handle_export_png(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Chart Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui, &self.regions);
        });
    }
}
