//! Chart Plotter Module
//! Creates interactive visualizations using egui_plot.

use crate::data::SummaryTable;
use crate::geo::{RegionLookup, RegionMarker};
use crate::stats::CorrelationMatrix;
use egui::{Color32, RichText, Stroke};
use egui_plot::{Bar, BarChart, Legend, Plot, PlotPoint, PlotPoints, Points, Polygon, Text};

pub const PALETTE: [Color32; 10] = [
    Color32::from_rgb(52, 152, 219),  // Blue
    Color32::from_rgb(231, 76, 60),   // Red
    Color32::from_rgb(46, 204, 113),  // Green
    Color32::from_rgb(155, 89, 182),  // Purple
    Color32::from_rgb(243, 156, 18),  // Orange
    Color32::from_rgb(26, 188, 156),  // Teal
    Color32::from_rgb(233, 30, 99),   // Pink
    Color32::from_rgb(0, 188, 212),   // Cyan
    Color32::from_rgb(121, 85, 72),   // Brown
    Color32::from_rgb(96, 125, 139),  // Blue Grey
];

pub const UNDEFINED_COLOR: Color32 = Color32::from_rgb(189, 189, 189);

/// Points per full circle when tessellating pie slices
const PIE_SEGMENTS: usize = 120;

/// Creates dashboard charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    pub fn color(index: usize) -> Color32 {
        PALETTE[index % PALETTE.len()]
    }

    /// Diverging blue-white-red scale for r in [-1, 1].
    pub fn correlation_color(r: f64) -> Color32 {
        if r.is_nan() {
            return UNDEFINED_COLOR;
        }
        let t = r.clamp(-1.0, 1.0) as f32;
        let lerp = |a: u8, b: u8, f: f32| (a as f32 + (b as f32 - a as f32) * f).round() as u8;
        if t >= 0.0 {
            Color32::from_rgb(lerp(255, 178, t), lerp(255, 24, t), lerp(255, 43, t))
        } else {
            let f = -t;
            Color32::from_rgb(lerp(255, 33, f), lerp(255, 102, f), lerp(255, 172, f))
        }
    }

    /// Outline of one pie slice from `start` to `end` radians.
    pub fn slice_points(start: f64, end: f64) -> Vec<[f64; 2]> {
        let steps = (((end - start) / std::f64::consts::TAU) * PIE_SEGMENTS as f64)
            .ceil()
            .max(1.0) as usize;
        let mut points = Vec::with_capacity(steps + 2);
        points.push([0.0, 0.0]);
        for i in 0..=steps {
            let angle = start + (end - start) * i as f64 / steps as f64;
            points.push([angle.cos(), angle.sin()]);
        }
        points
    }

    fn empty_notice(ui: &mut egui::Ui, height: f32) {
        ui.add_sized(
            [ui.available_width(), height],
            egui::Label::new(RichText::new("Sem dados para a seleção").color(Color32::GRAY)),
        );
    }

    /// Draw a pie chart, slices clockwise from 12 o'clock in table order.
    pub fn draw_pie_chart(ui: &mut egui::Ui, id: &str, table: &SummaryTable, height: f32) {
        let total = table.total();
        if total <= 0.0 {
            Self::empty_notice(ui, height);
            return;
        }

        Plot::new(format!("pie_{}", id))
            .height(height)
            .data_aspect(1.0)
            .show_axes(false)
            .show_grid(false)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                let mut angle = std::f64::consts::FRAC_PI_2;
                for (i, (label, value)) in table.entries().iter().enumerate() {
                    if *value <= 0.0 {
                        continue;
                    }
                    let sweep = value / total * std::f64::consts::TAU;
                    let color = Self::color(i);
                    let points = Self::slice_points(angle - sweep, angle);

                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(points))
                            .fill_color(color)
                            .stroke(Stroke::new(1.0, Color32::WHITE))
                            .name(label),
                    );

                    let mid = angle - sweep / 2.0;
                    plot_ui.text(Text::new(
                        PlotPoint::new(0.65 * mid.cos(), 0.65 * mid.sin()),
                        RichText::new(format!("{:.1}%", value / total * 100.0))
                            .color(Color32::WHITE)
                            .strong(),
                    ));
                    angle -= sweep;
                }
            });
    }

    /// Draw a vertical bar chart with category labels on the x axis.
    pub fn draw_bar_chart(ui: &mut egui::Ui, id: &str, table: &SummaryTable, height: f32) {
        let labels: Vec<String> = table.labels().iter().map(|s| s.to_string()).collect();

        let bars: Vec<Bar> = table
            .entries()
            .iter()
            .enumerate()
            .map(|(i, (label, value))| {
                Bar::new(i as f64, *value)
                    .name(label)
                    .width(0.6)
                    .fill(Self::color(i))
            })
            .collect();

        Plot::new(format!("bar_{}", id))
            .height(height)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .include_y(0.0)
            .y_axis_label("Escolas")
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if (mark.value - idx).abs() < 1e-6 && idx >= 0.0 {
                    labels.get(idx as usize).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars));
            });
    }

    /// Draw the correlation heatmap; row 0 at the top.
    pub fn draw_heatmap(ui: &mut egui::Ui, id: &str, matrix: &CorrelationMatrix, height: f32) {
        let n = matrix.size();
        let rounded = matrix.rounded(2);
        let x_labels = matrix.columns.clone();
        let y_labels: Vec<String> = matrix.columns.iter().rev().cloned().collect();

        let axis_label = |labels: Vec<String>| {
            move |mark: egui_plot::GridMark, _range: &std::ops::RangeInclusive<f64>| {
                let pos = mark.value - 0.5;
                let idx = pos.round();
                if (pos - idx).abs() < 1e-6 && idx >= 0.0 {
                    labels.get(idx as usize).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            }
        };

        Plot::new(format!("heatmap_{}", id))
            .height(height)
            .data_aspect(1.0)
            .show_grid(false)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .x_axis_formatter(axis_label(x_labels))
            .y_axis_formatter(axis_label(y_labels))
            .show(ui, |plot_ui| {
                for i in 0..n {
                    let y = (n - 1 - i) as f64;
                    for j in 0..n {
                        let x = j as f64;
                        let value = matrix.get(i, j);
                        let cell = vec![[x, y], [x + 1.0, y], [x + 1.0, y + 1.0], [x, y + 1.0]];
                        plot_ui.polygon(
                            Polygon::new(PlotPoints::from(cell))
                                .fill_color(Self::correlation_color(value))
                                .stroke(Stroke::new(0.5, Color32::WHITE)),
                        );

                        let text = if matrix.is_defined(i, j) {
                            format!("{:.2}", rounded[i][j])
                        } else {
                            "-".to_string()
                        };
                        plot_ui.text(Text::new(
                            PlotPoint::new(x + 0.5, y + 0.5),
                            RichText::new(text).size(10.0).color(Color32::BLACK),
                        ));
                    }
                }
            });
    }

    /// Draw region outlines with markers sized by school count.
    pub fn draw_region_map(
        ui: &mut egui::Ui,
        id: &str,
        lookup: &RegionLookup,
        markers: &[RegionMarker],
        height: f32,
    ) {
        let max_count = markers.iter().map(|m| m.count).fold(0.0, f64::max);

        Plot::new(format!("map_{}", id))
            .height(height)
            .data_aspect(1.0)
            .show_axes(false)
            .show_grid(false)
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                for (i, region) in lookup.regions().iter().enumerate() {
                    let color = Self::color(i);
                    for ring in &region.boundary {
                        plot_ui.polygon(
                            Polygon::new(PlotPoints::from(ring.clone()))
                                .fill_color(color.gamma_multiply(0.25))
                                .stroke(Stroke::new(1.0, color))
                                .name(&region.name),
                        );
                    }
                }

                for marker in markers {
                    let radius = if max_count > 0.0 {
                        4.0 + 16.0 * (marker.count / max_count).sqrt() as f32
                    } else {
                        4.0
                    };
                    plot_ui.points(
                        Points::new(PlotPoints::from(vec![marker.position]))
                            .radius(radius)
                            .color(Color32::from_rgb(231, 76, 60).gamma_multiply(0.8)),
                    );
                    plot_ui.text(Text::new(
                        PlotPoint::new(marker.position[0], marker.position[1] - 2.0),
                        RichText::new(format!("{}: {}", marker.name, marker.count))
                            .size(11.0)
                            .strong(),
                    ));
                }
            });
    }
}
