//! Static Chart Renderer
//! Draws dashboard sections to PNG files with plotters.
//!
//! Layout per section:
//! 1. Title centered at the top
//! 2. Chart body (pie with side legend, bars, heatmap or region map)
//! 3. Failed sections are not rendered; the export reports them instead

use crate::dashboard::{ChartKind, DashboardSnapshot, Section, SectionData};
use crate::data::SummaryTable;
use crate::geo::{RegionLookup, RegionMarker};
use crate::stats::CorrelationMatrix;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const PALETTE: [RGBColor; 10] = [
    RGBColor(52, 152, 219),
    RGBColor(231, 76, 60),
    RGBColor(46, 204, 113),
    RGBColor(155, 89, 182),
    RGBColor(243, 156, 18),
    RGBColor(26, 188, 156),
    RGBColor(233, 30, 99),
    RGBColor(0, 188, 212),
    RGBColor(121, 85, 72),
    RGBColor(96, 125, 139),
];

const GRAY: RGBColor = RGBColor(189, 189, 189);
const FONT: &str = "sans-serif";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("Pixel buffer has the wrong size")]
    Buffer,
    #[error("PNG encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("Failed to write {path}: {error}")]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

/// Result of exporting a whole snapshot.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<String>,
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render every available section to `<dir>/section_<slug>.png`.
    pub fn export_snapshot(
        snapshot: &DashboardSnapshot,
        lookup: &RegionLookup,
        dir: &Path,
        size: (u32, u32),
    ) -> Result<ExportReport, RenderError> {
        let mut report = ExportReport::default();

        for section in &snapshot.sections {
            if let Err(e) = &section.result {
                log::warn!("Not exporting {}: {}", section.title(), e);
                report.skipped.push(format!("{}: {}", section.title(), e));
                continue;
            }

            let bytes = Self::render_section_png(section, lookup, size)?;
            let path = dir.join(format!("section_{}.png", section.id.slug()));
            std::fs::write(&path, bytes).map_err(|error| RenderError::Io {
                path: path.clone(),
                error,
            })?;
            log::info!("Exported {}", path.display());
            report.written.push(path);
        }

        Ok(report)
    }

    /// Render one section to PNG bytes. Failed sections render a notice.
    pub fn render_section_png(
        section: &Section,
        lookup: &RegionLookup,
        (width, height): (u32, u32),
    ) -> Result<Vec<u8>, RenderError> {
        let mut buf = vec![255u8; (width * height * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buf, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;
            let body = root
                .titled(section.title(), (FONT, 22).into_font())
                .map_err(draw_err)?;

            match &section.result {
                Ok(SectionData::Table(table)) => match section.kind() {
                    ChartKind::Pie => Self::draw_pie(&body, table)?,
                    _ => Self::draw_bars(&body, table)?,
                },
                Ok(SectionData::Map { markers, .. }) => Self::draw_map(&body, lookup, markers)?,
                Ok(SectionData::Heatmap(matrix)) => Self::draw_heatmap(&body, matrix)?,
                Err(e) => Self::draw_notice(&body, &e.to_string())?,
            }
            root.present().map_err(draw_err)?;
        }

        let img = image::RgbImage::from_raw(width, height, buf).ok_or(RenderError::Buffer)?;
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
        Ok(bytes)
    }

    fn draw_notice<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, text: &str) -> Result<(), RenderError> {
        let (_, h) = area.dim_in_pixel();
        area.draw(&Text::new(
            text.to_string(),
            (20, h as i32 / 2),
            (FONT, 16).into_font().color(&GRAY),
        ))
        .map_err(draw_err)?;
        Ok(())
    }

    /// Pixel outline of a pie slice, angles in radians clockwise from 12 o'clock.
    pub fn slice_polygon(center: (i32, i32), radius: f64, start: f64, end: f64) -> Vec<(i32, i32)> {
        let steps = ((end - start).abs() / std::f64::consts::TAU * 120.0).ceil().max(1.0) as usize;
        let mut points = vec![center];
        for i in 0..=steps {
            let a = start + (end - start) * i as f64 / steps as f64;
            points.push((
                center.0 + (radius * a.sin()).round() as i32,
                center.1 - (radius * a.cos()).round() as i32,
            ));
        }
        points
    }

    fn draw_pie<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, table: &SummaryTable) -> Result<(), RenderError> {
        let total = table.total();
        if total <= 0.0 {
            return Self::draw_notice(area, "Sem dados para a seleção");
        }

        let (w, h) = area.dim_in_pixel();
        let radius = (w.min(h) as f64 * 0.4).max(10.0);
        let center = ((w as f64 * 0.35) as i32, (h / 2) as i32);

        let mut angle = 0.0;
        for (i, (label, value)) in table.entries().iter().enumerate() {
            let color = PALETTE[i % PALETTE.len()];
            if *value > 0.0 {
                let sweep = value / total * std::f64::consts::TAU;
                area.draw(&Polygon::new(
                    Self::slice_polygon(center, radius, angle, angle + sweep),
                    color.filled(),
                ))
                .map_err(draw_err)?;
                angle += sweep;
            }

            // Legend entry
            let ly = 30 + i as i32 * 24;
            let lx = (w as f64 * 0.72) as i32;
            area.draw(&Rectangle::new([(lx, ly), (lx + 14, ly + 14)], color.filled()))
                .map_err(draw_err)?;
            area.draw(&Text::new(
                format!("{} ({:.1}%)", label, value / total * 100.0),
                (lx + 20, ly),
                (FONT, 14).into_font(),
            ))
            .map_err(draw_err)?;
        }
        Ok(())
    }

    fn draw_bars<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, table: &SummaryTable) -> Result<(), RenderError> {
        if table.is_empty() {
            return Self::draw_notice(area, "Sem dados para a seleção");
        }

        let n = table.len();
        let labels: Vec<String> = table.labels().iter().map(|s| s.to_string()).collect();
        let y_max = (table.max_value() * 1.1).max(1.0);

        let mut chart = ChartBuilder::on(area)
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&|x: &f64| {
                let idx = x.round();
                if (x - idx).abs() < 1e-6 && idx >= 0.0 {
                    labels.get(idx as usize).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            })
            .y_desc("Escolas")
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(table.values().into_iter().enumerate().map(|(i, v)| {
                let x = i as f64;
                Rectangle::new(
                    [(x - 0.3, 0.0), (x + 0.3, v)],
                    PALETTE[i % PALETTE.len()].filled(),
                )
            }))
            .map_err(draw_err)?;
        Ok(())
    }

    /// Cell colour on the same diverging scale as the interactive heatmap.
    pub fn correlation_color(r: f64) -> RGBColor {
        if r.is_nan() {
            return GRAY;
        }
        let t = r.clamp(-1.0, 1.0);
        let lerp = |a: u8, b: u8, f: f64| (a as f64 + (b as f64 - a as f64) * f).round() as u8;
        if t >= 0.0 {
            RGBColor(lerp(255, 178, t), lerp(255, 24, t), lerp(255, 43, t))
        } else {
            RGBColor(lerp(255, 33, -t), lerp(255, 102, -t), lerp(255, 172, -t))
        }
    }

    fn draw_heatmap<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, matrix: &CorrelationMatrix) -> Result<(), RenderError> {
        let n = matrix.size();
        let rounded = matrix.rounded(2);
        let x_labels = matrix.columns.clone();
        let y_labels: Vec<String> = matrix.columns.iter().rev().cloned().collect();
        let label_at = |labels: &[String], v: f64| {
            let pos = v - 0.5;
            let idx = pos.round();
            if (pos - idx).abs() < 1e-6 && idx >= 0.0 {
                labels.get(idx as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        };

        let mut chart = ChartBuilder::on(area)
            .margin(15)
            .x_label_area_size(120)
            .y_label_area_size(200)
            .build_cartesian_2d(0f64..n as f64, 0f64..n as f64)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(n * 2 + 1)
            .y_labels(n * 2 + 1)
            .x_label_formatter(&|v: &f64| label_at(&x_labels, *v))
            .y_label_formatter(&|v: &f64| label_at(&y_labels, *v))
            .x_label_style((FONT, 11).into_font().transform(FontTransform::Rotate90))
            .draw()
            .map_err(draw_err)?;

        for i in 0..n {
            let y = (n - 1 - i) as f64;
            for j in 0..n {
                let x = j as f64;
                chart
                    .draw_series(std::iter::once(Rectangle::new(
                        [(x, y), (x + 1.0, y + 1.0)],
                        Self::correlation_color(matrix.get(i, j)).filled(),
                    )))
                    .map_err(draw_err)?;

                let text = if matrix.is_defined(i, j) {
                    format!("{:.2}", rounded[i][j])
                } else {
                    "-".to_string()
                };
                chart
                    .draw_series(std::iter::once(Text::new(
                        text,
                        (x + 0.3, y + 0.6),
                        (FONT, 11).into_font(),
                    )))
                    .map_err(draw_err)?;
            }
        }
        Ok(())
    }

    fn draw_map<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        lookup: &RegionLookup,
        markers: &[RegionMarker],
    ) -> Result<(), RenderError> {
        let mut chart = ChartBuilder::on(area)
            .margin(15)
            .build_cartesian_2d(-75f64..-33f64, -35f64..7f64)
            .map_err(draw_err)?;

        for (i, region) in lookup.regions().iter().enumerate() {
            let color = PALETTE[i % PALETTE.len()];
            for ring in &region.boundary {
                let points: Vec<(f64, f64)> = ring.iter().map(|p| (p[0], p[1])).collect();
                chart
                    .draw_series(std::iter::once(Polygon::new(
                        points.clone(),
                        color.mix(0.25).filled(),
                    )))
                    .map_err(draw_err)?;
                chart
                    .draw_series(std::iter::once(PathElement::new(points, color.stroke_width(1))))
                    .map_err(draw_err)?;
            }
        }

        let max_count = markers.iter().map(|m| m.count).fold(0.0, f64::max);
        for marker in markers {
            let radius = if max_count > 0.0 {
                4 + (16.0 * (marker.count / max_count).sqrt()) as i32
            } else {
                4
            };
            let pos = (marker.position[0], marker.position[1]);
            chart
                .draw_series(std::iter::once(Circle::new(pos, radius, RED.mix(0.8).filled())))
                .map_err(draw_err)?;
            chart
                .draw_series(std::iter::once(Text::new(
                    format!("{}: {}", marker.name, marker.count),
                    (pos.0 - 3.0, pos.1 - 2.0),
                    (FONT, 13).into_font(),
                )))
                .map_err(draw_err)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::SectionId;
    use crate::data::SchemaError;

    #[test]
    fn test_full_slice_closes_on_start() {
        let points = StaticChartRenderer::slice_polygon((100, 100), 50.0, 0.0, std::f64::consts::TAU);
        assert_eq!(points[0], (100, 100));
        assert_eq!(points[1], (100, 50));
        assert_eq!(*points.last().unwrap(), (100, 50));
    }

    #[test]
    fn test_quarter_slice_ends_at_three_oclock() {
        let points =
            StaticChartRenderer::slice_polygon((0, 0), 10.0, 0.0, std::f64::consts::FRAC_PI_2);
        assert_eq!(*points.last().unwrap(), (10, 0));
    }

    #[test]
    fn test_failed_sections_are_skipped_on_export() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = DashboardSnapshot {
            row_count: 0,
            total_rows: 0,
            sections: vec![Section {
                id: SectionId::WaterSupply,
                result: Err(SchemaError::MissingColumns {
                    context: "water_supply".to_string(),
                    columns: vec!["IN_AGUA_POTAVEL".to_string()],
                }),
            }],
        };

        let report = StaticChartRenderer::export_snapshot(
            &snapshot,
            &RegionLookup::builtin(),
            dir.path(),
            (400, 300),
        )
        .unwrap();
        assert!(report.written.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].contains("IN_AGUA_POTAVEL"));
    }

    #[test]
    fn test_correlation_color_matches_scale() {
        assert_eq!(StaticChartRenderer::correlation_color(0.0), RGBColor(255, 255, 255));
        assert_eq!(StaticChartRenderer::correlation_color(-1.0), RGBColor(33, 102, 172));
    }
}
