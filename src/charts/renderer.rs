//! Static Chart Renderer
//! Draws the time series and distribution charts into one PNG image.
//!
//! Layout:
//! 1. Top half: weekly % ILI (raw or rolling mean) against week number
//! 2. Bottom half: density histogram with the fitted exponential PDF, or the
//!    "not enough data" message when no fit exists

use crate::charts::ChartData;
use crate::stats::{HistogramBin, SeriesPoint};
use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::io::Cursor;
use thiserror::Error;

const SERIES_RGB: RGBColor = RGBColor(52, 152, 219);
const HISTOGRAM_RGB: RGBColor = RGBColor(52, 152, 219);
const PDF_RGB: RGBColor = RGBColor(231, 76, 60);

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Canvas must have a non-zero size, got {0}x{1}")]
    EmptyCanvas(u32, u32),
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("Pixel buffer does not match canvas size")]
    Buffer,
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

fn draw_err<E: std::fmt::Display>(err: E) -> RenderError {
    RenderError::Draw(err.to_string())
}

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render both charts for one state and encode them as PNG bytes.
    pub fn render_png(data: &ChartData, width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyCanvas(width, height));
        }

        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            let (upper, lower) = root.split_vertically((height / 2) as i32);
            Self::draw_series_panel(&upper, data)?;
            Self::draw_distribution_panel(&lower, data)?;

            root.present().map_err(draw_err)?;
        }

        let img = RgbImage::from_raw(width, height, buffer).ok_or(RenderError::Buffer)?;
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    fn draw_series_panel(area: &Area<'_>, data: &ChartData) -> Result<(), RenderError> {
        let (x_max, y_max) = Self::series_bounds(&data.series);

        let mut chart = ChartBuilder::on(area)
            .caption(format!("Weekly Percent ILI in {}", data.label), ("sans-serif", 22))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0f64..x_max, 0f64..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_desc("Week Number")
            .y_desc("% ILI")
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(LineSeries::new(
                data.series.iter().map(|p| (p.index as f64, p.value)),
                &SERIES_RGB,
            ))
            .map_err(draw_err)?;

        Ok(())
    }

    fn draw_distribution_panel(area: &Area<'_>, data: &ChartData) -> Result<(), RenderError> {
        let title = format!("Distribution of Weekly ILI % in {}", data.label);

        let Some(legend) = data.pdf_legend() else {
            area.draw(&Text::new(title, (20, 20), ("sans-serif", 22).into_font()))
                .map_err(draw_err)?;
            area.draw(&Text::new(
                data.no_fit_message(),
                (20, 70),
                ("sans-serif", 18).into_font(),
            ))
            .map_err(draw_err)?;
            return Ok(());
        };

        let (x_max, y_max) = Self::distribution_bounds(&data.histogram, &data.pdf_curve);

        let mut chart = ChartBuilder::on(area)
            .caption(title, ("sans-serif", 22))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0f64..x_max, 0f64..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_desc("Weekly ILI Percentage (%)")
            .y_desc("Density")
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(data.histogram.iter().map(|bin| {
                Rectangle::new(
                    [(bin.left, 0.0), (bin.right, bin.density)],
                    HISTOGRAM_RGB.mix(0.6).filled(),
                )
            }))
            .map_err(draw_err)?
            .label("Observed ILI %")
            .legend(|(x, y)| {
                Rectangle::new(
                    [(x, y - 5), (x + 20, y + 5)],
                    HISTOGRAM_RGB.mix(0.6).filled(),
                )
            });

        chart
            .draw_series(LineSeries::new(
                data.pdf_curve.iter().map(|p| (p[0], p[1])),
                PDF_RGB.stroke_width(2),
            ))
            .map_err(draw_err)?
            .label(legend)
            .legend(|(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], PDF_RGB.stroke_width(2))
            });

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(draw_err)?;

        Ok(())
    }

    /// Axis extents for the time series, never collapsing to zero width.
    fn series_bounds(series: &[SeriesPoint]) -> (f64, f64) {
        let x_max = series
            .iter()
            .map(|p| p.index as f64)
            .fold(0.0, f64::max)
            .max(1.0);
        let y_max = series.iter().map(|p| p.value).fold(0.0, f64::max);
        (x_max, if y_max > 0.0 { y_max * 1.1 } else { 1.0 })
    }

    /// Axis extents covering every bar and the whole density curve.
    fn distribution_bounds(histogram: &[HistogramBin], curve: &[[f64; 2]]) -> (f64, f64) {
        let x_max = histogram
            .iter()
            .map(|b| b.right)
            .chain(curve.iter().map(|p| p[0]))
            .fold(0.0, f64::max);
        let y_max = histogram
            .iter()
            .map(|b| b.density)
            .chain(curve.iter().map(|p| p[1]))
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max);

        (
            if x_max > 0.0 { x_max } else { 1.0 },
            if y_max > 0.0 { y_max * 1.1 } else { 1.0 },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_bounds_pad_the_peak() {
        let series = [
            SeriesPoint { index: 0, value: 1.0 },
            SeriesPoint { index: 9, value: 4.0 },
        ];
        let (x_max, y_max) = StaticChartRenderer::series_bounds(&series);
        assert_eq!(x_max, 9.0);
        assert!((y_max - 4.4).abs() < 1e-12);
    }

    #[test]
    fn empty_series_still_has_an_axis() {
        assert_eq!(StaticChartRenderer::series_bounds(&[]), (1.0, 1.0));
    }

    #[test]
    fn distribution_bounds_cover_curve_and_bars() {
        let bins = [HistogramBin {
            left: 0.0,
            right: 2.0,
            count: 3,
            density: 0.5,
        }];
        let curve = [[0.0, 0.8], [3.3, 0.1]];
        let (x_max, y_max) = StaticChartRenderer::distribution_bounds(&bins, &curve);
        assert_eq!(x_max, 3.3);
        assert!((y_max - 0.88).abs() < 1e-12);
    }

    #[test]
    fn zero_sized_canvas_is_rejected() {
        let data = ChartData {
            group: "ca".to_string(),
            label: "California".to_string(),
            smoothed: false,
            window: 5,
            series: Vec::new(),
            stats: crate::stats::DescriptiveStats::default(),
            fit: crate::stats::FitOutcome::NoFit,
            histogram: Vec::new(),
            pdf_curve: Vec::new(),
        };
        let err = StaticChartRenderer::render_png(&data, 0, 600).unwrap_err();
        assert!(matches!(err, RenderError::EmptyCanvas(0, 600)));
    }
}
