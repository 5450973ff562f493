// forecast_chart.rs

use plotters::prelude::*;
use std::error::Error;
use std::path::Path;

use crate::error::{PredictorAppError, Result};
use crate::flow_analyzer::traffic_analyzer::PredictionReport;
use crate::shared_data::StatusColor;

fn status_rgb(color: StatusColor) -> RGBColor {
    match color {
        StatusColor::Green => RGBColor(0, 160, 0),
        StatusColor::Orange => RGBColor(255, 165, 0),
        StatusColor::Red => RGBColor(220, 0, 0),
        StatusColor::Black => RGBColor(0, 0, 0),
    }
}

/// Writes a two-panel PNG: flow by hour on top, occupancy by hour (dots coloured by status) below.
pub fn draw_hourly_forecast(reports: &[PredictionReport], path: &Path) -> Result<()> {
    let Some(first) = reports.first() else {
        return Err(PredictorAppError::Chart("no forecast to draw".to_string()));
    };
    let title = format!(
        "{} {} - {}",
        first.input.day, first.input.detector_id, first.model
    );
    draw(reports, &title, path).map_err(|e| PredictorAppError::Chart(e.to_string()))?;
    log::info!("Hourly forecast chart saved to {}", path.display());
    Ok(())
}

fn draw(reports: &[PredictionReport], title: &str, path: &Path) -> std::result::Result<(), Box<dyn Error>> {
    let last_hour = reports
        .iter()
        .map(|r| u32::from(r.input.hour()))
        .max()
        .unwrap_or(0)
        .max(1);
    let max_flow = reports
        .iter()
        .map(|r| r.output.flow)
        .fold(0.0, f64::max)
        .max(1.0)
        * 1.1;
    let max_occupancy = reports
        .iter()
        .map(|r| r.output.occupancy)
        .fold(0.0, f64::max)
        .max(1.0)
        * 1.1;

    let root = BitMapBackend::new(path, (900, 700)).into_drawing_area();
    root.fill(&WHITE)?;
    let (upper, lower) = root.split_vertically(350);

    let mut flow_chart = ChartBuilder::on(&upper)
        .caption(format!("Predicted flow: {}", title), ("sans-serif", 20))
        .margin(20)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(0u32..last_hour, 0f64..max_flow)?;
    flow_chart
        .configure_mesh()
        .x_desc("Hour")
        .y_desc("Vehicles")
        .draw()?;
    flow_chart.draw_series(LineSeries::new(
        reports
            .iter()
            .map(|r| (u32::from(r.input.hour()), r.output.flow)),
        &BLUE,
    ))?;

    let mut occupancy_chart = ChartBuilder::on(&lower)
        .caption(format!("Predicted occupancy: {}", title), ("sans-serif", 20))
        .margin(20)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(0u32..last_hour, 0f64..max_occupancy)?;
    occupancy_chart
        .configure_mesh()
        .x_desc("Hour")
        .y_desc("Occupancy (%)")
        .draw()?;
    occupancy_chart.draw_series(LineSeries::new(
        reports
            .iter()
            .map(|r| (u32::from(r.input.hour()), r.output.occupancy)),
        &BLACK,
    ))?;
    occupancy_chart.draw_series(reports.iter().map(|r| {
        Circle::new(
            (u32::from(r.input.hour()), r.output.occupancy),
            5,
            status_rgb(r.color()).filled(),
        )
    }))?;

    root.present()?;
    Ok(())
}
