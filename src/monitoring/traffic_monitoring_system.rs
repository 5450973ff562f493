use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::config::DashboardConfig;
use crate::error::Result;
use crate::flow_analyzer::categorical_encoder::DetectorEncoder;
use crate::flow_analyzer::model_registry::ModelRegistry;
use crate::flow_analyzer::status_classifier::status_rules;
use crate::flow_analyzer::traffic_analyzer::{hourly_forecast, run_prediction, PredictionReport};
use crate::global_variables::DETECTOR_ENCODER_FILE;
use crate::monitoring::forecast_chart::draw_hourly_forecast;
use crate::shared_data::{current_timestamp, DayOfWeek, ModelSelection, PredictionInput, TrafficStatus};

/// One row of the prediction history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub timestamp: u64,
    pub model: ModelSelection,
    pub day: DayOfWeek,
    pub hour: u8,
    pub detector_id: String,
    pub flow: f64,
    pub occupancy: f64,
    pub status: TrafficStatus,
}

impl PredictionRecord {
    pub fn from_report(report: &PredictionReport, timestamp: u64) -> Self {
        Self {
            timestamp,
            model: report.model,
            day: report.input.day,
            hour: report.input.hour(),
            detector_id: report.input.detector_id.clone(),
            flow: report.output.flow,
            occupancy: report.output.occupancy,
            status: report.status,
        }
    }
}

/// Appends a record, writing the header only when the file is new or empty.
pub fn log_to_csv<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    let needs_header = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    wtr.serialize(record)?;
    wtr.flush()?;
    Ok(())
}

/// A missing history file is an empty history.
pub fn read_history(path: &Path) -> Result<Vec<PredictionRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut rdr = csv::Reader::from_reader(File::open(path)?);
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: PredictionRecord = result?;
        records.push(record);
    }
    Ok(records)
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    pub total: usize,
    pub per_status: Vec<(TrafficStatus, usize)>,
    pub mean_flow: f64,
    pub mean_occupancy: f64,
}

pub fn summarize_history(records: &[PredictionRecord]) -> HistorySummary {
    let per_status = TrafficStatus::ALL
        .iter()
        .map(|&status| (status, records.iter().filter(|r| r.status == status).count()))
        .collect();
    let (mean_flow, mean_occupancy) = if records.is_empty() {
        (0.0, 0.0)
    } else {
        let n = records.len() as f64;
        (
            records.iter().map(|r| r.flow).sum::<f64>() / n,
            records.iter().map(|r| r.occupancy).sum::<f64>() / n,
        )
    };
    HistorySummary {
        total: records.len(),
        per_status,
        mean_flow,
        mean_occupancy,
    }
}

pub fn format_report(report: &PredictionReport) -> String {
    format!(
        "Analysis complete!\n\
         Predicted flow:  {} vehicles\n\
         Road occupancy:  {}\n\
         Model used:      {}\n\
         STATUS: {} [{}]\n\
         Interpretation: {}",
        report.displayed_flow(),
        report.displayed_occupancy(),
        report.model,
        report.status,
        report.color(),
        report.interpretation()
    )
}

/// Session state of the interactive dashboard.
pub struct Dashboard {
    config: DashboardConfig,
    encoder: DetectorEncoder,
    registry: ModelRegistry,
    model: ModelSelection,
    day: DayOfWeek,
    hour: u8,
    detector_id: String,
}

impl Dashboard {
    /// Loads the detector encoder (and, if configured, every model). Failure here is fatal.
    pub fn start(config: DashboardConfig) -> Result<Self> {
        let encoder = DetectorEncoder::load(&config.model_dir.join(DETECTOR_ENCODER_FILE))?;
        let mut registry = ModelRegistry::from_dir(config.model_dir.clone());
        if config.preload_models {
            registry.preload_all()?;
        }
        Ok(Self::with_parts(config, encoder, registry))
    }

    pub fn with_parts(config: DashboardConfig, encoder: DetectorEncoder, registry: ModelRegistry) -> Self {
        let detector_id = encoder
            .list_known_detectors()
            .first()
            .cloned()
            .unwrap_or_default();
        Self {
            model: config.default_model,
            day: config.default_day,
            hour: config.default_hour.min(23),
            config,
            encoder,
            registry,
            detector_id,
        }
    }

    fn current_input(&self) -> Result<PredictionInput> {
        PredictionInput::new(self.day, self.hour, self.detector_id.clone())
    }

    /// Runs the pipeline for the current selection and appends it to the history.
    pub fn predict(&mut self) -> Result<PredictionReport> {
        let input = self.current_input()?;
        let report = run_prediction(
            &self.encoder,
            &mut self.registry,
            &self.config.thresholds,
            self.model,
            &input,
        )?;
        let record = PredictionRecord::from_report(&report, current_timestamp());
        if let Err(e) = log_to_csv(&self.config.history_file, &record) {
            log::error!("Error logging prediction: {}", e);
        }
        Ok(report)
    }

    pub fn forecast_day(&mut self) -> Result<Vec<PredictionReport>> {
        hourly_forecast(
            &self.encoder,
            &mut self.registry,
            &self.config.thresholds,
            self.model,
            self.day,
            &self.detector_id,
        )
    }

    fn selection_line(&self) -> String {
        format!(
            "Model: {} | Day: {} | Hour: {}:00 | Detector: {}",
            self.model, self.day, self.hour, self.detector_id
        )
    }

    /// Menu loop over any input/output pair. Returns on "Exit" or end of input.
    pub fn run_cli<R: BufRead, W: Write>(&mut self, input: &mut R, out: &mut W) -> io::Result<()> {
        loop {
            writeln!(out, "\nRotterdam Traffic Predictor")?;
            writeln!(out, "{}", self.selection_line())?;
            writeln!(out, "1. Choose Model")?;
            writeln!(out, "2. Choose Day")?;
            writeln!(out, "3. Choose Hour")?;
            writeln!(out, "4. Choose Detector")?;
            writeln!(out, "5. Predict Now")?;
            writeln!(out, "6. Hourly Forecast")?;
            writeln!(out, "7. Show Prediction History")?;
            writeln!(out, "8. Generate Report")?;
            writeln!(out, "9. Show Status Rules")?;
            writeln!(out, "10. About the Models")?;
            writeln!(out, "0. Exit")?;
            let Some(line) = prompt(input, out, "Enter your choice: ")? else {
                break;
            };
            match line.parse::<u32>().unwrap_or(u32::MAX) {
                1 => self.choose_model(input, out)?,
                2 => self.choose_day(input, out)?,
                3 => self.choose_hour(input, out)?,
                4 => self.choose_detector(input, out)?,
                5 => match self.predict() {
                    Ok(report) => writeln!(out, "{}", format_report(&report))?,
                    Err(e) => report_error(out, &e)?,
                },
                6 => self.show_forecast(out)?,
                7 => self.show_history(out)?,
                8 => self.show_summary(out)?,
                9 => {
                    writeln!(out, "Status rules:")?;
                    for rule in status_rules(&self.config.thresholds) {
                        writeln!(out, "- {}", rule)?;
                    }
                }
                10 => {
                    for model in ModelSelection::ALL {
                        writeln!(out, "- {}: {}", model, model.description())?;
                    }
                }
                0 => {
                    writeln!(out, "Exiting dashboard.")?;
                    break;
                }
                _ => writeln!(out, "Invalid choice. Try again.")?,
            }
        }
        Ok(())
    }

    fn choose_model<R: BufRead, W: Write>(&mut self, input: &mut R, out: &mut W) -> io::Result<()> {
        for (i, model) in ModelSelection::ALL.iter().enumerate() {
            writeln!(out, "{}. {}", i + 1, model)?;
        }
        let Some(line) = prompt(input, out, "Select model (number or name): ")? else {
            return Ok(());
        };
        let chosen = match line.parse::<usize>() {
            Ok(n) if (1..=ModelSelection::ALL.len()).contains(&n) => Ok(ModelSelection::ALL[n - 1]),
            _ => line.parse::<ModelSelection>(),
        };
        match chosen {
            Ok(model) => self.model = model,
            Err(e) => report_error(out, &e)?,
        }
        Ok(())
    }

    fn choose_day<R: BufRead, W: Write>(&mut self, input: &mut R, out: &mut W) -> io::Result<()> {
        let Some(line) = prompt(input, out, "Enter day (e.g. Wednesday, wed, or 0-6): ")? else {
            return Ok(());
        };
        match line.parse::<DayOfWeek>() {
            Ok(day) => self.day = day,
            Err(e) => report_error(out, &e)?,
        }
        Ok(())
    }

    fn choose_hour<R: BufRead, W: Write>(&mut self, input: &mut R, out: &mut W) -> io::Result<()> {
        let Some(line) = prompt(input, out, "Enter hour (0-23): ")? else {
            return Ok(());
        };
        match line.parse::<u8>() {
            Ok(hour) if hour <= 23 => self.hour = hour,
            _ => writeln!(out, "Error: hour must be a whole number from 0 to 23.")?,
        }
        Ok(())
    }

    fn choose_detector<R: BufRead, W: Write>(&mut self, input: &mut R, out: &mut W) -> io::Result<()> {
        for (i, id) in self.encoder.list_known_detectors().iter().enumerate() {
            writeln!(out, "{}. {}", i + 1, id)?;
        }
        let Some(line) = prompt(input, out, "Select detector (number or id): ")? else {
            return Ok(());
        };
        // An exact id wins over a list position, so numeric ids stay selectable.
        if self.encoder.detector_to_code(&line).is_ok() {
            self.detector_id = line;
            return Ok(());
        }
        let by_number = line
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.encoder.list_known_detectors().get(i).cloned());
        match by_number {
            Some(id) => self.detector_id = id,
            None => report_error(out, &crate::error::PredictorAppError::UnknownDetector(line))?,
        }
        Ok(())
    }

    fn show_forecast<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        let reports = match self.forecast_day() {
            Ok(reports) => reports,
            Err(e) => return report_error(out, &e),
        };
        writeln!(out, "Hour   Flow  Occupancy  Status")?;
        for report in &reports {
            writeln!(
                out,
                "{:>2}:00 {:>6} {:>10}  {}",
                report.input.hour(),
                report.displayed_flow(),
                report.displayed_occupancy(),
                report.status
            )?;
        }
        match draw_hourly_forecast(&reports, &self.config.chart_file) {
            Ok(()) => writeln!(out, "Chart saved to {}", self.config.chart_file.display())?,
            Err(e) => report_error(out, &e)?,
        }
        Ok(())
    }

    fn show_history<W: Write>(&self, out: &mut W) -> io::Result<()> {
        match read_history(&self.config.history_file) {
            Ok(records) if records.is_empty() => writeln!(out, "No predictions recorded yet.")?,
            Ok(records) => {
                writeln!(out, "Prediction History:")?;
                for r in records {
                    writeln!(
                        out,
                        "[{}] {} {} {}:00 {} -> flow {:.0}, occupancy {:.2}%, {}",
                        r.timestamp, r.model, r.day, r.hour, r.detector_id, r.flow, r.occupancy, r.status
                    )?;
                }
            }
            Err(e) => report_error(out, &e)?,
        }
        Ok(())
    }

    fn show_summary<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let records = match read_history(&self.config.history_file) {
            Ok(records) => records,
            Err(e) => return report_error(out, &e),
        };
        let summary = summarize_history(&records);
        writeln!(out, "Report Summary:")?;
        writeln!(out, "Predictions: {} records", summary.total)?;
        for (status, count) in &summary.per_status {
            writeln!(out, "{}: {}", status, count)?;
        }
        writeln!(out, "Mean flow: {:.1} vehicles", summary.mean_flow)?;
        writeln!(out, "Mean occupancy: {:.2}%", summary.mean_occupancy)?;
        Ok(())
    }
}

fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, message: &str) -> io::Result<Option<String>> {
    write!(out, "{}", message)?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn report_error<W: Write>(out: &mut W, error: &crate::error::PredictorAppError) -> io::Result<()> {
    log::warn!("Request failed: {}", error);
    writeln!(out, "Error: {}", error)?;
    if error.is_resource_error() {
        writeln!(out, "Check that the model directory contains the exported artifacts.")?;
    }
    Ok(())
}
