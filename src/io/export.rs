//! CSV export for episode step records.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::error::Result;
use crate::sim::types::StepRecord;

/// Column header for CSV telemetry export.
const HEADER: &str = "time_step,absolute_hour,action,effective_tier,high_price,reward,\
                       sale_price,outdoor_temp,generation,total_load,tcl_budget,\
                       tcl_consumption,mean_tcl_soc,battery_charged,battery_discharged,\
                       battery_soc,energy_sold,energy_bought,grid_buy_price,\
                       grid_sell_price,pending_deferrals";

/// Exports step records to a CSV file at the given path.
///
/// Writes a header row followed by one data row per record. Produces
/// deterministic output for identical inputs.
///
/// # Arguments
///
/// * `records` - Settled hours of one episode
/// * `path` - Output file path
///
/// # Errors
///
/// Returns `SimError::Io` or `SimError::Csv` if file creation or writing fails.
pub fn export_csv(records: &[StepRecord], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_csv(records, io::BufWriter::new(file))
}

/// Writes step records as CSV to any writer.
///
/// # Errors
///
/// Returns `SimError::Io` or `SimError::Csv` if writing fails.
pub fn write_csv(records: &[StepRecord], writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in records {
        let mean_soc = if r.tcl_socs.is_empty() {
            0.0
        } else {
            r.tcl_socs.iter().sum::<f64>() / r.tcl_socs.len() as f64
        };
        wtr.write_record(&[
            r.time_step.to_string(),
            r.absolute_hour.to_string(),
            r.action.index().to_string(),
            r.effective_price_tier.to_string(),
            r.high_price.to_string(),
            format!("{:.6}", r.reward),
            format!("{:.4}", r.sale_price),
            format!("{:.4}", r.outdoor_temp),
            format!("{:.4}", r.generation),
            format!("{:.4}", r.total_load),
            format!("{:.4}", r.tcl_budget),
            format!("{:.4}", r.tcl_consumption),
            format!("{:.4}", mean_soc),
            format!("{:.4}", r.battery_charged),
            format!("{:.4}", r.battery_discharged),
            format!("{:.4}", r.battery_soc),
            format!("{:.4}", r.energy_sold),
            format!("{:.4}", r.energy_bought),
            format!("{:.4}", r.grid_buy_price),
            format!("{:.4}", r.grid_sell_price),
            r.pending_deferrals.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
