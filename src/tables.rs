use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    core::{cycle::ReportSink, report::Report},
    error::CycleError,
    prelude::*,
};

pub fn build_report_table(report: &Report) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec!["Code", "Field", "Value"]);

    let mut add_row = |code: &str, field: &str, value: Option<String>| {
        let value_cell = value.map_or_else(
            || Cell::new("—").add_attribute(Attribute::Dim),
            |value| Cell::new(value).fg(Color::Green),
        );
        table.add_row(vec![
            Cell::new(code).add_attribute(Attribute::Dim),
            Cell::new(field),
            value_cell.set_alignment(CellAlignment::Right),
        ]);
    };
    add_row("d", "Date", Some(report.date.format("%Y-%m-%d").to_string()));
    add_row("t", "Time", Some(report.time.format("%H:%M").to_string()));
    add_row("v1", "Generation energy", report.generation_energy.map(|value| format!("{value} Wh")));
    add_row("v2", "Generation power", Some(format!("{} W", report.generation_power)));
    add_row(
        "v3",
        "Consumption energy",
        report.consumption_energy.map(|value| format!("{value} Wh")),
    );
    add_row("v4", "Consumption power", Some(format!("{} W", report.consumption_power)));
    add_row("v6", "Voltage", report.voltage.map(|value| format!("{value:.1} V")));
    add_row("v7", "Frequency", report.frequency.map(|value| format!("{value:.2} Hz")));
    add_row("v8", "Net grid power", report.net_grid_power.map(|value| format!("{value} W")));
    add_row("v10", "Battery power", report.battery_power.map(|value| format!("{value} W")));
    add_row("v11", "Battery charge", report.battery_soc.map(|value| format!("{value} %")));
    add_row("c1", "Cumulative", report.is_cumulative.map(|value| value.to_string()));
    table
}

/// Prints the report instead of uploading it.
pub struct DryRun;

impl ReportSink for DryRun {
    fn send(&self, report: &Report) -> Result<(), CycleError> {
        info!("dry run, skipping the upload");
        println!("{}", build_report_table(report));
        Ok(())
    }
}
