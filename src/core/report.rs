use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use enumset::EnumSet;
use serde::{Serialize, Serializer};
use serde_with::serde_as;

use crate::core::sample::AggregateSample;

/// Optional field groups of the status report.
#[derive(Debug, clap::ValueEnum, enumset::EnumSetType)]
pub enum ReportField {
    /// Generation and consumption energy since midnight, flagged as cumulative.
    DailyEnergy,

    Frequency,

    NetGridPower,

    /// Battery power and state of charge.
    Battery,
}

/// Status report in the PVOutput `addstatus` form encoding.
#[must_use]
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    #[serde(rename = "d", serialize_with = "serialize_date")]
    pub date: NaiveDate,

    #[serde(rename = "t", serialize_with = "serialize_time")]
    pub time: NaiveTime,

    /// Generation energy, watt-hours.
    #[serde(rename = "v1", skip_serializing_if = "Option::is_none")]
    pub generation_energy: Option<i64>,

    /// Generation power, watts.
    #[serde(rename = "v2")]
    pub generation_power: i64,

    /// Consumption energy, watt-hours.
    #[serde(rename = "v3", skip_serializing_if = "Option::is_none")]
    pub consumption_energy: Option<i64>,

    /// Consumption power, watts.
    #[serde(rename = "v4")]
    pub consumption_power: i64,

    #[serde(rename = "v6", skip_serializing_if = "Option::is_none")]
    pub voltage: Option<f64>,

    #[serde(rename = "v7", skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,

    /// Positive when importing, watts.
    #[serde(rename = "v8", skip_serializing_if = "Option::is_none")]
    pub net_grid_power: Option<i64>,

    /// Positive when charging, watts.
    #[serde(rename = "v10", skip_serializing_if = "Option::is_none")]
    pub battery_power: Option<i64>,

    /// State of charge, percent.
    #[serde(rename = "v11", skip_serializing_if = "Option::is_none")]
    pub battery_soc: Option<i64>,

    /// Energy values are totals since midnight rather than deltas.
    #[serde_as(as = "Option<serde_with::BoolFromInt>")]
    #[serde(rename = "c1", skip_serializing_if = "Option::is_none")]
    pub is_cumulative: Option<bool>,
}

impl Report {
    /// Map the sample onto the report, keeping only the enabled groups with known values.
    pub fn build(
        timestamp: NaiveDateTime,
        sample: &AggregateSample,
        fields: EnumSet<ReportField>,
    ) -> Self {
        let has_daily_energy = fields.contains(ReportField::DailyEnergy);
        let has_battery = fields.contains(ReportField::Battery);
        Self {
            date: timestamp.date(),
            time: timestamp.time(),
            generation_energy: sample
                .pv_energy
                .filter(|_| has_daily_energy)
                .map(|energy| whole(energy.0)),
            generation_power: whole(sample.pv_power.0),
            consumption_energy: sample
                .load_energy
                .filter(|_| has_daily_energy)
                .map(|energy| whole(energy.0)),
            consumption_power: whole(sample.load_power.0),
            voltage: sample.voltage.map(|voltage| voltage.rounded().0),
            frequency: sample
                .frequency
                .filter(|_| fields.contains(ReportField::Frequency))
                .map(|frequency| frequency.rounded().0),
            net_grid_power: fields
                .contains(ReportField::NetGridPower)
                .then(|| whole(sample.grid_power.0)),
            battery_power: sample
                .battery_power
                .filter(|_| has_battery)
                .map(|power| whole(power.0)),
            battery_soc: sample.battery_soc.filter(|_| has_battery).map(|soc| whole(soc.0)),
            is_cumulative: has_daily_energy.then_some(true),
        }
    }
}

/// Round to the nearest integer, half away from zero.
#[expect(clippy::cast_possible_truncation)]
fn whole(value: f64) -> i64 {
    value.round() as i64
}

fn serialize_date<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&date.format("%Y%m%d"))
}

fn serialize_time<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&time.format("%H:%M"))
}
