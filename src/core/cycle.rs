use bon::Builder;
use chrono::{Local, NaiveDateTime};
use enumset::EnumSet;

use crate::{
    core::{
        aggregate::Aggregation,
        collector::collect,
        report::{Report, ReportField},
        sample::{AggregateSample, Estimation},
        source::TelemetrySource,
    },
    error::CycleError,
    lock::Exclusion,
    prelude::*,
};

/// Destination of the status reports.
pub trait ReportSink {
    /// Deliver the report in a single attempt.
    fn send(&self, report: &Report) -> Result<(), CycleError>;
}

/// Immutable settings of the pipeline.
#[must_use]
#[derive(Clone, Debug, Builder)]
pub struct Settings {
    #[builder(default)]
    pub aggregation: Aggregation,

    #[builder(default)]
    pub estimation: Estimation,

    #[builder(default)]
    pub fields: EnumSet<ReportField>,
}

/// Run the whole pipeline once and upload the report.
///
/// The timestamp is taken by the caller so that the report stays consistent
/// no matter how long the collection takes.
#[instrument(skip_all, fields(timestamp = %timestamp))]
pub fn run(
    source: &impl TelemetrySource,
    sink: &(impl ReportSink + ?Sized),
    settings: &Settings,
    timestamp: NaiveDateTime,
) -> Result<Report, CycleError> {
    let telemetry =
        collect(source, settings.aggregation, settings.fields.contains(ReportField::Battery))?;
    let pv = telemetry.generation.aggregate()?;
    let sample = AggregateSample::derive(
        &pv,
        &telemetry.meter,
        telemetry.storage.as_ref(),
        settings.estimation,
    );
    let report = Report::build(timestamp, &sample, settings.fields);
    debug!(?report, "built the report");
    sink.send(&report)?;
    Ok(report)
}

/// Run the cycle unless another one is still holding the exclusion.
///
/// Returns [`None`] when the cycle has been skipped.
pub fn run_exclusively<E: Exclusion>(
    exclusion: &E,
    source: &impl TelemetrySource,
    sink: &(impl ReportSink + ?Sized),
    settings: &Settings,
) -> Result<Option<Report>> {
    let Some(_guard) = exclusion.try_acquire()? else {
        info!("another cycle is still running, skipping");
        return Ok(None);
    };
    let timestamp = Local::now().naive_local();
    Ok(Some(run(source, sink, settings, timestamp)?))
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use chrono::NaiveDate;

    use super::*;
    use crate::{
        core::{
            load::LoadEstimation,
            reading::StorageReading,
            sign::Polarity,
            source::fake::FakeSource,
        },
        lock::LockFile,
        quantity::{energy::WattHours, percent::Percent, power::Watts},
    };

    #[derive(Default)]
    struct FakeSink {
        reports: RefCell<Vec<Report>>,
        is_failing: bool,
    }

    impl ReportSink for FakeSink {
        fn send(&self, report: &Report) -> Result<(), CycleError> {
            if self.is_failing {
                return Err(CycleError::UploadFailed("fake failure".to_string()));
            }
            self.reports.borrow_mut().push(report.clone());
            Ok(())
        }
    }

    /// Exclusion that tracks whether it is held.
    #[derive(Default)]
    struct Flag(Cell<bool>);

    struct FlagGuard<'a>(&'a Cell<bool>);

    impl Drop for FlagGuard<'_> {
        fn drop(&mut self) {
            self.0.set(false);
        }
    }

    impl<'a> Exclusion for &'a Flag {
        type Guard = FlagGuard<'a>;

        fn try_acquire(&self) -> Result<Option<Self::Guard>> {
            let flag: &'a Flag = *self;
            if flag.0.replace(true) { Ok(None) } else { Ok(Some(FlagGuard(&flag.0))) }
        }
    }

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(9, 55, 0).unwrap()
    }

    #[test]
    fn test_per_device_cycle() -> Result<(), CycleError> {
        let source = FakeSource::with_meter(Watts(200.0))
            .with_device(1, 7, Watts(500.0), WattHours(1500.0))
            .with_device(2, 3, Watts(900.0), WattHours(9000.0))
            .with_device(3, 7, Watts(300.0), WattHours(500.0));
        let sink = FakeSink::default();
        let settings = Settings::builder().fields(ReportField::NetGridPower.into()).build();

        let report = run(&source, &sink, &settings, timestamp())?;
        assert_eq!(report.generation_power, 800);
        assert_eq!(report.consumption_power, 1000);
        assert_eq!(report.net_grid_power, Some(200));
        assert_eq!(report.voltage, Some(230.0));
        assert_eq!(report.generation_energy, None);
        assert_eq!(sink.reports.borrow().as_slice(), [report]);
        Ok(())
    }

    #[test]
    fn test_battery_cycle() -> Result<(), CycleError> {
        let mut source = FakeSource::with_meter(Watts(-300.0))
            .with_device(1, 7, Watts(100.0), WattHours(1500.0));
        source.storage =
            Some(StorageReading { power: Some(Watts(150.0)), state_of_charge: Some(Percent(140.0)) });
        let settings = Settings::builder()
            .fields(ReportField::Battery | ReportField::NetGridPower)
            .estimation(Estimation::builder().load(LoadEstimation::PowerBalance).build())
            .build();

        let report = run(&source, &FakeSink::default(), &settings, timestamp())?;
        assert_eq!(report.consumption_power, 0);
        assert_eq!(report.battery_power, Some(-150));
        assert_eq!(report.battery_soc, None);
        Ok(())
    }

    #[test]
    fn test_inverted_polarity_cycle() -> Result<(), CycleError> {
        let source =
            FakeSource::with_meter(Watts(300.0)).with_device(1, 7, Watts(100.0), WattHours(1500.0));
        let settings = Settings::builder()
            .fields(ReportField::NetGridPower.into())
            .estimation(Estimation::builder().polarity(Polarity::Inverted).build())
            .build();
        let report = run(&source, &FakeSink::default(), &settings, timestamp())?;
        assert_eq!(report.net_grid_power, Some(-300));
        assert_eq!(report.consumption_power, 0);
        Ok(())
    }

    #[test]
    fn test_upload_failure() {
        let source =
            FakeSource::with_meter(Watts(200.0)).with_device(1, 7, Watts(500.0), WattHours(1500.0));
        let sink = FakeSink { is_failing: true, ..FakeSink::default() };
        let result = run(&source, &sink, &Settings::builder().build(), timestamp());
        assert!(matches!(result, Err(CycleError::UploadFailed(_))));
    }

    #[test]
    fn test_held_exclusion_skips_the_cycle() -> Result {
        let flag = Flag::default();
        let _held = (&flag).try_acquire()?;
        let source =
            FakeSource::with_meter(Watts(200.0)).with_device(1, 7, Watts(500.0), WattHours(1500.0));
        let sink = FakeSink::default();

        let outcome = run_exclusively(&&flag, &source, &sink, &Settings::builder().build())?;
        assert!(outcome.is_none());
        assert_eq!(source.n_calls.get(), 0);
        assert!(sink.reports.borrow().is_empty());
        Ok(())
    }

    #[test]
    fn test_empty_discovery_releases_the_exclusion() {
        let flag = Flag::default();
        let source = FakeSource::with_meter(Watts(200.0));
        let sink = FakeSink::default();

        let error = run_exclusively(&&flag, &source, &sink, &Settings::builder().build())
            .expect_err("the cycle should fail");
        assert!(matches!(error.downcast_ref::<CycleError>(), Some(CycleError::NoActiveDevices(_))));
        assert!(sink.reports.borrow().is_empty());
        assert!(!flag.0.get());
    }

    #[test]
    fn test_lock_file_is_released_after_the_cycle() -> Result {
        let directory = tempfile::tempdir()?;
        let lock = LockFile::new(directory.path().join("pvrelay.lock"));
        let source =
            FakeSource::with_meter(Watts(200.0)).with_device(1, 7, Watts(500.0), WattHours(1500.0));
        let sink = FakeSink::default();

        assert!(run_exclusively(&lock, &source, &sink, &Settings::builder().build())?.is_some());
        assert!(lock.try_acquire()?.is_some());
        Ok(())
    }
}
