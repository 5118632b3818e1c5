//! Monitoring session orchestration

use crate::config::MonitorConfig;
use crate::dispatch::{DispatchError, DispatchRequest, EmergencyDispatcher};
use crate::summary::SessionSummary;
use crate::SessionError;
use alerting::{Alert, AlertBus, AlertEngine, AlertEvent, AlertId, ReadingOutcome};
use chrono::{DateTime, Utc};
use correlation::{CorrelationAnalyzer, CorrelationResult};
use data_validator::Validator;
use fatigue::{FatigueClassifier, FatigueState};
use ring_buffer::RingBuffer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use telemetry::{DriverSample, Reading, Sample, SourceKind, VehicleSample};
use threshold_rules::{rolling_seat_pressure, ThresholdEvaluator};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Sample and reading counters for a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCounters {
    pub driver_samples: u64,
    pub vehicle_samples: u64,
    pub rejected_samples: u64,
    pub readings: u64,
    pub paired_readings: u64,
}

/// Diagnostic view of a session's inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDiagnostics {
    /// Sources not heard from within the stale interval
    pub stale_sources: Vec<SourceKind>,
    /// Source of the sample waiting for its counterpart
    pub pending: Option<SourceKind>,
    pub window_len: usize,
    pub window_capacity: usize,
    pub counters: SessionCounters,
}

/// Result of an emergency declaration
#[derive(Debug, Clone)]
pub struct EmergencyOutcome {
    /// The emergency alert, raised locally in every case
    pub alert: Alert,
    /// Whether the dispatch collaborator accepted the request
    pub dispatch: Result<(), DispatchError>,
}

/// Monitoring state for one driver/vehicle pairing, from check-in to check-out.
///
/// All mutation goes through `&mut self`; the owner serialises access.
pub struct MonitoringSession {
    id: Uuid,
    driver_id: String,
    vehicle_id: String,
    checked_in_at: DateTime<Utc>,
    checked_out_at: Option<DateTime<Utc>>,
    config: MonitorConfig,

    validator: Validator,
    evaluator: ThresholdEvaluator,
    classifier: FatigueClassifier,
    analyzer: CorrelationAnalyzer,
    engine: AlertEngine,

    /// Rolling window shared by the classifier and the analyzer
    window: RingBuffer<Reading>,
    /// Sample waiting for a counterpart from the other stream
    pending: Option<Sample>,
    last_driver: Option<DriverSample>,
    last_vehicle: Option<VehicleSample>,
    correlations: Vec<CorrelationResult>,
    counters: SessionCounters,

    bus: AlertBus,
    dispatcher: Arc<dyn EmergencyDispatcher>,
}

impl MonitoringSession {
    /// Check in a driver
    pub fn new(
        driver_id: impl Into<String>,
        vehicle_id: impl Into<String>,
        config: MonitorConfig,
        bus: AlertBus,
        dispatcher: Arc<dyn EmergencyDispatcher>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let id = Uuid::new_v4();
        let window = RingBuffer::new(config.window_capacity)
            .map_err(|e| SessionError::Config(e.to_string()))?;
        let analyzer = CorrelationAnalyzer::new(config.correlation.clone());
        let correlations = analyzer.analyze(&window);
        let driver_id = driver_id.into();
        let vehicle_id = vehicle_id.into();

        info!(session_id = %id, %driver_id, %vehicle_id, "driver checked in");

        Ok(Self {
            id,
            driver_id,
            vehicle_id,
            checked_in_at: Utc::now(),
            checked_out_at: None,
            validator: Validator::new(config.validation.clone()),
            evaluator: ThresholdEvaluator::new(config.thresholds.clone()),
            classifier: FatigueClassifier::new(config.fatigue.clone()),
            engine: AlertEngine::new(id, config.alert_config()),
            analyzer,
            window,
            pending: None,
            last_driver: None,
            last_vehicle: None,
            correlations,
            counters: SessionCounters::default(),
            bus,
            dispatcher,
            config,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn driver_id(&self) -> &str {
        &self.driver_id
    }

    pub fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    pub fn is_closed(&self) -> bool {
        self.checked_out_at.is_some()
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.is_closed() {
            Err(SessionError::SessionClosed(self.id))
        } else {
            Ok(())
        }
    }

    /// Accept a sample from either stream.
    ///
    /// Invalid samples are dropped without touching fatigue or alert state.
    pub fn ingest(&mut self, sample: Sample) -> Result<(), SessionError> {
        self.ensure_open()?;
        let source = sample.source();

        if let Err(err) = self.check(&sample) {
            self.counters.rejected_samples += 1;
            metrics::counter!("monitor_samples_rejected_total", "source" => source.as_str())
                .increment(1);
            warn!(
                session_id = %self.id,
                source = source.as_str(),
                timestamp_ms = sample.timestamp_ms(),
                error = %err,
                "sample rejected"
            );
            return Err(err.into());
        }

        metrics::counter!("monitor_samples_total", "source" => source.as_str()).increment(1);
        match &sample {
            Sample::Driver(driver) => {
                self.counters.driver_samples += 1;
                self.last_driver = Some(driver.clone());
            }
            Sample::Vehicle(vehicle) => {
                self.counters.vehicle_samples += 1;
                self.last_vehicle = Some(vehicle.clone());
            }
        }

        for reading in self.pair(sample) {
            self.process_reading(reading);
        }
        Ok(())
    }

    fn check(&self, sample: &Sample) -> Result<(), data_validator::ValidationError> {
        self.validator.validate(sample)?;
        if let (Sample::Vehicle(current), Some(previous)) = (sample, &self.last_vehicle) {
            self.validator.validate_counters(previous, current)?;
        }
        Ok(())
    }

    /// Pair the sample with the pending one, or hold it and flush the pending
    /// sample as an unpaired reading.
    fn pair(&mut self, sample: Sample) -> Vec<Reading> {
        let tolerance = self.config.pairing_tolerance_ms;
        match self.pending.take() {
            Some(pending)
                if pending.source() != sample.source()
                    && pending.timestamp_ms().abs_diff(sample.timestamp_ms()) <= tolerance =>
            {
                vec![reading_from([pending, sample])]
            }
            Some(pending) => {
                debug!(
                    session_id = %self.id,
                    source = pending.source().as_str(),
                    "flushing unpaired sample"
                );
                self.pending = Some(sample);
                vec![reading_from([pending])]
            }
            None => {
                self.pending = Some(sample);
                Vec::new()
            }
        }
    }

    /// Complete a held sample as an unpaired reading
    pub fn flush_pending(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        if let Some(pending) = self.pending.take() {
            self.process_reading(reading_from([pending]));
        }
        Ok(())
    }

    fn process_reading(&mut self, mut reading: Reading) {
        let seat_avg = rolling_seat_pressure(self.window.iter());
        reading.flags = self.evaluator.evaluate(&reading, seat_avg);

        self.counters.readings += 1;
        if reading.is_paired() {
            self.counters.paired_readings += 1;
        }

        self.window.push(reading.clone());
        let transition = self.classifier.observe(&reading, &self.window);
        self.correlations = self.analyzer.analyze(&self.window);

        let events = self.engine.process(ReadingOutcome {
            reading: &reading,
            fatigue: self.classifier.state(),
            transition,
            correlations: &self.correlations,
        });

        debug!(
            session_id = %self.id,
            timestamp_ms = reading.timestamp_ms,
            paired = reading.is_paired(),
            flags = ?reading.flags,
            events = events.len(),
            "reading processed"
        );
        self.publish(events);
    }

    fn publish(&self, events: impl IntoIterator<Item = AlertEvent>) {
        for event in events {
            self.bus.publish(event);
        }
    }

    /// Snapshot of the fatigue state
    pub fn current_fatigue_state(&self) -> FatigueState {
        self.classifier.state().clone()
    }

    /// Snapshot of the open alerts
    pub fn open_alerts(&self) -> Vec<Alert> {
        self.engine.open_alerts()
    }

    /// Every alert of the session, cleared ones first
    pub fn alert_history(&self) -> Vec<Alert> {
        self.engine.all_alerts()
    }

    /// Correlation results for the current window
    pub fn correlation_snapshot(&self) -> Vec<CorrelationResult> {
        self.correlations.clone()
    }

    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    /// Mark an open alert acknowledged (it stays open)
    pub fn acknowledge_alert(&mut self, id: AlertId) -> Result<Alert, SessionError> {
        self.ensure_open()?;
        let event = self.engine.acknowledge(id, now_ms())?;
        self.publish(event);
        self.engine
            .open_alert(id)
            .cloned()
            .ok_or(SessionError::UnknownAlert(id))
    }

    /// Clear an open alert on operator request
    pub fn clear_alert(&mut self, id: AlertId) -> Result<Alert, SessionError> {
        self.ensure_open()?;
        let event = self.engine.clear(id, now_ms())?;
        let alert = event.alert.clone();
        self.publish([event]);
        Ok(alert)
    }

    /// Raise an emergency alert immediately and notify the dispatch service.
    ///
    /// The alert is raised even when dispatch fails or the session has been
    /// checked out.
    pub fn declare_emergency(&mut self, reason: &str) -> EmergencyOutcome {
        let source_sample_ms = self
            .last_driver
            .as_ref()
            .map(|d| d.timestamp_ms)
            .max(self.last_vehicle.as_ref().map(|v| v.timestamp_ms))
            .unwrap_or(0);
        let event = self.engine.declare_emergency(reason, now_ms(), source_sample_ms);
        let alert = event.alert.clone();
        self.publish([event]);

        let request = DispatchRequest {
            session_id: self.id,
            driver_id: self.driver_id.clone(),
            vehicle_id: self.vehicle_id.clone(),
            reason: reason.to_string(),
            location: self.last_vehicle.as_ref().and_then(|v| v.location.clone()),
            latest_driver: self.last_driver.clone(),
            latest_vehicle: self.last_vehicle.clone(),
            alert: alert.clone(),
            requested_at: Utc::now(),
        };
        let dispatch = self.dispatcher.dispatch(request);
        if let Err(err) = &dispatch {
            warn!(session_id = %self.id, error = %err, "emergency dispatch failed");
        }

        EmergencyOutcome { alert, dispatch }
    }

    /// Report sources that have gone quiet. Never blocks or mutates.
    pub fn diagnostics(&self, now_ms: u64) -> SessionDiagnostics {
        let baseline = self.checked_in_at.timestamp_millis().max(0) as u64;
        let last_seen = |ts: Option<u64>| ts.unwrap_or(baseline);
        let stale = |ts: u64| now_ms.saturating_sub(ts) > self.config.stale_after_ms;

        let mut stale_sources = Vec::new();
        if stale(last_seen(self.last_driver.as_ref().map(|d| d.timestamp_ms))) {
            stale_sources.push(SourceKind::Driver);
        }
        if stale(last_seen(self.last_vehicle.as_ref().map(|v| v.timestamp_ms))) {
            stale_sources.push(SourceKind::Vehicle);
        }
        if !stale_sources.is_empty() {
            debug!(session_id = %self.id, ?stale_sources, "stale source detected");
        }

        SessionDiagnostics {
            stale_sources,
            pending: self.pending.as_ref().map(|s| s.source()),
            window_len: self.window.len(),
            window_capacity: self.window.capacity(),
            counters: self.counters,
        }
    }

    /// Summary of the session so far
    pub fn summary(&self) -> SessionSummary {
        let vehicle = self.last_vehicle.as_ref();
        SessionSummary {
            session_id: self.id,
            driver_id: self.driver_id.clone(),
            vehicle_id: self.vehicle_id.clone(),
            checked_in_at: self.checked_in_at,
            checked_out_at: self.checked_out_at,
            driver_samples: self.counters.driver_samples,
            vehicle_samples: self.counters.vehicle_samples,
            rejected_samples: self.counters.rejected_samples,
            readings: self.counters.readings,
            paired_readings: self.counters.paired_readings,
            harsh_brake_events: vehicle.map_or(0, |v| v.harsh_brake_event_count),
            rapid_accel_events: vehicle.map_or(0, |v| v.rapid_accel_event_count),
            final_fatigue: self.classifier.state().level,
            alerts: self.engine.all_alerts(),
        }
    }

    /// Check out: complete any held sample, close the session and discard
    /// the rolling state. Further calls are rejected with `SessionClosed`.
    pub fn close(&mut self) -> Result<SessionSummary, SessionError> {
        self.flush_pending()?;
        self.checked_out_at = Some(Utc::now());
        let summary = self.summary();

        self.window.clear();
        self.classifier.reset();
        self.correlations = self.analyzer.analyze(&self.window);

        info!(
            session_id = %self.id,
            driver_id = %self.driver_id,
            readings = summary.readings,
            alerts = summary.alerts.len(),
            "driver checked out"
        );
        Ok(summary)
    }
}

fn reading_from<const N: usize>(samples: [Sample; N]) -> Reading {
    let mut driver = None;
    let mut vehicle = None;
    for sample in samples {
        match sample {
            Sample::Driver(d) => driver = Some(d),
            Sample::Vehicle(v) => vehicle = Some(v),
        }
    }
    Reading::new(driver, vehicle)
}

fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{ChannelDispatcher, LoggingDispatcher};
    use alerting::{AlertChange, AlertKind, Severity};
    use correlation::{CorrelationClass, Confidence};
    use fatigue::FatigueLevel;
    use telemetry::SteeringStability;

    fn session_with(dispatcher: Arc<dyn EmergencyDispatcher>) -> (MonitoringSession, AlertBus) {
        let bus = AlertBus::default();
        let session = MonitoringSession::new(
            "DR-001",
            "TRK-A001",
            MonitorConfig::default(),
            bus.clone(),
            dispatcher,
        )
        .unwrap();
        (session, bus)
    }

    fn session() -> MonitoringSession {
        session_with(Arc::new(LoggingDispatcher)).0
    }

    fn driver(ts: u64, hr: i32) -> Sample {
        Sample::Driver(DriverSample {
            timestamp_ms: ts,
            heart_rate_bpm: hr,
            ..Default::default()
        })
    }

    fn vehicle(ts: u64, steering: SteeringStability) -> Sample {
        Sample::Vehicle(VehicleSample {
            timestamp_ms: ts,
            steering,
            ..Default::default()
        })
    }

    /// One 5 s tick: driver sample then vehicle sample 100 ms later
    fn tick(session: &mut MonitoringSession, n: u64, hr: i32, steering: SteeringStability) {
        let ts = n * 5_000;
        session.ingest(driver(ts, hr)).unwrap();
        session.ingest(vehicle(ts + 100, steering)).unwrap();
    }

    fn fatigue_alert(alerts: &[Alert]) -> Option<&Alert> {
        alerts.iter().find(|a| a.kind == AlertKind::Fatigue)
    }

    #[test]
    fn test_fatigue_scenario_raise_and_clear() {
        let mut s = session();

        tick(&mut s, 1, 95, SteeringStability::Irregular);
        assert_eq!(s.current_fatigue_state().level, FatigueLevel::Normal);
        assert!(fatigue_alert(&s.open_alerts()).is_none());

        tick(&mut s, 2, 95, SteeringStability::Irregular);
        assert_eq!(s.current_fatigue_state().level, FatigueLevel::Warning);
        let open = s.open_alerts();
        let alert = fatigue_alert(&open).unwrap();
        assert_eq!(alert.severity, Severity::Warning);
        assert!(alert.cleared_at_ms.is_none());
        let id = alert.id;

        for n in 3..=5 {
            tick(&mut s, n, 72, SteeringStability::Stable);
        }
        assert_eq!(s.current_fatigue_state().level, FatigueLevel::Normal);
        assert!(fatigue_alert(&s.open_alerts()).is_none());

        let history = s.alert_history();
        let cleared = history.iter().find(|a| a.id == id).unwrap();
        assert_eq!(cleared.cleared_at_ms, Some(25_100));
    }

    #[test]
    fn test_cleared_fatigue_alert_returns_while_still_tired() {
        let (mut s, bus) = session_with(Arc::new(LoggingDispatcher));
        tick(&mut s, 1, 95, SteeringStability::Irregular);
        tick(&mut s, 2, 95, SteeringStability::Irregular);
        let first = fatigue_alert(&s.open_alerts()).unwrap().id;

        s.clear_alert(first).unwrap();
        assert!(fatigue_alert(&s.open_alerts()).is_none());
        let mut rx = bus.subscribe();

        for n in 3..=6 {
            tick(&mut s, n, 95, SteeringStability::Irregular);
        }
        assert_eq!(s.current_fatigue_state().level, FatigueLevel::Warning);
        let open = s.open_alerts();
        let again = fatigue_alert(&open).unwrap();
        assert_ne!(again.id, first);
        assert_eq!(again.raised_at_ms, 15_100);

        let mut raised = 0;
        while let Ok(event) = rx.try_recv() {
            if event.alert.kind == AlertKind::Fatigue && event.change == AlertChange::Raised {
                raised += 1;
            }
        }
        assert_eq!(raised, 1);
    }

    #[test]
    fn test_stalled_driver_stream_keeps_fatigue_warning() {
        let mut s = session();
        tick(&mut s, 1, 95, SteeringStability::Irregular);
        tick(&mut s, 2, 95, SteeringStability::Irregular);
        let id = fatigue_alert(&s.open_alerts()).unwrap().id;

        // Driver stream stalls; vehicle keeps reporting a steady drive
        for n in 3..=8 {
            s.ingest(vehicle(n * 5_000, SteeringStability::Stable)).unwrap();
        }
        s.flush_pending().unwrap();

        assert_eq!(s.diagnostics(40_000).stale_sources, vec![SourceKind::Driver]);
        assert_eq!(s.current_fatigue_state().level, FatigueLevel::Warning);
        assert_eq!(fatigue_alert(&s.open_alerts()).unwrap().id, id);

        // Clean driver data resumes: cooldown runs as usual
        for n in 9..=11 {
            tick(&mut s, n, 72, SteeringStability::Stable);
        }
        assert_eq!(s.current_fatigue_state().level, FatigueLevel::Normal);
        assert!(fatigue_alert(&s.open_alerts()).is_none());
    }

    #[test]
    fn test_invalid_sample_leaves_state_untouched() {
        let mut s = session();
        tick(&mut s, 1, 95, SteeringStability::Irregular);
        tick(&mut s, 2, 95, SteeringStability::Irregular);
        let fatigue = s.current_fatigue_state();
        let alerts = s.open_alerts();
        let diagnostics = s.diagnostics(10_000);

        for hr in [19, 251, -5, 1_000] {
            let err = s.ingest(driver(15_000, hr)).unwrap_err();
            assert!(matches!(err, SessionError::InvalidSample(_)));
        }

        assert_eq!(s.current_fatigue_state(), fatigue);
        assert_eq!(s.open_alerts(), alerts);
        let after = s.diagnostics(10_000);
        assert_eq!(after.window_len, diagnostics.window_len);
        assert_eq!(after.pending, diagnostics.pending);
        assert_eq!(after.counters.rejected_samples, 4);
    }

    #[test]
    fn test_counter_regression_rejected() {
        let mut s = session();
        let mut sample = VehicleSample {
            timestamp_ms: 1_000,
            harsh_brake_event_count: 2,
            ..Default::default()
        };
        s.ingest(Sample::Vehicle(sample.clone())).unwrap();
        sample.timestamp_ms = 6_000;
        sample.harsh_brake_event_count = 1;
        assert!(matches!(
            s.ingest(Sample::Vehicle(sample)),
            Err(SessionError::InvalidSample(_))
        ));
        assert_eq!(s.summary().harsh_brake_events, 2);
    }

    #[test]
    fn test_unpaired_samples_flushed() {
        let mut s = session();
        s.ingest(driver(1_000, 72)).unwrap();
        assert_eq!(s.counters().readings, 0);

        // Same stream again: first one completes unpaired
        s.ingest(driver(6_000, 72)).unwrap();
        assert_eq!(s.counters().readings, 1);
        assert_eq!(s.counters().paired_readings, 0);

        // Counterpart too far away: driver flushed, vehicle held
        s.ingest(vehicle(20_000, SteeringStability::Stable)).unwrap();
        assert_eq!(s.counters().readings, 2);
        assert_eq!(s.diagnostics(20_000).pending, Some(SourceKind::Vehicle));

        s.flush_pending().unwrap();
        assert_eq!(s.counters().readings, 3);
        assert_eq!(s.diagnostics(20_000).pending, None);
    }

    #[test]
    fn test_correlation_scenario() {
        let mut s = session();
        let feed = |s: &mut MonitoringSession, n: u64| {
            let ts = n * 5_000;
            s.ingest(driver(ts, 70 + n as i32)).unwrap();
            s.ingest(Sample::Vehicle(VehicleSample {
                timestamp_ms: ts + 100,
                speed_kmh: 55.0 + 2.0 * n as f64,
                ..Default::default()
            }))
            .unwrap();
        };

        for n in 0..5 {
            feed(&mut s, n);
        }
        let snapshot = s.correlation_snapshot();
        let speed = snapshot.iter().find(|r| r.pair == "heartRate_vs_speed").unwrap();
        assert_eq!(speed.samples, 5);
        assert_eq!(speed.confidence, Confidence::InsufficientData);

        for n in 5..10 {
            feed(&mut s, n);
        }
        let snapshot = s.correlation_snapshot();
        let speed = snapshot.iter().find(|r| r.pair == "heartRate_vs_speed").unwrap();
        assert_eq!(speed.samples, 10);
        assert!(speed.coefficient.is_some());
        assert_eq!(speed.classification, CorrelationClass::StrongPositive);
        assert_eq!(snapshot, s.correlation_snapshot());
    }

    #[test]
    fn test_correlation_snapshot_before_any_sample() {
        let s = session();
        let snapshot = s.correlation_snapshot();
        assert!(!snapshot.is_empty());
        assert!(snapshot.iter().all(|r| r.is_insufficient()));
    }

    #[test]
    fn test_events_published_once() {
        let (mut s, bus) = session_with(Arc::new(LoggingDispatcher));
        let mut rx = bus.subscribe();

        for n in 1..=4 {
            tick(&mut s, n, 95, SteeringStability::Irregular);
        }

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        let fatigue_raised = events
            .iter()
            .filter(|e| e.alert.kind == AlertKind::Fatigue && e.change == AlertChange::Raised)
            .count();
        assert_eq!(fatigue_raised, 1);
        // Steering stayed irregular after the warning: one corroboration
        let escalations = events
            .iter()
            .filter(|e| e.alert.kind == AlertKind::Fatigue && e.change == AlertChange::Escalated)
            .count();
        assert_eq!(escalations, 1);
        assert!(events.iter().all(|e| e.session_id == s.id()));
    }

    #[test]
    fn test_declare_emergency_bypasses_debounce() {
        let (dispatcher, mut rx) = ChannelDispatcher::channel(4);
        let (mut s, _bus) = session_with(Arc::new(dispatcher));
        s.ingest(Sample::Vehicle(VehicleSample {
            timestamp_ms: 1_000,
            location: Some("Tomei Expressway near Ebina SA".to_string()),
            ..Default::default()
        }))
        .unwrap();

        let outcome = s.declare_emergency("driver reports chest pain");
        assert!(outcome.dispatch.is_ok());
        assert_eq!(outcome.alert.severity, Severity::Emergency);
        assert_eq!(outcome.alert.source_sample_ms, 1_000);
        assert_eq!(s.current_fatigue_state().level, FatigueLevel::Normal);
        assert!(s.open_alerts().iter().any(|a| a.kind == AlertKind::Emergency));

        let request = rx.try_recv().unwrap();
        assert_eq!(request.session_id, s.id());
        assert_eq!(request.location.as_deref(), Some("Tomei Expressway near Ebina SA"));
        assert_eq!(request.reason, "driver reports chest pain");
        assert!(request.latest_vehicle.is_some());
    }

    #[test]
    fn test_emergency_raised_when_dispatch_fails() {
        let (dispatcher, rx) = ChannelDispatcher::channel(1);
        drop(rx);
        let (mut s, _bus) = session_with(Arc::new(dispatcher));

        let outcome = s.declare_emergency("SOS");
        assert_eq!(outcome.dispatch, Err(DispatchError::ChannelClosed));
        assert_eq!(outcome.alert.severity, Severity::Emergency);
        assert_eq!(s.open_alerts().len(), 1);
    }

    #[test]
    fn test_acknowledge_and_clear() {
        let mut s = session();
        let id = s.declare_emergency("SOS").alert.id;

        let acked = s.acknowledge_alert(id).unwrap();
        assert!(acked.is_acknowledged());
        assert!(acked.is_open());

        let cleared = s.clear_alert(id).unwrap();
        assert!(cleared.cleared_at_ms.is_some());
        assert!(s.open_alerts().is_empty());

        assert!(matches!(
            s.acknowledge_alert(id),
            Err(SessionError::UnknownAlert(_))
        ));
        assert!(matches!(
            s.clear_alert(Uuid::new_v4()),
            Err(SessionError::UnknownAlert(_))
        ));
    }

    #[test]
    fn test_stale_sources() {
        let mut s = session();
        s.ingest(driver(100_000, 72)).unwrap();
        s.ingest(vehicle(100_100, SteeringStability::Stable)).unwrap();

        assert!(s.diagnostics(110_000).stale_sources.is_empty());
        s.ingest(driver(120_000, 72)).unwrap();
        assert_eq!(s.diagnostics(120_000).stale_sources, vec![SourceKind::Vehicle]);
    }

    #[test]
    fn test_closed_session_rejects_ingest() {
        let mut s = session();
        tick(&mut s, 1, 72, SteeringStability::Stable);
        s.ingest(driver(10_000, 72)).unwrap();

        let summary = s.close().unwrap();
        assert_eq!(summary.readings, 2);
        assert_eq!(summary.driver_samples, 2);
        assert!(summary.checked_out_at.is_some());

        assert!(matches!(
            s.ingest(driver(15_000, 72)),
            Err(SessionError::SessionClosed(_))
        ));
        assert!(s.close().is_err());
    }
}
