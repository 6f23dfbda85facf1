//! Integration tests for the monitoring and profile screens

use chrono::{Duration, NaiveDate, Utc};
use health_monitor::core::{
    MonitorSinks, MonitoringState, ProfileController, ProfileSinks, SessionController,
    SessionSettings, START_LABEL, STOP_LABEL,
};
use health_monitor::display::{AlertLog, Color, Label};
use health_monitor::health::{
    BiologicalSex, BloodType, HealthStore, MemoryHealthStore, MetricKind, MetricSample,
    NoopHealthStore, SampleSimulator, SimulatorConfig,
};
use std::sync::Arc;
use std::thread;

struct MonitorScreen {
    heart_rate: Label,
    step_count: Label,
    button: Label,
    alerts: AlertLog,
}

fn monitor(store: Arc<dyn HealthStore>) -> (SessionController, MonitorScreen) {
    let screen = MonitorScreen {
        heart_rate: Label::new(),
        step_count: Label::new(),
        button: Label::new(),
        alerts: AlertLog::new(),
    };
    let controller = SessionController::new(
        store,
        MonitorSinks {
            heart_rate: Box::new(screen.heart_rate.clone()),
            step_count: Box::new(screen.step_count.clone()),
            button: Box::new(screen.button.clone()),
        },
        Box::new(screen.alerts.clone()),
        SessionSettings::default(),
    );
    (controller, screen)
}

#[test]
fn test_deliveries_from_producer_thread_reach_labels() {
    let store = Arc::new(MemoryHealthStore::new());
    let (mut controller, screen) = monitor(store.clone());

    controller.activate();
    controller.toggle();
    controller.process_pending();

    let producer = store.clone();
    thread::spawn(move || {
        producer.append_samples(vec![
            MetricSample::new(MetricKind::HeartRate, 61.0, Utc::now()),
            MetricSample::new(MetricKind::StepCount, 3.0, Utc::now()),
            MetricSample::new(MetricKind::StepCount, 4.0, Utc::now()),
            MetricSample::new(MetricKind::StepCount, 5.0, Utc::now()),
        ]);
    })
    .join()
    .unwrap();

    // Nothing is rendered until the UI context drains its queue.
    assert_eq!(screen.heart_rate.text(), "---");
    controller.process_pending();

    assert_eq!(screen.heart_rate.text(), "61");
    assert_eq!(screen.heart_rate.color(), Color::Red);
    assert_eq!(screen.step_count.text(), "12");
    assert_eq!(screen.step_count.color(), Color::Green);
}

#[test]
fn test_steps_outside_window_are_not_counted() {
    let store = Arc::new(MemoryHealthStore::new());
    let now = Utc::now();
    store.append_samples(vec![
        MetricSample::new(MetricKind::StepCount, 1000.0, now - Duration::hours(30)),
        MetricSample::new(MetricKind::StepCount, 250.0, now - Duration::hours(2)),
        MetricSample::new(MetricKind::StepCount, 50.0, now - Duration::minutes(10)),
    ]);
    let (mut controller, screen) = monitor(store);

    controller.toggle_at(now);
    controller.process_pending();

    assert_eq!(screen.step_count.text(), "300");
    assert_eq!(screen.heart_rate.text(), "---");
}

#[test]
fn test_full_session_cycle() {
    let store = Arc::new(MemoryHealthStore::new());
    let (mut controller, screen) = monitor(store.clone());

    assert_eq!(screen.button.text(), START_LABEL);

    controller.toggle();
    assert_eq!(controller.state(), MonitoringState::Active);
    assert_eq!(screen.button.text(), STOP_LABEL);

    store.append_samples(vec![MetricSample::new(MetricKind::HeartRate, 99.6, Utc::now())]);
    controller.process_pending();
    assert_eq!(screen.heart_rate.text(), "99");

    controller.toggle();
    assert_eq!(controller.state(), MonitoringState::Idle);
    assert_eq!(screen.button.text(), START_LABEL);
    assert_eq!(screen.heart_rate.text(), "---");
    assert_eq!(screen.step_count.text(), "---");
    assert_eq!(store.running_query_count(), 0);

    // Samples after stopping never reach the labels.
    store.append_samples(vec![MetricSample::new(MetricKind::HeartRate, 120.0, Utc::now())]);
    controller.process_pending();
    assert_eq!(screen.heart_rate.text(), "---");
}

#[test]
fn test_unavailable_service_scenario() {
    let (mut controller, screen) = monitor(Arc::new(NoopHealthStore::new()));

    controller.activate();
    controller.toggle();
    controller.process_pending();

    let alerts = screen.alerts.alerts();
    assert!(!alerts.is_empty());
    assert!(alerts
        .iter()
        .all(|a| a.title == "HealthKit" && a.message == "HealthKit not supported"));
    assert_eq!(controller.state(), MonitoringState::Active);
    assert_eq!(screen.button.text(), STOP_LABEL);
    assert!(!controller.heart_rate().is_active());
    assert!(!controller.step_count().is_active());
}

#[test]
fn test_regranted_access_allows_next_session() {
    use health_monitor::health::memory::AuthorizationStatus;

    let store = Arc::new(MemoryHealthStore::new().with_authorization_answer(false));
    let (mut controller, screen) = monitor(store.clone());

    controller.activate();
    controller.process_pending();
    assert_eq!(screen.alerts.alerts().len(), 1);

    controller.toggle();
    assert!(!controller.heart_rate().is_active());
    controller.toggle();

    // The user re-grants access in system settings.
    store.set_authorization(AuthorizationStatus::Granted);
    store.append_samples(vec![MetricSample::new(MetricKind::HeartRate, 70.0, Utc::now())]);

    controller.toggle();
    controller.process_pending();
    assert!(controller.heart_rate().is_active());
    assert_eq!(screen.heart_rate.text(), "70");
}

#[test]
fn test_simulated_session_shows_readings() {
    let store = Arc::new(MemoryHealthStore::new());
    let mut simulator = SampleSimulator::new(
        SimulatorConfig {
            interval_ms: 10,
            ..SimulatorConfig::default()
        },
        store.clone(),
    );
    let (mut controller, screen) = monitor(store);

    controller.toggle();
    simulator.start().unwrap();

    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
    while screen.heart_rate.text() == "---" && std::time::Instant::now() < deadline {
        controller.process_next(std::time::Duration::from_millis(20));
    }
    simulator.stop();

    assert_ne!(screen.heart_rate.text(), "---");
    assert!(screen.heart_rate.text().parse::<u64>().is_ok());
    assert!(controller.activity().stats().readings_displayed > 0);
}

#[test]
fn test_profile_screen() {
    let store = Arc::new(MemoryHealthStore::new().with_profile(
        NaiveDate::from_ymd_opt(2000, 2, 29),
        Some(BiologicalSex::Other),
        Some(BloodType::BNegative),
    ));
    let date_of_birth = Label::new();
    let age = Label::new();
    let sex = Label::new();
    let blood_type = Label::new();

    let controller = ProfileController::new(
        store,
        ProfileSinks {
            date_of_birth: Box::new(date_of_birth.clone()),
            age: Box::new(age.clone()),
            sex: Box::new(sex.clone()),
            blood_type: Box::new(blood_type.clone()),
        },
        chrono_tz::UTC,
    );

    let profile = controller.activate_on(NaiveDate::from_ymd_opt(2024, 2, 28).unwrap());

    assert_eq!(profile.age, Some(23));
    assert_eq!(date_of_birth.text(), "2000-02-29");
    assert_eq!(age.text(), "23");
    assert_eq!(sex.text(), "Other");
    assert_eq!(blood_type.text(), "B-");
}
