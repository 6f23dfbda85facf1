//! The monitoring screen's controller.
//!
//! A two-state machine driven by a single button. Starting a session
//! subscribes to heart rate and step count together; stopping cancels both
//! and puts the placeholder back on both labels.

use crate::activity::{create_shared_log, SharedActivityLog};
use crate::core::dispatch::{UiEvent, UiQueue};
use crate::core::subscription::{DeliveryOutcome, MetricSubscription};
use crate::display::{Alert, AlertPresenter, Color, DisplaySink, PLACEHOLDER};
use crate::health::{HealthError, HealthStore, MetricKind, READ_TYPES};
use chrono::{DateTime, Duration, Utc};
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Button text while idle.
pub const START_LABEL: &str = "Start Monitoring";
/// Button text while monitoring.
pub const STOP_LABEL: &str = "Stop Monitoring";

pub const ALERT_TITLE: &str = "HealthKit";
pub const ALERT_CONFIRM: &str = "OK";
pub const UNAVAILABLE_MESSAGE: &str = "HealthKit not supported";
pub const DENIED_MESSAGE: &str = "HealthKit is not allowed";

/// Whether the monitor is currently subscribed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitoringState {
    Idle,
    Active,
}

/// What happens to each subscription's cursor when a new session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorPolicy {
    /// Start every session from the initial cursor, re-reading history.
    ResetOnSessionStart,
    /// Continue from the last delivered position.
    Resume,
}

impl Default for CursorPolicy {
    fn default() -> Self {
        CursorPolicy::ResetOnSessionStart
    }
}

/// Tunables for a session controller.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub placeholder: String,
    pub step_window: Duration,
    pub cursor_policy: CursorPolicy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            placeholder: PLACEHOLDER.to_string(),
            step_window: Duration::hours(24),
            cursor_policy: CursorPolicy::default(),
        }
    }
}

/// The three labels on the monitoring screen.
pub struct MonitorSinks {
    pub heart_rate: Box<dyn DisplaySink>,
    pub step_count: Box<dyn DisplaySink>,
    pub button: Box<dyn DisplaySink>,
}

pub fn unavailable_alert() -> Alert {
    Alert::new(ALERT_TITLE, UNAVAILABLE_MESSAGE, ALERT_CONFIRM)
}

pub fn denied_alert() -> Alert {
    Alert::new(ALERT_TITLE, DENIED_MESSAGE, ALERT_CONFIRM)
}

/// Owns the monitoring flag and both metric subscriptions.
pub struct SessionController {
    state: MonitoringState,
    store: Arc<dyn HealthStore>,
    heart_rate: MetricSubscription,
    step_count: MetricSubscription,
    button: Box<dyn DisplaySink>,
    alerts: Box<dyn AlertPresenter>,
    queue: UiQueue,
    settings: SessionSettings,
    activity: SharedActivityLog,
}

impl SessionController {
    /// Build an idle controller and put every label in its initial state.
    pub fn new(
        store: Arc<dyn HealthStore>,
        sinks: MonitorSinks,
        alerts: Box<dyn AlertPresenter>,
        settings: SessionSettings,
    ) -> Self {
        Self::with_activity_log(store, sinks, alerts, settings, create_shared_log())
    }

    pub fn with_activity_log(
        store: Arc<dyn HealthStore>,
        sinks: MonitorSinks,
        alerts: Box<dyn AlertPresenter>,
        settings: SessionSettings,
        activity: SharedActivityLog,
    ) -> Self {
        let queue = UiQueue::new();

        let heart_rate = MetricSubscription::new(
            MetricKind::HeartRate,
            store.clone(),
            sinks.heart_rate,
            Color::Red,
            queue.sender(),
        )
        .with_activity_log(activity.clone());

        let step_count = MetricSubscription::new(
            MetricKind::StepCount,
            store.clone(),
            sinks.step_count,
            Color::Green,
            queue.sender(),
        )
        .with_step_window(settings.step_window)
        .with_activity_log(activity.clone());

        let controller = Self {
            state: MonitoringState::Idle,
            store,
            heart_rate,
            step_count,
            button: sinks.button,
            alerts,
            queue,
            settings,
            activity,
        };
        controller.reset_displays();
        controller.button.render(START_LABEL, Color::Neutral);
        controller
    }

    /// Screen activation: check the service and ask for read access.
    ///
    /// The authorization answer arrives through the UI queue.
    pub fn activate(&self) {
        if !self.store.is_available() {
            tracing::warn!("health data service unavailable");
            self.alerts.present(unavailable_alert());
            return;
        }

        let ui = self.queue.sender();
        self.store.request_authorization(
            &READ_TYPES,
            Box::new(move |result| {
                let _ = ui.send(UiEvent::AuthorizationCompleted(result));
            }),
        );
    }

    /// Flip between idle and monitoring, starting the session "now".
    pub fn toggle(&mut self) {
        self.toggle_at(Utc::now());
    }

    /// Flip between idle and monitoring with an explicit reference date.
    pub fn toggle_at(&mut self, now: DateTime<Utc>) {
        match self.state {
            MonitoringState::Idle => self.begin_session(now),
            MonitoringState::Active => self.end_session(),
        }
    }

    fn begin_session(&mut self, now: DateTime<Utc>) {
        self.state = MonitoringState::Active;
        self.button.render(STOP_LABEL, Color::Neutral);
        self.activity.record_session_started();
        tracing::info!("monitoring started");

        if !self.store.is_available() {
            self.alerts.present(unavailable_alert());
            return;
        }

        if self.settings.cursor_policy == CursorPolicy::ResetOnSessionStart {
            self.heart_rate.reset_cursor();
            self.step_count.reset_cursor();
        }
        self.heart_rate.start(now);
        self.step_count.start(now);
    }

    fn end_session(&mut self) {
        self.state = MonitoringState::Idle;
        self.heart_rate.stop();
        self.step_count.stop();
        self.reset_displays();
        self.button.render(START_LABEL, Color::Neutral);
        tracing::info!("monitoring stopped");
    }

    fn reset_displays(&self) {
        self.heart_rate.reset_display(&self.settings.placeholder);
        self.step_count.reset_display(&self.settings.placeholder);
    }

    /// Handle one UI event. Returns `false` when the loop should exit.
    pub fn process_event(&mut self, event: UiEvent) -> bool {
        match event {
            UiEvent::Delivery {
                kind,
                generation,
                delivery,
            } => {
                let outcome = match kind {
                    MetricKind::HeartRate => self.heart_rate.apply(generation, delivery),
                    MetricKind::StepCount => self.step_count.apply(generation, delivery),
                };
                if let DeliveryOutcome::Applied(Some(text)) = &outcome {
                    tracing::trace!(metric = %kind, value = %text, "reading displayed");
                }
            }
            UiEvent::AuthorizationCompleted(Ok(())) => {
                tracing::info!("health data access granted");
            }
            UiEvent::AuthorizationCompleted(Err(HealthError::ServiceUnavailable)) => {
                self.alerts.present(unavailable_alert());
            }
            UiEvent::AuthorizationCompleted(Err(e)) => {
                tracing::warn!("health data access refused: {e}");
                self.alerts.present(denied_alert());
            }
            UiEvent::ToggleRequested => self.toggle(),
            UiEvent::Shutdown => return false,
        }
        true
    }

    /// Drain every queued event. Returns how many were handled.
    ///
    /// A `Shutdown` event stops the drain and is counted.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.queue.try_recv() {
            handled += 1;
            if !self.process_event(event) {
                break;
            }
        }
        handled
    }

    /// Wait up to `timeout` for one event and handle it.
    ///
    /// Returns `false` once a `Shutdown` event has been handled.
    pub fn process_next(&mut self, timeout: std::time::Duration) -> bool {
        match self.queue.recv_timeout(timeout) {
            Some(event) => self.process_event(event),
            None => true,
        }
    }

    /// Sender for posting button presses or shutdown from other threads.
    pub fn ui_sender(&self) -> Sender<UiEvent> {
        self.queue.sender()
    }

    pub fn state(&self) -> MonitoringState {
        self.state
    }

    pub fn button_label(&self) -> &'static str {
        match self.state {
            MonitoringState::Idle => START_LABEL,
            MonitoringState::Active => STOP_LABEL,
        }
    }

    pub fn heart_rate(&self) -> &MetricSubscription {
        &self.heart_rate
    }

    pub fn step_count(&self) -> &MetricSubscription {
        &self.step_count
    }

    pub fn activity(&self) -> &SharedActivityLog {
        &self.activity
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.heart_rate.stop();
        self.step_count.stop();
    }
}
