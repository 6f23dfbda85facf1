//! Live subscription to one metric.
//!
//! A subscription owns its cursor and the handle of the query it started.
//! Store callbacks only post to the UI queue; `apply` runs on the UI
//! context and is the single place the cursor and the sink change.

use crate::activity::SharedActivityLog;
use crate::core::dispatch::UiEvent;
use crate::core::format::MetricFormatter;
use crate::display::{Color, DisplaySink};
use crate::health::{
    AnchoredQuery, Cursor, Delivery, HealthError, HealthStore, MetricKind, MetricSample,
    QueryHandle, TimePredicate,
};
use chrono::{DateTime, Duration, Utc};
use crossbeam_channel::Sender;
use std::sync::Arc;

/// What happened to a delivery handed to [`MetricSubscription::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Cursor advanced; `Some` carries the text pushed to the sink.
    Applied(Option<String>),
    /// The store reported a failure. The cursor advanced, the sink was left alone.
    Failed(HealthError),
    /// The delivery's cursor is older than the stored one.
    Stale,
    /// The delivery belongs to a query that is no longer running.
    Inactive,
}

#[derive(Debug, Clone, Copy)]
struct ActiveQuery {
    handle: QueryHandle,
    generation: u64,
}

/// One metric's query, cursor and display sink.
pub struct MetricSubscription {
    kind: MetricKind,
    store: Arc<dyn HealthStore>,
    sink: Box<dyn DisplaySink>,
    color: Color,
    ui: Sender<UiEvent>,
    cursor: Cursor,
    generation: u64,
    active: Option<ActiveQuery>,
    step_window: Duration,
    activity: Option<SharedActivityLog>,
}

impl MetricSubscription {
    pub fn new(
        kind: MetricKind,
        store: Arc<dyn HealthStore>,
        sink: Box<dyn DisplaySink>,
        color: Color,
        ui: Sender<UiEvent>,
    ) -> Self {
        Self {
            kind,
            store,
            sink,
            color,
            ui,
            cursor: Cursor::initial(),
            generation: 0,
            active: None,
            step_window: Duration::hours(24),
            activity: None,
        }
    }

    /// How far back the step-count window reaches from the reference date.
    pub fn with_step_window(mut self, window: Duration) -> Self {
        self.step_window = window;
        self
    }

    pub fn with_activity_log(mut self, activity: SharedActivityLog) -> Self {
        self.activity = Some(activity);
        self
    }

    /// The query this subscription issues for a session starting at `reference_date`.
    pub fn query_for(&self, reference_date: DateTime<Utc>) -> AnchoredQuery {
        let predicate = match self.kind {
            MetricKind::HeartRate => TimePredicate::unbounded(),
            // A window reaching past the earliest representable date is unbounded.
            MetricKind::StepCount => reference_date
                .checked_sub_signed(self.step_window)
                .map_or_else(TimePredicate::unbounded, TimePredicate::since),
        };
        AnchoredQuery {
            kind: self.kind,
            predicate,
            cursor: self.cursor,
        }
    }

    /// Register the query with the store.
    ///
    /// Failures are swallowed: an unavailable service, denied access or an
    /// unknown metric type leave the subscription stopped and the sink as is.
    pub fn start(&mut self, reference_date: DateTime<Utc>) {
        self.stop();

        let query = self.query_for(reference_date);
        self.generation += 1;
        let generation = self.generation;
        let kind = self.kind;
        let ui = self.ui.clone();

        let handler = Box::new(move |delivery: Delivery| {
            // The receiver only goes away when the controller is dropped.
            let _ = ui.send(UiEvent::Delivery {
                kind,
                generation,
                delivery,
            });
        });

        match self.store.start_anchored_query(query, handler) {
            Ok(handle) => {
                tracing::debug!(metric = %self.kind, %handle, "query started");
                self.active = Some(ActiveQuery { handle, generation });
            }
            Err(HealthError::MissingMetricType(kind)) => {
                tracing::debug!(metric = %kind, "metric type unavailable, not subscribing");
            }
            Err(e) => {
                tracing::warn!(metric = %self.kind, "query not started: {e}");
            }
        }
    }

    /// Cancel the running query. Does nothing when stopped. The cursor is kept.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            if let Err(e) = self.store.stop_query(active.handle) {
                tracing::debug!(metric = %self.kind, "stop ignored: {e}");
            }
        }
    }

    /// Handle one delivery on the UI context.
    pub fn apply(&mut self, generation: u64, delivery: Delivery) -> DeliveryOutcome {
        let outcome = self.apply_inner(generation, delivery);
        if let Some(activity) = &self.activity {
            match &outcome {
                DeliveryOutcome::Applied(shown) => {
                    activity.record_delivery_applied();
                    if shown.is_some() {
                        activity.record_reading_displayed();
                    }
                }
                DeliveryOutcome::Failed(_) => {
                    activity.record_delivery_applied();
                }
                DeliveryOutcome::Stale | DeliveryOutcome::Inactive => {
                    activity.record_delivery_ignored();
                }
            }
        }
        outcome
    }

    fn apply_inner(&mut self, generation: u64, delivery: Delivery) -> DeliveryOutcome {
        match self.active {
            Some(active) if active.generation == generation => {}
            _ => return DeliveryOutcome::Inactive,
        }
        if delivery.cursor < self.cursor {
            tracing::debug!(
                metric = %self.kind,
                stored = self.cursor.position(),
                received = delivery.cursor.position(),
                "stale delivery ignored"
            );
            return DeliveryOutcome::Stale;
        }

        self.cursor = delivery.cursor;

        if let Some(error) = delivery.error {
            tracing::warn!(metric = %self.kind, "delivery failed: {error}");
            return DeliveryOutcome::Failed(error);
        }

        match select_value(self.kind, &delivery.samples) {
            Some(value) => {
                let text = MetricFormatter::format(value);
                self.sink.render(&text, self.color);
                DeliveryOutcome::Applied(Some(text))
            }
            None => DeliveryOutcome::Applied(None),
        }
    }

    /// Show `placeholder` in this subscription's color.
    pub fn reset_display(&self, placeholder: &str) {
        self.sink.render(placeholder, self.color);
    }

    /// Forget delivery progress so the next start re-reads history.
    pub fn reset_cursor(&mut self) {
        self.cursor = Cursor::initial();
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Handle of the running query, if any.
    pub fn active_handle(&self) -> Option<QueryHandle> {
        self.active.map(|a| a.handle)
    }

    /// Identity of the most recently started query.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Pick the value to display from one batch (most recent first).
///
/// Heart rate shows the first sample, steps show the batch total.
pub fn select_value(kind: MetricKind, samples: &[MetricSample]) -> Option<f64> {
    match kind {
        MetricKind::HeartRate => samples.first().map(|s| s.value),
        MetricKind::StepCount if samples.is_empty() => None,
        MetricKind::StepCount => Some(samples.iter().map(|s| s.value).sum()),
    }
}
