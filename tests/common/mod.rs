//! Shared test harness: log capture.
//!
//! The library's observable behavior is its log output, so the scenario
//! tests need to see what was logged and at which level. [`capture`] runs a
//! closure under a scoped subscriber whose only layer records every event
//! at DEBUG level and above; the library's internal diagnostics are all
//! TRACE-level and stay out of the way.

#![allow(dead_code)]

use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;

/// One recorded log event.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub message: String,
}

#[derive(Clone, Default)]
struct CaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        if level == Level::TRACE {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.events
            .lock()
            .expect("capture buffer should not be poisoned")
            .push(CapturedEvent {
                level,
                message: visitor.message,
            });
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}

/// Runs `f` with log capture in place and returns its result alongside the
/// events recorded at DEBUG level and above, in emission order.
pub fn capture<R>(f: impl FnOnce() -> R) -> (R, Vec<CapturedEvent>) {
    let layer = CaptureLayer::default();
    let events = Arc::clone(&layer.events);
    let subscriber = tracing_subscriber::registry().with(layer);

    let result = tracing::subscriber::with_default(subscriber, f);
    let events = events
        .lock()
        .expect("capture buffer should not be poisoned")
        .clone();
    (result, events)
}

/// The levels of the captured events, in emission order.
pub fn levels(events: &[CapturedEvent]) -> Vec<Level> {
    events.iter().map(|e| e.level).collect()
}
