use aeris_shared::BookingEvent;
use async_trait::async_trait;
use std::sync::Arc;

use crate::CoreResult;

/// Receives booking events after their transaction has committed.
/// Failures are reported back but never undo the committed change.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: &BookingEvent) -> CoreResult<()>;
}

pub struct NoopEventSink;

#[async_trait]
impl EventSink for NoopEventSink {
    async fn emit(&self, _event: &BookingEvent) -> CoreResult<()> {
        Ok(())
    }
}

/// Fans an event out to several sinks. Every sink is attempted; the first
/// error is returned.
#[derive(Default)]
pub struct CompositeSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl CompositeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl EventSink for CompositeSink {
    async fn emit(&self, event: &BookingEvent) -> CoreResult<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.emit(event).await {
                tracing::warn!("Event sink failed for booking {}: {}", event.booking_id, e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
