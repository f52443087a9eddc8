// Booking Metrics
//
// Counts booking outcomes and times the booking protocol, flagging slow
// bookings so lock contention shows up in the logs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use utoipa::ToSchema;

use crate::booking::BookingError;

/// Bookings slower than this are logged at warn
const SLOW_BOOKING_THRESHOLD_MS: u64 = 100;

#[derive(Debug, Clone, Default)]
pub struct BookingMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    bookings_attempted: AtomicU64,
    bookings_committed: AtomicU64,
    auto_assigned: AtomicU64,
    explicit_assigned: AtomicU64,
    validation_failures: AtomicU64,
    no_available_practitioner: AtomicU64,
    concurrent_booking_lost: AtomicU64,
    storage_failures: AtomicU64,

    bookings_timed: AtomicU64,
    total_booking_time_us: AtomicU64,
    slow_bookings: AtomicU64,
}

impl BookingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing a booking; the duration is recorded when the timer drops
    pub fn start_booking(&self) -> BookingTimer {
        self.inner.bookings_attempted.fetch_add(1, Ordering::Relaxed);
        BookingTimer {
            start: Instant::now(),
            metrics: self.clone(),
        }
    }

    pub fn record_committed(&self, auto_assigned: bool) {
        self.inner.bookings_committed.fetch_add(1, Ordering::Relaxed);
        let counter = if auto_assigned {
            &self.inner.auto_assigned
        } else {
            &self.inner.explicit_assigned
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Classify a failed booking
    pub fn record_failure(&self, error: &BookingError) {
        let counter = match error {
            BookingError::ValidationError(_)
            | BookingError::BranchNotFound(_)
            | BookingError::PractitionerNotFound(_) => &self.inner.validation_failures,
            BookingError::NoAvailablePractitioner => &self.inner.no_available_practitioner,
            BookingError::ConcurrentBookingLost(_) => &self.inner.concurrent_booking_lost,
            BookingError::StorageError(_) => &self.inner.storage_failures,
            BookingError::NotFound | BookingError::InvalidTransition(_) => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn record_duration(&self, duration: Duration) {
        self.inner.bookings_timed.fetch_add(1, Ordering::Relaxed);
        self.inner
            .total_booking_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);

        if duration.as_millis() as u64 > SLOW_BOOKING_THRESHOLD_MS {
            self.inner.slow_bookings.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("Slow booking: {}ms", duration.as_millis());
        }
    }

    /// Average time of finished bookings in milliseconds
    pub fn avg_booking_time_ms(&self) -> f64 {
        let count = self.inner.bookings_timed.load(Ordering::Relaxed);
        let total_us = self.inner.total_booking_time_us.load(Ordering::Relaxed);

        if count == 0 {
            0.0
        } else {
            (total_us as f64 / count as f64) / 1000.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        MetricsSummary {
            bookings_attempted: load(&self.inner.bookings_attempted),
            bookings_committed: load(&self.inner.bookings_committed),
            auto_assigned: load(&self.inner.auto_assigned),
            explicit_assigned: load(&self.inner.explicit_assigned),
            validation_failures: load(&self.inner.validation_failures),
            no_available_practitioner: load(&self.inner.no_available_practitioner),
            concurrent_booking_lost: load(&self.inner.concurrent_booking_lost),
            storage_failures: load(&self.inner.storage_failures),
            avg_booking_time_ms: self.avg_booking_time_ms(),
            slow_bookings: load(&self.inner.slow_bookings),
        }
    }

    pub fn log_summary(&self) {
        let summary = self.summary();
        tracing::info!(
            "Booking metrics: {} attempted, {} committed ({} auto, {} explicit), \
             {} rejected, {} unavailable, {} lost races, {} storage failures, \
             avg {:.2}ms, {} slow",
            summary.bookings_attempted,
            summary.bookings_committed,
            summary.auto_assigned,
            summary.explicit_assigned,
            summary.validation_failures,
            summary.no_available_practitioner,
            summary.concurrent_booking_lost,
            summary.storage_failures,
            summary.avg_booking_time_ms,
            summary.slow_bookings,
        );
    }
}

/// Records the booking duration on drop
pub struct BookingTimer {
    start: Instant,
    metrics: BookingMetrics,
}

impl Drop for BookingTimer {
    fn drop(&mut self) {
        self.metrics.record_duration(self.start.elapsed());
    }
}

/// Snapshot of booking metrics
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MetricsSummary {
    pub bookings_attempted: u64,
    pub bookings_committed: u64,
    pub auto_assigned: u64,
    pub explicit_assigned: u64,
    pub validation_failures: u64,
    pub no_available_practitioner: u64,
    pub concurrent_booking_lost: u64,
    pub storage_failures: u64,
    pub avg_booking_time_ms: f64,
    pub slow_bookings: u64,
}
