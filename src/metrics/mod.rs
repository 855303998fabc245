use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

// ============================================================================
// Metrics - Prometheus instruments for the rental engine
// ============================================================================
//
// Covers:
// - order placement and reservation bookkeeping
// - lifecycle transitions for orders and bookings
// - stock and slot conflicts
// - payment attempts, latency and circuit breaker state
//
// Exposed in text format at GET /metrics.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Orders & Inventory
    pub orders_created: IntCounter,
    pub reservations_created: IntCounter,
    pub reservations_released: IntCounter,
    pub stock_conflicts: IntCounterVec,

    // Lifecycle
    pub lifecycle_transitions: IntCounterVec,

    // Bookings
    pub bookings_created: IntCounter,
    pub slot_conflicts: IntCounter,

    // Payments
    pub payment_attempts: IntCounterVec,
    pub payment_duration: Histogram,
    pub circuit_breaker_state: IntGauge,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let orders_created = IntCounter::new("orders_created_total", "Orders placed from carts")?;
        registry.register(Box::new(orders_created.clone()))?;

        let reservations_created =
            IntCounter::new("reservations_created_total", "Stock reservations created")?;
        registry.register(Box::new(reservations_created.clone()))?;

        let reservations_released =
            IntCounter::new("reservations_released_total", "Stock reservations released")?;
        registry.register(Box::new(reservations_released.clone()))?;

        let stock_conflicts = IntCounterVec::new(
            Opts::new("stock_conflicts_total", "Requests rejected for lack of stock"),
            &["stage"],
        )?;
        registry.register(Box::new(stock_conflicts.clone()))?;

        let lifecycle_transitions = IntCounterVec::new(
            Opts::new("lifecycle_transitions_total", "Committed status transitions"),
            &["aggregate", "from", "to"],
        )?;
        registry.register(Box::new(lifecycle_transitions.clone()))?;

        let bookings_created =
            IntCounter::new("bookings_created_total", "Photography bookings created")?;
        registry.register(Box::new(bookings_created.clone()))?;

        let slot_conflicts =
            IntCounter::new("slot_conflicts_total", "Bookings rejected for a taken slot")?;
        registry.register(Box::new(slot_conflicts.clone()))?;

        let payment_attempts = IntCounterVec::new(
            Opts::new("payment_attempts_total", "Payment authorizations by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(payment_attempts.clone()))?;

        let payment_duration = Histogram::with_opts(
            HistogramOpts::new("payment_duration_seconds", "Payment authorization latency")
                .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0]),
        )?;
        registry.register(Box::new(payment_duration.clone()))?;

        let circuit_breaker_state = IntGauge::new(
            "payment_circuit_breaker_state",
            "Payment circuit breaker state (0=Closed, 1=Open, 2=HalfOpen)",
        )?;
        registry.register(Box::new(circuit_breaker_state.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            reservations_created,
            reservations_released,
            stock_conflicts,
            lifecycle_transitions,
            bookings_created,
            slot_conflicts,
            payment_attempts,
            payment_duration,
            circuit_breaker_state,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_transition(&self, aggregate: &str, from: &str, to: &str) {
        self.lifecycle_transitions
            .with_label_values(&[aggregate, from, to])
            .inc();
    }

    pub fn record_stock_conflict(&self, stage: &str) {
        self.stock_conflicts.with_label_values(&[stage]).inc();
    }

    pub fn record_payment(&self, outcome: &str, duration_secs: f64) {
        self.payment_attempts.with_label_values(&[outcome]).inc();
        self.payment_duration.observe(duration_secs);
    }

    /// Render every registered family in the Prometheus text format.
    pub fn render(&self) -> Result<Vec<u8>, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }
}
