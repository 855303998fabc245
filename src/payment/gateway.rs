use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{PaymentAdapter, PaymentError, PaymentReceipt, PaymentRequest};
use crate::metrics::Metrics;
use crate::utils::{
    retry_on_transient, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState,
    RetryConfig,
};

/// Timeout-bounded, retrying, circuit-protected front for a `PaymentAdapter`.
#[derive(Clone)]
pub struct PaymentGateway {
    adapter: Arc<dyn PaymentAdapter>,
    circuit_breaker: CircuitBreaker,
    retry: RetryConfig,
    timeout: Duration,
    metrics: Arc<Metrics>,
}

impl PaymentGateway {
    pub fn new(
        adapter: Arc<dyn PaymentAdapter>,
        timeout: Duration,
        retry: RetryConfig,
        breaker: CircuitBreakerConfig,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            adapter,
            circuit_breaker: CircuitBreaker::new(breaker),
            retry,
            timeout,
            metrics,
        }
    }

    pub async fn authorize(&self, request: &PaymentRequest) -> Result<PaymentReceipt, PaymentError> {
        let started = Instant::now();

        let result = retry_on_transient(&self.retry, |attempt| self.attempt(request, attempt)).await;

        let elapsed = started.elapsed().as_secs_f64();
        match &result {
            Ok(receipt) => {
                self.metrics.record_payment("approved", elapsed);
                tracing::info!(
                    subject_id = %request.subject_id,
                    subject_kind = request.subject_kind,
                    amount = request.amount,
                    transaction_ref = %receipt.transaction_ref,
                    "Payment authorized"
                );
            }
            Err(err) => {
                self.metrics.record_payment(err.outcome(), elapsed);
                tracing::warn!(
                    subject_id = %request.subject_id,
                    subject_kind = request.subject_kind,
                    amount = request.amount,
                    error = %err,
                    "Payment not authorized"
                );
            }
        }

        self.metrics
            .circuit_breaker_state
            .set(self.circuit_breaker.state().await.as_gauge());

        result
    }

    pub async fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state().await
    }

    async fn attempt(&self, request: &PaymentRequest, attempt: u32) -> Result<PaymentReceipt, PaymentError> {
        tracing::debug!(subject_id = %request.subject_id, attempt, "Authorizing payment");

        let timeout = self.timeout;
        let bounded = async move {
            match tokio::time::timeout(timeout, self.adapter.authorize(request)).await {
                Ok(result) => result,
                Err(_) => Err(PaymentError::TimedOut(timeout)),
            }
        };

        // Declines are the provider working as intended and do not trip the breaker.
        let guarded = self
            .circuit_breaker
            .call(bounded, |err: &PaymentError| !matches!(err, PaymentError::Declined(_)))
            .await;

        match guarded {
            Ok(receipt) => Ok(receipt),
            Err(CircuitBreakerError::CircuitOpen) => Err(PaymentError::CircuitOpen),
            Err(CircuitBreakerError::OperationFailed(err)) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::{PaymentMethod, SandboxPaymentAdapter};
    use uuid::Uuid;

    fn request() -> PaymentRequest {
        PaymentRequest {
            subject_id: Uuid::new_v4(),
            subject_kind: "order",
            payer_id: Uuid::new_v4(),
            amount: 45_000,
            method: PaymentMethod::Card,
        }
    }

    fn gateway(adapter: Arc<SandboxPaymentAdapter>, timeout: Duration) -> PaymentGateway {
        PaymentGateway::new(
            adapter,
            timeout,
            RetryConfig {
                max_attempts: 3,
                initial_delay: Duration::from_millis(5),
                max_delay: Duration::from_millis(10),
                multiplier: 2.0,
            },
            CircuitBreakerConfig {
                failure_threshold: 2,
                open_for: Duration::from_secs(60),
                success_threshold: 1,
            },
            Arc::new(Metrics::new().unwrap()),
        )
    }

    #[tokio::test]
    async fn test_approved_payment_returns_receipt() {
        let adapter = Arc::new(SandboxPaymentAdapter::approving());
        let gateway = gateway(adapter.clone(), Duration::from_secs(1));

        let receipt = gateway.authorize(&request()).await.unwrap();

        assert!(receipt.transaction_ref.starts_with("sbx_"));
        assert_eq!(adapter.attempts(), 1);
    }

    #[tokio::test]
    async fn test_decline_is_not_retried() {
        let adapter = Arc::new(SandboxPaymentAdapter::declining("insufficient funds"));
        let gateway = gateway(adapter.clone(), Duration::from_secs(1));

        let result = gateway.authorize(&request()).await;

        assert!(matches!(result, Err(PaymentError::Declined(_))));
        assert_eq!(adapter.attempts(), 1);
        assert_eq!(gateway.circuit_state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let adapter = Arc::new(SandboxPaymentAdapter::approving().with_latency(Duration::from_millis(200)));
        let gateway = gateway(adapter, Duration::from_millis(20));

        let result = gateway.authorize(&request()).await;

        assert!(matches!(result, Err(PaymentError::TimedOut(_))));
    }

    #[tokio::test]
    async fn test_unavailable_provider_is_retried_until_breaker_opens() {
        let adapter = Arc::new(SandboxPaymentAdapter::unavailable());
        let gateway = gateway(adapter.clone(), Duration::from_secs(1));

        let result = gateway.authorize(&request()).await;

        // Two real attempts open the breaker; the third fails fast.
        assert!(matches!(result, Err(PaymentError::CircuitOpen)));
        assert_eq!(adapter.attempts(), 2);
        assert_eq!(gateway.circuit_state().await, CircuitState::Open);
    }
}
