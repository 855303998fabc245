use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{PaymentAdapter, PaymentError, PaymentReceipt, PaymentRequest};

#[derive(Debug, Clone)]
enum Behaviour {
    Approve,
    Decline(String),
    Unavailable,
}

/// Deterministic stand-in for a payment provider. Used by the demo binary
/// and by tests.
#[derive(Debug)]
pub struct SandboxPaymentAdapter {
    behaviour: Behaviour,
    latency: Duration,
    attempts: AtomicU32,
}

impl SandboxPaymentAdapter {
    pub fn approving() -> Self {
        Self::with_behaviour(Behaviour::Approve)
    }

    pub fn declining(reason: impl Into<String>) -> Self {
        Self::with_behaviour(Behaviour::Decline(reason.into()))
    }

    pub fn unavailable() -> Self {
        Self::with_behaviour(Behaviour::Unavailable)
    }

    fn with_behaviour(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            latency: Duration::ZERO,
            attempts: AtomicU32::new(0),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of authorize calls received so far.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentAdapter for SandboxPaymentAdapter {
    async fn authorize(&self, request: &PaymentRequest) -> Result<PaymentReceipt, PaymentError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match &self.behaviour {
            Behaviour::Approve => Ok(PaymentReceipt {
                transaction_ref: format!(
                    "sbx_{}_{}_{}",
                    request.method.as_str(),
                    request.subject_id.simple(),
                    attempt
                ),
            }),
            Behaviour::Decline(reason) => Err(PaymentError::Declined(reason.clone())),
            Behaviour::Unavailable => Err(PaymentError::Unavailable("sandbox offline".to_string())),
        }
    }
}
