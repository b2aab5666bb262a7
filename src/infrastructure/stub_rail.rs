use crate::domain::payout::{TransferId, TransferRequest};
use crate::domain::ports::PaymentRail;
use crate::error::Result;
use async_trait::async_trait;

/// Payment rail adapter for local runs and tests.
///
/// Derives the transfer reference from the idempotency key, so repeating a
/// call for the same batch yields the same reference, matching the
/// idempotency contract of the real rail.
#[derive(Default, Clone)]
pub struct StubPaymentRail;

impl StubPaymentRail {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PaymentRail for StubPaymentRail {
    async fn create_transfer(&self, request: TransferRequest) -> Result<TransferId> {
        Ok(TransferId(format!("tr_{}", request.idempotency_key)))
    }
}
