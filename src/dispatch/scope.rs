use std::future::Future;

use tokio_util::sync::{CancellationToken, DropGuard};

use crate::services::ServiceError;

/// Cancellation handle attached to one in-flight request.
///
/// The owning [`Dispatch`](super::Dispatch) holds the drop guard, so the scope
/// is cancelled both when the response has been produced and when the client
/// goes away and the handler future is dropped mid-flight.
#[derive(Debug, Clone)]
pub struct Scope {
    token: CancellationToken,
}

impl Scope {
    pub(crate) fn open() -> (Self, DropGuard) {
        let token = CancellationToken::new();
        let guard = token.clone().drop_guard();
        (Self { token }, guard)
    }

    /// A scope nobody cancels; for Service-owned background work and tests.
    pub fn detached() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the request scope closes.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Race a Service future against scope cancellation.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, ServiceError>>,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(ServiceError::Cancelled),
            result = fut => result,
        }
    }
}
