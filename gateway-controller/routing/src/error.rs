use lb_gateway_controller_core::Reason;

/// Failure to materialize a route.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The route's own configuration cannot be compiled. Reported on the
    /// route's status; never retried.
    #[error("{reason}: {message}")]
    Invalid { reason: Reason, message: String },

    /// The resource store failed. The route should be retried.
    #[error(transparent)]
    Infrastructure(#[from] anyhow::Error),
}

impl LoadError {
    pub(crate) fn invalid(reason: Reason, message: impl Into<String>) -> Self {
        Self::Invalid {
            reason,
            message: message.into(),
        }
    }
}
