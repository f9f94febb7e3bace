use teamspace_shared::ApiError;

/// Snapshot of a cached read, shaped for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
    /// Last successful result, possibly stale.
    pub data: Option<T>,
    /// A request for this key is in flight.
    pub is_loading: bool,
    /// The most recent fetch failed.
    pub error: Option<ApiError>,
    /// `data` has been invalidated and will be refetched on the next read.
    pub is_stale: bool,
}

impl<T> QueryState<T> {
    /// Nothing cached, nothing in flight.
    pub fn idle() -> Self {
        Self {
            data: None,
            is_loading: false,
            error: None,
            is_stale: false,
        }
    }

    pub fn ready(data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::idle()
        }
    }

    pub fn is_success(&self) -> bool {
        self.data.is_some() && self.error.is_none()
    }
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self::idle()
    }
}
