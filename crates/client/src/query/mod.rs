//! Keyed query cache.
//!
//! Reads are cached under a [`QueryKey`] and shared while in flight.
//! Mutations invalidate every key under a prefix so the next read refetches.

mod client;
mod key;
mod state;

pub use client::QueryClient;
pub use key::QueryKey;
pub use state::QueryState;

/// Build a [`QueryKey`] from displayable segments.
///
/// ```rust,ignore
/// let key = query_key!["projects", project_id, "tasks"];
/// ```
#[macro_export]
macro_rules! query_key {
    ($($segment:expr),+ $(,)?) => {
        $crate::query::QueryKey::new([$(($segment).to_string()),+])
    };
}
