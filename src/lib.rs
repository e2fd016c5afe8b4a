//! Keyed pools of long-lived, concurrency-limited resource handles.
//!

pub use corral_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use corral_internal::prelude::*;
}
