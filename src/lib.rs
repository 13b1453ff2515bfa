//! Turn ordinary typed functions into a live, persisted dataflow graph
//! with automatically generated widgets.
//!

pub use fiatlight_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use fiatlight_internal::prelude::*;
}
