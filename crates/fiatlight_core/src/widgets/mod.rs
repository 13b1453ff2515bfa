//! Built-in widgets.
//!
//! - [`primitives`]: `int`, `float`, `bool`, `str`
//! - [`optional`], [`list`], [`tuple`]: containers
//! - [`enumeration`]: unit-variant enums
//! - [`record`]: structs, plain or validated
//! - [`unregistered`]: placeholder for types without a widget

pub mod enumeration;
pub mod list;
pub mod optional;
pub mod primitives;
pub mod record;
pub mod tuple;
pub mod unregistered;

pub use enumeration::EnumWidget;
pub use list::ListWidget;
pub use optional::OptionalWidget;
pub use primitives::{BoolWidget, FloatWidget, IntWidget, StrWidget};
pub use record::RecordWidget;
pub use tuple::TupleWidget;
pub use unregistered::UnregisteredWidget;
