//! Procedural macros for `fiatlight_core`.
//!
//! This crate provides the derives that implement `FiatType` for
//! application types:
//!
//! - `#[derive(FiatRecord)]` for structs with named fields
//! - `#[derive(FiatEnum)]` for enums with unit variants
//! - `#[derive(FiatNewType)]` for documented single-field wrappers

mod common;
mod enumeration;
mod new_type;
mod record;

use proc_macro::TokenStream;

/// Derive macro for `FiatType` on a struct with named fields.
///
/// The struct becomes a record: its widget shows one editor per field.
///
/// # Struct attributes
///
/// - `#[fiat(model)]`: validated model flavour (saved with the `Pydantic` tag)
/// - `#[fiat(validator = path)]`: a `fn(&Self) -> Result<(), String>` run on the whole record
/// - `#[fiat(attributes(x__range = (0, 10), ...))]`: fiat attributes forwarded to fields
///
/// # Field attributes
///
/// - `/// doc comment`: tooltip of the field
/// - `#[fiat(ge = 0, le = 10)]` (also `gt`, `lt`): numeric bounds
/// - `#[fiat(default)]` or `#[fiat(default = expr)]`: field default
/// - `#[fiat(attributes(edit_type = "slider"))]`: fiat attributes of the field widget
///
/// # Example
///
/// ```
/// use fiatlight_core::{FiatRecord, FiatType, TypeSpec};
///
/// /// A point on the canvas.
/// #[derive(FiatRecord)]
/// #[fiat(model)]
/// struct Point {
///     /// Horizontal position.
///     #[fiat(ge = 0, le = 10, default = 0)]
///     x: i64,
///     y: f64,
/// }
///
/// let TypeSpec::Record(spec) = Point::type_spec() else { unreachable!() };
/// assert_eq!(spec.fields.len(), 2);
/// ```
#[proc_macro_derive(FiatRecord, attributes(fiat))]
pub fn derive_fiat_record(input: TokenStream) -> TokenStream {
    record::derive_fiat_record(input)
}

/// Derive macro for `FiatType` on an enum with unit variants.
///
/// # Variant attributes
///
/// - `#[fiat(label = "...")]`: label shown instead of the variant name
/// - `#[fiat(tooltip = "...")]`: tooltip (defaults to the doc comment)
///
/// # Example
///
/// ```
/// use fiatlight_core::{FiatEnum, FiatType, FiatValue};
///
/// #[derive(FiatEnum, Debug, PartialEq)]
/// enum Color {
///     Red,
///     #[fiat(label = "Green (default)")]
///     Green,
/// }
///
/// assert_eq!(Color::Green.into_fiat(), FiatValue::variant("Color", "Green"));
/// ```
#[proc_macro_derive(FiatEnum, attributes(fiat))]
pub fn derive_fiat_enum(input: TokenStream) -> TokenStream {
    enumeration::derive_fiat_enum(input)
}

/// Derive macro for `FiatType` on a single-field tuple struct.
///
/// The doc comment of the struct documents the alias; registering a widget
/// for an undocumented new type is rejected. Bounds (`ge`, `gt`, `le`, `lt`)
/// may be attached with `#[fiat(...)]`.
///
/// # Example
///
/// ```
/// use fiatlight_core::{FiatNewType, FiatType, TypeSpec};
///
/// /// A distance in meters.
/// #[derive(FiatNewType)]
/// #[fiat(ge = 0)]
/// struct Meters(f64);
///
/// assert!(matches!(Meters::type_spec(), TypeSpec::NewType(_)));
/// ```
#[proc_macro_derive(FiatNewType, attributes(fiat))]
pub fn derive_fiat_new_type(input: TokenStream) -> TokenStream {
    new_type::derive_fiat_new_type(input)
}
