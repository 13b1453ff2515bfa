//! Procedural macros for `fiatlight_graph`.
//!
//! Provides `#[fiat_function]`, which keeps a plain function as is and adds
//! a constructor wrapping it into a `FunctionWithGui` whose parameter names,
//! docs and defaults come from the Rust signature.

mod function;

use proc_macro::TokenStream;

/// Declares a Fiatlight function.
///
/// Generates `fn <name>_with_gui() -> Result<FunctionWithGui, RegistryError>`
/// next to the function, which is left callable as before.
///
/// # Function attributes
///
/// - `invoke_async`, `invoke_manually`, `invoke_always_dirty`: invocation flags
/// - `label = "..."`: label shown instead of the function name
/// - `attributes(return__range = (0, 10), ...)`: any other fiat attributes
///
/// # Parameter attributes
///
/// - `/// doc comment`: tooltip of the parameter
/// - `#[fiat(default = expr)]`: default value
/// - `#[fiat(attributes(range = (0, 10)))]`: fiat attributes of the parameter widget
///
/// # Example
///
/// ```
/// use fiatlight_core::FiatValue;
/// use fiatlight_graph::fiat_function;
///
/// /// Adds two numbers.
/// #[fiat_function(invoke_manually)]
/// fn add(
///     /// First term.
///     a: i64,
///     #[fiat(default = 2, attributes(range = (0, 10)))]
///     b: i64,
/// ) -> i64 {
///     a + b
/// }
///
/// assert_eq!(add(1, 2), 3);
/// let function = add_with_gui().unwrap();
/// assert_eq!(function.input_names(), ["a", "b"]);
/// assert!(function.invoke_manually());
/// let b = function.input("b").unwrap();
/// assert_eq!(b.default_value.as_value(), Some(&FiatValue::Int(2)));
/// ```
#[proc_macro_attribute]
pub fn fiat_function(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as syn::ItemFn);
    function::generate_fiat_function(attr.into(), &input).into()
}
