//! Helpers shared by the Fiatlight derive and attribute macros.
//!
//! Generated code names `fiatlight_core` and `fiatlight_graph` through
//! [`resolve_crate_path`], so it compiles against a direct dependency, a
//! renamed one, or the `fiatlight` umbrella. Doc comments become tooltips
//! and descriptions through [`extract_doc_comments`] and
//! [`quote_option_string`].

use proc_macro_crate::{FoundCrate, crate_name};
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use syn::{Attribute, Expr, ExprLit, Lit, Meta};

const UMBRELLA: &str = "fiatlight";

/// A Fiatlight layer crate referenced by generated code.
#[derive(Debug, Clone, Copy)]
pub enum FiatlightCrate {
    /// Values, reflection and widgets.
    Core,
    /// Function wrappers and the graph.
    Graph,
}

impl FiatlightCrate {
    fn package(self) -> &'static str {
        match self {
            Self::Core => "fiatlight_core",
            Self::Graph => "fiatlight_graph",
        }
    }
}

/// The identifier under which the consumer sees `package`, if it depends on it.
fn dependency_ident(package: &str) -> Option<Ident> {
    match crate_name(package).ok()? {
        // The layer crates alias themselves with `extern crate self`.
        FoundCrate::Itself => Some(format_ident!("{}", package)),
        FoundCrate::Name(renamed) => Some(format_ident!("{}", renamed)),
    }
}

/// The path generated code uses to reach `krate`.
///
/// A direct dependency wins, under its `Cargo.toml` name. Otherwise the crate
/// is reached as `<umbrella>::<package>`. With neither, the bare package name
/// is emitted and the compiler reports the missing dependency at the use site.
#[must_use]
pub fn resolve_crate_path(krate: FiatlightCrate) -> TokenStream {
    let package = krate.package();
    if let Some(direct) = dependency_ident(package) {
        return quote!(#direct);
    }
    let module = format_ident!("{}", package);
    match dependency_ident(UMBRELLA) {
        Some(umbrella) => quote!(#umbrella::#module),
        None => quote!(#module),
    }
}

/// The `///` lines of an item, trimmed and joined with newlines.
///
/// Returns `None` for an undocumented item.
#[must_use]
pub fn extract_doc_comments(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| {
            let Meta::NameValue(meta) = &attr.meta else {
                return None;
            };
            let Expr::Lit(ExprLit { lit: Lit::Str(text), .. }) = &meta.value else {
                return None;
            };
            Some(text.value().trim().to_string())
        })
        .collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}

/// Tokens for an `Option<String>` expression holding `value`.
#[must_use]
pub fn quote_option_string(value: Option<&str>) -> TokenStream {
    match value {
        Some(text) => quote!(::core::option::Option::Some(::std::string::String::from(#text))),
        None => quote!(::core::option::Option::None),
    }
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::*;

    #[test]
    fn doc_lines_are_trimmed_and_joined() {
        let item: syn::ItemStruct = parse_quote! {
            ///  A point.
            /// In pixels.
            #[derive(Debug)]
            struct Point;
        };
        assert_eq!(extract_doc_comments(&item.attrs).as_deref(), Some("A point.\nIn pixels."));

        let bare: syn::ItemStruct = parse_quote!(struct Bare;);
        assert_eq!(extract_doc_comments(&bare.attrs), None);
    }

    #[test]
    fn optional_strings_quote_as_options() {
        let some = quote_option_string(Some("hint")).to_string();
        assert!(some.contains("Some"));
        assert!(some.contains("\"hint\""));
        assert!(quote_option_string(None).to_string().ends_with("None"));
    }
}
