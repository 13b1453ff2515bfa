//! Helpers shared by the derives.

use std::collections::HashMap;

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Expr, Generics};

/// Numeric bounds written as `#[fiat(ge = .., gt = .., le = .., lt = ..)]`.
pub(crate) struct BoundExprs<'a> {
    pub ge: Option<&'a Expr>,
    pub gt: Option<&'a Expr>,
    pub le: Option<&'a Expr>,
    pub lt: Option<&'a Expr>,
}

impl BoundExprs<'_> {
    fn is_empty(&self) -> bool {
        self.ge.is_none() && self.gt.is_none() && self.le.is_none() && self.lt.is_none()
    }

    /// Wraps `spec` (an expression of type `TypeSpec`) in `TypeSpec::Annotated`
    /// when at least one bound is set.
    pub(crate) fn annotate(&self, core: &TokenStream, spec: TokenStream) -> TokenStream {
        if self.is_empty() {
            return spec;
        }
        let bound = |expr: Option<&Expr>| match expr {
            Some(expr) => quote!(::core::option::Option::Some((#expr) as f64)),
            None => quote!(::core::option::Option::None),
        };
        let (ge, gt, le, lt) = (bound(self.ge), bound(self.gt), bound(self.le), bound(self.lt));
        quote! {
            #core::schema::TypeSpec::annotated(
                #spec,
                #core::schema::Bounds { ge: #ge, gt: #gt, le: #le, lt: #lt },
            )
        }
    }
}

/// Statements inserting `attributes(...)` entries into the `FiatAttributes` named `target`.
///
/// Entries are emitted in name order so the expansion is stable.
pub(crate) fn insert_attributes(target: &TokenStream, attributes: &HashMap<String, Expr>) -> TokenStream {
    let mut names: Vec<&String> = attributes.keys().collect();
    names.sort();
    let inserts = names.into_iter().map(|name| {
        let value = &attributes[name];
        quote!(#target.insert(#name, #value);)
    });
    quote!(#(#inserts)*)
}

/// Rejects generic types, which cannot be `'static` reflected types in general.
pub(crate) fn reject_generics(generics: &Generics, derive: &str) -> Option<TokenStream> {
    if generics.params.is_empty() {
        return None;
    }
    Some(
        syn::Error::new_spanned(generics, format!("#[derive({derive})] does not support generic types"))
            .to_compile_error(),
    )
}

/// The `module_path!()::Name` typename expression of a type.
pub(crate) fn typename_expr(name: &syn::Ident) -> TokenStream {
    let name_str = name.to_string();
    quote!(::core::concat!(::core::module_path!(), "::", #name_str))
}
