//! Derive macro for new types (documented single-field wrappers).

use darling::{FromDeriveInput, FromField};
use fiatlight_macro_utils::{FiatlightCrate, extract_doc_comments, quote_option_string, resolve_crate_path};
use proc_macro::TokenStream;
use quote::quote;
use syn::{Attribute, DeriveInput, Expr, Ident, Type, parse_macro_input};

use crate::common::{BoundExprs, reject_generics, typename_expr};

#[derive(FromDeriveInput)]
#[darling(attributes(fiat), supports(struct_newtype), forward_attrs(doc))]
struct NewTypeArgs {
    ident: Ident,
    generics: syn::Generics,
    attrs: Vec<Attribute>,
    data: darling::ast::Data<(), NewTypeField>,

    #[darling(default)]
    ge: Option<Expr>,
    #[darling(default)]
    gt: Option<Expr>,
    #[darling(default)]
    le: Option<Expr>,
    #[darling(default)]
    lt: Option<Expr>,
}

#[derive(FromField)]
struct NewTypeField {
    ty: Type,
}

/// Implementation of `#[derive(FiatNewType)]`.
pub(crate) fn derive_fiat_new_type(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let args = match NewTypeArgs::from_derive_input(&input) {
        Ok(args) => args,
        Err(err) => return err.write_errors().into(),
    };
    if let Some(err) = reject_generics(&args.generics, "FiatNewType") {
        return err.into();
    }

    let core = resolve_crate_path(FiatlightCrate::Core);
    let name = &args.ident;
    let typename = typename_expr(name);
    let doc = quote_option_string(extract_doc_comments(&args.attrs).as_deref());

    let inner = match args.data.take_struct().map(|fields| fields.fields) {
        Some(mut fields) if fields.len() == 1 => fields.remove(0).ty,
        _ => {
            return syn::Error::new_spanned(name, "#[derive(FiatNewType)] requires a single-field tuple struct")
                .to_compile_error()
                .into();
        }
    };

    let bounds = BoundExprs {
        ge: args.ge.as_ref(),
        gt: args.gt.as_ref(),
        le: args.le.as_ref(),
        lt: args.lt.as_ref(),
    };
    let inner_spec = bounds.annotate(&core, quote!(<#inner as #core::FiatType>::type_spec()));

    let expanded = quote! {
        impl #core::FiatType for #name {
            fn type_spec() -> #core::schema::TypeSpec {
                #core::schema::TypeSpec::NewType(#core::schema::NewTypeSpec {
                    typename: ::std::string::String::from(#typename),
                    doc: #doc,
                    inner: ::std::boxed::Box::new(#inner_spec),
                })
            }

            fn into_fiat(self) -> #core::value::FiatValue {
                #core::FiatType::into_fiat(self.0)
            }

            fn from_fiat(
                value: #core::value::FiatValue,
            ) -> ::core::result::Result<Self, #core::error::ValueError> {
                <#inner as #core::FiatType>::from_fiat(value).map(Self)
            }
        }
    };

    expanded.into()
}
