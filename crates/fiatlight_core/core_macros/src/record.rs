//! Derive macro for records.

use std::collections::HashMap;

use darling::util::Override;
use darling::{FromDeriveInput, FromField};
use fiatlight_macro_utils::{FiatlightCrate, extract_doc_comments, quote_option_string, resolve_crate_path};
use proc_macro::TokenStream;
use quote::quote;
use syn::{Attribute, DeriveInput, Expr, Ident, Path, Type, parse_macro_input};

use crate::common::{BoundExprs, insert_attributes, reject_generics, typename_expr};

/// Parsed attributes of the struct.
#[derive(FromDeriveInput)]
#[darling(attributes(fiat), supports(struct_named), forward_attrs(doc))]
struct RecordArgs {
    ident: Ident,
    generics: syn::Generics,
    attrs: Vec<Attribute>,
    data: darling::ast::Data<(), RecordField>,

    /// Validated model flavour.
    #[darling(default)]
    model: bool,

    /// Record-wide validator, `fn(&Self) -> Result<(), String>`.
    #[darling(default)]
    validator: Option<Path>,

    /// Fiat attributes attached to the record.
    #[darling(default)]
    attributes: HashMap<String, Expr>,
}

/// Parsed attributes of one field.
#[derive(FromField)]
#[darling(attributes(fiat), forward_attrs(doc))]
struct RecordField {
    ident: Option<Ident>,
    ty: Type,
    attrs: Vec<Attribute>,

    #[darling(default)]
    ge: Option<Expr>,
    #[darling(default)]
    gt: Option<Expr>,
    #[darling(default)]
    le: Option<Expr>,
    #[darling(default)]
    lt: Option<Expr>,

    /// `default` (uses `Default::default()`) or `default = expr`.
    #[darling(default)]
    default: Option<Override<Expr>>,

    #[darling(default)]
    attributes: HashMap<String, Expr>,
}

impl RecordField {
    fn default_expr(&self) -> Option<proc_macro2::TokenStream> {
        let ty = &self.ty;
        self.default.as_ref().map(|default| match default {
            Override::Inherit => quote!(<#ty as ::core::default::Default>::default()),
            Override::Explicit(expr) => quote!(#expr),
        })
    }
}

/// Implementation of `#[derive(FiatRecord)]`.
pub(crate) fn derive_fiat_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let args = match RecordArgs::from_derive_input(&input) {
        Ok(args) => args,
        Err(err) => return err.write_errors().into(),
    };
    if let Some(err) = reject_generics(&args.generics, "FiatRecord") {
        return err.into();
    }

    let core = resolve_crate_path(FiatlightCrate::Core);
    let name = &args.ident;
    let typename = typename_expr(name);
    let doc = quote_option_string(extract_doc_comments(&args.attrs).as_deref());
    let kind = if args.model {
        quote!(#core::schema::RecordKind::Model)
    } else {
        quote!(#core::schema::RecordKind::Dataclass)
    };

    let Some(fields) = args.data.take_struct() else {
        return syn::Error::new_spanned(name, "#[derive(FiatRecord)] requires named fields")
            .to_compile_error()
            .into();
    };
    let fields = fields.fields;

    let field_specs = fields.iter().map(|field| {
        let ident = field.ident.as_ref().map(ToString::to_string).unwrap_or_default();
        let ty = &field.ty;
        let bounds = BoundExprs {
            ge: field.ge.as_ref(),
            gt: field.gt.as_ref(),
            le: field.le.as_ref(),
            lt: field.lt.as_ref(),
        };
        let spec = bounds.annotate(&core, quote!(<#ty as #core::FiatType>::type_spec()));
        let field_doc = quote_option_string(extract_doc_comments(&field.attrs).as_deref());
        let default = match field.default_expr() {
            Some(expr) => quote! {
                __field.default = ::core::option::Option::Some(#core::schema::FieldDefault::Factory(
                    ::std::sync::Arc::new(|| {
                        let __value: #ty = #expr;
                        #core::FiatType::into_fiat(__value)
                    }),
                ));
            },
            None => quote!(),
        };
        let inserts = insert_attributes(&quote!(__field.fiat_attributes), &field.attributes);
        quote! {
            {
                let mut __field = #core::schema::FieldSpec::new(#ident, #spec);
                __field.doc = #field_doc;
                #default
                #inserts
                __field
            }
        }
    });

    let validator = match &args.validator {
        Some(path) => quote! {
            __spec.model_validator = ::core::option::Option::Some(::std::sync::Arc::new(
                |__value: &#core::value::FiatValue| -> ::core::result::Result<#core::value::FiatValue, ::std::string::String> {
                    let __typed = <#name as #core::FiatType>::from_fiat(__value.clone())
                        .map_err(|__err| ::std::string::ToString::to_string(&__err))?;
                    #path(&__typed)?;
                    ::core::result::Result::Ok(__value.clone())
                },
            ));
        },
        None => quote!(),
    };
    let record_inserts = insert_attributes(&quote!(__spec.fiat_attributes), &args.attributes);

    let into_fields = fields.iter().map(|field| {
        let ident = field.ident.as_ref();
        let ident_str = ident.map(ToString::to_string).unwrap_or_default();
        quote!((#ident_str, #core::FiatType::into_fiat(self.#ident)))
    });

    let from_fields = fields.iter().map(|field| {
        let ident = field.ident.as_ref();
        let ident_str = ident.map(ToString::to_string).unwrap_or_default();
        let ty = &field.ty;
        let missing = match field.default_expr() {
            Some(expr) => quote!(#expr),
            None => quote! {
                return ::core::result::Result::Err(#core::error::ValueError::MissingField {
                    typename: ::std::string::String::from(#typename),
                    field: ::std::string::String::from(#ident_str),
                })
            },
        };
        quote! {
            #ident: match __fields.shift_remove(#ident_str) {
                ::core::option::Option::Some(__value) => <#ty as #core::FiatType>::from_fiat(__value)?,
                ::core::option::Option::None => #missing,
            }
        }
    });

    let expanded = quote! {
        impl #core::FiatType for #name {
            fn type_spec() -> #core::schema::TypeSpec {
                let mut __spec = #core::schema::RecordSpec::new(#typename, #kind);
                __spec.doc = #doc;
                #(__spec.fields.push(#field_specs);)*
                #validator
                #record_inserts
                #core::schema::TypeSpec::Record(__spec)
            }

            fn into_fiat(self) -> #core::value::FiatValue {
                let __fields: ::std::vec::Vec<(&'static str, #core::value::FiatValue)> = ::std::vec![#(#into_fields),*];
                #core::value::FiatValue::record(#typename, __fields)
            }

            fn from_fiat(
                value: #core::value::FiatValue,
            ) -> ::core::result::Result<Self, #core::error::ValueError> {
                match value {
                    #core::value::FiatValue::Record { typename, fields: mut __fields } if typename == #typename => {
                        ::core::result::Result::Ok(Self {
                            #(#from_fields),*
                        })
                    }
                    other => ::core::result::Result::Err(#core::error::ValueError::mismatch(#typename, &other)),
                }
            }
        }
    };

    expanded.into()
}
