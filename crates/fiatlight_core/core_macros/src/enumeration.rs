//! Derive macro for enums with unit variants.

use darling::{FromDeriveInput, FromVariant};
use fiatlight_macro_utils::{FiatlightCrate, extract_doc_comments, quote_option_string, resolve_crate_path};
use proc_macro::TokenStream;
use quote::quote;
use syn::{Attribute, DeriveInput, Ident, parse_macro_input};

use crate::common::{reject_generics, typename_expr};

#[derive(FromDeriveInput)]
#[darling(attributes(fiat), supports(enum_unit))]
struct EnumArgs {
    ident: Ident,
    generics: syn::Generics,
    data: darling::ast::Data<EnumVariant, ()>,
}

#[derive(FromVariant)]
#[darling(attributes(fiat), forward_attrs(doc))]
struct EnumVariant {
    ident: Ident,
    attrs: Vec<Attribute>,

    /// Label shown instead of the variant name.
    #[darling(default)]
    label: Option<String>,

    /// Tooltip; the doc comment when omitted.
    #[darling(default)]
    tooltip: Option<String>,
}

/// Implementation of `#[derive(FiatEnum)]`.
pub(crate) fn derive_fiat_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let args = match EnumArgs::from_derive_input(&input) {
        Ok(args) => args,
        Err(err) => return err.write_errors().into(),
    };
    if let Some(err) = reject_generics(&args.generics, "FiatEnum") {
        return err.into();
    }

    let core = resolve_crate_path(FiatlightCrate::Core);
    let name = &args.ident;
    let class = name.to_string();
    let typename = typename_expr(name);

    let Some(variants) = args.data.take_enum() else {
        return syn::Error::new_spanned(name, "#[derive(FiatEnum)] requires an enum")
            .to_compile_error()
            .into();
    };

    let variant_specs = variants.iter().map(|variant| {
        let variant_name = variant.ident.to_string();
        let label = quote_option_string(variant.label.as_deref());
        let tooltip = variant.tooltip.clone().or_else(|| extract_doc_comments(&variant.attrs));
        let tooltip = quote_option_string(tooltip.as_deref());
        quote! {
            #core::schema::EnumVariantSpec {
                name: ::std::string::String::from(#variant_name),
                label: #label,
                tooltip: #tooltip,
            }
        }
    });

    let into_arms = variants.iter().map(|variant| {
        let ident = &variant.ident;
        let variant_name = ident.to_string();
        quote!(Self::#ident => #core::value::FiatValue::variant(#class, #variant_name))
    });

    let from_arms = variants.iter().map(|variant| {
        let ident = &variant.ident;
        let variant_name = ident.to_string();
        quote!(#variant_name => ::core::result::Result::Ok(Self::#ident))
    });

    let expanded = quote! {
        impl #core::FiatType for #name {
            fn type_spec() -> #core::schema::TypeSpec {
                #core::schema::TypeSpec::Enum(#core::schema::EnumSpec {
                    typename: ::std::string::String::from(#typename),
                    variants: ::std::vec![#(#variant_specs),*],
                })
            }

            fn into_fiat(self) -> #core::value::FiatValue {
                match self {
                    #(#into_arms,)*
                }
            }

            fn from_fiat(
                value: #core::value::FiatValue,
            ) -> ::core::result::Result<Self, #core::error::ValueError> {
                match value {
                    #core::value::FiatValue::Enum { class, variant } if class == #class => match variant.as_str() {
                        #(#from_arms,)*
                        _ => ::core::result::Result::Err(#core::error::ValueError::UnknownVariant {
                            class,
                            variant,
                        }),
                    },
                    other => ::core::result::Result::Err(#core::error::ValueError::mismatch(#class, &other)),
                }
            }
        }
    };

    expanded.into()
}
