//! Code generation for `#[fiat_function]`.

use std::collections::HashMap;

use darling::ast::NestedMeta;
use darling::{FromAttributes, FromMeta};
use fiatlight_macro_utils::{FiatlightCrate, extract_doc_comments, resolve_crate_path};
use proc_macro2::TokenStream;
use quote::{ToTokens, format_ident, quote};
use syn::{Expr, FnArg, ItemFn, Pat, PatType, Signature};

/// Arguments of `#[fiat_function(...)]`.
#[derive(Debug, Default, FromMeta)]
#[darling(default)]
struct FunctionArgs {
    invoke_async: bool,
    invoke_manually: bool,
    invoke_always_dirty: bool,
    label: Option<String>,
    /// Other fiat attributes, inserted as written.
    attributes: HashMap<String, Expr>,
}

/// `#[fiat(...)]` on a parameter.
#[derive(Debug, Default, FromAttributes)]
#[darling(attributes(fiat))]
struct ParamArgs {
    #[darling(default)]
    default: Option<Expr>,
    /// Fiat attributes of the parameter, forwarded as `<param>__<name>`.
    #[darling(default)]
    attributes: HashMap<String, Expr>,
}

struct ParamInfo {
    name: String,
    ty: syn::Type,
    doc: Option<String>,
    args: ParamArgs,
}

/// Rejects signatures that cannot be adapted to a dynamic call.
fn validate_signature(sig: &Signature) -> Option<TokenStream> {
    fn error(tokens: impl ToTokens, message: &str) -> Option<TokenStream> {
        Some(syn::Error::new_spanned(tokens, message).to_compile_error())
    }

    if let Some(asyncness) = &sig.asyncness {
        return error(asyncness, "#[fiat_function] cannot be applied to async functions");
    }
    if let Some(unsafety) = &sig.unsafety {
        return error(unsafety, "#[fiat_function] cannot be applied to unsafe functions");
    }
    if let Some(abi) = &sig.abi {
        return error(abi, "#[fiat_function] cannot be applied to extern functions");
    }
    if !sig.generics.params.is_empty() {
        return error(&sig.generics, "#[fiat_function] does not support generic parameters");
    }
    if let Some(FnArg::Receiver(receiver)) = sig.inputs.first() {
        return error(receiver, "#[fiat_function] cannot be applied to methods");
    }
    if sig.inputs.len() > 8 {
        return error(&sig.inputs, "#[fiat_function] supports at most 8 parameters");
    }
    None
}

fn parse_param(pat_type: &PatType) -> Result<ParamInfo, TokenStream> {
    let Pat::Ident(pat_ident) = &*pat_type.pat else {
        return Err(syn::Error::new_spanned(&pat_type.pat, "#[fiat_function] parameters must be plain identifiers")
            .to_compile_error());
    };
    let args = ParamArgs::from_attributes(&pat_type.attrs).map_err(|err| err.write_errors())?;
    Ok(ParamInfo {
        name: pat_ident.ident.to_string(),
        ty: (*pat_type.ty).clone(),
        doc: extract_doc_comments(&pat_type.attrs),
        args,
    })
}

/// Generates the function, with its parameter attributes stripped, and its
/// `<name>_with_gui` constructor.
pub(crate) fn generate_fiat_function(attr: TokenStream, input: &ItemFn) -> TokenStream {
    let args = match NestedMeta::parse_meta_list(attr) {
        Ok(items) => match FunctionArgs::from_list(&items) {
            Ok(args) => args,
            Err(err) => return err.write_errors(),
        },
        Err(err) => return darling::Error::from(err).write_errors(),
    };
    if let Some(err) = validate_signature(&input.sig) {
        return err;
    }

    let mut params = Vec::new();
    for arg in &input.sig.inputs {
        if let FnArg::Typed(pat_type) = arg {
            match parse_param(pat_type) {
                Ok(param) => params.push(param),
                Err(err) => return err,
            }
        }
    }

    let core = resolve_crate_path(FiatlightCrate::Core);
    let graph = resolve_crate_path(FiatlightCrate::Graph);

    let fn_name = &input.sig.ident;
    let fn_name_str = fn_name.to_string();
    let ctor_name = format_ident!("{}_with_gui", fn_name);
    let ctor_doc = format!("Wraps [`{fn_name_str}`] into a `FunctionWithGui`.");

    let mut inserts = Vec::new();
    for (flag, set) in [
        ("invoke_async", args.invoke_async),
        ("invoke_manually", args.invoke_manually),
        ("invoke_always_dirty", args.invoke_always_dirty),
    ] {
        if set {
            inserts.push(quote!(.with(#flag, true)));
        }
    }
    if let Some(label) = &args.label {
        inserts.push(quote!(.with("label", #label)));
    }
    inserts.extend(sorted(&args.attributes).into_iter().map(|(name, value)| {
        quote!(.with(#name, #value))
    }));
    for param in &params {
        inserts.extend(sorted(&param.args.attributes).into_iter().map(|(name, value)| {
            let forwarded = format!("{}__{name}", param.name);
            quote!(.with(#forwarded, #value))
        }));
    }

    let signature_params = params.iter().map(|param| {
        let name = &param.name;
        let ty = &param.ty;
        let mut chain = quote!(#graph::SignatureParam::new(#name));
        if let Some(doc) = &param.doc {
            chain = quote!(#chain.with_doc(#doc));
        }
        if let Some(default) = &param.args.default {
            chain = quote! {
                #chain.with_default({
                    let __value: #ty = #default;
                    #core::FiatType::into_fiat(__value)
                })
            };
        }
        quote!(.with_param(#chain))
    });

    let doc = match extract_doc_comments(&input.attrs) {
        Some(doc) => quote!(.doc(#doc)),
        None => quote!(),
    };

    let mut cleaned = input.clone();
    for arg in &mut cleaned.sig.inputs {
        if let FnArg::Typed(pat_type) = arg {
            pat_type
                .attrs
                .retain(|attr| !attr.path().is_ident("fiat") && !attr.path().is_ident("doc"));
        }
    }
    let vis = &input.vis;

    quote! {
        #cleaned

        #[doc = #ctor_doc]
        ///
        /// # Errors
        ///
        /// Returns a `RegistryError` if a widget rejects its attributes.
        #vis fn #ctor_name() -> ::core::result::Result<#graph::FunctionWithGui, #core::RegistryError> {
            let __attributes = #core::FiatAttributes::new()
                #(#inserts)*;
            let __signature = #graph::Signature::new(#fn_name_str)
                #(#signature_params)*;
            #graph::FunctionWithGui::builder(#fn_name_str, #fn_name)
                .signature(__signature)
                .attributes(__attributes)
                #doc
                .build()
        }
    }
}

/// Entries in name order so the expansion is stable.
fn sorted(attributes: &HashMap<String, Expr>) -> Vec<(&String, &Expr)> {
    let mut entries: Vec<_> = attributes.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}
