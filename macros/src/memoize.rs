use syn::ext::IdentExt;

use super::*;

/// Memoize a function.
pub fn expand(mut func: syn::ItemFn) -> Result<proc_macro2::TokenStream> {
    let sig = &func.sig;
    if !sig.generics.params.is_empty() {
        bail!(sig.generics, "generic functions are not supported");
    }
    if let Some(asyncness) = &sig.asyncness {
        bail!(asyncness, "async functions are not supported");
    }
    if let Some(variadic) = &sig.variadic {
        bail!(variadic, "C-variadic functions are not supported, use `Rest<T>` instead");
    }
    if sig.inputs.is_empty() {
        bail!(sig, "memoized functions must take at least one argument");
    }
    let block = &func.block;
    if mentions_self(quote! { #sig #block }) {
        bail!(sig, "associated functions are not supported, memoize a free function instead");
    }

    let output = match &sig.output {
        syn::ReturnType::Type(_, ty) if !is_unit(ty) => ty.as_ref().clone(),
        _ => bail!(sig, "memoized functions must return a value"),
    };

    let mut args = vec![];
    let mut bindings = vec![];
    for input in &sig.inputs {
        let typed = match input {
            syn::FnArg::Typed(typed) => typed,
            syn::FnArg::Receiver(_) => {
                bail!(input, "methods are not supported")
            }
        };

        match typed.pat.as_ref() {
            syn::Pat::Ident(pat @ syn::PatIdent { by_ref: None, subpat: None, .. }) => {
                args.push(pat.ident.clone());
                bindings.push(pat.clone());
            }
            pat => bail!(pat, "only simple identifiers are supported"),
        }
    }

    // The call site passes the arguments as a tuple and the closure takes it
    // apart again, keeping any `mut` binding.
    let arg_tuple = quote! { (#(#args,)*) };
    let closure_pat = quote! { (#(#bindings,)*) };

    // The cache lives next to the function so that the control function can
    // reach it too.
    let name = &sig.ident;
    let vis = &func.vis;
    let cache = format_ident!("__MEMOTRIE_CACHE_{}", name.unraw().to_string().to_uppercase());
    let control = format_ident!("{}_cache", name.unraw());
    let doc = format!("The cache of the memoized [`{}`] function.", name.unraw());

    let body = &func.block;
    func.block = parse_quote! { {
        ::memotrie::internal::cached(
            &#cache,
            #arg_tuple,
            |#closure_pat| -> #output #body,
        )
    } };

    Ok(quote! {
        #[doc(hidden)]
        static #cache: ::memotrie::internal::Cache<#output> =
            ::memotrie::internal::Cache::new();

        #func

        #[doc = #doc]
        #vis fn #control() -> ::memotrie::CacheControl<#output> {
            #cache.control()
        }
    })
}

/// Whether the type is `()`.
fn is_unit(ty: &syn::Type) -> bool {
    matches!(ty, syn::Type::Tuple(tuple) if tuple.elems.is_empty())
}

/// Whether the tokens refer to `Self`, which only exists inside an `impl`.
fn mentions_self(tokens: proc_macro2::TokenStream) -> bool {
    tokens.into_iter().any(|tree| match tree {
        proc_macro2::TokenTree::Ident(ident) => ident == "Self",
        proc_macro2::TokenTree::Group(group) => mentions_self(group.stream()),
        _ => false,
    })
}
