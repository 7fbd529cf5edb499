//! Procedural macros for keyword registration.
//!
//! `#[keyword]` marks a free function or a `&self` method as a keyword. The
//! function itself is emitted unchanged; the attribute adds a hidden companion
//! that captures name, tags, documentation and the argument specification,
//! together with a binding that maps host arguments onto the Rust parameters.
//!
//! Free functions are also submitted to the module inventory so that
//! `Namespace::from_module(module_path!())` finds them. Methods must be added
//! to their type's `LibraryType` through the companion
//! `Self::__keyword_<name>()`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{
    Attribute, Expr, FnArg, Ident, ItemFn, LitStr, Meta, Pat, ReturnType, Token,
    Type, bracketed, parse_macro_input,
};

/// Exposes a function or method as a keyword.
///
/// ```ignore
/// #[keyword(name = "Open Browser", tags = ["browser"])]
/// /// Opens `url` in a new browser.
/// fn open_browser(url: String, #[arg(default = "chrome".to_owned())] browser: String) {}
/// ```
///
/// Parameters accept `#[arg(default = <expr>)]`, `#[arg(varargs)]` and
/// `#[arg(kwargs)]`; a defaulted parameter's type must implement `Debug`.
/// Functions returning a type named `Result` are fallible; their error is
/// boxed into `KeywordError::Failed`.
///
/// Documentation comes from every `#[doc = ..]` attribute, including computed
/// forms such as `#[doc = include_str!("..")]`.
#[proc_macro_attribute]
pub fn keyword(attr: TokenStream, item: TokenStream) -> TokenStream {
    let options = parse_macro_input!(attr as KeywordOptions);
    let function = parse_macro_input!(item as ItemFn);
    expand(options, function)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[derive(Default)]
struct KeywordOptions {
    name: Option<LitStr>,
    tags: Vec<LitStr>,
}

impl Parse for KeywordOptions {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut options = Self::default();
        if input.peek(LitStr) {
            options.name = Some(input.parse()?);
            if input.is_empty() {
                return Ok(options);
            }
            input.parse::<Token![,]>()?;
        }

        while !input.is_empty() {
            let key: Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            if key == "name" {
                options.name = Some(input.parse()?);
            } else if key == "tags" {
                let content;
                bracketed!(content in input);
                let tags = Punctuated::<LitStr, Token![,]>::parse_terminated(&content)?;
                options.tags = tags.into_iter().collect();
            } else {
                return Err(syn::Error::new(
                    key.span(),
                    "unknown `keyword` option; expected `name` or `tags`",
                ));
            }

            if input.is_empty() {
                break;
            }
            input.parse::<Token![,]>()?;
        }

        Ok(options)
    }
}

enum Role {
    Required,
    Default(Expr),
    Varargs,
    Kwargs,
}

struct Param {
    ident: Ident,
    name: String,
    ty: Type,
    role: Role,
}

fn expand(options: KeywordOptions, mut function: ItemFn) -> syn::Result<TokenStream2> {
    let sig = &function.sig;
    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(asyncness, "keywords cannot be `async`"));
    }
    if !sig.generics.params.is_empty() || sig.generics.where_clause.is_some() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "keywords cannot be generic",
        ));
    }
    if let Some(variadic) = &sig.variadic {
        return Err(syn::Error::new_spanned(variadic, "keywords cannot be C-variadic"));
    }

    let mut receiver = false;
    let mut params = Vec::new();
    for input in &mut function.sig.inputs {
        match input {
            FnArg::Receiver(recv) => {
                if recv.reference.is_none() || recv.mutability.is_some() {
                    return Err(syn::Error::new_spanned(
                        recv,
                        "keyword methods must take `&self`",
                    ));
                }
                receiver = true;
            }
            FnArg::Typed(pat_type) => {
                let ident = match pat_type.pat.as_ref() {
                    Pat::Ident(pat) if pat.by_ref.is_none() && pat.subpat.is_none() => {
                        pat.ident.clone()
                    }
                    other => {
                        return Err(syn::Error::new_spanned(
                            other,
                            "keyword parameters must be plain identifiers",
                        ));
                    }
                };
                let role = take_role(&mut pat_type.attrs)?;
                params.push(Param {
                    name: ident.unraw().to_string(),
                    ident,
                    ty: pat_type.ty.as_ref().clone(),
                    role,
                });
            }
        }
    }
    check_order(&params)?;

    let fn_ident = function.sig.ident.clone();
    let fn_name = fn_ident.unraw().to_string();
    let companion = format_ident!("__keyword_{}", fn_name);
    let vis = function.vis.clone();
    let doc = doc_text(&function.attrs);
    let spec = argument_spec(&params);
    let exposure = exposure(&options);

    let idents: Vec<&Ident> = params.iter().map(|param| &param.ident).collect();
    let call = if receiver {
        quote!(__receiver.#fn_ident(#(#idents),*))
    } else {
        quote!(#fn_ident(#(#idents),*))
    };
    let invoke = if returns_result(&function.sig.output) {
        quote! {
            match #call {
                ::core::result::Result::Ok(__value) => {
                    ::keyword_core::__private::into_return(#fn_name, __value)
                }
                ::core::result::Result::Err(__error) => {
                    ::core::result::Result::Err(::keyword_core::KeywordError::failed(__error))
                }
            }
        }
    } else {
        quote!(::keyword_core::__private::into_return(#fn_name, #call))
    };
    let bindings = params.iter().map(binding);
    let body = quote! {
        #[allow(unused_mut)]
        let mut __binder = __arguments.binder(#fn_name);
        #(#bindings)*
        __binder.finish()?;
        #invoke
    };

    let expanded = if receiver {
        quote! {
            #function

            #[doc(hidden)]
            #[allow(non_snake_case)]
            #vis fn #companion() -> ::keyword_core::Method<Self> {
                ::keyword_core::Method::new(
                    #fn_name,
                    #spec,
                    |__receiver: &Self,
                     __arguments: ::keyword_core::Arguments|
                     -> ::keyword_core::KeywordResult<::keyword_core::Value> { #body },
                )
                .with_doc(#doc)
                .exposed(#exposure)
            }
        }
    } else {
        quote! {
            #function

            #[doc(hidden)]
            #[allow(non_snake_case)]
            #vis fn #companion() -> ::keyword_core::Callable {
                ::keyword_core::Callable::new(
                    #fn_name,
                    #spec,
                    |__arguments: ::keyword_core::Arguments|
                     -> ::keyword_core::KeywordResult<::keyword_core::Value> { #body },
                )
                .with_doc(#doc)
                .exposed(#exposure)
            }

            ::keyword_core::__private::inventory::submit! {
                ::keyword_core::FunctionEntry::new(::core::module_path!(), #companion)
            }
        }
    };

    Ok(expanded)
}

fn take_role(attrs: &mut Vec<Attribute>) -> syn::Result<Role> {
    let mut role = Role::Required;
    let mut kept = Vec::with_capacity(attrs.len());
    for attr in attrs.drain(..) {
        if attr.path().is_ident("arg") {
            role = attr.parse_args_with(parse_role)?;
        } else {
            kept.push(attr);
        }
    }
    *attrs = kept;
    Ok(role)
}

fn parse_role(input: ParseStream) -> syn::Result<Role> {
    let key: Ident = input.parse()?;
    if key == "default" {
        input.parse::<Token![=]>()?;
        Ok(Role::Default(input.parse()?))
    } else if key == "varargs" {
        Ok(Role::Varargs)
    } else if key == "kwargs" {
        Ok(Role::Kwargs)
    } else {
        Err(syn::Error::new(
            key.span(),
            "expected `default = <expr>`, `varargs` or `kwargs`",
        ))
    }
}

fn check_order(params: &[Param]) -> syn::Result<()> {
    let mut seen_default = false;
    let mut seen_varargs = false;
    let mut seen_kwargs = false;
    for param in params {
        let fail = |message: &str| Err(syn::Error::new_spanned(&param.ident, message));
        if seen_kwargs {
            return fail("the `kwargs` parameter must be last");
        }
        match param.role {
            Role::Required if seen_varargs => {
                return fail("parameters after `varargs` are not supported");
            }
            Role::Required if seen_default => {
                return fail("mandatory parameter follows a parameter with a default");
            }
            Role::Required => {}
            Role::Default(_) if seen_varargs => {
                return fail("parameters after `varargs` are not supported");
            }
            Role::Default(_) => seen_default = true,
            Role::Varargs if seen_varargs => {
                return fail("only one `varargs` parameter is allowed");
            }
            Role::Varargs => seen_varargs = true,
            Role::Kwargs => seen_kwargs = true,
        }
    }
    Ok(())
}

fn binding(param: &Param) -> TokenStream2 {
    let Param {
        ident, name, ty, ..
    } = param;
    match &param.role {
        Role::Required => quote! {
            let #ident: #ty = __binder.required(#name)?;
        },
        Role::Default(default) => quote! {
            let #ident: #ty = __binder.optional(#name, || #default)?;
        },
        Role::Varargs => quote! {
            let #ident: #ty = __binder.varargs(#name)?;
        },
        Role::Kwargs => quote! {
            let #ident: #ty = __binder.kwargs(#name)?;
        },
    }
}

fn argument_spec(params: &[Param]) -> TokenStream2 {
    let mut names = Vec::new();
    let mut defaults = Vec::new();
    let mut varargs = quote!(::core::option::Option::None);
    let mut kwargs = quote!(::core::option::Option::None);
    for param in params {
        let name = &param.name;
        let ty = &param.ty;
        match &param.role {
            Role::Required => names.push(name),
            Role::Default(default) => {
                names.push(name);
                defaults.push(quote!(::keyword_core::__private::default_value::<#ty>(#default)));
            }
            Role::Varargs => {
                varargs = quote!(::core::option::Option::Some(::std::string::String::from(#name)));
            }
            Role::Kwargs => {
                kwargs = quote!(::core::option::Option::Some(::std::string::String::from(#name)));
            }
        }
    }

    quote! {
        ::keyword_core::ArgumentSpec::from_parts(
            ::std::vec![#(::std::string::String::from(#names)),*],
            ::std::vec![#(#defaults),*],
            #varargs,
            #kwargs,
        )
    }
}

fn exposure(options: &KeywordOptions) -> TokenStream2 {
    let mut exposure = quote!(::keyword_core::ExposureMetadata::new());
    if let Some(name) = &options.name {
        exposure = quote!(#exposure.with_name(#name));
    }
    if !options.tags.is_empty() {
        let tags = &options.tags;
        exposure = quote!(#exposure.with_tags([#(#tags),*]));
    }
    exposure
}

fn doc_text(attrs: &[Attribute]) -> TokenStream2 {
    let parts: Vec<&Expr> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(meta) => Some(&meta.value),
            _ => None,
        })
        .collect();
    let separated = parts.iter().enumerate().map(|(index, part)| {
        if index == 0 {
            quote!(#part)
        } else {
            quote!("\n", #part)
        }
    });
    quote!(::core::concat!(#(#separated),*))
}

fn returns_result(output: &ReturnType) -> bool {
    match output {
        ReturnType::Type(_, ty) => match ty.as_ref() {
            Type::Path(path) => path
                .path
                .segments
                .last()
                .is_some_and(|segment| segment.ident == "Result"),
            _ => false,
        },
        ReturnType::Default => false,
    }
}
