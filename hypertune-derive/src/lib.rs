use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, parse_macro_input};

/// Derive macro for the `FromParams` trait on structs with named fields.
///
/// Each field becomes a parameter named after the field. The struct must
/// implement `Default`; fields absent from the combination keep their default
/// value. Field types must implement `hypertune::FromParamValue`.
///
/// Field attributes:
///
/// - `#[param(rename = "C")]` uses a different parameter name.
/// - `#[param(skip)]` excludes the field from the schema.
///
/// # Example
///
/// ```ignore
/// use hypertune::FromParams;
///
/// #[derive(Default, FromParams)]
/// struct SvmConfig {
///     #[param(rename = "C")]
///     c: f64,
///     kernel: String,
///     #[param(skip)]
///     cache: Vec<f64>,
/// }
/// ```
#[proc_macro_derive(FromParams, attributes(param))]
pub fn derive_from_params(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let Data::Struct(data_struct) = &input.data else {
        return syn::Error::new_spanned(&input, "FromParams can only be derived for structs")
            .to_compile_error()
            .into();
    };
    let Fields::Named(fields) = &data_struct.fields else {
        return syn::Error::new_spanned(
            &input,
            "FromParams can only be derived for structs with named fields",
        )
        .to_compile_error()
        .into();
    };

    let mut idents = Vec::new();
    let mut types = Vec::new();
    let mut keys = Vec::new();
    for field in &fields.named {
        let Some(ident) = &field.ident else { continue };
        let mut key = ident.to_string();
        let mut skip = false;

        for attr in field.attrs.iter().filter(|a| a.path().is_ident("param")) {
            let parsed = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    key = meta.value()?.parse::<LitStr>()?.value();
                    Ok(())
                } else if meta.path.is_ident("skip") {
                    skip = true;
                    Ok(())
                } else {
                    Err(meta.error("expected `rename = \"...\"` or `skip`"))
                }
            });
            if let Err(e) = parsed {
                return e.to_compile_error().into();
            }
        }

        if skip {
            continue;
        }
        if keys.contains(&key) {
            return syn::Error::new_spanned(field, format!("parameter `{key}` declared twice"))
                .to_compile_error()
                .into();
        }
        idents.push(ident);
        types.push(&field.ty);
        keys.push(key);
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::hypertune::FromParams for #name #ty_generics #where_clause {
            const PARAM_NAMES: &'static [&'static str] = &[#(#keys),*];

            fn from_params(params: &::hypertune::Params) -> ::hypertune::Result<Self> {
                params.check_names(Self::PARAM_NAMES)?;
                let mut config = <Self as ::core::default::Default>::default();
                #(
                    if let ::core::option::Option::Some(value) = params.get(#keys) {
                        config.#idents =
                            <#types as ::hypertune::FromParamValue>::from_param_value(#keys, value)?;
                    }
                )*
                ::core::result::Result::Ok(config)
            }
        }
    };

    expanded.into()
}
