use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{
    Data, DeriveInput, Error, Field, Fields, GenericArgument, LitStr, Path, PathArguments, Type,
    Visibility, parse_macro_input, parse_quote,
};

const SCALARS: &[&str] = &[
    "String", "bool", "f32", "f64", "i8", "i16", "i32", "i64", "isize", "u8", "u16", "u32",
    "u64", "usize",
];

pub fn derive_record_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

struct FormField {
    key: String,
    ident: syn::Ident,
}

fn expand(mut input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let krate = crate_path(&input)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new_spanned(
                    &input.ident,
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(Error::new_spanned(
                &input.ident,
                "Record can only be derived for structs",
            ));
        }
    };

    let mut form_fields = Vec::new();
    for field in fields {
        if let Some(form_field) = form_field(field)? {
            form_fields.push(form_field);
        }
    }

    let keys: Vec<LitStr> = form_fields
        .iter()
        .map(|f| LitStr::new(&f.key, Span::call_site()))
        .collect();
    let idents: Vec<&syn::Ident> = form_fields.iter().map(|f| &f.ident).collect();

    let type_params: Vec<syn::Ident> = input
        .generics
        .type_params()
        .map(|param| param.ident.clone())
        .collect();
    {
        let where_clause = input.generics.make_where_clause();
        for param in &type_params {
            where_clause
                .predicates
                .push(parse_quote!(#param: ::core::marker::Send + 'static));
        }
    }

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #krate::Record for #name #ty_generics #where_clause {
            fn assign_field(&mut self, field: &str, raw: &str) -> bool {
                match field {
                    #(
                        #keys => {
                            #krate::FormValue::assign_form_value(&mut self.#idents, raw);
                            true
                        }
                    )*
                    _ => {
                        let _ = raw;
                        false
                    }
                }
            }
        }
    })
}

fn crate_path(input: &DeriveInput) -> syn::Result<Path> {
    let mut krate: Path = parse_quote!(::easyrest);
    for attr in &input.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("crate") {
                let value: LitStr = meta.value()?.parse()?;
                krate = value.parse()?;
                Ok(())
            } else {
                Err(meta.error("unsupported record container attribute"))
            }
        })?;
    }
    Ok(krate)
}

fn form_field(field: &Field) -> syn::Result<Option<FormField>> {
    let Some(ident) = field.ident.clone() else {
        return Ok(None);
    };

    let mut skip = false;
    let mut force = false;
    let mut rename = None;

    for attr in &field.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else if meta.path.is_ident("form") {
                force = true;
                Ok(())
            } else if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                rename = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported record field attribute"))
            }
        })?;
    }

    let public = matches!(field.vis, Visibility::Public(_));
    if skip || !(force || (public && is_scalar(&field.ty))) {
        return Ok(None);
    }

    let key = rename.unwrap_or_else(|| {
        let name = ident.to_string();
        name.strip_prefix("r#").map(str::to_string).unwrap_or(name)
    });

    Ok(Some(FormField { key, ident }))
}

/// `String`, `bool`, primitive numbers, and `Option`s of those.
fn is_scalar(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    if path.qself.is_some() {
        return false;
    }
    let Some(last) = path.path.segments.last() else {
        return false;
    };

    if last.ident == "Option" {
        return match &last.arguments {
            PathArguments::AngleBracketed(args) => matches!(
                args.args.first(),
                Some(GenericArgument::Type(inner)) if args.args.len() == 1 && is_scalar(inner)
            ),
            _ => false,
        };
    }

    last.arguments.is_none() && SCALARS.iter().any(|name| last.ident == name)
}
