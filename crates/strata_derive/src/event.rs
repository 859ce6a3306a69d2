use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    parse::{Parse, ParseStream},
    DeriveInput,
};

pub struct DeriveEvent {
    ident: syn::Ident,
    name: String,
}

impl Parse for DeriveEvent {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let input: DeriveInput = input.parse()?;

        let mut name = None;
        for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("event")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: syn::LitStr = meta.value()?.parse()?;
                    name = Some(value.value());
                    Ok(())
                } else {
                    Err(meta.error("unknown event attribute"))
                }
            })?;
        }

        Ok(DeriveEvent {
            name: name.unwrap_or_else(|| input.ident.to_string()),
            ident: input.ident,
        })
    }
}

impl DeriveEvent {
    pub fn expand(self) -> TokenStream {
        let Self { ident, name } = self;

        quote! {
            #[automatically_derived]
            impl ::strata::EventType for #ident {
                const EVENT_TYPE: &'static str = #name;
            }
        }
    }
}
