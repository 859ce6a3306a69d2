use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    ext::IdentExt,
    parse::{Parse, ParseStream},
    spanned::Spanned,
    DeriveInput,
};

pub struct DeriveRecord {
    ident: syn::Ident,
    fields: Vec<(syn::Ident, syn::Type)>,
}

impl Parse for DeriveRecord {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let input: DeriveInput = input.parse()?;
        if !input.generics.params.is_empty() {
            return Err(syn::Error::new(
                input.generics.span(),
                "records cannot be generic",
            ));
        }

        let syn::Data::Struct(data) = input.data else {
            return Err(syn::Error::new(
                input.ident.span(),
                "records must be structs",
            ));
        };
        let syn::Fields::Named(syn::FieldsNamed { named, .. }) = data.fields else {
            return Err(syn::Error::new(
                data.fields.span(),
                "records must have named fields",
            ));
        };

        let fields = named
            .into_iter()
            .map(|field| {
                let ident = field
                    .ident
                    .ok_or_else(|| syn::Error::new(field.ty.span(), "expected named field"))?;
                Ok((ident, field.ty))
            })
            .collect::<syn::Result<_>>()?;

        Ok(DeriveRecord {
            ident: input.ident,
            fields,
        })
    }
}

impl DeriveRecord {
    pub fn expand(self) -> TokenStream {
        let record_impl = self.expand_record_impl();
        let codec_impls = self.expand_codec_impls();

        quote! {
            #record_impl
            #codec_impls
        }
    }

    fn expand_record_impl(&self) -> TokenStream {
        let Self { ident, fields } = self;
        let name = ident.to_string();

        let schema_fields = fields.iter().map(|(field, ty)| {
            let field_name = field.unraw().to_string();
            quote! {
                ::strata::codec::Field::new(#field_name, <#ty as ::strata::Decode>::kind())
            }
        });

        let encode_fields = fields.iter().map(|(field, _)| {
            let field_name = field.unraw().to_string();
            quote! {
                __fields.insert(
                    ::std::string::ToString::to_string(#field_name),
                    ::strata::Encode::encode(&self.#field, __codec)?,
                );
            }
        });

        let sealed_fields = fields.iter().map(|(field, _)| {
            let field_name = field.unraw().to_string();
            quote! {
                if ::strata::Encode::sealed(&self.#field).is_some() {
                    __sealed.push(#field_name);
                }
            }
        });

        let decode_fields = fields.iter().map(|(field, _)| {
            let field_name = field.unraw().to_string();
            quote! {
                #field: __codec.decode_field(&mut __fields, #name, #field_name)?
            }
        });

        let from_scalar = match fields.as_slice() {
            [(field, ty)] => quote! {
                fn from_scalar(
                    __value: ::strata::__macro_helpers::serde_json::Value,
                    __codec: &::strata::Codec,
                ) -> ::std::result::Result<Self, ::strata::Error> {
                    ::std::result::Result::Ok(#ident {
                        #field: <#ty as ::strata::Decode>::decode(__value, __codec)?,
                    })
                }
            },
            _ => TokenStream::new(),
        };

        quote! {
            #[automatically_derived]
            impl ::strata::Record for #ident {
                fn schema() -> &'static ::strata::codec::Schema {
                    static SCHEMA: ::std::sync::OnceLock<::strata::codec::Schema> =
                        ::std::sync::OnceLock::new();
                    SCHEMA.get_or_init(|| {
                        ::strata::codec::Schema::new(#name, ::std::vec![#( #schema_fields, )*])
                    })
                }

                fn encode_fields(
                    &self,
                    __codec: &::strata::Codec,
                ) -> ::std::result::Result<::strata::codec::Fields, ::strata::Error> {
                    let mut __fields = ::strata::codec::Fields::new();
                    #( #encode_fields )*
                    ::std::result::Result::Ok(__fields)
                }

                #[allow(unused_mut)]
                fn sealed_fields(&self) -> ::std::vec::Vec<&'static str> {
                    let mut __sealed = ::std::vec::Vec::new();
                    #( #sealed_fields )*
                    __sealed
                }

                #[allow(unused_mut)]
                fn decode_fields(
                    mut __fields: ::strata::codec::RecordFields,
                    __codec: &::strata::Codec,
                ) -> ::std::result::Result<Self, ::strata::Error> {
                    ::std::result::Result::Ok(#ident {
                        #( #decode_fields, )*
                    })
                }

                #from_scalar
            }
        }
    }

    fn expand_codec_impls(&self) -> TokenStream {
        let ident = &self.ident;

        quote! {
            #[automatically_derived]
            impl ::strata::Encode for #ident {
                fn encode(
                    &self,
                    codec: &::strata::Codec,
                ) -> ::std::result::Result<::strata::__macro_helpers::serde_json::Value, ::strata::Error> {
                    codec.encode_record(self)
                }
            }

            #[automatically_derived]
            impl ::strata::Decode for #ident {
                fn kind() -> ::strata::codec::FieldKind {
                    ::strata::codec::FieldKind::Record(<#ident as ::strata::Record>::schema)
                }

                fn decode(
                    value: ::strata::__macro_helpers::serde_json::Value,
                    codec: &::strata::Codec,
                ) -> ::std::result::Result<Self, ::strata::Error> {
                    codec.decode_record(value)
                }
            }
        }
    }
}
