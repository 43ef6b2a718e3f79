//! Custom derive for `devalloc::memory::DeviceCopy`.
//!
//! The derive is only sound if every field of the type is itself `DeviceCopy`, so alongside the
//! impl it emits a hidden function that asserts exactly that for each field. A type with a
//! `Vec`, `Box` or reference field fails to compile.

extern crate proc_macro;

use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;
use syn::{
    parse_quote, Data, DataEnum, DataStruct, DataUnion, DeriveInput, Field, Fields, Generics,
    TypeParamBound,
};

/// Derives `DeviceCopy` for a struct, enum or union whose fields are all `DeviceCopy`.
#[proc_macro_derive(DeviceCopy)]
pub fn derive_device_copy(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);
    proc_macro::TokenStream::from(impl_device_copy(&ast))
}

fn impl_device_copy(input: &DeriveInput) -> TokenStream {
    let input_type = &input.ident;

    let checks = match input.data {
        Data::Struct(ref data_struct) => type_check_struct(data_struct),
        Data::Enum(ref data_enum) => type_check_enum(data_enum),
        Data::Union(ref data_union) => type_check_union(data_union),
    };

    let verify_fn = Ident::new(
        &format!("__verify_{}_can_implement_DeviceCopy", input_type),
        Span::call_site(),
    );

    let generics = add_bound_to_generics(&input.generics);
    let (impl_generics, type_generics, where_clause) = generics.split_for_impl();

    quote! {
        unsafe impl #impl_generics ::devalloc::memory::DeviceCopy
            for #input_type #type_generics #where_clause {}

        #[doc(hidden)]
        #[allow(non_snake_case, unused_variables, dead_code)]
        fn #verify_fn #impl_generics(value: &#input_type #type_generics) #where_clause {
            #(#checks)*
        }
    }
}

fn add_bound_to_generics(generics: &Generics) -> Generics {
    let mut generics = generics.clone();
    let bound: TypeParamBound = parse_quote!(::devalloc::memory::DeviceCopy);
    for type_param in generics.type_params_mut() {
        type_param.bounds.push(bound.clone());
    }
    generics
}

fn fields_of(fields: &Fields) -> Vec<&Field> {
    match *fields {
        Fields::Named(ref named) => named.named.iter().collect(),
        Fields::Unnamed(ref unnamed) => unnamed.unnamed.iter().collect(),
        Fields::Unit => Vec::new(),
    }
}

fn type_check_struct(s: &DataStruct) -> Vec<TokenStream> {
    check_fields(&fields_of(&s.fields))
}

fn type_check_enum(e: &DataEnum) -> Vec<TokenStream> {
    e.variants
        .iter()
        .flat_map(|variant| check_fields(&fields_of(&variant.fields)))
        .collect()
}

fn type_check_union(u: &DataUnion) -> Vec<TokenStream> {
    let fields: Vec<&Field> = u.fields.named.iter().collect();
    check_fields(&fields)
}

fn check_fields(fields: &[&Field]) -> Vec<TokenStream> {
    fields
        .iter()
        .map(|field| {
            let field_type = &field.ty;
            quote! {
                {
                    fn assert_impl<T: ::devalloc::memory::DeviceCopy>() {}
                    assert_impl::<#field_type>();
                }
            }
        })
        .collect()
}
