#![forbid(unsafe_code)]

extern crate proc_macro;

#[macro_use]
extern crate proc_macro_error;

mod entity;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives `sqlframe::Entity`.
///
/// Struct attribute: `#[entity(table = "users")]`, defaulting to the lower-cased
/// type name. Field attributes: `#[entity(column = "password_hash")]` to rename
/// the column, `#[entity(skip)]` to exclude the field from generated SQL.
#[proc_macro_error]
#[proc_macro_derive(Entity, attributes(entity))]
pub fn entity_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match entity::entity_impl(input) {
        Ok(output) => output.into(),
        Err(e) => e.to_compile_error().into(),
    }
}
