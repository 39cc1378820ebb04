use convert_case::{Case, Casing};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Ident, LitStr};

struct FieldAttrs {
    column: Option<String>,
    skip: bool,
}

fn struct_table(input: &DeriveInput) -> syn::Result<Option<String>> {
    let mut table = None;

    for attr in input.attrs.iter().filter(|a| a.path().is_ident("entity")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let lit: LitStr = meta.value()?.parse()?;
                table = Some(lit.value());
                return Ok(());
            }

            Err(meta.error("expected `table = \"...\"`"))
        })?;
    }

    Ok(table)
}

fn field_attrs(field: &syn::Field) -> syn::Result<FieldAttrs> {
    let mut attrs = FieldAttrs {
        column: None,
        skip: false,
    };

    for attr in field.attrs.iter().filter(|a| a.path().is_ident("entity")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("column") {
                let lit: LitStr = meta.value()?.parse()?;
                attrs.column = Some(lit.value());
                return Ok(());
            }

            if meta.path.is_ident("skip") {
                attrs.skip = true;
                return Ok(());
            }

            Err(meta.error("expected `column = \"...\"` or `skip`"))
        })?;
    }

    Ok(attrs)
}

pub fn entity_impl(input: DeriveInput) -> syn::Result<TokenStream> {
    let ident = &input.ident;

    let syn::Data::Struct(data) = &input.data else {
        abort!(ident, "Derive Entity only available on struct");
    };

    let syn::Fields::Named(named) = &data.fields else {
        abort!(ident, "Derive Entity requires named fields");
    };

    let entity_name = ident.to_string();
    let table = struct_table(&input)?.unwrap_or_else(|| entity_name.to_case(Case::Flat));

    let mut descriptors = Vec::new();
    let mut persisted: Vec<(&Ident, String)> = Vec::new();

    for field in &named.named {
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };

        let attrs = field_attrs(field)?;
        let name = field_ident.to_string();

        if attrs.skip {
            descriptors.push(quote! { ::sqlframe::Field::new(#name, None) });
            continue;
        }

        let column = attrs.column.unwrap_or_else(|| name.clone());
        if persisted.iter().any(|(_, c)| c.eq_ignore_ascii_case(&column)) {
            abort!(field_ident, "column `{}` is mapped by more than one field", column);
        }

        descriptors.push(quote! { ::sqlframe::Field::new(#name, Some(#column)) });
        persisted.push((field_ident, column));
    }

    let find = |column: &str| {
        persisted
            .iter()
            .find(|(_, c)| c == column)
            .map(|(field, _)| *field)
    };

    let Some(id_field) = find("id") else {
        abort!(ident, "Entity `{}` requires a field mapped to column `id`", entity_name);
    };

    for required in ["created_at", "updated_at"] {
        if find(required).is_none() {
            abort!(
                ident,
                "Entity `{}` requires a field mapped to column `{}`",
                entity_name,
                required
            );
        }
    }

    let value_pairs = persisted.iter().map(|(field, column)| {
        quote! {
            (#column, ::sqlframe::Value::from(::core::clone::Clone::clone(&self.#field)))
        }
    });

    let setters = persisted.iter().map(|(field, column)| {
        quote! {
            if column.eq_ignore_ascii_case(#column) {
                self.#field = ::sqlframe::FromValue::from_value(value)
                    .map_err(|e| e.in_column(#column))?;
                return Ok(());
            }
        }
    });

    Ok(quote! {
        impl ::sqlframe::Entity for #ident {
            fn entity_name() -> &'static str {
                #entity_name
            }

            fn table_name() -> &'static str {
                #table
            }

            fn fields() -> &'static [::sqlframe::Field] {
                const FIELDS: &[::sqlframe::Field] = &[#(#descriptors),*];
                FIELDS
            }

            fn id(&self) -> ::sqlframe::Value {
                ::sqlframe::Value::from(::core::clone::Clone::clone(&self.#id_field))
            }

            fn to_values(&self) -> ::std::vec::Vec<(&'static str, ::sqlframe::Value)> {
                ::std::vec![#(#value_pairs),*]
            }

            fn set_value(
                &mut self,
                column: &str,
                value: ::sqlframe::Value,
            ) -> ::core::result::Result<(), ::sqlframe::MappingError> {
                #(#setters)*

                Err(::sqlframe::MappingError::UnknownColumn {
                    entity: #entity_name,
                    column: column.to_owned(),
                })
            }
        }
    })
}
