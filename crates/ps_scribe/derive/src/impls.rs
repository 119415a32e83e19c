//! Code generation of `#[derive(Scribe)]`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Field, Fields, Ident, LitStr, Type, WherePredicate, parse_quote};

use crate::attributes::{FieldAttributes, TypeAttributes};

const TYPE_FIELD: &str = "type";

// Types whose `Scribe` impl writes something other than named fields.
const UNFLATTENABLE: &[&str] = &[
    "Vec", "VecDeque", "LinkedList", "BTreeMap", "HashMap", "Option", "String", "str", "bool",
    "char", "u8", "u16", "u32", "u64", "u128", "usize", "i8", "i16", "i32", "i64", "i128",
    "isize", "f32", "f64",
];

fn check_flatten(ty: &Type) -> syn::Result<()> {
    let flattenable = match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|segment| !UNFLATTENABLE.iter().any(|name| segment.ident == *name)),
        Type::Group(group) => return check_flatten(&group.elem),
        Type::Paren(paren) => return check_flatten(&paren.elem),
        _ => false,
    };
    if flattenable {
        Ok(())
    } else {
        Err(syn::Error::new_spanned(
            ty,
            "only struct fields can be flattened, this type is not written as named fields",
        ))
    }
}

// -----------------------------------------------------------------------------
// Fields

struct ScribeField<'a> {
    field: &'a Field,
    ident: &'a Ident,
    name: LitStr,
    attrs: FieldAttributes,
}

impl<'a> ScribeField<'a> {
    fn parse(field: &'a Field) -> syn::Result<Self> {
        let attrs = FieldAttributes::parse_attrs(&field.attrs)?;
        if attrs.flatten {
            check_flatten(&field.ty)?;
        }
        let Some(ident) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        let name = match &attrs.rename {
            Some(rename) => rename.clone(),
            None => {
                let text = ident.to_string();
                let text = text.strip_prefix("r#").unwrap_or(&text);
                LitStr::new(text, ident.span())
            }
        };
        Ok(Self {
            field,
            ident,
            name,
            attrs,
        })
    }

    fn save(&self, krate: &syn::Path) -> TokenStream {
        let ScribeField { ident, name, .. } = self;
        if self.attrs.skip {
            quote! {}
        } else if self.attrs.flatten {
            quote! { #krate::Scribe::save(&self.#ident, ar)?; }
        } else if self.attrs.optional {
            quote! { #krate::wrap_optional(#name, &self.#ident).save(ar)?; }
        } else {
            quote! { #krate::wrap(#name, &self.#ident).save(ar)?; }
        }
    }

    fn load(&self, krate: &syn::Path) -> TokenStream {
        let ScribeField { ident, name, .. } = self;
        if self.attrs.skip {
            quote! {}
        } else if self.attrs.flatten {
            quote! { #krate::Scribe::load(&mut self.#ident, ar)?; }
        } else if self.attrs.optional {
            quote! { #krate::wrap_optional(#name, &mut self.#ident).load(ar)?; }
        } else {
            quote! { #krate::wrap(#name, &mut self.#ident).load(ar)?; }
        }
    }
}

fn parse_fields(ast: &DeriveInput) -> syn::Result<Vec<ScribeField<'_>>> {
    match &ast.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => fields.named.iter().map(ScribeField::parse).collect(),
            Fields::Unit => Ok(Vec::new()),
            Fields::Unnamed(fields) => Err(syn::Error::new_spanned(
                fields,
                "`Scribe` cannot be derived for tuple structs, fields need names",
            )),
        },
        Data::Enum(data) => Err(syn::Error::new(
            data.enum_token.span,
            "`Scribe` cannot be derived for enums",
        )),
        Data::Union(data) => Err(syn::Error::new(
            data.union_token.span,
            "`Scribe` cannot be derived for unions",
        )),
    }
}

// -----------------------------------------------------------------------------
// Derive

pub(crate) fn derive_scribe(ast: &DeriveInput) -> syn::Result<TokenStream> {
    let attrs = TypeAttributes::parse_attrs(&ast.attrs)?;
    let fields = parse_fields(ast)?;
    if attrs.is_polymorphic() {
        let reserved = fields.iter().find(|field| {
            !field.attrs.skip && !field.attrs.flatten && field.name.value() == TYPE_FIELD
        });
        if let Some(field) = reserved {
            return Err(syn::Error::new(
                field.name.span(),
                "the `type` field holds the type tag, rename this field",
            ));
        }
    }
    let krate = attrs.krate.clone().unwrap_or_else(crate::path::ps_scribe);

    let ident = &ast.ident;
    let is_generic = !ast.generics.params.is_empty();
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let mut scribe_where = where_clause
        .cloned()
        .unwrap_or_else(|| parse_quote! { where });
    if is_generic {
        for field in fields.iter().filter(|field| !field.attrs.skip) {
            let ty = &field.field.ty;
            let predicate: WherePredicate = parse_quote! { #ty: #krate::Scribe };
            scribe_where.predicates.push(predicate);
        }
    }
    let mut load_new_where = scribe_where.clone();
    load_new_where
        .predicates
        .push(parse_quote! { Self: ::core::default::Default });

    let saves = fields.iter().map(|field| field.save(&krate));
    let loads = fields.iter().map(|field| field.load(&krate));

    let scribe_impl = quote! {
        impl #impl_generics #krate::Scribe for #ident #ty_generics #scribe_where {
            #[allow(unused_variables)]
            fn save<__A: #krate::archive::OutputArchive>(
                &self,
                ar: &mut __A,
            ) -> ::core::result::Result<(), #krate::ScribeError> {
                #(#saves)*
                ::core::result::Result::Ok(())
            }

            #[allow(unused_variables)]
            fn load<__A: #krate::archive::InputArchive>(
                &mut self,
                ar: &mut __A,
            ) -> ::core::result::Result<(), #krate::ScribeError> {
                #(#loads)*
                ::core::result::Result::Ok(())
            }
        }

        impl #impl_generics #krate::LoadNew for #ident #ty_generics #load_new_where {
            fn load_new<__A: #krate::archive::InputArchive>(
                ar: &mut __A,
            ) -> ::core::result::Result<Self, #krate::ScribeError> {
                let mut value = <Self as ::core::default::Default>::default();
                #krate::Scribe::load(&mut value, ar)?;
                ::core::result::Result::Ok(value)
            }
        }
    };

    if is_generic {
        return Ok(scribe_impl);
    }

    let pointee_impl = if let Some(tag) = &attrs.tag {
        let relations = attrs.bases.iter().map(|base| {
            quote! { #krate::register_relation!(dyn #base => #ident); }
        });
        quote! {
            #krate::impl_pointee!(#ident, tag = #tag);
            #krate::register_type!(#ident);
            #(#relations)*
        }
    } else if attrs.is_polymorphic() {
        quote! { #krate::impl_pointee!(#ident, polymorphic); }
    } else {
        quote! { #krate::impl_pointee!(#ident); }
    };

    Ok(quote! {
        #scribe_impl
        #pointee_impl
    })
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use syn::{DeriveInput, parse_quote};

    use super::derive_scribe;

    fn message(ast: &DeriveInput) -> String {
        match derive_scribe(ast) {
            Ok(_) => String::new(),
            Err(err) => err.to_string(),
        }
    }

    #[test]
    fn tagged_type_field_is_refused() {
        let ast: DeriveInput = parse_quote! {
            #[scribe(crate = "ps_scribe", tag = "derive.Typed")]
            struct Typed {
                r#type: String,
            }
        };
        assert!(message(&ast).contains("type tag"));

        let ast: DeriveInput = parse_quote! {
            #[scribe(crate = "ps_scribe", polymorphic)]
            struct Renamed {
                #[scribe(rename = "type")]
                kind: String,
            }
        };
        assert!(message(&ast).contains("type tag"));
    }

    #[test]
    fn type_field_is_plain_elsewhere() {
        let ast: DeriveInput = parse_quote! {
            #[scribe(crate = "ps_scribe")]
            struct Plain {
                r#type: String,
            }
        };
        assert!(derive_scribe(&ast).is_ok());

        let ast: DeriveInput = parse_quote! {
            #[scribe(crate = "ps_scribe", tag = "derive.Kept")]
            struct Kept {
                #[scribe(rename = "kind")]
                r#type: String,
            }
        };
        assert!(derive_scribe(&ast).is_ok());
    }

    #[test]
    fn only_structs_flatten() {
        let refused: [DeriveInput; 4] = [
            parse_quote! {
                #[scribe(crate = "ps_scribe")]
                struct A { #[scribe(flatten)] extra: BTreeMap<String, u32>, x: u32 }
            },
            parse_quote! {
                #[scribe(crate = "ps_scribe")]
                struct B { #[scribe(flatten)] items: Vec<u8> }
            },
            parse_quote! {
                #[scribe(crate = "ps_scribe")]
                struct C { #[scribe(flatten)] maybe: Option<Common> }
            },
            parse_quote! {
                #[scribe(crate = "ps_scribe")]
                struct D { #[scribe(flatten)] grid: [u8; 4] }
            },
        ];
        for ast in &refused {
            assert!(message(ast).contains("flattened"), "{}", ast.ident);
        }

        let ast: DeriveInput = parse_quote! {
            #[scribe(crate = "ps_scribe")]
            struct E { #[scribe(flatten)] common: Common, x: u32 }
        };
        assert!(derive_scribe(&ast).is_ok());
    }
}
