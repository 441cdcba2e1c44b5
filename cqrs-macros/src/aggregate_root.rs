use crate::utils::{apply_derives, ensure_required_fields};
use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{
    Ident, Item, LitBool, Result, Token, Type, parse::Parse, parse::ParseStream, parse_macro_input,
};

/// #[aggregate_root] 宏实现
/// - 若缺失则追加字段：`id: IdType`、`pending_events: PendingEvents`，并置于字段最前
/// - 默认派生 `Debug`、`Default`；`new` 依赖 `Default` 填充其余字段
/// - 实现 `Entity` 与 `HasPendingEvents`，`AggregateRoot` 本身（类型名与应用规则）由用户实现
/// - 支持参数：`#[aggregate_root(id = IdType, debug = true|false)]`
///   - `id` 默认 `String`
///   - `debug = false` 时不派生 Debug，便于用户自定义实现
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as AggregateAttrConfig);
    let input = parse_macro_input!(item as Item);

    let mut st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[aggregate_root] only on struct")
                .to_compile_error()
                .into();
        }
    };

    let fields_named = match &mut st.fields {
        syn::Fields::Named(f) => f,
        _ => {
            return syn::Error::new(st.span(), "only supports named-field struct")
                .to_compile_error()
                .into();
        }
    };

    let id_type = cfg.id_ty.unwrap_or_else(|| syn::parse_quote! { String });
    let pending_ty: Type = syn::parse_quote! { ::cqrs_domain::aggregate_root::PendingEvents };
    ensure_required_fields(
        fields_named,
        &[("id", &id_type), ("pending_events", &pending_ty)],
    );

    let mut required: Vec<syn::Path> = vec![syn::parse_quote!(Default)];
    if cfg.derive_debug {
        required.insert(0, syn::parse_quote!(Debug));
    }
    apply_derives(&mut st.attrs, required);

    let ident = &st.ident;
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    let expanded = quote! {
        #st

        impl #impl_generics ::cqrs_domain::entity::Entity for #ident #ty_generics #where_clause {
            type Id = #id_type;

            fn new(id: Self::Id) -> Self {
                Self { id, ..::std::default::Default::default() }
            }

            fn id(&self) -> &Self::Id { &self.id }
        }

        impl #impl_generics ::cqrs_domain::aggregate_root::HasPendingEvents for #ident #ty_generics #where_clause {
            fn pending_events(&self) -> &::cqrs_domain::aggregate_root::PendingEvents {
                &self.pending_events
            }

            fn pending_events_mut(&mut self) -> &mut ::cqrs_domain::aggregate_root::PendingEvents {
                &mut self.pending_events
            }
        }
    };

    TokenStream::from(expanded)
}

struct AggregateAttrConfig {
    id_ty: Option<Type>,
    derive_debug: bool,
}

impl Parse for AggregateAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut id_ty: Option<Type> = None;
        let mut derive_debug: Option<bool> = None;

        // `id` 的取值是类型（可能带泛型参数），不能按表达式解析
        while !input.is_empty() {
            let key: Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            match key.to_string().as_str() {
                "id" => {
                    if id_ty.is_some() {
                        return Err(syn::Error::new(key.span(), "duplicate key 'id' in attribute"));
                    }
                    id_ty = Some(input.parse()?);
                }
                "debug" => {
                    if derive_debug.is_some() {
                        return Err(syn::Error::new(
                            key.span(),
                            "duplicate key 'debug' in attribute",
                        ));
                    }
                    derive_debug = Some(input.parse::<LitBool>()?.value);
                }
                _ => {
                    return Err(syn::Error::new(
                        key.span(),
                        "unknown key; expected 'id' | 'debug'",
                    ));
                }
            }
            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(Self {
            id_ty,
            derive_debug: derive_debug.unwrap_or(true),
        })
    }
}
