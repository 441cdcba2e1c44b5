use crate::utils::{apply_derives, expect_str, parse_kv_args, strip_suffix_name};
use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Item, LitStr, Result, parse::Parse, parse::ParseStream, parse_macro_input};

/// #[domain_event] 宏实现
/// - 支持具名字段、元组与单元结构体
/// - 默认派生 `Debug`、`Clone`（与用户已有 derive 合并）
/// - 生成 `EventType` 与 `DomainEvent` 实现
/// - 事件名称默认取类型名并去掉 `Event` 后缀，可用 `#[domain_event(name = "...")]` 覆写
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as EventAttrConfig);
    let input = parse_macro_input!(item as Item);

    let mut st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[domain_event] can only be used on structs")
                .to_compile_error()
                .into();
        }
    };

    apply_derives(
        &mut st.attrs,
        vec![syn::parse_quote!(Debug), syn::parse_quote!(Clone)],
    );

    let ident = &st.ident;
    let name = cfg
        .name
        .unwrap_or_else(|| LitStr::new(&strip_suffix_name(ident, "Event"), ident.span()));
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    let expanded = quote! {
        #st

        impl #impl_generics ::cqrs_domain::domain_event::EventType for #ident #ty_generics #where_clause {
            const EVENT_TYPE: &'static str = #name;
        }

        impl #impl_generics ::cqrs_domain::domain_event::DomainEvent for #ident #ty_generics #where_clause {
            fn event_type(&self) -> &str {
                <Self as ::cqrs_domain::domain_event::EventType>::EVENT_TYPE
            }
        }
    };

    TokenStream::from(expanded)
}

struct EventAttrConfig {
    name: Option<LitStr>,
}

impl Parse for EventAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut name = None;

        for (key, value) in parse_kv_args(input)? {
            match key.to_string().as_str() {
                "name" => {
                    if name.is_some() {
                        return Err(syn::Error::new(
                            key.span(),
                            "duplicate key 'name' in attribute",
                        ));
                    }
                    let lit = expect_str(&value, "name")?;
                    if lit.value().is_empty() {
                        return Err(syn::Error::new(lit.span(), "event name must not be empty"));
                    }
                    name = Some(lit);
                }
                _ => {
                    return Err(syn::Error::new(key.span(), "unknown key; expected 'name'"));
                }
            }
        }

        Ok(Self { name })
    }
}
