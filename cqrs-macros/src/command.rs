use crate::utils::{apply_derives, expect_str, parse_kv_args, strip_suffix_name};
use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Item, LitStr, Result, parse::Parse, parse::ParseStream, parse_macro_input};

/// #[command] 宏实现
/// - 默认派生 `Debug`
/// - 生成 `::cqrs_application::command::Command` 实现
/// - 命令名称默认取类型名并去掉 `Command` 后缀，可用 `#[command(name = "...")]` 覆写
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as CommandAttrConfig);
    let input = parse_macro_input!(item as Item);

    let mut st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[command] can only be used on structs")
                .to_compile_error()
                .into();
        }
    };

    apply_derives(&mut st.attrs, vec![syn::parse_quote!(Debug)]);

    let ident = &st.ident;
    let name = cfg
        .name
        .unwrap_or_else(|| LitStr::new(&strip_suffix_name(ident, "Command"), ident.span()));
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    let expanded = quote! {
        #st

        impl #impl_generics ::cqrs_application::command::Command for #ident #ty_generics #where_clause {
            const NAME: &'static str = #name;
        }
    };

    TokenStream::from(expanded)
}

struct CommandAttrConfig {
    name: Option<LitStr>,
}

impl Parse for CommandAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut name = None;

        for (key, value) in parse_kv_args(input)? {
            match key.to_string().as_str() {
                "name" if name.is_none() => name = Some(expect_str(&value, "name")?),
                "name" => {
                    return Err(syn::Error::new(key.span(), "duplicate key 'name' in attribute"));
                }
                _ => {
                    return Err(syn::Error::new(key.span(), "unknown key; expected 'name'"));
                }
            }
        }

        Ok(Self { name })
    }
}
