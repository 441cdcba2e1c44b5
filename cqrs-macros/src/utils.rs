use proc_macro2::Span;
use quote::ToTokens;
use syn::punctuated::Punctuated;
use syn::{Attribute, Expr, Field, FieldsNamed, Ident, Lit, Token, Type};

// 提取非 derive 属性与已有 derive 列表
fn split_derives(attrs: &[Attribute]) -> (Vec<Attribute>, Vec<syn::Path>) {
    let mut retained = Vec::new();
    let mut existing = Vec::new();
    for attr in attrs.iter() {
        if attr.path().is_ident("derive") {
            if let Ok(list) =
                attr.parse_args_with(Punctuated::<syn::Path, Token![,]>::parse_terminated)
            {
                existing.extend(list);
            }
        } else {
            retained.push(attr.clone());
        }
    }
    (retained, existing)
}

// 按末段名称去重，`Debug` 与 `std::fmt::Debug` 视为同一个
fn derive_key(p: &syn::Path) -> String {
    p.segments
        .last()
        .map(|s| s.ident.to_string())
        .unwrap_or_else(|| p.to_token_stream().to_string())
}

/// 合并默认派生与用户已有派生，合并后的 derive 置于其他属性之前
pub(crate) fn apply_derives(attrs: &mut Vec<Attribute>, required: Vec<syn::Path>) {
    let (retained, existing) = split_derives(attrs);

    let mut seen = std::collections::HashSet::new();
    let merged: Vec<syn::Path> = required
        .into_iter()
        .chain(existing)
        .filter(|p| seen.insert(derive_key(p)))
        .collect();

    let derive: Attribute = syn::parse_quote!(#[derive(#(#merged),*)]);
    *attrs = std::iter::once(derive).chain(retained).collect();
}

/// 确保具名字段结构体包含所需字段，并按给定顺序置于最前；
/// 已存在的同名字段沿用用户的定义
pub(crate) fn ensure_required_fields(fields_named: &mut FieldsNamed, required: &[(&str, &Type)]) {
    let old_named = fields_named.named.clone();
    let mut new_named: Punctuated<Field, Token![,]> = Punctuated::new();

    for (name, ty) in required {
        match old_named.iter().find(|f| field_is(f, name)) {
            Some(existing) => new_named.push(existing.clone()),
            None => {
                let ident = Ident::new(name, Span::call_site());
                new_named.push(syn::parse_quote! { #ident: #ty });
            }
        }
    }

    for f in old_named {
        if !required.iter().any(|(name, _)| field_is(&f, name)) {
            new_named.push(f);
        }
    }

    fields_named.named = new_named;
}

fn field_is(field: &Field, name: &str) -> bool {
    field.ident.as_ref().map(|i| i == name).unwrap_or(false)
}

/// 默认逻辑名称：去掉类型名上的约定后缀（`EmailChangedEvent` -> `EmailChanged`）
pub(crate) fn strip_suffix_name(ident: &Ident, suffix: &str) -> String {
    let name = ident.to_string();
    match name.strip_suffix(suffix) {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => name,
    }
}

pub(crate) fn expect_str(expr: &Expr, key: &str) -> syn::Result<syn::LitStr> {
    match expr {
        Expr::Lit(syn::ExprLit {
            lit: Lit::Str(lit), ..
        }) => Ok(lit.clone()),
        other => Err(syn::Error::new_spanned(
            other,
            format!("expected string literal for '{key}'"),
        )),
    }
}

/// 解析 `key = value, ...` 形式的属性参数
pub(crate) fn parse_kv_args(input: syn::parse::ParseStream) -> syn::Result<Vec<(Ident, Expr)>> {
    let pairs = Punctuated::<syn::ExprAssign, Token![,]>::parse_terminated(input)?;
    pairs
        .into_iter()
        .map(|assign| match *assign.left {
            Expr::Path(p) if p.path.segments.len() == 1 && p.qself.is_none() => {
                Ok((p.path.segments[0].ident.clone(), *assign.right))
            }
            other => Err(syn::Error::new_spanned(other, "invalid attribute key")),
        })
        .collect()
}
