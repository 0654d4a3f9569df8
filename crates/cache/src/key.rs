//! Cache key computation.
//!
//! The key is the SHA-256 hex digest of the RFC 8785 (JCS) canonical form of
//! `{name, source, options, extra}`. JCS sorts object keys, so option maps
//! hash the same regardless of the order they were built or parsed in.
//!
//! Typed options and free-form extras live under separate keys: an extra
//! named like a typed option can never stand in for it.

use formwright_core::{FormCacheError, FormRequest, SourceKind};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Inputs hashed into a [`CacheKey`].
#[derive(Serialize)]
struct KeyInputs<'a> {
    name: &'a str,
    source: &'a str,
    options: TypedOptions<'a>,
    extra: &'a BTreeMap<String, Value>,
}

#[derive(Serialize)]
struct TypedOptions<'a> {
    load_saved_data: bool,
    control_group: Option<&'a str>,
    source_kind: SourceKind,
    field_group: Option<&'a str>,
}

/// Deterministic signature of a form request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Compute the key for a request.
    pub fn compute(request: &FormRequest) -> formwright_core::Result<Self> {
        let options = &request.options;
        let inputs = KeyInputs {
            name: &request.name,
            source: &request.source,
            options: TypedOptions {
                load_saved_data: options.load_saved_data,
                control_group: options.control_group.as_deref(),
                source_kind: options.source_kind,
                field_group: options.field_group.as_deref(),
            },
            extra: &options.extra,
        };

        let jcs_bytes = serde_json_canonicalizer::to_vec(&inputs)
            .map_err(|e| FormCacheError::Key(e.to_string()))?;

        let mut hasher = Sha256::new();
        hasher.update(&jcs_bytes);
        Ok(Self(hex::encode(hasher.finalize())))
    }

    /// The hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwright_core::FormOptions;
    use serde_json::json;

    fn request_with(options: serde_json::Value) -> FormRequest {
        FormRequest::file("article", "article").with_options(serde_json::from_value(options).unwrap())
    }

    #[test]
    fn key_is_sha256_hex() {
        let key = CacheKey::compute(&FormRequest::file("article", "article")).unwrap();
        assert_eq!(key.as_str().len(), 64);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key.short().len(), 12);
    }

    #[test]
    fn equal_requests_equal_keys() {
        let a = CacheKey::compute(&FormRequest::file("article", "article")).unwrap();
        let b = CacheKey::compute(&FormRequest::file("article", "article")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn option_order_does_not_matter() {
        let a = request_with(json!({
            "load_saved_data": true,
            "control_group": "jform",
            "layout": "edit",
            "filters": {"state": 1, "category": 7}
        }));
        let b = request_with(json!({
            "filters": {"category": 7, "state": 1},
            "layout": "edit",
            "control_group": "jform",
            "load_saved_data": true
        }));
        assert_eq!(CacheKey::compute(&a).unwrap(), CacheKey::compute(&b).unwrap());
    }

    #[test]
    fn option_value_changes_key() {
        let base = request_with(json!({"load_saved_data": false}));
        let changed = request_with(json!({"load_saved_data": true}));
        assert_ne!(CacheKey::compute(&base).unwrap(), CacheKey::compute(&changed).unwrap());

        let grouped = base.clone().with_options(base.options.clone().with_control_group("jform"));
        assert_ne!(CacheKey::compute(&base).unwrap(), CacheKey::compute(&grouped).unwrap());

        let extra = base.clone().with_options(base.options.clone().with_extra("layout", json!("edit")));
        assert_ne!(CacheKey::compute(&base).unwrap(), CacheKey::compute(&extra).unwrap());
    }

    #[test]
    fn source_text_changes_key() {
        let a = FormRequest::inline("article", "[[fields]]\nname = \"title\"\ntype = \"text\"\n");
        let b = FormRequest::inline("article", "[[fields]]\nname = \"body\"\ntype = \"text\"\n");
        assert_ne!(CacheKey::compute(&a).unwrap(), CacheKey::compute(&b).unwrap());
    }

    #[test]
    fn source_kind_changes_key() {
        let file = FormRequest::file("article", "article");
        let inline = file
            .clone()
            .with_options(FormOptions::default().with_source_kind(SourceKind::Inline));
        assert_ne!(CacheKey::compute(&file).unwrap(), CacheKey::compute(&inline).unwrap());
    }

    #[test]
    fn form_name_is_part_of_key() {
        let a = FormRequest::file("article", "shared");
        let b = FormRequest::file("page", "shared");
        assert_ne!(CacheKey::compute(&a).unwrap(), CacheKey::compute(&b).unwrap());
    }

    #[test]
    fn extra_named_like_typed_option_does_not_collide() {
        let typed = FormRequest::file("article", "article")
            .with_options(FormOptions::default().with_control_group("jform"));

        let mut options = FormOptions::default();
        options.extra.insert("control_group".into(), json!("jform"));
        let shadowed = FormRequest::file("article", "article").with_options(options);
        assert!(shadowed.options.control_group.is_none());

        assert_ne!(CacheKey::compute(&typed).unwrap(), CacheKey::compute(&shadowed).unwrap());
    }

    #[test]
    fn extra_values_are_hashed_separately_from_typed_fields() {
        let mut a = FormOptions::default().with_field_group("meta");
        a.extra.insert("layout".into(), json!("edit"));
        let mut b = FormOptions::default();
        b.extra.insert("field_group".into(), json!("meta"));
        b.extra.insert("layout".into(), json!("edit"));

        let a = FormRequest::file("article", "article").with_options(a);
        let b = FormRequest::file("article", "article").with_options(b);
        assert_ne!(CacheKey::compute(&a).unwrap(), CacheKey::compute(&b).unwrap());
    }
}
