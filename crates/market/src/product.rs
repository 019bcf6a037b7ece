use std::fmt;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;

/// Wire prefix marking a seller-originated template type.
pub const SELLER_TYPE_PREFIX: &str = "seller_";

/// The universal product key, resolved once at the boundary.
///
/// The wire form is a single string: either a canonical type name for
/// admin/traditional templates ("seo_blog") or "seller_<prompt_id>" for
/// seller templates. Everything past the boundary works with this enum
/// instead of re-parsing the prefix convention ad hoc.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductRef {
    Traditional(String),
    Seller { prompt_id: Uuid },
}

impl ProductRef {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(anyhow!("product type must not be empty"));
        }

        match raw.strip_prefix(SELLER_TYPE_PREFIX) {
            Some(suffix) => {
                let prompt_id = suffix
                    .parse::<Uuid>()
                    .map_err(|_| anyhow!("malformed seller product type: {}", raw))?;
                Ok(ProductRef::Seller { prompt_id })
            }
            None => Ok(ProductRef::Traditional(raw.to_string())),
        }
    }

    pub fn for_prompt(prompt_id: Uuid) -> Self {
        ProductRef::Seller { prompt_id }
    }

    pub fn is_seller(&self) -> bool {
        matches!(self, ProductRef::Seller { .. })
    }

    pub fn prompt_id(&self) -> Option<Uuid> {
        match self {
            ProductRef::Seller { prompt_id } => Some(*prompt_id),
            ProductRef::Traditional(_) => None,
        }
    }
}

impl fmt::Display for ProductRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductRef::Traditional(name) => write!(f, "{}", name),
            ProductRef::Seller { prompt_id } => write!(f, "{}{}", SELLER_TYPE_PREFIX, prompt_id),
        }
    }
}

/// Built-in catalog entry for the traditional templates that predate the
/// product type registry. Used as the last pricing fallback at checkout.
#[derive(Debug, Clone)]
pub struct BuiltinProduct {
    pub name: &'static str,
    pub description: &'static str,
    pub price_cents: i64,
}

pub fn builtin_product(type_name: &str) -> Option<BuiltinProduct> {
    match type_name {
        "seo_blog" => Some(BuiltinProduct {
            name: "SEO Blog Post Generator",
            description: "Expert-level SEO blog post generator with comprehensive optimization",
            price_cents: 2999,
        }),
        "email_sequence" => Some(BuiltinProduct {
            name: "Email Marketing Sequence Generator",
            description: "Expert email marketing sequence generator for conversions",
            price_cents: 2499,
        }),
        "ad_copy" => Some(BuiltinProduct {
            name: "High-Converting Ad Copy Generator",
            description: "High-converting ad copy generator for all platforms",
            price_cents: 1999,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traditional_round_trip() {
        let parsed = ProductRef::parse("seo_blog").unwrap();
        assert_eq!(parsed, ProductRef::Traditional("seo_blog".into()));
        assert!(!parsed.is_seller());
        assert_eq!(parsed.to_string(), "seo_blog");
    }

    #[test]
    fn seller_round_trip() {
        let prompt_id = Uuid::new_v4();
        let raw = format!("seller_{}", prompt_id);
        let parsed = ProductRef::parse(&raw).unwrap();
        assert_eq!(parsed, ProductRef::Seller { prompt_id });
        assert_eq!(parsed.prompt_id(), Some(prompt_id));
        assert_eq!(parsed.to_string(), raw);
    }

    #[test]
    fn malformed_seller_suffix_rejected() {
        assert!(ProductRef::parse("seller_not-a-uuid").is_err());
        assert!(ProductRef::parse("seller_").is_err());
        assert!(ProductRef::parse("").is_err());
        assert!(ProductRef::parse("   ").is_err());
    }

    #[test]
    fn builtin_catalog_prices() {
        assert_eq!(builtin_product("seo_blog").unwrap().price_cents, 2999);
        assert_eq!(builtin_product("email_sequence").unwrap().price_cents, 2499);
        assert_eq!(builtin_product("ad_copy").unwrap().price_cents, 1999);
        assert!(builtin_product("custom_thing").is_none());
    }
}
