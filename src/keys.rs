//! Marketplace key conventions
//!
//! Key builders and the invalidation plan each mutation needs. Listing keys
//! use the plural prefix (`products:`), single records the singular one
//! (`product:`), so a record and the listings containing it never collide.

use crate::cache::Invalidation;

// == Products ==
pub fn product(id: i64) -> String {
    format!("product:{}", id)
}

pub fn products_all() -> String {
    "products:all".to_string()
}

pub fn products_by_producer(producer_id: i64) -> String {
    format!("products:producer:{}", producer_id)
}

/// Search keys are case-insensitive on the name.
pub fn products_search_name(name: &str) -> String {
    format!("products:search:name:{}", name.to_lowercase())
}

pub fn products_search_name_by_producer(name: &str, producer_id: i64) -> String {
    format!(
        "products:search:name:{}:producer:{}",
        name.to_lowercase(),
        producer_id
    )
}

pub fn products_by_category_and_producer(category_id: i64, producer_id: i64) -> String {
    format!("products:category:{}:producer:{}", category_id, producer_id)
}

pub fn products_by_category(category_id: i64) -> String {
    format!("products:category:{}", category_id)
}

pub fn products_by_tag(tag_id: i64) -> String {
    format!("products:tag:{}", tag_id)
}

pub fn products_by_tag_and_producer(tag_id: i64, producer_id: i64) -> String {
    format!("products:tag:{}:producer:{}", tag_id, producer_id)
}

/// Combined category + tag filter, e.g. `products:complex:[1, 2]:tags:[3]:producer:4`.
pub fn products_complex(category_ids: &[i64], tag_ids: &[i64], producer_id: i64) -> String {
    format!(
        "products:complex:{}:tags:{}:producer:{}",
        id_list(category_ids),
        id_list(tag_ids),
        producer_id
    )
}

pub fn products_marketplace_by_producer(producer_id: i64) -> String {
    format!("products:marketplace:producer:{}", producer_id)
}

pub fn products_search_producer_name(producer_name: &str) -> String {
    format!(
        "products:search:producer-name:{}",
        producer_name.to_lowercase()
    )
}

fn id_list(ids: &[i64]) -> String {
    let ids: Vec<String> = ids.iter().map(i64::to_string).collect();
    format!("[{}]", ids.join(", "))
}

// == Producers ==
pub fn producer(id: i64) -> String {
    format!("producer:{}", id)
}

pub fn producer_by_user(user_id: i64) -> String {
    format!("producer:user:{}", user_id)
}

pub fn producers_all() -> String {
    "producers:all".to_string()
}

pub fn producers_approved() -> String {
    "producers:approved".to_string()
}

pub fn producers_approved_with_stock() -> String {
    "producers:approved:with-stock".to_string()
}

// == Cart ==
pub fn cart_items(user_id: i64) -> String {
    format!("cart:items:user:{}", user_id)
}

pub fn cart_count(user_id: i64) -> String {
    format!("cart:count:user:{}", user_id)
}

pub fn cart_total(user_id: i64) -> String {
    format!("cart:total:user:{}", user_id)
}

// == Invalidation Plans ==
/// After a product is created, updated or deleted.
///
/// Covers every listing whose result set can contain the product. Category
/// and tag listings are dropped wholesale since the plan does not know the
/// product's links.
///
/// # Arguments
/// * `product_id` - The product that changed
/// * `producer_id` - Its owning producer
pub fn product_changed(product_id: i64, producer_id: i64) -> Invalidation {
    Invalidation::new()
        .key(product(product_id))
        .key(products_marketplace_by_producer(producer_id))
        .key(producers_approved_with_stock())
        .pattern(products_all())
        .pattern(products_by_producer(producer_id))
        .pattern("products:search:*")
        .pattern("products:category:*")
        .pattern("products:tag:*")
        .pattern("products:complex:*")
}

/// After a category is linked to or unlinked from a product.
pub fn product_category_changed(product_id: i64, category_id: i64) -> Invalidation {
    Invalidation::new()
        .key(product(product_id))
        .pattern(format!("products:category:{}*", category_id))
        .pattern("products:complex:*")
}

/// After a tag is linked to or unlinked from a product.
pub fn product_tag_changed(product_id: i64, tag_id: i64) -> Invalidation {
    Invalidation::new()
        .key(product(product_id))
        .pattern(format!("products:tag:{}*", tag_id))
        .pattern("products:complex:*")
}

/// After a producer is saved or approved.
pub fn producer_changed(producer_id: i64, user_id: Option<i64>) -> Invalidation {
    let mut plan = Invalidation::new()
        .key(producer(producer_id))
        .pattern("producers:*")
        .pattern("products:marketplace:*");
    if let Some(user_id) = user_id {
        plan = plan.key(producer_by_user(user_id));
    }
    plan
}

/// After a producer is deleted; also drops everything scoped to it.
pub fn producer_deleted(producer_id: i64, user_id: Option<i64>) -> Invalidation {
    producer_changed(producer_id, user_id)
        .pattern(products_by_producer(producer_id))
        .pattern(format!("products:marketplace:producer:{}", producer_id))
        .pattern(format!("orders:producer:{}", producer_id))
        .pattern(format!("stats:producer:{}", producer_id))
}

/// After any change to a user's cart.
pub fn cart_changed(user_id: i64) -> Invalidation {
    Invalidation::new().pattern(format!("cart:*:user:{}", user_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_builders() {
        assert_eq!(product(1), "product:1");
        assert_eq!(products_search_name("WiDgEt"), "products:search:name:widget");
        assert_eq!(
            products_search_name_by_producer("Box", 4),
            "products:search:name:box:producer:4"
        );
        assert_eq!(producer_by_user(9), "producer:user:9");
        assert_eq!(cart_total(7), "cart:total:user:7");
        assert_eq!(products_by_tag_and_producer(3, 4), "products:tag:3:producer:4");
        assert_eq!(
            products_search_producer_name("Acme Farms"),
            "products:search:producer-name:acme farms"
        );
        assert_eq!(producers_approved_with_stock(), "producers:approved:with-stock");
    }

    #[test]
    fn test_complex_key_lists_ids() {
        assert_eq!(
            products_complex(&[1, 2], &[3], 4),
            "products:complex:[1, 2]:tags:[3]:producer:4"
        );
        assert_eq!(products_complex(&[], &[], 4), "products:complex:[]:tags:[]:producer:4");
    }

    #[test]
    fn test_product_changed_plan() {
        let plan = product_changed(5, 3);
        assert_eq!(
            plan.keys,
            vec![
                "product:5",
                "products:marketplace:producer:3",
                "producers:approved:with-stock"
            ]
        );
        assert_eq!(
            plan.patterns,
            vec![
                "products:all",
                "products:producer:3",
                "products:search:*",
                "products:category:*",
                "products:tag:*",
                "products:complex:*"
            ]
        );
    }

    #[test]
    fn test_product_changed_reaches_every_listing() {
        let plan = product_changed(1, 4);
        let listings = [
            products_all(),
            products_by_producer(4),
            products_search_name("widget"),
            products_search_producer_name("acme"),
            products_by_category(2),
            products_by_category_and_producer(2, 4),
            products_by_tag(3),
            products_by_tag_and_producer(3, 4),
            products_complex(&[2], &[3], 4),
            products_marketplace_by_producer(4),
            producers_approved_with_stock(),
        ];

        for listing in &listings {
            let covered = plan.keys.contains(listing)
                || plan
                    .patterns
                    .iter()
                    .any(|p| glob::Pattern::new(p).unwrap().matches(listing));
            assert!(covered, "{} survives a product change", listing);
        }
    }

    #[test]
    fn test_producer_plans() {
        let plan = producer_changed(3, None);
        assert_eq!(plan.keys, vec!["producer:3"]);

        let plan = producer_deleted(3, Some(9));
        assert_eq!(plan.keys, vec!["producer:3", "producer:user:9"]);
        assert!(plan.patterns.contains(&"orders:producer:3".to_string()));
        assert!(plan.patterns.contains(&"products:marketplace:*".to_string()));
    }

    #[test]
    fn test_cart_plan_covers_every_cart_key() {
        let plan = cart_changed(7);
        assert!(plan.keys.is_empty());
        assert_eq!(plan.patterns, vec!["cart:*:user:7"]);

        let glob = glob::Pattern::new(&plan.patterns[0]).unwrap();
        assert!(glob.matches(&cart_items(7)));
        assert!(glob.matches(&cart_count(7)));
        assert!(glob.matches(&cart_total(7)));
        assert!(!glob.matches(&cart_items(70)));
    }
}
