//! Products, variants and the three-level category tree

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Named product attribute, e.g. `size: [S, M, L]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ProductAttribute {
    pub name: Option<String>,
    #[serde(default)]
    pub values: Vec<String>,
}

/// First value of the first attribute, used to derive SKUs
pub fn primary_attribute_value(attributes: &[ProductAttribute]) -> Option<&str> {
    attributes
        .first()
        .and_then(|a| a.values.first())
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

/// Sellable price after a percentage discount
pub fn discounted_price(price: Decimal, discount_percent: Decimal) -> Decimal {
    if discount_percent <= Decimal::ZERO {
        return price;
    }
    let pct = discount_percent.min(Decimal::from(100));
    (price - price * pct / Decimal::from(100)).round_dp(2)
}

/// Category depth: 0 (root), 1, or 2 (leaf)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CategoryLevel(u8);

impl CategoryLevel {
    pub const ROOT: CategoryLevel = CategoryLevel(0);

    pub fn new(level: i32) -> Result<Self, &'static str> {
        match level {
            0..=2 => Ok(CategoryLevel(level as u8)),
            _ => Err("Category level must be 0, 1 or 2"),
        }
    }

    pub fn value(&self) -> i32 {
        self.0 as i32
    }
}

/// Check that a category's parent sits exactly one level above it
pub fn validate_category_parent(
    level: CategoryLevel,
    parent_level: Option<CategoryLevel>,
) -> Result<(), &'static str> {
    match (level.0, parent_level) {
        (0, None) => Ok(()),
        (0, Some(_)) => Err("Top-level categories cannot have a parent"),
        (_, None) => Err("Parent category is required"),
        (n, Some(p)) if p.0 + 1 == n => Ok(()),
        _ => Err("Parent category must be exactly one level above"),
    }
}

/// Minimal category row used to build the tree
#[derive(Debug, Clone)]
pub struct CategoryNode {
    pub id: Uuid,
    pub name: String,
    pub level: i32,
    pub parent_id: Option<Uuid>,
}

/// `{ root: { child: [grandchildren] } }`
pub type CategoryTree = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Build the nested category tree, dropping nodes whose ancestry is broken
pub fn build_category_tree(nodes: &[CategoryNode]) -> CategoryTree {
    let by_id: HashMap<Uuid, &CategoryNode> = nodes.iter().map(|n| (n.id, n)).collect();
    let mut tree = CategoryTree::new();

    for node in nodes.iter().filter(|n| n.level == 0) {
        tree.entry(node.name.clone()).or_default();
    }

    let parent_of = |node: &CategoryNode, level: i32| {
        node.parent_id
            .and_then(|pid| by_id.get(&pid).copied())
            .filter(|p| p.level == level)
    };

    for node in nodes.iter().filter(|n| n.level == 1) {
        if let Some(root) = parent_of(node, 0) {
            tree.entry(root.name.clone())
                .or_default()
                .entry(node.name.clone())
                .or_default();
        }
    }

    for node in nodes.iter().filter(|n| n.level == 2) {
        let Some(mid) = parent_of(node, 1) else { continue };
        let Some(root) = parent_of(mid, 0) else { continue };
        tree.entry(root.name.clone())
            .or_default()
            .entry(mid.name.clone())
            .or_default()
            .push(node.name.clone());
    }

    tree
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn node(name: &str, level: i32, parent: Option<Uuid>) -> CategoryNode {
        CategoryNode {
            id: Uuid::new_v4(),
            name: name.into(),
            level,
            parent_id: parent,
        }
    }

    #[test]
    fn test_category_tree() {
        let fashion = node("Fashion", 0, None);
        let men = node("Men", 1, Some(fashion.id));
        let shirts = node("Shirts", 2, Some(men.id));
        let orphan = node("Orphan", 2, Some(Uuid::new_v4()));
        let misplaced = node("Misplaced", 2, Some(fashion.id));

        let tree = build_category_tree(&[shirts, orphan, misplaced, men, fashion]);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree["Fashion"]["Men"], vec!["Shirts".to_string()]);
        assert_eq!(tree["Fashion"].len(), 1);
    }

    #[test]
    fn test_validate_category_parent() {
        let l0 = CategoryLevel::new(0).unwrap();
        let l1 = CategoryLevel::new(1).unwrap();
        let l2 = CategoryLevel::new(2).unwrap();
        assert!(validate_category_parent(l0, None).is_ok());
        assert!(validate_category_parent(l1, Some(l0)).is_ok());
        assert!(validate_category_parent(l2, Some(l1)).is_ok());
        assert!(validate_category_parent(l2, Some(l0)).is_err());
        assert!(validate_category_parent(l1, None).is_err());
        assert!(CategoryLevel::new(3).is_err());
    }

    #[test]
    fn test_discounted_price() {
        assert_eq!(discounted_price(dec("200"), dec("10")), dec("180"));
        assert_eq!(discounted_price(dec("99.99"), dec("0")), dec("99.99"));
        assert_eq!(discounted_price(dec("50"), dec("150")), dec("0"));
    }

    #[test]
    fn test_primary_attribute_value() {
        let attrs = vec![ProductAttribute {
            name: Some("size".into()),
            values: vec!["XL".into(), "L".into()],
        }];
        assert_eq!(primary_attribute_value(&attrs), Some("XL"));
        assert_eq!(primary_attribute_value(&[]), None);
    }
}
