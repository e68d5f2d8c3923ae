use crate::domain::order::OrderId;

// ============================================================================
// Key Space Mapper
// ============================================================================

const ORDER_KEY_PREFIX: &str = "order:";

/// Set holding the key of every live order.
pub const ORDER_INDEX_KEY: &str = "orders";

pub fn order_key(id: OrderId) -> String {
    format!("{ORDER_KEY_PREFIX}{id}")
}

/// Inverse of [`order_key`]. Returns `None` for keys outside the order namespace.
pub fn parse_order_key(key: &str) -> Option<OrderId> {
    let digits = key.strip_prefix(ORDER_KEY_PREFIX)?;
    // Reject forms like "order:+1" or "order:007" that order_key never produces.
    if digits.is_empty() || digits.starts_with('+') || (digits.len() > 1 && digits.starts_with('0')) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_key_format() {
        assert_eq!(order_key(123), "order:123");
        assert_eq!(order_key(0), "order:0");
        assert_eq!(order_key(u64::MAX), "order:18446744073709551615");
    }

    #[test]
    fn test_parse_inverts_order_key() {
        for id in [0, 1, 1001, u64::MAX] {
            assert_eq!(parse_order_key(&order_key(id)), Some(id));
        }
    }

    #[test]
    fn test_parse_rejects_foreign_keys() {
        assert_eq!(parse_order_key("orders"), None);
        assert_eq!(parse_order_key("user:12"), None);
        assert_eq!(parse_order_key("order:"), None);
        assert_eq!(parse_order_key("order:abc"), None);
        assert_eq!(parse_order_key("order:+5"), None);
        assert_eq!(parse_order_key("order:007"), None);
    }

    #[test]
    fn test_index_key_is_outside_order_namespace() {
        assert!(parse_order_key(ORDER_INDEX_KEY).is_none());
    }
}
