//! Tool argument validation.
//!
//! Turns a tool name plus a raw argument object into a strongly-typed
//! argument record, or a validation error naming the first violated
//! constraint. Validation is total and side-effect-free: no network, no
//! state. Unknown tool names are their own error category, never silently
//! ignored.

use serde_json::Value;

use nextshop_core::ProductId;

use crate::error::GatewayError;
use crate::store::{ProductFilter, SortOrder};

/// Default product listing page size.
const DEFAULT_LIMIT: u32 = 20;

/// Maximum product listing page size.
const MAX_LIMIT: u32 = 50;

/// Validated, typed arguments for a tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolArgs {
    Login { username: String, password: String },
    Logout,
    ProductsList(ProductFilter),
    ProductsGet { product_id: ProductId },
    ProductsCategories,
    CartGet,
    CartAdd { product_id: ProductId, quantity: u32 },
    CartUpdate { product_id: ProductId, quantity: u32 },
    CartRemove { product_id: ProductId },
    CartClear,
}

/// Validate raw arguments against the named tool's schema.
///
/// # Errors
///
/// `GatewayError::UnknownTool` for unrecognized names,
/// `GatewayError::Validation` naming the first violated constraint.
pub fn validate(tool_name: &str, args: &Value) -> Result<ToolArgs, GatewayError> {
    // Tools with no arguments tolerate null/missing argument objects;
    // anything else must be a JSON object.
    if !args.is_object() && !args.is_null() {
        return Err(GatewayError::Validation(
            "arguments must be a JSON object".to_string(),
        ));
    }

    match tool_name {
        "auth.login" => Ok(ToolArgs::Login {
            username: required_non_empty_string(args, "username")?,
            password: required_non_empty_string(args, "password")?,
        }),
        "auth.logout" => Ok(ToolArgs::Logout),
        "products.list" => {
            let category = optional_string(args, "category")?;
            let limit = optional_bounded_u32(args, "limit", 1, MAX_LIMIT)?.unwrap_or(DEFAULT_LIMIT);
            let sort = optional_sort(args)?.unwrap_or_default();
            Ok(ToolArgs::ProductsList(ProductFilter {
                category,
                limit,
                sort,
            }))
        }
        "products.get" => Ok(ToolArgs::ProductsGet {
            product_id: required_product_id(args)?,
        }),
        "products.categories" => Ok(ToolArgs::ProductsCategories),
        "cart.get" => Ok(ToolArgs::CartGet),
        "cart.add" => Ok(ToolArgs::CartAdd {
            product_id: required_product_id(args)?,
            quantity: optional_bounded_u32(args, "quantity", 1, u32::MAX)?.unwrap_or(1),
        }),
        "cart.update" => {
            let product_id = required_product_id(args)?;
            let Some(quantity) = optional_bounded_u32(args, "quantity", 0, u32::MAX)? else {
                return Err(GatewayError::Validation(
                    "quantity is required".to_string(),
                ));
            };
            Ok(ToolArgs::CartUpdate {
                product_id,
                quantity,
            })
        }
        "cart.remove" => Ok(ToolArgs::CartRemove {
            product_id: required_product_id(args)?,
        }),
        "cart.clear" => Ok(ToolArgs::CartClear),
        other => Err(GatewayError::UnknownTool(other.to_string())),
    }
}

// =============================================================================
// Field helpers
// =============================================================================

fn field<'a>(args: &'a Value, name: &str) -> Option<&'a Value> {
    match args.get(name) {
        None | Some(Value::Null) => None,
        Some(value) => Some(value),
    }
}

fn required_non_empty_string(args: &Value, name: &str) -> Result<String, GatewayError> {
    match field(args, name) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(GatewayError::Validation(format!(
            "{name} must not be empty"
        ))),
        Some(_) => Err(GatewayError::Validation(format!("{name} must be a string"))),
        None => Err(GatewayError::Validation(format!("{name} is required"))),
    }
}

fn optional_string(args: &Value, name: &str) -> Result<Option<String>, GatewayError> {
    match field(args, name) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(GatewayError::Validation(format!("{name} must be a string"))),
    }
}

fn optional_bounded_u32(
    args: &Value,
    name: &str,
    min: u32,
    max: u32,
) -> Result<Option<u32>, GatewayError> {
    let Some(value) = field(args, name) else {
        return Ok(None);
    };
    let Some(n) = value.as_i64() else {
        return Err(GatewayError::Validation(format!(
            "{name} must be an integer"
        )));
    };
    let n = u32::try_from(n).ok().filter(|n| *n >= min && *n <= max);
    n.map(Some).ok_or_else(|| {
        if max == u32::MAX {
            GatewayError::Validation(format!("{name} must be at least {min}"))
        } else {
            GatewayError::Validation(format!("{name} must be between {min} and {max}"))
        }
    })
}

fn required_product_id(args: &Value) -> Result<ProductId, GatewayError> {
    match field(args, "productId") {
        None => Err(GatewayError::Validation("productId is required".to_string())),
        Some(value) => value.as_i64().map(ProductId::new).ok_or_else(|| {
            GatewayError::Validation("productId must be an integer".to_string())
        }),
    }
}

fn optional_sort(args: &Value) -> Result<Option<SortOrder>, GatewayError> {
    match field(args, "sort") {
        None => Ok(None),
        Some(Value::String(s)) if s == "asc" => Ok(Some(SortOrder::Ascending)),
        Some(Value::String(s)) if s == "desc" => Ok(Some(SortOrder::Descending)),
        Some(_) => Err(GatewayError::Validation(
            "sort must be \"asc\" or \"desc\"".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(result: Result<ToolArgs, GatewayError>) -> String {
        result.expect_err("expected a validation error").to_string()
    }

    #[test]
    fn test_login_valid() {
        let args = validate(
            "auth.login",
            &json!({"username": "johnd", "password": "m38rmF$"}),
        )
        .unwrap();
        assert_eq!(
            args,
            ToolArgs::Login {
                username: "johnd".to_string(),
                password: "m38rmF$".to_string()
            }
        );
    }

    #[test]
    fn test_login_rejects_missing_and_empty_fields() {
        assert_eq!(
            message(validate("auth.login", &json!({"password": "x"}))),
            "username is required"
        );
        assert_eq!(
            message(validate("auth.login", &json!({"username": "", "password": "x"}))),
            "username must not be empty"
        );
        assert_eq!(
            message(validate("auth.login", &json!({"username": "johnd", "password": 3}))),
            "password must be a string"
        );
    }

    #[test]
    fn test_unknown_tool_is_distinct_error() {
        let err = validate("orders.list", &json!({})).expect_err("should fail");
        assert!(matches!(err, GatewayError::UnknownTool(_)));
    }

    #[test]
    fn test_products_list_defaults() {
        let args = validate("products.list", &json!({})).unwrap();
        let ToolArgs::ProductsList(filter) = args else {
            panic!("wrong variant");
        };
        assert_eq!(filter.limit, 20);
        assert_eq!(filter.sort, SortOrder::Ascending);
        assert!(filter.category.is_none());
    }

    #[test]
    fn test_products_list_null_args_treated_as_empty() {
        assert!(validate("products.list", &Value::Null).is_ok());
    }

    #[test]
    fn test_products_list_bounds_limit() {
        assert_eq!(
            message(validate("products.list", &json!({"limit": 0}))),
            "limit must be between 1 and 50"
        );
        assert_eq!(
            message(validate("products.list", &json!({"limit": 51}))),
            "limit must be between 1 and 50"
        );
        assert!(validate("products.list", &json!({"limit": 50})).is_ok());
    }

    #[test]
    fn test_products_list_restricts_sort() {
        assert_eq!(
            message(validate("products.list", &json!({"sort": "sideways"}))),
            "sort must be \"asc\" or \"desc\""
        );
        let args = validate("products.list", &json!({"sort": "desc"})).unwrap();
        let ToolArgs::ProductsList(filter) = args else {
            panic!("wrong variant");
        };
        assert_eq!(filter.sort, SortOrder::Descending);
    }

    #[test]
    fn test_cart_add_defaults_quantity_to_one() {
        let args = validate("cart.add", &json!({"productId": 5})).unwrap();
        assert_eq!(
            args,
            ToolArgs::CartAdd {
                product_id: ProductId::new(5),
                quantity: 1
            }
        );
    }

    #[test]
    fn test_cart_add_rejects_zero_quantity() {
        assert_eq!(
            message(validate("cart.add", &json!({"productId": 5, "quantity": 0}))),
            "quantity must be at least 1"
        );
    }

    #[test]
    fn test_cart_add_requires_integer_product_id() {
        assert_eq!(
            message(validate("cart.add", &json!({}))),
            "productId is required"
        );
        assert_eq!(
            message(validate("cart.add", &json!({"productId": "five"}))),
            "productId must be an integer"
        );
    }

    #[test]
    fn test_cart_update_accepts_zero_but_requires_quantity() {
        let args = validate("cart.update", &json!({"productId": 5, "quantity": 0})).unwrap();
        assert_eq!(
            args,
            ToolArgs::CartUpdate {
                product_id: ProductId::new(5),
                quantity: 0
            }
        );

        assert_eq!(
            message(validate("cart.update", &json!({"productId": 5}))),
            "quantity is required"
        );
        assert_eq!(
            message(validate("cart.update", &json!({"productId": 5, "quantity": -1}))),
            "quantity must be at least 0"
        );
    }

    #[test]
    fn test_no_arg_tools_accept_anything_object_shaped() {
        for name in ["cart.get", "cart.clear", "products.categories", "auth.logout"] {
            assert!(validate(name, &json!({})).is_ok(), "{name} should accept {{}}");
            assert!(validate(name, &Value::Null).is_ok(), "{name} should accept null");
        }
    }

    #[test]
    fn test_non_object_arguments_rejected() {
        assert_eq!(
            message(validate("cart.get", &json!([1, 2]))),
            "arguments must be a JSON object"
        );
    }
}
