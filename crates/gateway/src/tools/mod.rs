//! Tool definitions for the agent-facing catalog.
//!
//! Each tool is a named, schema-described operation. The catalog is
//! self-describing: the dispatcher, the `GET /api/tools` listing, and the
//! validator all read the same records, so the table here is the single
//! source of truth for what the gateway exposes.
//!
//! Tools are statically partitioned into "requires session" (all `cart.*`
//! plus `auth.logout`) and "does not" (`auth.login`, `products.*`).

pub mod dispatcher;
pub mod schema;

pub use dispatcher::{ToolCall, ToolDispatcher};

use serde::Serialize;
use serde_json::json;

/// A named, schema-described operation exposed to the calling agent.
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    /// Tool name (e.g., `cart.add`).
    pub name: String,
    /// Human/agent-readable description.
    pub description: String,
    /// JSON Schema for the tool's arguments.
    pub input_schema: serde_json::Value,
    /// Whether the tool must be called with a resolvable session.
    pub requires_session: bool,
}

/// Get all tools exposed by the gateway (10 total).
#[must_use]
pub fn all_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: "auth.login".to_string(),
            description: "Authenticate with the store. Returns the user id and an opaque session id to pass on subsequent cart calls.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "username": {
                        "type": "string",
                        "description": "Store account username"
                    },
                    "password": {
                        "type": "string",
                        "description": "Store account password"
                    }
                },
                "required": ["username", "password"]
            }),
            requires_session: false,
        },
        Tool {
            name: "auth.logout".to_string(),
            description: "End the current session. The session id becomes unusable immediately.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
            requires_session: true,
        },
        Tool {
            name: "products.list".to_string(),
            description: "List products from the store catalog, optionally filtered by category and sorted by the upstream ordering field.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "category": {
                        "type": "string",
                        "description": "Exact category name to filter by"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Number of products to fetch (1-50, default 20)",
                        "minimum": 1,
                        "maximum": 50
                    },
                    "sort": {
                        "type": "string",
                        "description": "Sort direction (default asc)",
                        "enum": ["asc", "desc"]
                    }
                }
            }),
            requires_session: false,
        },
        Tool {
            name: "products.get".to_string(),
            description: "Get detailed information about a single product by id.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "productId": {
                        "type": "integer",
                        "description": "Product id"
                    }
                },
                "required": ["productId"]
            }),
            requires_session: false,
        },
        Tool {
            name: "products.categories".to_string(),
            description: "List all product categories.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
            requires_session: false,
        },
        Tool {
            name: "cart.get".to_string(),
            description: "Get the current contents of the user's cart.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
            requires_session: true,
        },
        Tool {
            name: "cart.add".to_string(),
            description: "Add a product to the cart. Adding a product already in the cart increments its quantity.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "productId": {
                        "type": "integer",
                        "description": "Product id to add"
                    },
                    "quantity": {
                        "type": "integer",
                        "description": "Quantity to add (default 1)",
                        "minimum": 1
                    }
                },
                "required": ["productId"]
            }),
            requires_session: true,
        },
        Tool {
            name: "cart.update".to_string(),
            description: "Set a product's quantity in the cart exactly. Quantity 0 removes the product.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "productId": {
                        "type": "integer",
                        "description": "Product id to update"
                    },
                    "quantity": {
                        "type": "integer",
                        "description": "New quantity (0 removes the line)",
                        "minimum": 0
                    }
                },
                "required": ["productId", "quantity"]
            }),
            requires_session: true,
        },
        Tool {
            name: "cart.remove".to_string(),
            description: "Remove a product from the cart entirely.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "productId": {
                        "type": "integer",
                        "description": "Product id to remove"
                    }
                },
                "required": ["productId"]
            }),
            requires_session: true,
        },
        Tool {
            name: "cart.clear".to_string(),
            description: "Empty the user's cart.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
            requires_session: true,
        },
    ]
}

/// Get a tool by name.
#[must_use]
pub fn get_tool_by_name(name: &str) -> Option<Tool> {
    all_tools().into_iter().find(|t| t.name == name)
}

/// Check if a tool requires a resolvable session.
#[must_use]
pub fn requires_session(tool_name: &str) -> bool {
    get_tool_by_name(tool_name).is_some_and(|t| t.requires_session)
}

/// Get tool names from a list of tools.
#[must_use]
pub fn get_tool_names(tools: &[Tool]) -> Vec<&str> {
    tools.iter().map(|t| t.name.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_tools_count() {
        assert_eq!(all_tools().len(), 10);
    }

    #[test]
    fn test_tool_names() {
        let tools = all_tools();
        let names = get_tool_names(&tools);

        for expected in [
            "auth.login",
            "auth.logout",
            "products.list",
            "products.get",
            "products.categories",
            "cart.get",
            "cart.add",
            "cart.update",
            "cart.remove",
            "cart.clear",
        ] {
            assert!(names.contains(&expected), "{expected} should be exposed");
        }
    }

    #[test]
    fn test_cart_tools_require_session() {
        for tool in all_tools() {
            if tool.name.starts_with("cart.") {
                assert!(tool.requires_session, "{} should require a session", tool.name);
            }
        }
    }

    #[test]
    fn test_login_and_product_tools_do_not_require_session() {
        for name in ["auth.login", "products.list", "products.get", "products.categories"] {
            assert!(!requires_session(name), "{name} should not require a session");
        }
    }

    #[test]
    fn test_unknown_tool_is_absent() {
        assert!(get_tool_by_name("orders.list").is_none());
        assert!(!requires_session("orders.list"));
    }

    #[test]
    fn test_tool_input_schema_is_object() {
        for tool in all_tools() {
            assert_eq!(
                tool.input_schema.get("type"),
                Some(&json!("object")),
                "{} schema should be an object schema",
                tool.name
            );
        }
    }
}
