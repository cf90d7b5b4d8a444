//! Tool dispatch.
//!
//! The entry point for every tool call. Per request the dispatcher runs a
//! short, terminal pipeline: validate arguments, resolve the session when
//! the tool requires one, execute against the cart reconciler or the
//! upstream store adapter, and wrap the outcome in the uniform response
//! envelope. Any transition failure short-circuits straight to the envelope
//! as `{success:false, error}`; no partial success is ever reported and no
//! error crosses this boundary as a fault.
//!
//! Authentication is checked strictly before any upstream call: a `cart.*`
//! tool with no resolvable session performs no upstream I/O at all.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::cart::CartService;
use crate::error::GatewayError;
use crate::session::{Session, SessionRegistry};
use crate::store::StoreApi;

use super::schema::{self, ToolArgs};

/// A single tool invocation as received from the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    /// Tool name (e.g., `cart.add`).
    #[serde(alias = "toolName")]
    pub tool: String,
    /// Raw, untyped argument object.
    #[serde(default, alias = "arguments")]
    pub args: Value,
    /// Opaque session id from a prior `auth.login`, if any.
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<String>,
}

/// Routes validated tool calls to the right operation and envelopes the
/// result.
#[derive(Clone)]
pub struct ToolDispatcher<S> {
    store: S,
    sessions: Arc<SessionRegistry>,
    carts: CartService<S>,
}

impl<S: StoreApi + Clone> ToolDispatcher<S> {
    /// Create a dispatcher over the given store and session registry.
    pub fn new(store: S, sessions: Arc<SessionRegistry>) -> Self {
        let carts = CartService::new(store.clone());
        Self {
            store,
            sessions,
            carts,
        }
    }

    /// The session registry this dispatcher authenticates against.
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Execute a tool call and return the uniform response envelope.
    ///
    /// Always returns an envelope: `{success:true, ...payload}` on success,
    /// `{success:false, error}` on any failure.
    #[instrument(skip(self, call), fields(tool = %call.tool))]
    pub async fn dispatch(&self, call: &ToolCall) -> Value {
        match self.run(call).await {
            Ok(payload) => envelope_success(payload),
            Err(error) => {
                warn!(tool = %call.tool, %error, "Tool call failed");
                json!({ "success": false, "error": error.to_string() })
            }
        }
    }

    /// validated -> session-resolved -> executed; failures short-circuit.
    async fn run(&self, call: &ToolCall) -> Result<Value, GatewayError> {
        let args = schema::validate(&call.tool, &call.args)?;

        let session = if super::requires_session(&call.tool) {
            Some(self.resolve_session(call.session_id.as_deref())?)
        } else {
            None
        };

        match args {
            ToolArgs::Login { username, password } => {
                let credentials = self.store.login(&username, &password).await?;
                let session_id = Uuid::new_v4().to_string();
                self.sessions.create(
                    session_id.clone(),
                    credentials.user_id,
                    username,
                    credentials.token,
                );
                Ok(json!({ "userId": credentials.user_id, "sessionId": session_id }))
            }
            ToolArgs::Logout => {
                let session = session.ok_or(GatewayError::AuthenticationRequired)?;
                self.sessions.destroy(&session.session_id);
                Ok(json!({}))
            }
            ToolArgs::ProductsList(filter) => {
                let products = self.store.list_products(&filter).await?;
                Ok(json!({ "products": products, "count": products.len() }))
            }
            ToolArgs::ProductsGet { product_id } => {
                let product = self.store.get_product(product_id).await?;
                Ok(json!({ "product": product }))
            }
            ToolArgs::ProductsCategories => {
                let categories = self.store.list_categories().await?;
                Ok(json!({ "categories": categories }))
            }
            ToolArgs::CartGet => {
                let session = session.ok_or(GatewayError::AuthenticationRequired)?;
                let cart = self.carts.get(session.user_id).await;
                Ok(json!({ "cart": cart }))
            }
            ToolArgs::CartAdd {
                product_id,
                quantity,
            } => {
                let session = session.ok_or(GatewayError::AuthenticationRequired)?;
                let cart = self.carts.add(session.user_id, product_id, quantity).await?;
                Ok(json!({ "cart": cart }))
            }
            ToolArgs::CartUpdate {
                product_id,
                quantity,
            } => {
                let session = session.ok_or(GatewayError::AuthenticationRequired)?;
                let cart = self
                    .carts
                    .update(session.user_id, product_id, quantity)
                    .await?;
                Ok(json!({ "cart": cart }))
            }
            ToolArgs::CartRemove { product_id } => {
                let session = session.ok_or(GatewayError::AuthenticationRequired)?;
                let cart = self.carts.remove(session.user_id, product_id).await?;
                Ok(json!({ "cart": cart }))
            }
            ToolArgs::CartClear => {
                let session = session.ok_or(GatewayError::AuthenticationRequired)?;
                let cart = self.carts.clear(session.user_id).await?;
                Ok(json!({ "cart": cart }))
            }
        }
    }

    /// Resolve the caller's session. Missing, unknown, and expired ids are
    /// all the same failure; callers learn nothing about which it was.
    fn resolve_session(&self, session_id: Option<&str>) -> Result<Session, GatewayError> {
        session_id
            .and_then(|id| self.sessions.resolve(id))
            .ok_or(GatewayError::AuthenticationRequired)
    }
}

/// Merge a payload object into the success envelope.
fn envelope_success(payload: Value) -> Value {
    match payload {
        Value::Object(mut fields) => {
            fields.insert("success".to_string(), Value::Bool(true));
            Value::Object(fields)
        }
        other => json!({ "success": true, "result": other }),
    }
}
