//! In-memory commerce backend (for development/testing).
//!
//! Behaves like the storefront for the operations the cart engine uses and
//! records every call so tests can assert on what was sent.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::attributes::keys;
use crate::cart::{
    BuyerIdentity, BuyerIdentityInput, Cart, CartCost, CartLine, CommerceBackend, LineItemRequest,
    LineUpdate, MutationOutcome, UserError,
};
use crate::error::CommerceError;
use crate::ids::{CartId, LineId, MerchandiseId};
use crate::money::{Currency, Money};

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Create,
    Fetch(CartId),
    Add(Vec<MerchandiseId>),
    Update(Vec<LineUpdate>),
    Remove(Vec<LineId>),
    BuyerIdentity,
}

#[derive(Debug, Clone)]
struct Product {
    title: String,
    price: Money,
}

#[derive(Default)]
struct State {
    carts: HashMap<CartId, Cart>,
    products: HashMap<MerchandiseId, Product>,
    rejected: HashMap<MerchandiseId, String>,
    calls: Vec<BackendCall>,
    unavailable: bool,
}

/// Storefront stand-in keeping carts in a map.
pub struct MemoryBackend {
    currency: Currency,
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            state: Mutex::new(State::default()),
        }
    }

    /// Register a purchasable variant.
    pub fn with_product(self, id: &str, title: &str, price: Money) -> Self {
        self.lock().products.insert(
            MerchandiseId::new(id),
            Product {
                title: title.to_string(),
                price,
            },
        );
        self
    }

    /// Answer adds of `id` with a user error.
    pub fn reject(&self, id: &MerchandiseId, message: impl Into<String>) {
        self.lock().rejected.insert(id.clone(), message.into());
    }

    /// Fail every call at the transport level.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Drop a cart as if it expired remotely.
    pub fn expire(&self, id: &CartId) {
        self.lock().carts.remove(id);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    /// Number of add calls that included `id`.
    pub fn adds_of(&self, id: &MerchandiseId) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, BackendCall::Add(ids) if ids.contains(id)))
            .count()
    }

    pub fn removes(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, BackendCall::Remove(_)))
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: BackendCall) -> Result<std::sync::MutexGuard<'_, State>, CommerceError> {
        let mut state = self.lock();
        state.calls.push(call);
        if state.unavailable {
            return Err(CommerceError::remote("storefront unavailable"));
        }
        Ok(state)
    }

    fn reprice(&self, cart: &mut Cart) {
        let subtotal = cart
            .lines
            .iter()
            .filter_map(|l| l.line_total())
            .fold(Money::zero(self.currency), |acc, m| acc.try_add(&m).unwrap_or(acc));
        cart.cost = CartCost {
            subtotal,
            total: subtotal,
            total_tax: None,
        };
    }
}

fn missing_cart(id: &CartId) -> MutationOutcome {
    MutationOutcome::rejected(vec![UserError {
        field: Some(vec!["cartId".to_string()]),
        message: format!("The specified cart does not exist: {}", id),
    }])
}

#[async_trait]
impl CommerceBackend for MemoryBackend {
    async fn cart_create(&self, buyer: BuyerIdentityInput) -> Result<MutationOutcome, CommerceError> {
        let mut state = self.record(BackendCall::Create)?;
        let id = CartId::generate();
        let cart = Cart {
            id: id.clone(),
            checkout_url: format!("https://checkout.memory.test/{}", id),
            lines: Vec::new(),
            cost: CartCost::zero(self.currency),
            buyer_identity: BuyerIdentity {
                email: buyer.email,
                customer_id: None,
            },
        };
        state.carts.insert(id, cart.clone());
        Ok(MutationOutcome::ok(cart))
    }

    async fn cart(&self, id: &CartId) -> Result<Option<Cart>, CommerceError> {
        let state = self.record(BackendCall::Fetch(id.clone()))?;
        Ok(state.carts.get(id).cloned())
    }

    async fn lines_add(
        &self,
        cart_id: &CartId,
        lines: Vec<LineItemRequest>,
    ) -> Result<MutationOutcome, CommerceError> {
        let ids = lines.iter().map(|l| l.merchandise_id.clone()).collect();
        let mut state = self.record(BackendCall::Add(ids))?;

        let mut errors = Vec::new();
        let mut added = Vec::new();
        for request in lines {
            if let Some(message) = state.rejected.get(&request.merchandise_id) {
                errors.push(UserError::new(message.clone()));
                continue;
            }
            let Some(product) = state.products.get(&request.merchandise_id) else {
                errors.push(UserError::new(format!(
                    "The merchandise with id {} does not exist.",
                    request.merchandise_id
                )));
                continue;
            };
            // the checkout function honours the override; mirror it here
            let unit_price = request
                .attributes
                .get(keys::PRICE_OVERRIDE)
                .and_then(|v| Money::parse_decimal(v, self.currency))
                .unwrap_or(product.price);
            added.push(CartLine {
                id: LineId::generate(),
                merchandise_id: request.merchandise_id,
                title: product.title.clone(),
                quantity: request.quantity,
                attributes: request.attributes,
                unit_price,
            });
        }
        if !errors.is_empty() {
            return Ok(MutationOutcome::rejected(errors));
        }

        let Some(cart) = state.carts.get_mut(cart_id) else {
            return Ok(missing_cart(cart_id));
        };
        cart.lines.extend(added);
        let mut cart = cart.clone();
        self.reprice(&mut cart);
        state.carts.insert(cart_id.clone(), cart.clone());
        Ok(MutationOutcome::ok(cart))
    }

    async fn lines_update(
        &self,
        cart_id: &CartId,
        lines: Vec<LineUpdate>,
    ) -> Result<MutationOutcome, CommerceError> {
        let mut state = self.record(BackendCall::Update(lines.clone()))?;
        let Some(mut cart) = state.carts.get(cart_id).cloned() else {
            return Ok(missing_cart(cart_id));
        };
        for update in &lines {
            match cart.lines.iter_mut().find(|l| l.id == update.id) {
                Some(line) => line.quantity = update.quantity,
                None => {
                    return Ok(MutationOutcome::rejected(vec![UserError::new(format!(
                        "The line with id {} does not exist.",
                        update.id
                    ))]))
                }
            }
        }
        self.reprice(&mut cart);
        state.carts.insert(cart_id.clone(), cart.clone());
        Ok(MutationOutcome::ok(cart))
    }

    async fn lines_remove(
        &self,
        cart_id: &CartId,
        line_ids: Vec<LineId>,
    ) -> Result<MutationOutcome, CommerceError> {
        let mut state = self.record(BackendCall::Remove(line_ids.clone()))?;
        let Some(mut cart) = state.carts.get(cart_id).cloned() else {
            return Ok(missing_cart(cart_id));
        };
        cart.lines.retain(|l| !line_ids.contains(&l.id));
        self.reprice(&mut cart);
        state.carts.insert(cart_id.clone(), cart.clone());
        Ok(MutationOutcome::ok(cart))
    }

    async fn buyer_identity_update(
        &self,
        cart_id: &CartId,
        buyer: BuyerIdentityInput,
    ) -> Result<MutationOutcome, CommerceError> {
        let mut state = self.record(BackendCall::BuyerIdentity)?;
        let Some(cart) = state.carts.get_mut(cart_id) else {
            return Ok(missing_cart(cart_id));
        };
        if buyer.email.is_some() {
            cart.buyer_identity.email = buyer.email;
        }
        Ok(MutationOutcome::ok(cart.clone()))
    }
}
