//! Cart engine.
//!
//! [`CartService`] owns the remote cart's lifecycle for one buyer session.
//! Every mutation returns a fresh immutable snapshot; the derived donation
//! rule runs against the backend's response before the snapshot is exposed.
//!
//! Mutations are not serialized. When two race, whichever response resolves
//! last replaces the held snapshot.

use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::attributes::AttributeList;
use crate::cart::{
    normalize, BuyerIdentityInput, Cart, CartIdStore, CartRules, CommerceBackend, DisplayTotals,
    DonationEvaluation, DonationRule, LineItemRequest, LineUpdate, GENERIC_CART_ERROR,
    MAX_LINE_QUANTITY,
};
use crate::error::CommerceError;
use crate::ids::{CartId, LineId, MerchandiseId};
use crate::session::BuyerSession;

pub struct CartService {
    backend: Arc<dyn CommerceBackend>,
    ids: Arc<dyn CartIdStore>,
    rules: CartRules,
    donation: Option<DonationRule>,
    session: RwLock<Option<BuyerSession>>,
    current: RwLock<Option<Arc<Cart>>>,
}

impl CartService {
    pub fn new(backend: Arc<dyn CommerceBackend>, ids: Arc<dyn CartIdStore>, rules: CartRules) -> Self {
        let donation = rules.donation_rule();
        Self {
            backend,
            ids,
            rules,
            donation,
            session: RwLock::new(None),
            current: RwLock::new(None),
        }
    }

    pub fn with_session(self, session: BuyerSession) -> Self {
        self.set_session(Some(session));
        self
    }

    pub fn set_session(&self, session: Option<BuyerSession>) {
        *self.session.write().unwrap_or_else(|e| e.into_inner()) = session;
    }

    pub fn session(&self) -> Option<BuyerSession> {
        self.session.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn rules(&self) -> &CartRules {
        &self.rules
    }

    /// The last known-good snapshot.
    pub fn cart(&self) -> Option<Arc<Cart>> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Create a remote cart, seeded with the signed-in buyer's email.
    pub async fn create_cart(&self) -> Result<Arc<Cart>, CommerceError> {
        let buyer = BuyerIdentityInput {
            email: self.session().map(|s| s.email),
            customer_access_token: None,
        };
        let cart = normalize("cart_create", self.backend.cart_create(buyer).await)?;
        self.ids.save(&cart.id)?;
        info!(cart = %cart.id, "cart created");
        Ok(self.publish(cart))
    }

    /// Load `id`; if the backend no longer has it, forget it and start over.
    pub async fn fetch_cart(&self, id: &CartId) -> Result<Arc<Cart>, CommerceError> {
        match self.backend.cart(id).await {
            Ok(Some(cart)) => {
                debug!(cart = %cart.id, lines = cart.lines.len(), "cart fetched");
                Ok(self.publish(cart))
            }
            Ok(None) => {
                info!(cart = %id, "stored cart not found, creating a new one");
                self.ids.clear()?;
                self.create_cart().await
            }
            Err(e) => {
                warn!(cart = %id, error = %e, "cart fetch failed");
                Err(CommerceError::remote(GENERIC_CART_ERROR))
            }
        }
    }

    /// Resume the persisted cart or create one.
    pub async fn load_or_create(&self) -> Result<Arc<Cart>, CommerceError> {
        match self.ids.load()? {
            Some(id) => self.fetch_cart(&id).await,
            None => self.create_cart().await,
        }
    }

    /// Add one line, creating the cart first if there is none.
    pub async fn add_line_item(
        &self,
        merchandise_id: MerchandiseId,
        quantity: i64,
        attributes: AttributeList,
    ) -> Result<Arc<Cart>, CommerceError> {
        self.add_request(LineItemRequest::new(merchandise_id, quantity, attributes))
            .await
    }

    pub async fn add_request(&self, request: LineItemRequest) -> Result<Arc<Cart>, CommerceError> {
        check_quantity(request.quantity)?;
        let cart_id = self.ensure_cart().await?;
        let is_donation = self.is_donation_merchandise(&request.merchandise_id);
        let merchandise = request.merchandise_id.clone();
        let quantity = request.quantity;

        let cart = normalize(
            "lines_add",
            self.backend.lines_add(&cart_id, vec![request]).await,
        )?;
        info!(cart = %cart.id, merchandise = %merchandise, quantity, "line added");
        self.settle(cart, is_donation).await
    }

    /// Set a line's quantity; zero or less removes it.
    pub async fn update_line_item(
        &self,
        line_id: LineId,
        quantity: i64,
    ) -> Result<Arc<Cart>, CommerceError> {
        if quantity <= 0 {
            return self.remove_line_item(line_id).await;
        }
        check_quantity(quantity)?;
        let cart_id = self.ensure_cart().await?;
        let current = self.cart().ok_or(CommerceError::NoCart)?;
        let is_donation = self.is_donation_line(&current, &line_id);

        let update = LineUpdate {
            id: line_id.clone(),
            quantity,
        };
        let cart = normalize(
            "lines_update",
            self.backend.lines_update(&cart_id, vec![update]).await,
        )?;
        info!(cart = %cart.id, line = %line_id, quantity, "line updated");
        self.settle(cart, is_donation).await
    }

    /// Remove one line, resuming the persisted cart if none is held yet.
    pub async fn remove_line_item(&self, line_id: LineId) -> Result<Arc<Cart>, CommerceError> {
        let cart_id = self.ensure_cart().await?;
        let current = self.cart().ok_or(CommerceError::NoCart)?;
        let is_donation = self.is_donation_line(&current, &line_id);

        let cart = normalize(
            "lines_remove",
            self.backend
                .lines_remove(&cart_id, vec![line_id.clone()])
                .await,
        )?;
        info!(cart = %cart.id, line = %line_id, "line removed");
        self.settle(cart, is_donation).await
    }

    /// Attach the signed-in customer to the cart.
    pub async fn associate_cart_with_customer(
        &self,
        access_token: &str,
    ) -> Result<Arc<Cart>, CommerceError> {
        let cart_id = self.ensure_cart().await?;
        let buyer = BuyerIdentityInput {
            email: self.session().map(|s| s.email),
            customer_access_token: Some(access_token.to_string()),
        };
        let cart = normalize(
            "buyer_identity_update",
            self.backend.buyer_identity_update(&cart_id, buyer).await,
        )?;
        info!(cart = %cart.id, "buyer identity attached");
        self.settle(cart, false).await
    }

    /// Issue one add per request, in order, each independent of the others.
    ///
    /// Every add failing yields the first failure; a mix yields
    /// [`CommerceError::PartialCompletion`] with the snapshot after the
    /// successful adds.
    pub async fn add_line_items_independently(
        &self,
        requests: Vec<LineItemRequest>,
    ) -> Result<Arc<Cart>, CommerceError> {
        let attempted = requests.len();
        if attempted == 0 {
            self.ensure_cart().await?;
            return self.cart().ok_or(CommerceError::NoCart);
        }

        let mut succeeded = 0;
        let mut latest = None;
        let mut failures = Vec::new();
        for request in requests {
            match self.add_request(request).await {
                Ok(cart) => {
                    succeeded += 1;
                    latest = Some(cart);
                }
                Err(e) => failures.push(e),
            }
        }

        match (latest, failures.is_empty()) {
            (Some(cart), true) => Ok(cart),
            (Some(cart), false) => {
                let message = failures
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                warn!(succeeded, attempted, "only some lines were added");
                Err(CommerceError::PartialCompletion {
                    succeeded,
                    attempted,
                    message,
                    cart: Box::new(cart.as_ref().clone()),
                })
            }
            (None, _) => Err(failures
                .into_iter()
                .next()
                .unwrap_or(CommerceError::NoCart)),
        }
    }

    /// Hand off to checkout: return the checkout URL and forget the cart.
    pub async fn complete_checkout_handoff(&self) -> Result<String, CommerceError> {
        let cart = self.cart().ok_or(CommerceError::NoCart)?;
        self.ids.clear()?;
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = None;
        info!(cart = %cart.id, "checkout handoff");
        Ok(cart.checkout_url.clone())
    }

    /// Donation rule evaluated against the held snapshot.
    pub fn donation_status(&self) -> Option<DonationEvaluation> {
        let rule = self.donation.as_ref()?;
        let cart = self.cart()?;
        Some(rule.evaluate(&cart))
    }

    /// Subtotal with the first-time discount applied for display.
    pub fn display_totals(&self, is_first_time_customer: bool) -> Option<DisplayTotals> {
        let cart = self.cart()?;
        Some(DisplayTotals::compute(
            &cart,
            self.rules.first_time_discount(),
            is_first_time_customer,
        ))
    }

    async fn ensure_cart(&self) -> Result<CartId, CommerceError> {
        match self.cart() {
            Some(cart) => Ok(cart.id.clone()),
            None => Ok(self.load_or_create().await?.id.clone()),
        }
    }

    fn is_donation_merchandise(&self, merchandise_id: &MerchandiseId) -> bool {
        self.donation
            .as_ref()
            .map(|rule| &rule.merchandise_id == merchandise_id)
            .unwrap_or(false)
    }

    fn is_donation_line(&self, cart: &Cart, line_id: &LineId) -> bool {
        match (self.donation.as_ref(), cart.line(line_id)) {
            (Some(rule), Some(line)) => rule.is_donation(line),
            _ => false,
        }
    }

    /// Apply the donation rule to a fresh backend response, then publish it.
    ///
    /// A failed donation removal is logged and the response published as is;
    /// the next mutation evaluates the rule again.
    async fn settle(&self, cart: Cart, mutated_donation: bool) -> Result<Arc<Cart>, CommerceError> {
        let Some(rule) = self.donation.as_ref().filter(|_| !mutated_donation) else {
            return Ok(self.publish(cart));
        };

        let evaluation = rule.evaluate(&cart);
        debug!(
            qualifying = evaluation.qualifying,
            eyeglasses = evaluation.eyeglasses_lines,
            contact_lenses = evaluation.contact_lens_quantity,
            "donation rule evaluated"
        );
        let removals = evaluation.removals();
        if removals.is_empty() {
            return Ok(self.publish(cart));
        }

        info!(cart = %cart.id, lines = removals.len(), "removing donation line from non-qualifying cart");
        let result = self.backend.lines_remove(&cart.id, removals.to_vec()).await;
        match normalize("lines_remove", result) {
            Ok(pruned) => Ok(self.publish(pruned)),
            Err(e) => {
                warn!(cart = %cart.id, error = %e, "donation removal failed");
                Ok(self.publish(cart))
            }
        }
    }

    fn publish(&self, cart: Cart) -> Arc<Cart> {
        let snapshot = Arc::new(cart);
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(snapshot.clone());
        snapshot
    }
}

fn check_quantity(quantity: i64) -> Result<(), CommerceError> {
    if quantity <= 0 || quantity > MAX_LINE_QUANTITY {
        return Err(CommerceError::InvalidQuantity(quantity));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::oneshot;

    use crate::attributes::{Attribute, AttributeList};
    use crate::cart::{BackendCall, MemoryBackend, MemoryCartIdStore, MutationOutcome};
    use crate::ids::CustomerId;
    use crate::money::{Currency, Money};

    const FRAME: &str = "variant-frame";
    const CONTACTS: &str = "variant-contacts";
    const DONATION: &str = "variant-donation";

    fn backend() -> Arc<MemoryBackend> {
        Arc::new(
            MemoryBackend::new(Currency::USD)
                .with_product(FRAME, "Aviator", Money::from_major(95, Currency::USD))
                .with_product(CONTACTS, "Daily Lenses", Money::from_major(45, Currency::USD))
                .with_product(DONATION, "Donate a pair", Money::from_major(5, Currency::USD)),
        )
    }

    fn service(backend: Arc<MemoryBackend>) -> (CartService, Arc<MemoryCartIdStore>) {
        let ids = Arc::new(MemoryCartIdStore::new());
        let rules = CartRules::default().with_donation(MerchandiseId::new(DONATION));
        (CartService::new(backend, ids.clone(), rules), ids)
    }

    fn tagged(kind: &str) -> AttributeList {
        vec![Attribute::new("FocalProductType", kind)].into()
    }

    /// Holds each quantity update until its gate is opened.
    struct GatedBackend {
        inner: Arc<MemoryBackend>,
        gates: Mutex<HashMap<i64, oneshot::Receiver<()>>>,
    }

    impl GatedBackend {
        fn new(inner: Arc<MemoryBackend>) -> Self {
            Self {
                inner,
                gates: Mutex::new(HashMap::new()),
            }
        }

        fn gate(&self, quantity: i64) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(quantity, rx);
            tx
        }
    }

    #[async_trait]
    impl CommerceBackend for GatedBackend {
        async fn cart_create(&self, buyer: BuyerIdentityInput) -> Result<MutationOutcome, CommerceError> {
            self.inner.cart_create(buyer).await
        }

        async fn cart(&self, id: &CartId) -> Result<Option<Cart>, CommerceError> {
            self.inner.cart(id).await
        }

        async fn lines_add(
            &self,
            cart_id: &CartId,
            lines: Vec<LineItemRequest>,
        ) -> Result<MutationOutcome, CommerceError> {
            self.inner.lines_add(cart_id, lines).await
        }

        async fn lines_update(
            &self,
            cart_id: &CartId,
            lines: Vec<LineUpdate>,
        ) -> Result<MutationOutcome, CommerceError> {
            let gate = lines
                .first()
                .and_then(|l| self.gates.lock().unwrap().remove(&l.quantity));
            if let Some(gate) = gate {
                gate.await.unwrap();
            }
            self.inner.lines_update(cart_id, lines).await
        }

        async fn lines_remove(
            &self,
            cart_id: &CartId,
            line_ids: Vec<LineId>,
        ) -> Result<MutationOutcome, CommerceError> {
            self.inner.lines_remove(cart_id, line_ids).await
        }

        async fn buyer_identity_update(
            &self,
            cart_id: &CartId,
            buyer: BuyerIdentityInput,
        ) -> Result<MutationOutcome, CommerceError> {
            self.inner.buyer_identity_update(cart_id, buyer).await
        }
    }

    #[tokio::test]
    async fn test_first_add_creates_and_persists_cart() {
        let backend = backend();
        let (service, ids) = service(backend.clone());

        let cart = service
            .add_line_item(MerchandiseId::new(FRAME), 1, tagged("Eyeglasses"))
            .await
            .unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(ids.load().unwrap(), Some(cart.id.clone()));
        assert_eq!(backend.calls()[0], BackendCall::Create);
    }

    #[tokio::test]
    async fn test_create_seeds_signed_in_email() {
        let backend = backend();
        let (service, _) = service(backend);
        let service = service.with_session(BuyerSession::new(
            CustomerId::new("customer-1"),
            "ada@example.com",
            "token",
        ));
        let cart = service.create_cart().await.unwrap();
        assert_eq!(cart.buyer_identity.email.as_deref(), Some("ada@example.com"));
    }

    #[tokio::test]
    async fn test_missing_remote_cart_is_replaced() {
        let backend = backend();
        let (service, ids) = service(backend.clone());
        let first = service.create_cart().await.unwrap();
        backend.expire(&first.id);

        let second = service.load_or_create().await.unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(ids.load().unwrap(), Some(second.id.clone()));
    }

    #[tokio::test]
    async fn test_zero_quantity_update_removes_line() {
        let backend = backend();
        let (service, _) = service(backend.clone());
        let cart = service
            .add_line_item(MerchandiseId::new(CONTACTS), 2, tagged("ContactLenses"))
            .await
            .unwrap();
        let line = cart.lines[0].id.clone();

        let cart = service.update_line_item(line.clone(), 0).await.unwrap();
        assert!(cart.is_empty());
        assert!(matches!(backend.calls().last(), Some(BackendCall::Remove(ids)) if ids == &vec![line]));
    }

    #[tokio::test]
    async fn test_resumed_session_can_update_and_remove() {
        let backend = backend();
        let (first, ids) = service(backend.clone());
        let cart = first
            .add_line_item(MerchandiseId::new(CONTACTS), 1, tagged("ContactLenses"))
            .await
            .unwrap();
        let line = cart.lines[0].id.clone();

        // later sessions only have the persisted id
        let resume = || {
            let rules = CartRules::default().with_donation(MerchandiseId::new(DONATION));
            CartService::new(backend.clone(), ids.clone(), rules)
        };

        let resumed = resume();
        assert!(resumed.cart().is_none());
        let cart = resumed.update_line_item(line.clone(), 3).await.unwrap();
        assert_eq!(cart.lines[0].quantity, 3);
        assert!(backend.calls().contains(&BackendCall::Fetch(cart.id.clone())));

        let cart = resume().remove_line_item(line).await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_last_resolved_update_wins() {
        let gated = Arc::new(GatedBackend::new(backend()));
        let ids = Arc::new(MemoryCartIdStore::new());
        let service = CartService::new(gated.clone(), ids, CartRules::default());
        let cart = service
            .add_line_item(MerchandiseId::new(CONTACTS), 1, tagged("ContactLenses"))
            .await
            .unwrap();
        let line = cart.lines[0].id.clone();

        let open_two = gated.gate(2);
        let open_three = gated.gate(3);
        let (three_done_tx, three_done_rx) = oneshot::channel();

        // issued 2 then 3, resolved 3 then 2
        let (two, three, ()) = tokio::join!(
            service.update_line_item(line.clone(), 2),
            async {
                let result = service.update_line_item(line.clone(), 3).await;
                three_done_tx.send(()).unwrap();
                result
            },
            async {
                open_three.send(()).unwrap();
                three_done_rx.await.unwrap();
                open_two.send(()).unwrap();
            },
        );
        assert_eq!(three.unwrap().lines[0].quantity, 3);
        assert_eq!(two.unwrap().lines[0].quantity, 2);
        assert_eq!(service.cart().unwrap().lines[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_donation_removed_once_cart_stops_qualifying() {
        let backend = backend();
        let (service, _) = service(backend.clone());

        service
            .add_line_item(MerchandiseId::new(FRAME), 1, tagged("Eyeglasses"))
            .await
            .unwrap();
        let cart = service
            .add_line_item(MerchandiseId::new(DONATION), 1, AttributeList::new())
            .await
            .unwrap();
        assert_eq!(cart.lines.len(), 2);
        let cart = service
            .add_line_item(MerchandiseId::new(CONTACTS), 2, tagged("ContactLenses"))
            .await
            .unwrap();
        assert_eq!(cart.lines.len(), 3);
        assert_eq!(backend.removes(), 0);

        let frame = cart
            .line_for(&MerchandiseId::new(FRAME))
            .map(|l| l.id.clone())
            .unwrap();
        let cart = service.remove_line_item(frame).await.unwrap();

        // frame removal plus exactly one donation removal
        assert_eq!(backend.removes(), 2);
        assert!(cart.line_for(&MerchandiseId::new(DONATION)).is_none());
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(service.cart().unwrap().lines.len(), 1);
    }

    #[tokio::test]
    async fn test_rule_never_adds_donation() {
        let backend = backend();
        let (service, _) = service(backend.clone());
        for _ in 0..2 {
            service
                .add_line_item(MerchandiseId::new(FRAME), 1, tagged("Eyeglasses"))
                .await
                .unwrap();
        }
        assert_eq!(backend.adds_of(&MerchandiseId::new(DONATION)), 0);
        assert!(service.donation_status().unwrap().should_offer_donation());
    }

    #[tokio::test]
    async fn test_failure_keeps_last_known_good_snapshot() {
        let backend = backend();
        let (service, _) = service(backend.clone());
        let before = service
            .add_line_item(MerchandiseId::new(FRAME), 1, tagged("Eyeglasses"))
            .await
            .unwrap();

        backend.set_unavailable(true);
        let err = service
            .add_line_item(MerchandiseId::new(CONTACTS), 1, tagged("ContactLenses"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::RemoteOperation { .. }));
        assert_eq!(service.cart().unwrap(), before);
    }

    #[tokio::test]
    async fn test_quantity_bounds_checked_locally() {
        let backend = backend();
        let (service, _) = service(backend.clone());
        let err = service
            .add_line_item(MerchandiseId::new(CONTACTS), 100, tagged("ContactLenses"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::InvalidQuantity(100)));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_mixed_batch_reports_partial_completion() {
        let backend = backend();
        backend.reject(&MerchandiseId::new("variant-missing"), "Variant is sold out");
        let (service, _) = service(backend);

        let err = service
            .add_line_items_independently(vec![
                LineItemRequest::new(MerchandiseId::new(CONTACTS), 2, tagged("ContactLenses")),
                LineItemRequest::new(MerchandiseId::new("variant-missing"), 2, tagged("ContactLenses")),
            ])
            .await
            .unwrap_err();
        match err {
            CommerceError::PartialCompletion {
                succeeded,
                attempted,
                cart,
                message,
            } => {
                assert_eq!((succeeded, attempted), (1, 2));
                assert_eq!(cart.lines.len(), 1);
                assert_eq!(message, "Variant is sold out");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_checkout_handoff_forgets_cart() {
        let backend = backend();
        let (service, ids) = service(backend);
        let cart = service.create_cart().await.unwrap();

        let url = service.complete_checkout_handoff().await.unwrap();
        assert_eq!(url, cart.checkout_url);
        assert_eq!(ids.load().unwrap(), None);
        assert!(service.cart().is_none());
        assert!(matches!(
            service.complete_checkout_handoff().await,
            Err(CommerceError::NoCart)
        ));
    }
}
