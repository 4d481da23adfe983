use std::collections::HashSet;

use rust_decimal::Decimal;

use crate::Result;
use crate::codec;
use crate::error::Error;
use crate::instrument::Instruments;
use crate::intent::{
    CancelOrder, CanonicalPayload as _, CreateOrder, OrderChanges, OrderIntent, UpdateOrder,
};
use crate::nonce::NonceGenerator;
use crate::request::{
    BatchEnvelope, CancelAllBody, CancelBody, ModifyBody, ParentOrderBody, PlaceBody,
    SignedOperation, SignedRequest,
};
use crate::signer::{SignedPayload, Signer};
use crate::transport::Transport;
use crate::types::{OrderFlags, OrderRef, OrderType, ParentLink};

/// Turns intents into signed single or batch requests.
///
/// Everything here is synchronous except [`RequestBuilder::resolve_update`], which
/// reads the current order through a transport. Nothing is cached between calls:
/// each request gets fresh nonces, fresh buffers and fresh signatures.
#[derive(Debug)]
pub struct RequestBuilder {
    account_id: u64,
    signer: Option<Signer>,
    instruments: Instruments,
    nonces: NonceGenerator,
}

impl RequestBuilder {
    #[must_use]
    pub fn new(account_id: u64, signer: Option<Signer>, instruments: Instruments) -> Self {
        Self {
            account_id,
            signer,
            instruments,
            nonces: NonceGenerator::new(),
        }
    }

    #[must_use]
    pub fn account_id(&self) -> u64 {
        self.account_id
    }

    #[must_use]
    pub fn instruments(&self) -> &Instruments {
        &self.instruments
    }

    #[must_use]
    pub fn signer(&self) -> Option<&Signer> {
        self.signer.as_ref()
    }

    pub fn set_instruments(&mut self, instruments: Instruments) {
        self.instruments = instruments;
    }

    pub fn next_nonce(&self) -> u64 {
        self.nonces.next()
    }

    /// Signs a new order. An order carrying TPSL legs becomes a batch holding the
    /// parent followed by one child per leg.
    pub fn sign_create(&self, order: CreateOrder) -> Result<SignedRequest> {
        let signer = self.require_signer()?;
        let mut operations = self
            .expand(order)
            .into_iter()
            .map(|order| self.place(signer, order))
            .collect::<Result<Vec<_>>>()?;
        if operations.len() == 1
            && let Some(operation) = operations.pop()
        {
            return Ok(self.single(operation));
        }
        Ok(self.batch(operations))
    }

    pub fn sign_update(&self, update: UpdateOrder) -> Result<SignedRequest> {
        let signer = self.require_signer()?;
        let operation = self.modify(signer, update)?;
        Ok(self.single(operation))
    }

    pub fn sign_cancel(&self, cancel: CancelOrder) -> Result<SignedRequest> {
        let signer = self.require_signer()?;
        let operation = self.cancel(signer, cancel)?;
        Ok(self.single(operation))
    }

    pub fn sign_cancel_all(&self) -> Result<SignedRequest> {
        let signer = self.require_signer()?;
        let nonce = self.next_nonce();
        let payload =
            SignedPayload::sign(signer, self.account_id, codec::encode_cancel_all(nonce))?;
        Ok(SignedRequest::CancelAll {
            account_id: self.account_id,
            body: CancelAllBody { nonce, payload },
        })
    }

    /// Encodes and signs every intent, preserving order: position `i` of the
    /// envelope is intent `i`.
    ///
    /// No order state is fetched: updates must arrive complete. Creates carrying
    /// TPSL legs are refused, since their children would shift every later
    /// position; place those through [`RequestBuilder::sign_create`]. Identity and
    /// nonce problems are reported for the first offending item before anything is
    /// signed, and every error carries the index of the intent that caused it.
    pub fn build_batch(&self, mut intents: Vec<OrderIntent>) -> Result<SignedRequest> {
        if intents.is_empty() {
            return Err(Error::validation("batch has no orders"));
        }
        let mut nonces = HashSet::with_capacity(intents.len());
        for (index, intent) in intents.iter_mut().enumerate() {
            self.prepare_batch_item(intent, &mut nonces)
                .map_err(|e| e.at_index(index))?;
        }
        let signer = self.require_signer()?;

        let operations = intents
            .into_iter()
            .enumerate()
            .map(|(index, intent)| {
                match intent {
                    OrderIntent::Create(order) => self.place(signer, order),
                    OrderIntent::Update(update) => self.modify(signer, update),
                    OrderIntent::Cancel(cancel) => self.cancel(signer, cancel),
                }
                .map_err(|e| e.at_index(index))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self.batch(operations))
    }

    /// Completes an update from the order's current state.
    ///
    /// Fields set in `changes` win; symbol, side and flags always come from the
    /// exchange, the rest fall back to what the order currently holds. The read and
    /// the later write are not atomic: if the order changes in between, the
    /// exchange rejects the update.
    pub async fn resolve_update<T: Transport + ?Sized>(
        &self,
        transport: &T,
        target: OrderRef,
        changes: OrderChanges,
        max_fees_percent: Decimal,
    ) -> Result<UpdateOrder> {
        let current = transport.fetch_order(&target).await?;
        let quantity = changes
            .quantity
            .or(current.available_quantity)
            .or(current.total_quantity)
            .ok_or_else(|| {
                Error::validation(format!(
                    "order {} reports no quantity and none was given",
                    current.order_id
                ))
            })?;
        let order_nonce = match target {
            OrderRef::Nonce(nonce) => Some(nonce),
            OrderRef::Id(_) => current.nonce,
        };

        Ok(UpdateOrder {
            order_id: Some(current.order_id),
            order_nonce,
            symbol: current.symbol,
            side: current.side,
            quantity,
            max_fees_percent,
            price: changes.price.or(current.price),
            trigger_price: changes.trigger_price.or(current.trigger_price),
            creation_deadline: None,
            flags: current.order_flags,
            nonce: None,
        })
    }

    fn require_signer(&self) -> Result<&Signer> {
        self.signer
            .as_ref()
            .ok_or_else(|| Error::signing("no private key configured"))
    }

    /// Checks identity and pins the item's own nonce, which must not repeat within
    /// the batch. Cancels carry no nonce of their own.
    fn prepare_batch_item(&self, intent: &mut OrderIntent, seen: &mut HashSet<u64>) -> Result<()> {
        intent.validate_identity()?;
        let nonce = match intent {
            OrderIntent::Create(order) => {
                if order.tpsl.is_some() {
                    return Err(Error::validation(
                        "orders with TPSL legs cannot be batched, place them on their own",
                    ));
                }
                *order.nonce.get_or_insert_with(|| self.nonces.next())
            }
            OrderIntent::Update(update) => *update.nonce.get_or_insert_with(|| self.nonces.next()),
            OrderIntent::Cancel(_) => return Ok(()),
        };
        if seen.insert(nonce) {
            Ok(())
        } else {
            Err(Error::validation(format!("nonce {nonce} is used twice in one batch")))
        }
    }

    /// Assigns the parent nonce and appends one reduce-only trigger child per TPSL leg.
    fn expand(&self, mut order: CreateOrder) -> Vec<CreateOrder> {
        let parent_nonce = *order.nonce.get_or_insert_with(|| self.nonces.next());
        let Some(tpsl) = order.tpsl.take() else {
            return vec![order];
        };

        let mut orders = Vec::with_capacity(tpsl.legs().len() + 1);
        for leg in tpsl.legs() {
            let mut child = CreateOrder::builder()
                .symbol(order.symbol.clone())
                .side(order.side.opposite())
                .quantity(leg.quantity.unwrap_or(order.quantity))
                .max_fees_percent(order.max_fees_percent)
                .trigger_price(leg.price)
                .flags(OrderFlags::ReduceOnly)
                .nonce(self.nonces.next())
                .build();
            child.parent = Some(ParentLink {
                nonce: parent_nonce,
                kind: leg.kind,
            });
            orders.push(child);
        }
        orders.insert(0, order);
        orders
    }

    fn place(&self, signer: &Signer, mut order: CreateOrder) -> Result<SignedOperation> {
        let nonce = *order.nonce.get_or_insert_with(|| self.nonces.next());
        let canonical = order.canonical_bytes(&self.instruments)?;
        let creation_deadline = order
            .creation_deadline
            .map(codec::deadline_to_fixed)
            .transpose()?;
        let payload = SignedPayload::sign(signer, self.account_id, canonical)?;

        Ok(SignedOperation::Place(PlaceBody {
            nonce,
            order_type: if order.price.is_some() {
                OrderType::Limit
            } else {
                OrderType::Market
            },
            symbol: order.symbol,
            side: order.side,
            quantity: order.quantity,
            price: order.price,
            trigger_price: order.trigger_price,
            twap_config: order.twap,
            creation_deadline,
            order_flags: order.flags,
            parent_order: order.parent.map(ParentOrderBody::from),
            max_fees_percent: order.max_fees_percent,
            payload,
        }))
    }

    fn modify(&self, signer: &Signer, mut update: UpdateOrder) -> Result<SignedOperation> {
        let nonce = *update.nonce.get_or_insert_with(|| self.nonces.next());
        let canonical = update.canonical_bytes(&self.instruments)?;
        let creation_deadline = update
            .creation_deadline
            .map(codec::deadline_to_fixed)
            .transpose()?;
        let payload = SignedPayload::sign(signer, self.account_id, canonical)?;

        Ok(SignedOperation::Modify(ModifyBody {
            order_id: update.order_id,
            order_nonce: update.order_nonce,
            nonce,
            symbol: update.symbol,
            side: update.side,
            updated_quantity: update.quantity,
            updated_price: update.price,
            updated_trigger_price: update.trigger_price,
            creation_deadline,
            order_flags: update.flags,
            max_fees_percent: update.max_fees_percent,
            payload,
        }))
    }

    fn cancel(&self, signer: &Signer, cancel: CancelOrder) -> Result<SignedOperation> {
        let canonical = cancel.canonical_bytes(&self.instruments)?;
        let payload = SignedPayload::sign(signer, self.account_id, canonical)?;
        Ok(SignedOperation::Cancel(CancelBody {
            order_id: cancel.order_id,
            order_nonce: cancel.order_nonce,
            payload,
        }))
    }

    fn single(&self, operation: SignedOperation) -> SignedRequest {
        SignedRequest::Single {
            account_id: self.account_id,
            operation,
        }
    }

    fn batch(&self, orders: Vec<SignedOperation>) -> SignedRequest {
        SignedRequest::Batch(BatchEnvelope {
            account_id: self.account_id,
            orders,
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use secrecy::SecretString;

    use super::*;
    use crate::error::Kind;
    use crate::instrument::Instrument;
    use crate::types::{Side, TpslConfig, TpslKind};

    fn builder(signed: bool) -> RequestBuilder {
        let instruments = Instruments::new([Instrument::builder()
            .id(3)
            .symbol("SOL/USDT-P")
            .underlying_decimals(8)
            .settlement_decimals(6)
            .tick_size(dec!(0.01))
            .step_size(dec!(0.00000001))
            .build()])
        .expect("valid");
        let signer = signed.then(|| {
            Signer::from_secret(&SecretString::from("c29sLWFwaS1zZWNyZXQ=")).expect("key")
        });
        RequestBuilder::new(77, signer, instruments)
    }

    fn entry() -> CreateOrder {
        CreateOrder::builder()
            .symbol("SOL/USDT-P")
            .side(Side::Buy)
            .quantity(dec!(0.02))
            .price(dec!(150))
            .max_fees_percent(dec!(0.001))
            .build()
    }

    #[test]
    fn unsigned_builder_refuses_to_sign() {
        let err = builder(false).sign_create(entry()).unwrap_err();
        assert_eq!(err.kind(), Kind::Signing);
        let err = builder(false).sign_cancel_all().unwrap_err();
        assert_eq!(err.kind(), Kind::Signing);
    }

    #[test]
    fn caller_nonce_is_kept() {
        let mut order = entry();
        order.nonce = Some(1_234);
        let request = builder(true).sign_create(order).expect("sign");
        let SignedRequest::Single { operation, .. } = request else {
            panic!("expected single request");
        };
        assert_eq!(operation.nonce(), Some(1_234));
    }

    #[test]
    fn tpsl_expands_into_reduce_only_children() {
        let mut order = entry();
        order.tpsl = Some(
            TpslConfig::new()
                .add_take_profit(dec!(165), Some(dec!(0.005)))
                .add_stop_loss(dec!(135), None),
        );
        let request = builder(true).sign_create(order).expect("sign");
        let SignedRequest::Batch(envelope) = request else {
            panic!("expected batch");
        };
        assert_eq!(envelope.len(), 3);

        let SignedOperation::Place(parent) = &envelope.orders[0] else {
            panic!("parent is a place");
        };
        assert!(parent.parent_order.is_none(), "parent has no link");

        let children: Vec<_> = envelope.orders[1..]
            .iter()
            .map(|op| match op {
                SignedOperation::Place(body) => body,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(children[0].quantity, dec!(0.005));
        assert_eq!(children[1].quantity, dec!(0.02), "defaults to parent quantity");
        for (child, kind) in children.iter().zip([TpslKind::TakeProfit, TpslKind::StopLoss]) {
            assert_eq!(child.side, Side::Sell);
            assert_eq!(child.order_type, OrderType::Market);
            assert_eq!(child.order_flags, Some(OrderFlags::ReduceOnly));
            let link = child.parent_order.expect("link");
            assert_eq!(link.nonce, parent.nonce);
            assert_eq!(link.kind, kind);
            assert!(child.nonce > parent.nonce, "children get fresh nonces");
        }
    }

    #[test]
    fn empty_batch_is_rejected() {
        let err = builder(true).build_batch(Vec::new()).unwrap_err();
        assert_eq!(err.kind(), Kind::Validation);
    }

    #[test]
    fn batch_refuses_tpsl_legs() {
        let mut order = entry();
        order.tpsl = Some(TpslConfig::new().add_take_profit(dec!(165), None));
        let err = builder(true)
            .build_batch(vec![entry().into(), order.into()])
            .unwrap_err();
        assert_eq!(err.kind(), Kind::Validation);
        assert_eq!(err.index(), Some(1));
    }

    #[test]
    fn encoding_errors_carry_batch_index() {
        let mut bad = entry();
        bad.price = Some(dec!(150.005));
        let err = builder(true)
            .build_batch(vec![entry().into(), bad.into()])
            .unwrap_err();
        assert_eq!(err.kind(), Kind::Encoding);
        assert_eq!(err.index(), Some(1));
    }
}
