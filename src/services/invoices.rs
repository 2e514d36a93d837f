use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{
        app_user::Entity as AppUser,
        book::Entity as Book,
        invoice::{self, Address, Entity as Invoice, InvoiceStatus, ShippingMethod},
        invoice_item::{self, Entity as InvoiceItem},
        invoice_request::{self, Entity as InvoiceRequest, RequestStatus},
        invoice_request_item::{self, Entity as InvoiceRequestItem},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::payments::{PaymentEvent, PaymentOutcome, PaymentService},
    Page,
};

/// One line of a checkout submission.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderItemRequest {
    pub book_id: i64,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

/// Checkout submission: the cart plus shipping and payment selections.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    pub user_id: i64,
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    #[validate]
    pub items: Vec<OrderItemRequest>,
    pub address: Address,
    pub shipping_method: ShippingMethod,
    #[validate(length(min = 1, message = "Payment method is required"))]
    pub payment_method: String,
}

/// Billing details attached when a payment session is opened. Opaque
/// strings; never validated for PCI correctness here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BillingDetails {
    pub document_type: Option<String>,
    pub document_number: Option<String>,
    pub bank: Option<String>,
    pub account_number: Option<String>,
    pub card_holder: Option<String>,
    pub card_number: Option<String>,
    pub expiration_date: Option<String>,
    pub deadline: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub book_id: i64,
    pub title: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: i64,
    pub date_created: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
    pub address: Address,
    pub shipping_method: ShippingMethod,
    pub payment_method: String,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub status: RequestStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvoiceSummary {
    pub id: Uuid,
    pub user_id: i64,
    pub date_created: DateTime<Utc>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub paid: bool,
    pub payment_status: InvoiceStatus,
    pub preference_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvoiceResponse {
    #[serde(flatten)]
    pub summary: InvoiceSummary,
    pub address: Address,
    pub shipping_method: ShippingMethod,
    pub payment_method: String,
    pub items: Vec<OrderItemResponse>,
}

/// Priced totals for a cart. Total is computed once here and never
/// recomputed after the invoice exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

/// Prices a cart: subtotal from snapshotted unit prices, tax as a flat
/// rate on the subtotal, shipping free for pickup.
pub fn price_order(
    lines: &[(Decimal, i32)],
    tax_rate: Decimal,
    shipping_fee: Decimal,
    method: ShippingMethod,
) -> OrderTotals {
    let subtotal: Decimal = lines
        .iter()
        .map(|(unit_price, qty)| unit_price * Decimal::from(*qty))
        .sum();
    let tax = (subtotal * tax_rate).round_dp(2);
    let shipping = match method {
        ShippingMethod::PickUp => Decimal::ZERO,
        ShippingMethod::CarrierDelivery => shipping_fee,
    };
    OrderTotals {
        subtotal,
        tax,
        shipping,
        total: subtotal + tax + shipping,
    }
}

fn new_preference_id(invoice_id: Uuid) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect();
    format!("{}-{}", invoice_id.simple(), suffix)
}

/// Order lifecycle: turns a validated cart into a priced request, opens a
/// payment session producing the immutable invoice, and serves reads over
/// historical invoices.
#[derive(Clone)]
pub struct InvoiceService {
    db: Arc<DbPool>,
    events: EventSender,
    payments: Arc<PaymentService>,
    tax_rate: Decimal,
    shipping_fee: Decimal,
}

impl InvoiceService {
    pub fn new(
        db: Arc<DbPool>,
        events: EventSender,
        payments: Arc<PaymentService>,
        tax_rate: Decimal,
        shipping_fee: Decimal,
    ) -> Self {
        Self {
            db,
            events,
            payments,
            tax_rate,
            shipping_fee,
        }
    }

    /// Persists a checkout submission after validating every referenced
    /// book and the requesting user against the stores.
    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db;

        AppUser::find_by_id(request.user_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "User with ID {} does not exist",
                    request.user_id
                ))
            })?;

        // Snapshot title and unit price per line before pricing.
        let mut snapshots = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let book = Book::find_by_id(item.book_id).one(db).await?.ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Book with ID {} does not exist",
                    item.book_id
                ))
            })?;
            snapshots.push((book, item.quantity));
        }

        let lines: Vec<(Decimal, i32)> = snapshots
            .iter()
            .map(|(book, qty)| (book.price, *qty))
            .collect();
        let totals = price_order(&lines, self.tax_rate, self.shipping_fee, request.shipping_method);

        let request_id = Uuid::new_v4();
        let now = Utc::now();

        let txn = db.begin().await?;

        invoice_request::ActiveModel {
            id: Set(request_id),
            user_id: Set(request.user_id),
            date_created: Set(now),
            address: Set(request.address.clone()),
            shipping_method: Set(request.shipping_method),
            payment_method: Set(request.payment_method.clone()),
            subtotal: Set(totals.subtotal),
            tax: Set(totals.tax),
            shipping: Set(totals.shipping),
            total: Set(totals.total),
            status: Set(RequestStatus::Open),
        }
        .insert(&txn)
        .await?;

        let mut item_responses = Vec::with_capacity(snapshots.len());
        for (book, quantity) in &snapshots {
            invoice_request_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                request_id: Set(request_id),
                book_id: Set(book.id),
                title: Set(book.title.clone()),
                unit_price: Set(book.price),
                quantity: Set(*quantity),
            }
            .insert(&txn)
            .await?;

            item_responses.push(OrderItemResponse {
                book_id: book.id,
                title: book.title.clone(),
                unit_price: book.price,
                quantity: *quantity,
            });
        }

        txn.commit().await?;

        info!(%request_id, total = %totals.total, "order placed");
        self.events
            .send(Event::OrderPlaced {
                request_id,
                user_id: request.user_id,
            })
            .await;

        Ok(OrderResponse {
            id: request_id,
            user_id: request.user_id,
            date_created: now,
            items: item_responses,
            address: request.address,
            shipping_method: request.shipping_method,
            payment_method: request.payment_method,
            subtotal: totals.subtotal,
            tax: totals.tax,
            shipping: totals.shipping,
            total: totals.total,
            status: RequestStatus::Open,
        })
    }

    /// Opens a payment session for an order: produces the invoice record
    /// with a fresh preference id and consumes the request. A request can
    /// back at most one invoice.
    #[instrument(skip(self, billing), fields(request_id = %request_id))]
    pub async fn begin_payment(
        &self,
        request_id: Uuid,
        billing: BillingDetails,
    ) -> Result<InvoiceResponse, ServiceError> {
        let db = &*self.db;

        let request = InvoiceRequest::find_by_id(request_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order request {request_id} not found"))
            })?;

        if request.status == RequestStatus::Consumed {
            return Err(ServiceError::Conflict(format!(
                "Order request {request_id} already has an invoice"
            )));
        }

        let items = InvoiceRequestItem::find()
            .filter(invoice_request_item::Column::RequestId.eq(request_id))
            .all(db)
            .await?;

        let invoice_id = Uuid::new_v4();
        let preference_id = new_preference_id(invoice_id);
        let now = Utc::now();

        let txn = db.begin().await?;

        // Guarded consume; losing the race means another session already
        // produced the invoice.
        let consumed = InvoiceRequest::update_many()
            .set(invoice_request::ActiveModel {
                status: Set(RequestStatus::Consumed),
                ..Default::default()
            })
            .filter(invoice_request::Column::Id.eq(request_id))
            .filter(invoice_request::Column::Status.eq(RequestStatus::Open))
            .exec(&txn)
            .await?;
        if consumed.rows_affected == 0 {
            return Err(ServiceError::Conflict(format!(
                "Order request {request_id} already has an invoice"
            )));
        }

        invoice::ActiveModel {
            id: Set(invoice_id),
            user_id: Set(request.user_id),
            date_created: Set(now),
            subtotal: Set(request.subtotal),
            tax: Set(request.tax),
            shipping: Set(request.shipping),
            total: Set(request.total),
            document_type: Set(billing.document_type),
            document_number: Set(billing.document_number),
            bank: Set(billing.bank),
            account_number: Set(billing.account_number),
            card_holder: Set(billing.card_holder),
            card_number: Set(billing.card_number),
            expiration_date: Set(billing.expiration_date),
            deadline: Set(billing.deadline),
            notes: Set(billing.notes),
            address: Set(request.address.clone()),
            shipping_method: Set(request.shipping_method),
            payment_method: Set(request.payment_method.clone()),
            paid: Set(false),
            payment_status: Set(InvoiceStatus::Pending),
            preference_id: Set(preference_id.clone()),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut item_responses = Vec::with_capacity(items.len());
        for item in &items {
            invoice_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                invoice_id: Set(invoice_id),
                book_id: Set(item.book_id),
                title: Set(item.title.clone()),
                unit_price: Set(item.unit_price),
                quantity: Set(item.quantity),
            }
            .insert(&txn)
            .await?;

            item_responses.push(OrderItemResponse {
                book_id: item.book_id,
                title: item.title.clone(),
                unit_price: item.unit_price,
                quantity: item.quantity,
            });
        }

        txn.commit().await?;

        info!(%invoice_id, %preference_id, "payment session opened");
        self.events
            .send(Event::PaymentSessionCreated {
                invoice_id,
                preference_id: preference_id.clone(),
            })
            .await;

        Ok(InvoiceResponse {
            summary: InvoiceSummary {
                id: invoice_id,
                user_id: request.user_id,
                date_created: now,
                subtotal: request.subtotal,
                tax: request.tax,
                shipping: request.shipping,
                total: request.total,
                paid: false,
                payment_status: InvoiceStatus::Pending,
                preference_id,
            },
            address: request.address,
            shipping_method: request.shipping_method,
            payment_method: request.payment_method,
            items: item_responses,
        })
    }

    /// Applies a payment confirmation to the invoice. Delegates to the
    /// reconciliation service, which enforces exactly-once settlement.
    #[instrument(skip(self, event), fields(invoice_id = %invoice_id))]
    pub async fn process_payment(
        &self,
        invoice_id: Uuid,
        event: PaymentEvent,
    ) -> Result<PaymentOutcome, ServiceError> {
        self.payments.reconcile(invoice_id, event).await
    }

    pub async fn get_order(&self, request_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db;

        let request = InvoiceRequest::find_by_id(request_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order request {request_id} not found"))
            })?;

        let items = InvoiceRequestItem::find()
            .filter(invoice_request_item::Column::RequestId.eq(request_id))
            .all(db)
            .await?;

        Ok(OrderResponse {
            id: request.id,
            user_id: request.user_id,
            date_created: request.date_created,
            items: items
                .into_iter()
                .map(|i| OrderItemResponse {
                    book_id: i.book_id,
                    title: i.title,
                    unit_price: i.unit_price,
                    quantity: i.quantity,
                })
                .collect(),
            address: request.address,
            shipping_method: request.shipping_method,
            payment_method: request.payment_method,
            subtotal: request.subtotal,
            tax: request.tax,
            shipping: request.shipping,
            total: request.total,
            status: request.status,
        })
    }

    pub async fn get_invoice(&self, invoice_id: Uuid) -> Result<InvoiceResponse, ServiceError> {
        let db = &*self.db;

        let invoice = Invoice::find_by_id(invoice_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Invoice with ID {invoice_id} not found"))
            })?;

        let items = InvoiceItem::find()
            .filter(invoice_item::Column::InvoiceId.eq(invoice_id))
            .all(db)
            .await?;

        Ok(Self::to_response(invoice, items))
    }

    /// Paginated listing, newest first. Empty pages are data, not errors.
    #[instrument(skip(self))]
    pub async fn list_invoices(
        &self,
        page: u64,
        size: u64,
    ) -> Result<Page<InvoiceSummary>, ServiceError> {
        super::check_pagination(page, size)?;

        let paginator = Invoice::find()
            .order_by_desc(invoice::Column::DateCreated)
            .paginate(&*self.db, size);

        let total_items = paginator.num_items().await?;
        let invoices = paginator.fetch_page(page - 1).await?;

        Ok(Page::new(
            invoices.into_iter().map(Self::to_summary).collect(),
            total_items,
            page,
            size,
        ))
    }

    #[instrument(skip(self))]
    pub async fn list_invoices_by_user(
        &self,
        user_id: i64,
        page: u64,
        size: u64,
    ) -> Result<Page<InvoiceSummary>, ServiceError> {
        super::check_pagination(page, size)?;

        let paginator = Invoice::find()
            .filter(invoice::Column::UserId.eq(user_id))
            .order_by_desc(invoice::Column::DateCreated)
            .paginate(&*self.db, size);

        let total_items = paginator.num_items().await?;
        let invoices = paginator.fetch_page(page - 1).await?;

        Ok(Page::new(
            invoices.into_iter().map(Self::to_summary).collect(),
            total_items,
            page,
            size,
        ))
    }

    fn to_summary(model: invoice::Model) -> InvoiceSummary {
        InvoiceSummary {
            id: model.id,
            user_id: model.user_id,
            date_created: model.date_created,
            subtotal: model.subtotal,
            tax: model.tax,
            shipping: model.shipping,
            total: model.total,
            paid: model.paid,
            payment_status: model.payment_status,
            preference_id: model.preference_id,
        }
    }

    fn to_response(model: invoice::Model, items: Vec<invoice_item::Model>) -> InvoiceResponse {
        let address = model.address.clone();
        let shipping_method = model.shipping_method;
        let payment_method = model.payment_method.clone();
        InvoiceResponse {
            summary: Self::to_summary(model),
            address,
            shipping_method,
            payment_method,
            items: items
                .into_iter()
                .map(|i| OrderItemResponse {
                    book_id: i.book_id,
                    title: i.title,
                    unit_price: i.unit_price,
                    quantity: i.quantity,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn subtotal_and_total_identity() {
        // book A qty 2 @ $10, book B qty 1 @ $5
        let totals = price_order(
            &[(dec!(10.00), 2), (dec!(5.00), 1)],
            dec!(0.21),
            dec!(5.00),
            ShippingMethod::CarrierDelivery,
        );
        assert_eq!(totals.subtotal, dec!(25.00));
        assert_eq!(totals.tax, dec!(5.25));
        assert_eq!(totals.shipping, dec!(5.00));
        assert_eq!(totals.total, totals.subtotal + totals.tax + totals.shipping);
    }

    #[test]
    fn pickup_ships_free() {
        let totals = price_order(
            &[(dec!(12.50), 1)],
            dec!(0.21),
            dec!(5.00),
            ShippingMethod::PickUp,
        );
        assert_eq!(totals.shipping, Decimal::ZERO);
        assert_eq!(totals.total, dec!(12.50) + totals.tax);
    }

    #[test]
    fn tax_rounds_to_cents() {
        let totals = price_order(
            &[(dec!(0.99), 3)],
            dec!(0.21),
            dec!(5.00),
            ShippingMethod::PickUp,
        );
        assert_eq!(totals.subtotal, dec!(2.97));
        assert_eq!(totals.tax, dec!(0.62));
    }

    #[test]
    fn empty_cart_prices_to_zero() {
        let totals = price_order(&[], dec!(0.21), dec!(5.00), ShippingMethod::PickUp);
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn preference_ids_are_unique_per_invoice() {
        let id = Uuid::new_v4();
        let a = new_preference_id(id);
        let b = new_preference_id(id);
        assert_ne!(a, b);
        assert!(a.starts_with(&id.simple().to_string()));
    }

    #[test]
    fn empty_item_list_fails_validation() {
        let request = CreateOrderRequest {
            user_id: 1,
            items: vec![],
            address: Address::default(),
            shipping_method: ShippingMethod::PickUp,
            payment_method: "card".to_string(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn zero_quantity_fails_validation() {
        let request = CreateOrderRequest {
            user_id: 1,
            items: vec![OrderItemRequest {
                book_id: 1,
                quantity: 0,
            }],
            address: Address::default(),
            shipping_method: ShippingMethod::PickUp,
            payment_method: "card".to_string(),
        };
        assert!(request.validate().is_err());
    }
}
