use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::entities::invoice::{Address, InvoiceStatus, ShippingMethod};
use crate::entities::invoice_request::RequestStatus;
use crate::handlers;
use crate::services::{
    books::{BookPatch, BookResponse, CategoryRef, CreateBookRequest},
    categories::{CategoryResponse, CreateCategoryRequest},
    invoices::{
        BillingDetails, CreateOrderRequest, InvoiceResponse, InvoiceSummary, OrderItemRequest,
        OrderItemResponse, OrderResponse,
    },
    payments::{PaymentEvent, PaymentOutcome},
    reports::{BestSellerRow, CategorySalesRow, MonthlySalesRow},
    storage::StoredObject,
    users::{LoginRequest, LoginResponse, RegisterRequest, UserResponse},
};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Librera API",
        description = "Online bookstore backend: catalog, accounts, checkout, invoicing, payment reconciliation and sales reporting."
    ),
    paths(
        handlers::health::liveness_check,
        handlers::health::readiness_check,
        handlers::books::list_books,
        handlers::books::get_book,
        handlers::books::create_book,
        handlers::books::update_book,
        handlers::books::patch_book,
        handlers::books::delete_book,
        handlers::categories::list_categories,
        handlers::categories::get_category,
        handlers::categories::create_category,
        handlers::categories::delete_category,
        handlers::users::register,
        handlers::users::login,
        handlers::users::me,
        handlers::users::get_user,
        handlers::users::list_user_invoices,
        handlers::orders::create_order,
        handlers::orders::get_order,
        handlers::orders::begin_payment,
        handlers::invoices::list_invoices,
        handlers::invoices::get_invoice,
        handlers::payments::payment_webhook,
        handlers::payments::confirm_payment,
        handlers::reports::best_sellers,
        handlers::reports::monthly_sales,
        handlers::reports::category_sales,
        handlers::reports::summary,
        handlers::storage::upload_file,
        handlers::storage::delete_file,
    ),
    components(schemas(
        Address,
        ShippingMethod,
        InvoiceStatus,
        RequestStatus,
        CreateBookRequest,
        BookPatch,
        BookResponse,
        CategoryRef,
        CreateCategoryRequest,
        CategoryResponse,
        CreateOrderRequest,
        OrderItemRequest,
        OrderItemResponse,
        OrderResponse,
        BillingDetails,
        InvoiceSummary,
        InvoiceResponse,
        PaymentEvent,
        PaymentOutcome,
        BestSellerRow,
        MonthlySalesRow,
        CategorySalesRow,
        handlers::reports::SalesSummary,
        StoredObject,
        RegisterRequest,
        LoginRequest,
        LoginResponse,
        UserResponse,
        crate::errors::ErrorResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Books", description = "Catalog books"),
        (name = "Categories", description = "Catalog categories"),
        (name = "Users", description = "Accounts and authentication"),
        (name = "Orders", description = "Checkout and order requests"),
        (name = "Invoices", description = "Issued invoices"),
        (name = "Payments", description = "Payment confirmations"),
        (name = "Reports", description = "Sales statistics"),
        (name = "Files", description = "Binary asset storage"),
    )
)]
pub struct ApiDoc;

pub fn api_doc() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
