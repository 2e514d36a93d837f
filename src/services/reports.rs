use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Alias, Expr},
    ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, FromQueryResult, JoinType, Order, PaginatorTrait,
    QueryOrder, QuerySelect, RelationTrait, Statement,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

use crate::{
    db::DbPool,
    entities::{
        book,
        invoice::{self, Entity as Invoice},
        invoice_item::{self, Entity as InvoiceItem},
    },
    errors::ServiceError,
    Page,
};

/// One book with its accumulated sold quantity.
#[derive(Debug, Clone, Serialize, Deserialize, FromQueryResult, ToSchema)]
pub struct BestSellerRow {
    pub book_id: i64,
    pub title: String,
    pub total_quantity: i64,
}

/// Revenue and invoice count for one calendar month.
#[derive(Debug, Clone, Serialize, Deserialize, FromQueryResult, ToSchema)]
pub struct MonthlySalesRow {
    /// Year-month key, e.g. "2024-03"
    pub month: String,
    pub invoice_count: i64,
    pub total_sales: Decimal,
}

/// Sold quantity and revenue accumulated per catalog category.
#[derive(Debug, Clone, Serialize, Deserialize, FromQueryResult, ToSchema)]
pub struct CategorySalesRow {
    pub category_id: i64,
    pub category_name: String,
    pub total_quantity: i64,
    pub total_revenue: Decimal,
}

#[derive(Debug, Clone, FromQueryResult)]
struct DecimalSumRow {
    value: Option<Decimal>,
}

#[derive(Debug, Clone, FromQueryResult)]
struct IntSumRow {
    value: Option<i64>,
}

/// Read-only sales statistics over historical invoices and their items.
#[derive(Clone)]
pub struct ReportService {
    db: Arc<DbPool>,
}

impl ReportService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    fn best_sellers_query() -> sea_orm::Select<InvoiceItem> {
        InvoiceItem::find()
            .select_only()
            .column_as(invoice_item::Column::BookId, "book_id")
            .column_as(book::Column::Title, "title")
            .column_as(invoice_item::Column::Quantity.sum(), "total_quantity")
            .join(JoinType::InnerJoin, invoice_item::Relation::Book.def())
            .group_by(invoice_item::Column::BookId)
            .group_by(book::Column::Title)
            .order_by(Expr::col(Alias::new("total_quantity")), Order::Desc)
            .order_by(invoice_item::Column::BookId, Order::Asc)
    }

    /// All books ever sold, descending by quantity; ties break on book id
    /// ascending so the ordering is deterministic.
    #[instrument(skip(self))]
    pub async fn best_sellers_list(&self) -> Result<Vec<BestSellerRow>, ServiceError> {
        Ok(Self::best_sellers_query()
            .into_model::<BestSellerRow>()
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn best_sellers_page(
        &self,
        page: u64,
        size: u64,
    ) -> Result<Page<BestSellerRow>, ServiceError> {
        super::check_pagination(page, size)?;

        let paginator = Self::best_sellers_query()
            .into_model::<BestSellerRow>()
            .paginate(&*self.db, size);

        let total_items = paginator.num_items().await?;
        let rows = paginator.fetch_page(page - 1).await?;
        Ok(Page::new(rows, total_items, page, size))
    }

    /// Invoice totals grouped by calendar month of creation, ascending.
    #[instrument(skip(self))]
    pub async fn monthly_sales(
        &self,
        page: u64,
        size: u64,
    ) -> Result<Page<MonthlySalesRow>, ServiceError> {
        super::check_pagination(page, size)?;

        let backend = self.db.get_database_backend();
        let month_expr = match backend {
            DbBackend::Postgres => "to_char(date_created, 'YYYY-MM')",
            _ => "strftime('%Y-%m', date_created)",
        };
        let sql = format!(
            "SELECT {month_expr} AS month, COUNT(id) AS invoice_count, SUM(total) AS total_sales \
             FROM invoices GROUP BY month ORDER BY month ASC"
        );

        let rows = MonthlySalesRow::find_by_statement(Statement::from_string(backend, sql))
            .all(&*self.db)
            .await?;

        Ok(Page::from_all(rows, page, size))
    }

    /// Sold quantity and line revenue grouped by category. Only covers
    /// books still present in the catalog, since the join goes through
    /// the live category assignments.
    #[instrument(skip(self))]
    pub async fn sales_by_category(
        &self,
        page: u64,
        size: u64,
    ) -> Result<Page<CategorySalesRow>, ServiceError> {
        super::check_pagination(page, size)?;

        let backend = self.db.get_database_backend();
        let sql = "SELECT c.id AS category_id, c.name AS category_name, \
                   SUM(ii.quantity) AS total_quantity, \
                   SUM(ii.unit_price * ii.quantity) AS total_revenue \
                   FROM invoice_items ii \
                   JOIN book_categories bc ON bc.book_id = ii.book_id \
                   JOIN categories c ON c.id = bc.category_id \
                   GROUP BY c.id, c.name \
                   ORDER BY total_revenue DESC, c.id ASC";

        let rows =
            CategorySalesRow::find_by_statement(Statement::from_string(backend, sql.to_string()))
                .all(&*self.db)
                .await?;

        Ok(Page::from_all(rows, page, size))
    }

    /// Sum of all invoice totals; zero when no invoices exist.
    #[instrument(skip(self))]
    pub async fn total_revenue(&self) -> Result<Decimal, ServiceError> {
        let row = Invoice::find()
            .select_only()
            .column_as(invoice::Column::Total.sum(), "value")
            .into_model::<DecimalSumRow>()
            .one(&*self.db)
            .await?;
        Ok(row.and_then(|r| r.value).unwrap_or(Decimal::ZERO))
    }

    /// Mean invoice total. Guarded division: zero invoices is `NoData`,
    /// never a division by zero.
    #[instrument(skip(self))]
    pub async fn average_invoice_total(&self) -> Result<Decimal, ServiceError> {
        let count = Invoice::find().count(&*self.db).await?;
        if count == 0 {
            return Err(ServiceError::NoData(
                "no invoices to average over".to_string(),
            ));
        }
        let revenue = self.total_revenue().await?;
        Ok((revenue / Decimal::from(count)).round_dp(2))
    }

    /// Total quantity of books sold across all invoices.
    #[instrument(skip(self))]
    pub async fn total_books_sold(&self) -> Result<i64, ServiceError> {
        let row = InvoiceItem::find()
            .select_only()
            .column_as(invoice_item::Column::Quantity.sum(), "value")
            .into_model::<IntSumRow>()
            .one(&*self.db)
            .await?;
        Ok(row.and_then(|r| r.value).unwrap_or(0))
    }

    /// Mean books per invoice, `NoData` when no invoices exist.
    #[instrument(skip(self))]
    pub async fn average_books_per_invoice(&self) -> Result<Decimal, ServiceError> {
        let count = Invoice::find().count(&*self.db).await?;
        if count == 0 {
            return Err(ServiceError::NoData(
                "no invoices to average over".to_string(),
            ));
        }
        let sold = self.total_books_sold().await?;
        Ok((Decimal::from(sold) / Decimal::from(count)).round_dp(2))
    }
}
