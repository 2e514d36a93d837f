use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, LoaderTrait, ModelTrait, NotSet, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{
        book::{self, Entity as Book},
        book_category::{self, Entity as BookCategory},
        category::{self, Entity as Category},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    Page,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateBookRequest {
    #[validate(length(min = 10, max = 13, message = "ISBN must be 10 to 13 characters"))]
    pub isbn: String,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Authors are required"))]
    pub authors: String,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub image_url: Option<String>,
    pub price: Decimal,
    #[validate(length(min = 3, max = 3, message = "Currency must be 3 characters"))]
    pub currency_code: String,
    #[validate(range(min = 0))]
    pub stock: i32,
    pub category_ids: Vec<i64>,
}

/// Partial update: each field is independently present or absent. Absent
/// fields keep their stored value; there is no merge-by-reflection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BookPatch {
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub authors: Option<String>,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<Decimal>,
    pub currency_code: Option<String>,
    pub stock: Option<i32>,
    pub category_ids: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookResponse {
    pub id: i64,
    pub isbn: String,
    pub title: String,
    pub authors: String,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub image_url: Option<String>,
    pub price: Decimal,
    pub currency_code: String,
    pub stock: i32,
    pub categories: Vec<CategoryRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Catalog store: CRUD over books and their category assignments.
#[derive(Clone)]
pub struct BookService {
    db: Arc<DbPool>,
    events: EventSender,
}

impl BookService {
    pub fn new(db: Arc<DbPool>, events: EventSender) -> Self {
        Self { db, events }
    }

    #[instrument(skip(self, request), fields(isbn = %request.isbn))]
    pub async fn create_book(
        &self,
        request: CreateBookRequest,
    ) -> Result<BookResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db;

        self.ensure_categories_exist(&request.category_ids).await?;

        let isbn_taken = Book::find()
            .filter(book::Column::Isbn.eq(request.isbn.clone()))
            .count(db)
            .await?
            > 0;
        if isbn_taken {
            return Err(ServiceError::Conflict(format!(
                "Book with ISBN {} already exists",
                request.isbn
            )));
        }

        let now = Utc::now();
        let txn = db.begin().await?;

        let saved = book::ActiveModel {
            id: NotSet,
            isbn: Set(request.isbn),
            title: Set(request.title),
            authors: Set(request.authors),
            publisher: Set(request.publisher),
            description: Set(request.description),
            language: Set(request.language),
            image_url: Set(request.image_url),
            price: Set(request.price),
            currency_code: Set(request.currency_code),
            stock: Set(request.stock),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await?;

        for category_id in &request.category_ids {
            book_category::ActiveModel {
                book_id: Set(saved.id),
                category_id: Set(*category_id),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        info!(book_id = saved.id, "book created");
        self.events.send(Event::BookCreated(saved.id)).await;

        self.get_book(saved.id).await
    }

    #[instrument(skip(self, request), fields(book_id = %id))]
    pub async fn update_book(
        &self,
        id: i64,
        request: CreateBookRequest,
    ) -> Result<BookResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db;

        let existing = Book::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Book with ID {id} not found")))?;

        self.ensure_isbn_free(&request.isbn, id).await?;
        self.ensure_categories_exist(&request.category_ids).await?;

        let txn = db.begin().await?;

        let mut model: book::ActiveModel = existing.into();
        model.isbn = Set(request.isbn);
        model.title = Set(request.title);
        model.authors = Set(request.authors);
        model.publisher = Set(request.publisher);
        model.description = Set(request.description);
        model.language = Set(request.language);
        model.image_url = Set(request.image_url);
        model.price = Set(request.price);
        model.currency_code = Set(request.currency_code);
        model.stock = Set(request.stock);
        model.updated_at = Set(Some(Utc::now()));
        model.update(&txn).await?;

        Self::replace_categories(&txn, id, &request.category_ids).await?;

        txn.commit().await?;

        self.get_book(id).await
    }

    /// Applies only the fields present in the patch.
    #[instrument(skip(self, patch), fields(book_id = %id))]
    pub async fn patch_book(&self, id: i64, patch: BookPatch) -> Result<BookResponse, ServiceError> {
        let db = &*self.db;

        let existing = Book::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Book with ID {id} not found")))?;

        if let Some(isbn) = &patch.isbn {
            self.ensure_isbn_free(isbn, id).await?;
        }
        if let Some(category_ids) = &patch.category_ids {
            self.ensure_categories_exist(category_ids).await?;
        }

        let txn = db.begin().await?;

        let mut model: book::ActiveModel = existing.into();
        if let Some(isbn) = patch.isbn {
            model.isbn = Set(isbn);
        }
        if let Some(title) = patch.title {
            model.title = Set(title);
        }
        if let Some(authors) = patch.authors {
            model.authors = Set(authors);
        }
        if let Some(publisher) = patch.publisher {
            model.publisher = Set(Some(publisher));
        }
        if let Some(description) = patch.description {
            model.description = Set(Some(description));
        }
        if let Some(language) = patch.language {
            model.language = Set(Some(language));
        }
        if let Some(image_url) = patch.image_url {
            model.image_url = Set(Some(image_url));
        }
        if let Some(price) = patch.price {
            model.price = Set(price);
        }
        if let Some(currency_code) = patch.currency_code {
            model.currency_code = Set(currency_code);
        }
        if let Some(stock) = patch.stock {
            model.stock = Set(stock);
        }
        model.updated_at = Set(Some(Utc::now()));
        model.update(&txn).await?;

        if let Some(category_ids) = patch.category_ids {
            Self::replace_categories(&txn, id, &category_ids).await?;
        }

        txn.commit().await?;

        self.get_book(id).await
    }

    #[instrument(skip(self), fields(book_id = %id))]
    pub async fn get_book(&self, id: i64) -> Result<BookResponse, ServiceError> {
        let db = &*self.db;

        let model = Book::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Book with ID {id} not found")))?;

        let categories = model.find_related(Category).all(db).await?;
        Ok(Self::to_response(model, categories))
    }

    /// Paginated listing; an empty page is a valid result.
    #[instrument(skip(self))]
    pub async fn list_books(&self, page: u64, size: u64) -> Result<Page<BookResponse>, ServiceError> {
        super::check_pagination(page, size)?;

        let db = &*self.db;

        let paginator = Book::find()
            .order_by_asc(book::Column::Id)
            .paginate(db, size);

        let total_items = paginator.num_items().await?;
        let books = paginator.fetch_page(page - 1).await?;

        let categories = books
            .load_many_to_many(Category, BookCategory, db)
            .await?;

        let items = books
            .into_iter()
            .zip(categories)
            .map(|(model, cats)| Self::to_response(model, cats))
            .collect();

        Ok(Page::new(items, total_items, page, size))
    }

    #[instrument(skip(self), fields(book_id = %id))]
    pub async fn delete_book(&self, id: i64) -> Result<(), ServiceError> {
        let db = &*self.db;

        let existing = Book::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Book with ID {id} not found")))?;

        let txn = db.begin().await?;
        BookCategory::delete_many()
            .filter(book_category::Column::BookId.eq(id))
            .exec(&txn)
            .await?;
        book::Entity::delete_by_id(existing.id).exec(&txn).await?;
        txn.commit().await?;

        info!(book_id = id, "book deleted");
        self.events.send(Event::BookDeleted(id)).await;
        Ok(())
    }

    async fn ensure_categories_exist(&self, category_ids: &[i64]) -> Result<(), ServiceError> {
        for category_id in category_ids {
            let exists = Category::find_by_id(*category_id)
                .count(&*self.db)
                .await?
                > 0;
            if !exists {
                return Err(ServiceError::ValidationError(format!(
                    "Category with ID {category_id} does not exist"
                )));
            }
        }
        Ok(())
    }

    async fn ensure_isbn_free(&self, isbn: &str, current_id: i64) -> Result<(), ServiceError> {
        let taken = Book::find()
            .filter(book::Column::Isbn.eq(isbn))
            .filter(book::Column::Id.ne(current_id))
            .count(&*self.db)
            .await?
            > 0;
        if taken {
            return Err(ServiceError::Conflict(format!(
                "Book with ISBN {isbn} already exists"
            )));
        }
        Ok(())
    }

    async fn replace_categories(
        txn: &sea_orm::DatabaseTransaction,
        book_id: i64,
        category_ids: &[i64],
    ) -> Result<(), ServiceError> {
        BookCategory::delete_many()
            .filter(book_category::Column::BookId.eq(book_id))
            .exec(txn)
            .await?;
        for category_id in category_ids {
            book_category::ActiveModel {
                book_id: Set(book_id),
                category_id: Set(*category_id),
            }
            .insert(txn)
            .await?;
        }
        Ok(())
    }

    fn to_response(model: book::Model, categories: Vec<category::Model>) -> BookResponse {
        BookResponse {
            id: model.id,
            isbn: model.isbn,
            title: model.title,
            authors: model.authors,
            publisher: model.publisher,
            description: model.description,
            language: model.language,
            image_url: model.image_url,
            price: model.price,
            currency_code: model.currency_code,
            stock: model.stock,
            categories: categories
                .into_iter()
                .map(|c| CategoryRef {
                    id: c.id,
                    name: c.name,
                })
                .collect(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn valid_request() -> CreateBookRequest {
        CreateBookRequest {
            isbn: "9780132350884".to_string(),
            title: "Clean Code".to_string(),
            authors: "Robert C. Martin".to_string(),
            publisher: None,
            description: None,
            language: Some("en".to_string()),
            image_url: None,
            price: dec!(39.99),
            currency_code: "USD".to_string(),
            stock: 10,
            category_ids: vec![],
        }
    }

    #[test]
    fn create_request_validates() {
        assert!(valid_request().validate().is_ok());

        let mut bad_isbn = valid_request();
        bad_isbn.isbn = "123".to_string();
        assert!(bad_isbn.validate().is_err());

        let mut bad_currency = valid_request();
        bad_currency.currency_code = "US".to_string();
        assert!(bad_currency.validate().is_err());

        let mut negative_stock = valid_request();
        negative_stock.stock = -1;
        assert!(negative_stock.validate().is_err());
    }
}
