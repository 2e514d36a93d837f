use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, NotSet, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{
        book_category::{self, Entity as BookCategory},
        category::{self, Entity as Category},
    },
    errors::ServiceError,
    Page,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
    pub status: String,
}

/// Catalog category store.
#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DbPool>,
}

impl CategoryService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_category(
        &self,
        request: CreateCategoryRequest,
    ) -> Result<CategoryResponse, ServiceError> {
        request.validate()?;

        let taken = Category::find()
            .filter(category::Column::Name.eq(request.name.clone()))
            .count(&*self.db)
            .await?
            > 0;
        if taken {
            return Err(ServiceError::Conflict(format!(
                "Category '{}' already exists",
                request.name
            )));
        }

        let saved = category::ActiveModel {
            id: NotSet,
            name: Set(request.name),
            status: Set("active".to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;

        info!(category_id = saved.id, "category created");
        Ok(Self::to_response(saved))
    }

    pub async fn get_category(&self, id: i64) -> Result<CategoryResponse, ServiceError> {
        Category::find_by_id(id)
            .one(&*self.db)
            .await?
            .map(Self::to_response)
            .ok_or_else(|| ServiceError::NotFound(format!("Category with ID {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn list_categories(
        &self,
        page: u64,
        size: u64,
    ) -> Result<Page<CategoryResponse>, ServiceError> {
        super::check_pagination(page, size)?;

        let paginator = Category::find()
            .order_by_asc(category::Column::Name)
            .paginate(&*self.db, size);

        let total_items = paginator.num_items().await?;
        let categories = paginator.fetch_page(page - 1).await?;

        Ok(Page::new(
            categories.into_iter().map(Self::to_response).collect(),
            total_items,
            page,
            size,
        ))
    }

    /// Deleting a category detaches it from its books first.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn delete_category(&self, id: i64) -> Result<(), ServiceError> {
        let existing = Category::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category with ID {id} not found")))?;

        BookCategory::delete_many()
            .filter(book_category::Column::CategoryId.eq(id))
            .exec(&*self.db)
            .await?;
        Category::delete_by_id(existing.id).exec(&*self.db).await?;

        info!(category_id = id, "category deleted");
        Ok(())
    }

    fn to_response(model: category::Model) -> CategoryResponse {
        CategoryResponse {
            id: model.id,
            name: model.name,
            status: model.status,
        }
    }
}
