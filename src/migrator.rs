use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_catalog_tables::Migration),
            Box::new(m20240101_000002_create_user_tables::Migration),
            Box::new(m20240101_000003_create_invoice_request_tables::Migration),
            Box::new(m20240101_000004_create_invoice_tables::Migration),
        ]
    }
}

mod m20240101_000001_create_catalog_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Books::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Books::Id)
                                .big_integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Books::Isbn).string().not_null().unique_key())
                        .col(ColumnDef::new(Books::Title).string().not_null())
                        .col(ColumnDef::new(Books::Authors).string().not_null())
                        .col(ColumnDef::new(Books::Publisher).string().null())
                        .col(ColumnDef::new(Books::Description).text().null())
                        .col(ColumnDef::new(Books::Language).string().null())
                        .col(ColumnDef::new(Books::ImageUrl).string().null())
                        .col(ColumnDef::new(Books::Price).decimal().not_null())
                        .col(ColumnDef::new(Books::CurrencyCode).string().not_null())
                        .col(ColumnDef::new(Books::Stock).integer().not_null().default(0))
                        .col(ColumnDef::new(Books::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Books::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categories::Id)
                                .big_integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Categories::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Categories::Status).string().not_null())
                        .col(ColumnDef::new(Categories::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(BookCategories::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(BookCategories::BookId).big_integer().not_null())
                        .col(
                            ColumnDef::new(BookCategories::CategoryId)
                                .big_integer()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .col(BookCategories::BookId)
                                .col(BookCategories::CategoryId),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_books_isbn")
                        .table(Books::Table)
                        .col(Books::Isbn)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(BookCategories::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Books::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Books {
        Table,
        Id,
        Isbn,
        Title,
        Authors,
        Publisher,
        Description,
        Language,
        ImageUrl,
        Price,
        CurrencyCode,
        Stock,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Categories {
        Table,
        Id,
        Name,
        Status,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum BookCategories {
        Table,
        BookId,
        CategoryId,
    }
}

mod m20240101_000002_create_user_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_user_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(AppUsers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(AppUsers::Id)
                                .big_integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(AppUsers::Name).string().not_null())
                        .col(ColumnDef::new(AppUsers::LastName).string().not_null())
                        .col(
                            ColumnDef::new(AppUsers::Email)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(AppUsers::PasswordHash).string().not_null())
                        .col(ColumnDef::new(AppUsers::DateCreated).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(AppUserRoles::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(AppUserRoles::Id)
                                .big_integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(AppUserRoles::Description)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(UserRoles::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(UserRoles::UserId).big_integer().not_null())
                        .col(ColumnDef::new(UserRoles::RoleId).big_integer().not_null())
                        .primary_key(
                            Index::create().col(UserRoles::UserId).col(UserRoles::RoleId),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(UserRoles::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(AppUserRoles::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(AppUsers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum AppUsers {
        Table,
        Id,
        Name,
        LastName,
        Email,
        PasswordHash,
        DateCreated,
    }

    #[derive(DeriveIden)]
    enum AppUserRoles {
        Table,
        Id,
        Description,
    }

    #[derive(DeriveIden)]
    enum UserRoles {
        Table,
        UserId,
        RoleId,
    }
}

mod m20240101_000003_create_invoice_request_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_invoice_request_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InvoiceRequests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InvoiceRequests::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InvoiceRequests::UserId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InvoiceRequests::DateCreated)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InvoiceRequests::Address).json().not_null())
                        .col(
                            ColumnDef::new(InvoiceRequests::ShippingMethod)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InvoiceRequests::PaymentMethod)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InvoiceRequests::Subtotal).decimal().not_null())
                        .col(ColumnDef::new(InvoiceRequests::Tax).decimal().not_null())
                        .col(ColumnDef::new(InvoiceRequests::Shipping).decimal().not_null())
                        .col(ColumnDef::new(InvoiceRequests::Total).decimal().not_null())
                        .col(ColumnDef::new(InvoiceRequests::Status).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InvoiceRequestItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InvoiceRequestItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InvoiceRequestItems::RequestId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InvoiceRequestItems::BookId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InvoiceRequestItems::Title).string().not_null())
                        .col(
                            ColumnDef::new(InvoiceRequestItems::UnitPrice)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InvoiceRequestItems::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_invoice_request_items_request_id")
                        .table(InvoiceRequestItems::Table)
                        .col(InvoiceRequestItems::RequestId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InvoiceRequestItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(InvoiceRequests::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum InvoiceRequests {
        Table,
        Id,
        UserId,
        DateCreated,
        Address,
        ShippingMethod,
        PaymentMethod,
        Subtotal,
        Tax,
        Shipping,
        Total,
        Status,
    }

    #[derive(DeriveIden)]
    enum InvoiceRequestItems {
        Table,
        Id,
        RequestId,
        BookId,
        Title,
        UnitPrice,
        Quantity,
    }
}

mod m20240101_000004_create_invoice_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_invoice_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Invoices::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Invoices::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Invoices::UserId).big_integer().not_null())
                        .col(ColumnDef::new(Invoices::DateCreated).timestamp().not_null())
                        .col(ColumnDef::new(Invoices::Subtotal).decimal().not_null())
                        .col(ColumnDef::new(Invoices::Tax).decimal().not_null())
                        .col(ColumnDef::new(Invoices::Shipping).decimal().not_null())
                        .col(ColumnDef::new(Invoices::Total).decimal().not_null())
                        .col(ColumnDef::new(Invoices::DocumentType).string().null())
                        .col(ColumnDef::new(Invoices::DocumentNumber).string().null())
                        .col(ColumnDef::new(Invoices::Bank).string().null())
                        .col(ColumnDef::new(Invoices::AccountNumber).string().null())
                        .col(ColumnDef::new(Invoices::CardHolder).string().null())
                        .col(ColumnDef::new(Invoices::CardNumber).string().null())
                        .col(ColumnDef::new(Invoices::ExpirationDate).string().null())
                        .col(ColumnDef::new(Invoices::Deadline).string().null())
                        .col(ColumnDef::new(Invoices::Notes).string().null())
                        .col(ColumnDef::new(Invoices::Address).json().not_null())
                        .col(ColumnDef::new(Invoices::ShippingMethod).string().not_null())
                        .col(ColumnDef::new(Invoices::PaymentMethod).string().not_null())
                        .col(
                            ColumnDef::new(Invoices::Paid)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Invoices::PaymentStatus).string().not_null())
                        .col(
                            ColumnDef::new(Invoices::PreferenceId)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Invoices::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InvoiceItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InvoiceItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InvoiceItems::InvoiceId).uuid().not_null())
                        .col(ColumnDef::new(InvoiceItems::BookId).big_integer().not_null())
                        .col(ColumnDef::new(InvoiceItems::Title).string().not_null())
                        .col(ColumnDef::new(InvoiceItems::UnitPrice).decimal().not_null())
                        .col(ColumnDef::new(InvoiceItems::Quantity).integer().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_invoices_user_id")
                        .table(Invoices::Table)
                        .col(Invoices::UserId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_invoices_preference_id")
                        .table(Invoices::Table)
                        .col(Invoices::PreferenceId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_invoice_items_invoice_id")
                        .table(InvoiceItems::Table)
                        .col(InvoiceItems::InvoiceId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_invoice_items_book_id")
                        .table(InvoiceItems::Table)
                        .col(InvoiceItems::BookId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InvoiceItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Invoices::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Invoices {
        Table,
        Id,
        UserId,
        DateCreated,
        Subtotal,
        Tax,
        Shipping,
        Total,
        DocumentType,
        DocumentNumber,
        Bank,
        AccountNumber,
        CardHolder,
        CardNumber,
        ExpirationDate,
        Deadline,
        Notes,
        Address,
        ShippingMethod,
        PaymentMethod,
        Paid,
        PaymentStatus,
        PreferenceId,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum InvoiceItems {
        Table,
        Id,
        InvoiceId,
        BookId,
        Title,
        UnitPrice,
        Quantity,
    }
}
