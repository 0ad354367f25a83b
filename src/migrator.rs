use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_master_data::Migration),
            Box::new(m20240301_000002_create_stock_documents::Migration),
            Box::new(m20240301_000003_create_stock_movements::Migration),
            Box::new(m20240301_000004_create_reorder_settings::Migration),
            Box::new(m20240301_000005_create_document_sequences::Migration),
        ]
    }
}

// Migration implementations

mod m20240301_000001_create_master_data {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_master_data"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Items::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Items::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Items::Sku).string().not_null())
                        .col(ColumnDef::new(Items::Name).string().not_null())
                        .col(ColumnDef::new(Items::ItemType).string().not_null())
                        .col(ColumnDef::new(Items::TrackingType).string().not_null())
                        .col(ColumnDef::new(Items::UnitOfMeasure).string().not_null())
                        .col(
                            ColumnDef::new(Items::DefaultUnitCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Items::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Items::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Items::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_items_sku")
                        .table(Items::Table)
                        .col(Items::Sku)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Warehouses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Warehouses::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Warehouses::Code).string().not_null())
                        .col(ColumnDef::new(Warehouses::Name).string().not_null())
                        .col(
                            ColumnDef::new(Warehouses::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Warehouses::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Warehouses::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_warehouses_code")
                        .table(Warehouses::Table)
                        .col(Warehouses::Code)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Warehouses::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Items::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Items {
        Table,
        Id,
        Sku,
        Name,
        ItemType,
        TrackingType,
        UnitOfMeasure,
        DefaultUnitCost,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Warehouses {
        Table,
        Id,
        Code,
        Name,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000002_create_stock_documents {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_stock_documents"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockDocuments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockDocuments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockDocuments::DocumentNumber)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockDocuments::Kind).string().not_null())
                        .col(ColumnDef::new(StockDocuments::Status).string().not_null())
                        .col(
                            ColumnDef::new(StockDocuments::WarehouseId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockDocuments::DestWarehouseId).uuid().null())
                        .col(ColumnDef::new(StockDocuments::CounterpartId).uuid().null())
                        .col(ColumnDef::new(StockDocuments::Notes).string().null())
                        .col(
                            ColumnDef::new(StockDocuments::PostedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockDocuments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockDocuments::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_documents_number")
                        .table(StockDocuments::Table)
                        .col(StockDocuments::DocumentNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_documents_kind_status")
                        .table(StockDocuments::Table)
                        .col(StockDocuments::Kind)
                        .col(StockDocuments::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockDocumentLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockDocumentLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockDocumentLines::DocumentId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockDocumentLines::ItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockDocumentLines::Quantity)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockDocumentLines::UnitCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockDocumentLines::BatchNumber)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockDocumentLines::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockDocumentLines::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_document_lines_document")
                        .table(StockDocumentLines::Table)
                        .col(StockDocumentLines::DocumentId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockDocumentSerials::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockDocumentSerials::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockDocumentSerials::LineId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockDocumentSerials::SerialNumber)
                                .string()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_document_serials_line")
                        .table(StockDocumentSerials::Table)
                        .col(StockDocumentSerials::LineId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockDocumentSerials::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockDocumentLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockDocuments::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum StockDocuments {
        Table,
        Id,
        DocumentNumber,
        Kind,
        Status,
        WarehouseId,
        DestWarehouseId,
        CounterpartId,
        Notes,
        PostedAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum StockDocumentLines {
        Table,
        Id,
        DocumentId,
        ItemId,
        Quantity,
        UnitCost,
        BatchNumber,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum StockDocumentSerials {
        Table,
        Id,
        LineId,
        SerialNumber,
    }
}

mod m20240301_000003_create_stock_movements {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_stock_movements"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockMovements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::OccurredAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::MovementType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::WarehouseId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::ItemId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockMovements::Quantity)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::UnitCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockMovements::DocumentKind)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::DocumentId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::LineId).uuid().null())
                        .col(
                            ColumnDef::new(StockMovements::SerialNumber)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(StockMovements::BatchNumber).string().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_movements_warehouse_item")
                        .table(StockMovements::Table)
                        .col(StockMovements::WarehouseId)
                        .col(StockMovements::ItemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_movements_document")
                        .table(StockMovements::Table)
                        .col(StockMovements::DocumentKind)
                        .col(StockMovements::DocumentId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_movements_item_serial")
                        .table(StockMovements::Table)
                        .col(StockMovements::ItemId)
                        .col(StockMovements::SerialNumber)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockMovements::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum StockMovements {
        Table,
        Id,
        OccurredAt,
        MovementType,
        WarehouseId,
        ItemId,
        Quantity,
        UnitCost,
        DocumentKind,
        DocumentId,
        LineId,
        SerialNumber,
        BatchNumber,
    }
}

mod m20240301_000004_create_reorder_settings {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_reorder_settings"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ReorderSettings::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ReorderSettings::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReorderSettings::WarehouseId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ReorderSettings::ItemId).uuid().not_null())
                        .col(
                            ColumnDef::new(ReorderSettings::ReorderPoint)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReorderSettings::ReorderQuantity)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReorderSettings::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReorderSettings::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_reorder_settings_warehouse_item")
                        .table(ReorderSettings::Table)
                        .col(ReorderSettings::WarehouseId)
                        .col(ReorderSettings::ItemId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ReorderSettings::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum ReorderSettings {
        Table,
        Id,
        WarehouseId,
        ItemId,
        ReorderPoint,
        ReorderQuantity,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000005_create_document_sequences {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000005_create_document_sequences"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DocumentSequences::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DocumentSequences::Prefix)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DocumentSequences::CurrentValue)
                                .big_integer()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DocumentSequences::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum DocumentSequences {
        Table,
        Prefix,
        CurrentValue,
    }
}
