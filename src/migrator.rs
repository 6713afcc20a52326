use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240115_000001_create_locations_table::Migration),
            Box::new(m20240115_000002_create_location_assignments_table::Migration),
            Box::new(m20240115_000003_create_stock_transfer_orders_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240115_000001_create_locations_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240115_000001_create_locations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Locations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Locations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Locations::TenantId).uuid().not_null())
                        .col(ColumnDef::new(Locations::StoreName).string().not_null())
                        .col(ColumnDef::new(Locations::RoutingCode).string().null())
                        .col(
                            ColumnDef::new(Locations::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Locations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Locations::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_locations_tenant_id")
                        .table(Locations::Table)
                        .col(Locations::TenantId)
                        .to_owned(),
                )
                .await?;

            // One display name per store per tenant
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_locations_tenant_store_name")
                        .table(Locations::Table)
                        .col(Locations::TenantId)
                        .col(Locations::StoreName)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Locations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Locations {
        Table,
        Id,
        TenantId,
        StoreName,
        RoutingCode,
        Active,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240115_000002_create_location_assignments_table {

    use sea_orm_migration::prelude::*;

    use super::m20240115_000001_create_locations_table::Locations;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240115_000002_create_location_assignments_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(LocationAssignments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(LocationAssignments::UserId)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(LocationAssignments::TenantId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(LocationAssignments::LocationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(LocationAssignments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_location_assignments_location")
                                .from(
                                    LocationAssignments::Table,
                                    LocationAssignments::LocationId,
                                )
                                .to(Locations::Table, Locations::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_location_assignments_tenant_id")
                        .table(LocationAssignments::Table)
                        .col(LocationAssignments::TenantId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(LocationAssignments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum LocationAssignments {
        Table,
        UserId,
        TenantId,
        LocationId,
        CreatedAt,
    }
}

mod m20240115_000003_create_stock_transfer_orders_table {

    use sea_orm_migration::prelude::*;

    use super::m20240115_000001_create_locations_table::Locations;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240115_000003_create_stock_transfer_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockTransferOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockTransferOrders::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferOrders::TenantId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferOrders::RequesterId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferOrders::RequesterLocationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferOrders::SenderLocationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferOrders::ItemCode)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockTransferOrders::StyleCode).string().null())
                        .col(
                            ColumnDef::new(StockTransferOrders::Status)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferOrders::ShipmentRef)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(StockTransferOrders::Remarks).text().null())
                        .col(
                            ColumnDef::new(StockTransferOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_transfer_orders_sender_location")
                                .from(
                                    StockTransferOrders::Table,
                                    StockTransferOrders::SenderLocationId,
                                )
                                .to(Locations::Table, Locations::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_transfer_orders_requester_location")
                                .from(
                                    StockTransferOrders::Table,
                                    StockTransferOrders::RequesterLocationId,
                                )
                                .to(Locations::Table, Locations::Id),
                        )
                        .to_owned(),
                )
                .await?;

            // Fulfillment queue lookups: incoming requests for a location
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_transfer_orders_tenant_sender_status")
                        .table(StockTransferOrders::Table)
                        .col(StockTransferOrders::TenantId)
                        .col(StockTransferOrders::SenderLocationId)
                        .col(StockTransferOrders::Status)
                        .to_owned(),
                )
                .await?;

            // Outgoing listing: a requester's own orders
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_transfer_orders_tenant_requester")
                        .table(StockTransferOrders::Table)
                        .col(StockTransferOrders::TenantId)
                        .col(StockTransferOrders::RequesterId)
                        .to_owned(),
                )
                .await?;

            // Duplicate-active-request check
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_transfer_orders_dup_check")
                        .table(StockTransferOrders::Table)
                        .col(StockTransferOrders::RequesterId)
                        .col(StockTransferOrders::ItemCode)
                        .col(StockTransferOrders::SenderLocationId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockTransferOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum StockTransferOrders {
        Table,
        Id,
        TenantId,
        RequesterId,
        RequesterLocationId,
        SenderLocationId,
        ItemCode,
        StyleCode,
        Status,
        ShipmentRef,
        Remarks,
        CreatedAt,
        UpdatedAt,
    }
}
