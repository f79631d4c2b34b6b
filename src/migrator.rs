use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_vendors_table::Migration),
            Box::new(m20250301_000002_create_service_pincodes_table::Migration),
            Box::new(m20250301_000003_create_payment_orders_table::Migration),
        ]
    }
}

mod m20250301_000001_create_vendors_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000001_create_vendors_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Vendors::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Vendors::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Vendors::Name).string().not_null())
                        .col(ColumnDef::new(Vendors::Status).string().not_null())
                        .col(ColumnDef::new(Vendors::Pincodes).json().not_null())
                        .col(
                            ColumnDef::new(Vendors::DeliveryMessage)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(Vendors::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Vendors::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_vendors_status")
                        .table(Vendors::Table)
                        .col(Vendors::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Vendors::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Vendors {
        Table,
        Id,
        Name,
        Status,
        Pincodes,
        DeliveryMessage,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000002_create_service_pincodes_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000002_create_service_pincodes_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ServicePincodes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ServicePincodes::Pincode)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServicePincodes::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ServicePincodes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ServicePincodes {
        Table,
        Pincode,
        CreatedAt,
    }
}

mod m20250301_000003_create_payment_orders_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000003_create_payment_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PaymentOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PaymentOrders::OrderId)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentOrders::Amount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(PaymentOrders::CustomerId).string().not_null())
                        .col(ColumnDef::new(PaymentOrders::Mobile).string().not_null())
                        .col(ColumnDef::new(PaymentOrders::Email).string().not_null())
                        .col(ColumnDef::new(PaymentOrders::Status).string().not_null())
                        .col(ColumnDef::new(PaymentOrders::TxnId).string().null())
                        .col(
                            ColumnDef::new(PaymentOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PaymentOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum PaymentOrders {
        Table,
        OrderId,
        Amount,
        CustomerId,
        Mobile,
        Email,
        Status,
        TxnId,
        CreatedAt,
        UpdatedAt,
    }
}
