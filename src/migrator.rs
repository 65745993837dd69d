use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_requisitions_table::Migration),
            Box::new(m20240101_000002_create_requisition_lines_table::Migration),
            Box::new(m20240101_000003_create_fulfillment_tables::Migration),
            Box::new(m20240101_000004_create_document_sequences_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_requisitions_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_requisitions_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Requisitions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Requisitions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Requisitions::RequisitionNumber)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Requisitions::Status).string().not_null())
                        .col(ColumnDef::new(Requisitions::Priority).string().not_null())
                        .col(ColumnDef::new(Requisitions::RequesterId).uuid().not_null())
                        .col(
                            ColumnDef::new(Requisitions::RequesterName)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Requisitions::Department).string().not_null())
                        .col(
                            ColumnDef::new(Requisitions::DeliveryLocation)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Requisitions::Purpose).text().not_null())
                        .col(
                            ColumnDef::new(Requisitions::RequiredDate)
                                .date()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Requisitions::SubmittedAt).timestamp().null())
                        .col(ColumnDef::new(Requisitions::SubmittedBy).uuid().null())
                        .col(ColumnDef::new(Requisitions::ApprovedAt).timestamp().null())
                        .col(ColumnDef::new(Requisitions::ApprovedBy).uuid().null())
                        .col(ColumnDef::new(Requisitions::RejectedAt).timestamp().null())
                        .col(ColumnDef::new(Requisitions::RejectedBy).uuid().null())
                        .col(ColumnDef::new(Requisitions::RejectionReason).text().null())
                        .col(
                            ColumnDef::new(Requisitions::IsDeleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Requisitions::Version)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(Requisitions::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Requisitions::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_requisitions_number")
                        .table(Requisitions::Table)
                        .col(Requisitions::RequisitionNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_requisitions_status")
                        .table(Requisitions::Table)
                        .col(Requisitions::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_requisitions_created_at")
                        .table(Requisitions::Table)
                        .col(Requisitions::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Requisitions::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Requisitions {
        Table,
        Id,
        RequisitionNumber,
        Status,
        Priority,
        RequesterId,
        RequesterName,
        Department,
        DeliveryLocation,
        Purpose,
        RequiredDate,
        SubmittedAt,
        SubmittedBy,
        ApprovedAt,
        ApprovedBy,
        RejectedAt,
        RejectedBy,
        RejectionReason,
        IsDeleted,
        Version,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_requisition_lines_table {

    use super::m20240101_000001_create_requisitions_table::Requisitions;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_requisition_lines_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(RequisitionLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RequisitionLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RequisitionLines::RequisitionId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RequisitionLines::LineNumber)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RequisitionLines::ItemId).uuid().not_null())
                        .col(
                            ColumnDef::new(RequisitionLines::ItemCode)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RequisitionLines::ItemName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RequisitionLines::ItemDescription)
                                .text()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(RequisitionLines::UnitOfMeasure)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RequisitionLines::QuantityRequested)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RequisitionLines::QuantityFulfilled)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(RequisitionLines::Status)
                                .string()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_requisition_lines_requisition_id")
                                .from(RequisitionLines::Table, RequisitionLines::RequisitionId)
                                .to(Requisitions::Table, Requisitions::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_requisition_lines_requisition_id")
                        .table(RequisitionLines::Table)
                        .col(RequisitionLines::RequisitionId)
                        .to_owned(),
                )
                .await?;

            // line numbers are unique within a requisition
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_requisition_lines_line_number")
                        .table(RequisitionLines::Table)
                        .col(RequisitionLines::RequisitionId)
                        .col(RequisitionLines::LineNumber)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(RequisitionLines::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum RequisitionLines {
        Table,
        Id,
        RequisitionId,
        LineNumber,
        ItemId,
        ItemCode,
        ItemName,
        ItemDescription,
        UnitOfMeasure,
        QuantityRequested,
        QuantityFulfilled,
        Status,
    }
}

mod m20240101_000003_create_fulfillment_tables {

    use super::m20240101_000001_create_requisitions_table::Requisitions;
    use super::m20240101_000002_create_requisition_lines_table::RequisitionLines;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_fulfillment_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(FulfillmentRecords::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(FulfillmentRecords::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FulfillmentRecords::RequisitionId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FulfillmentRecords::RequisitionNumber)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FulfillmentRecords::Channel)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FulfillmentRecords::ReferenceNumber)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FulfillmentRecords::ActionDate)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FulfillmentRecords::ActingUserId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FulfillmentRecords::ActingUserName)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(FulfillmentRecords::SupplierId).uuid().null())
                        .col(
                            ColumnDef::new(FulfillmentRecords::WarehouseId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(FulfillmentRecords::SourceLocation)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(FulfillmentRecords::TargetLocation)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(FulfillmentRecords::TotalQuantity)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FulfillmentRecords::TotalValue)
                                .decimal()
                                .null(),
                        )
                        .col(ColumnDef::new(FulfillmentRecords::Remarks).text().null())
                        .col(
                            ColumnDef::new(FulfillmentRecords::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_fulfillment_records_requisition_id")
                                .from(FulfillmentRecords::Table, FulfillmentRecords::RequisitionId)
                                .to(Requisitions::Table, Requisitions::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_fulfillment_records_requisition_id")
                        .table(FulfillmentRecords::Table)
                        .col(FulfillmentRecords::RequisitionId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_fulfillment_records_reference_number")
                        .table(FulfillmentRecords::Table)
                        .col(FulfillmentRecords::ReferenceNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(FulfillmentLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(FulfillmentLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FulfillmentLines::FulfillmentRecordId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FulfillmentLines::RequisitionLineId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(FulfillmentLines::ItemId).uuid().not_null())
                        .col(
                            ColumnDef::new(FulfillmentLines::ItemCode)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FulfillmentLines::ItemName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FulfillmentLines::Quantity)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(FulfillmentLines::UnitRate).decimal().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_fulfillment_lines_record_id")
                                .from(FulfillmentLines::Table, FulfillmentLines::FulfillmentRecordId)
                                .to(FulfillmentRecords::Table, FulfillmentRecords::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_fulfillment_lines_requisition_line_id")
                                .from(FulfillmentLines::Table, FulfillmentLines::RequisitionLineId)
                                .to(RequisitionLines::Table, RequisitionLines::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_fulfillment_lines_record_id")
                        .table(FulfillmentLines::Table)
                        .col(FulfillmentLines::FulfillmentRecordId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_fulfillment_lines_requisition_line_id")
                        .table(FulfillmentLines::Table)
                        .col(FulfillmentLines::RequisitionLineId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(FulfillmentLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(FulfillmentRecords::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum FulfillmentRecords {
        Table,
        Id,
        RequisitionId,
        RequisitionNumber,
        Channel,
        ReferenceNumber,
        ActionDate,
        ActingUserId,
        ActingUserName,
        SupplierId,
        WarehouseId,
        SourceLocation,
        TargetLocation,
        TotalQuantity,
        TotalValue,
        Remarks,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum FulfillmentLines {
        Table,
        Id,
        FulfillmentRecordId,
        RequisitionLineId,
        ItemId,
        ItemCode,
        ItemName,
        Quantity,
        UnitRate,
    }
}

mod m20240101_000004_create_document_sequences_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_document_sequences_table"
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
                            ColumnDef::new(DocumentSequences::NextValue)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DocumentSequences::UpdatedAt)
                                .timestamp()
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

    #[derive(DeriveIden)]
    pub(super) enum DocumentSequences {
        Table,
        Prefix,
        NextValue,
        UpdatedAt,
    }
}
