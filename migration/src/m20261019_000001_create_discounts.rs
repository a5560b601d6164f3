use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Discounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Discounts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Discounts::Source)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Discounts::ProductName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Discounts::Category).string_len(100).null())
                    .col(ColumnDef::new(Discounts::OriginalPrice).double().null())
                    .col(
                        ColumnDef::new(Discounts::DiscountPrice)
                            .double()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Discounts::DiscountPercentage).double().null())
                    .col(ColumnDef::new(Discounts::ValidFrom).timestamp().null())
                    .col(ColumnDef::new(Discounts::ValidUntil).timestamp().null())
                    .col(ColumnDef::new(Discounts::ImageUrl).string_len(500).null())
                    .col(ColumnDef::new(Discounts::ProductUrl).string_len(500).null())
                    .col(ColumnDef::new(Discounts::Description).string_len(1000).null())
                    .col(
                        ColumnDef::new(Discounts::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Discounts::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .col(
                        ColumnDef::new(Discounts::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .to_owned(),
            )
            .await?;

        // Secondary indexes backing the list filters and the expiry sweep
        manager
            .create_index(
                Index::create()
                    .name("idx_discounts_source")
                    .table(Discounts::Table)
                    .col(Discounts::Source)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_discounts_category")
                    .table(Discounts::Table)
                    .col(Discounts::Category)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_discounts_valid_until")
                    .table(Discounts::Table)
                    .col(Discounts::ValidUntil)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_discounts_is_active")
                    .table(Discounts::Table)
                    .col(Discounts::IsActive)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Discounts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Discounts {
    Table,
    Id,
    Source,
    ProductName,
    Category,
    OriginalPrice,
    DiscountPrice,
    DiscountPercentage,
    ValidFrom,
    ValidUntil,
    ImageUrl,
    ProductUrl,
    Description,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
