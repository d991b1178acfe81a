use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users_table::Migration),
            Box::new(m20240101_000002_create_groups_table::Migration),
            Box::new(m20240101_000003_create_group_memberships_table::Migration),
            Box::new(m20240101_000004_create_group_requests_table::Migration),
            Box::new(m20240101_000005_create_password_reset_tokens_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_users_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Users::Username).string().not_null())
                        .col(ColumnDef::new(Users::Email).string().not_null())
                        .col(ColumnDef::new(Users::PasswordHash).text().not_null())
                        .col(ColumnDef::new(Users::Avatar).string().null())
                        .col(ColumnDef::new(Users::CreatedAt).timestamp_with_time_zone().not_null())
                        .col(ColumnDef::new(Users::UpdatedAt).timestamp_with_time_zone().not_null())
                        .to_owned(),
                )
                .await?;

            // Registration uniqueness is enforced here, not only by the
            // application-level pre-checks (those alone race under
            // concurrent signups).
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_users_email")
                        .table(Users::Table)
                        .col(Users::Email)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_users_username")
                        .table(Users::Table)
                        .col(Users::Username)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Users {
        Table,
        Id,
        Username,
        Email,
        PasswordHash,
        Avatar,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_groups_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_groups_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Groups::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Groups::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Groups::Name).string().not_null())
                        .col(ColumnDef::new(Groups::Description).text().not_null())
                        .col(ColumnDef::new(Groups::Schedule).string().not_null())
                        .col(ColumnDef::new(Groups::Location).string().not_null())
                        .col(ColumnDef::new(Groups::Chronic).text().not_null())
                        .col(ColumnDef::new(Groups::Master).uuid().not_null())
                        .col(ColumnDef::new(Groups::CreatedAt).timestamp_with_time_zone().not_null())
                        .col(ColumnDef::new(Groups::UpdatedAt).timestamp_with_time_zone().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_groups_master")
                        .table(Groups::Table)
                        .col(Groups::Master)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Groups::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Groups {
        Table,
        Id,
        Name,
        Description,
        Schedule,
        Location,
        Chronic,
        Master,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_group_memberships_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_group_memberships_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(GroupMemberships::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(GroupMemberships::GroupId).uuid().not_null())
                        .col(ColumnDef::new(GroupMemberships::UserId).uuid().not_null())
                        .col(
                            ColumnDef::new(GroupMemberships::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .col(GroupMemberships::GroupId)
                                .col(GroupMemberships::UserId),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_group_memberships_user_id")
                        .table(GroupMemberships::Table)
                        .col(GroupMemberships::UserId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(GroupMemberships::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum GroupMemberships {
        Table,
        GroupId,
        UserId,
        CreatedAt,
    }
}

mod m20240101_000004_create_group_requests_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_group_requests_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(GroupRequests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(GroupRequests::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(GroupRequests::UserId).uuid().not_null())
                        .col(ColumnDef::new(GroupRequests::GroupId).uuid().not_null())
                        .col(
                            ColumnDef::new(GroupRequests::Status)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GroupRequests::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GroupRequests::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // Rejected requests are deleted, so any surviving row is PENDING
            // or ACCEPTED; the pair-unique index is the storage-level guard
            // against two concurrent join requests slipping past the
            // check-then-create sequence.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_group_requests_user_id_group_id")
                        .table(GroupRequests::Table)
                        .col(GroupRequests::UserId)
                        .col(GroupRequests::GroupId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_group_requests_group_id")
                        .table(GroupRequests::Table)
                        .col(GroupRequests::GroupId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(GroupRequests::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum GroupRequests {
        Table,
        Id,
        UserId,
        GroupId,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000005_create_password_reset_tokens_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_password_reset_tokens_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PasswordResetTokens::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PasswordResetTokens::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PasswordResetTokens::UserId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PasswordResetTokens::Token)
                                .text()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PasswordResetTokens::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // At most one live token per user; forgot-password upserts
            // against this index.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_password_reset_tokens_user_id")
                        .table(PasswordResetTokens::Table)
                        .col(PasswordResetTokens::UserId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_password_reset_tokens_token")
                        .table(PasswordResetTokens::Table)
                        .col(PasswordResetTokens::Token)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PasswordResetTokens::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum PasswordResetTokens {
        Table,
        Id,
        UserId,
        Token,
        CreatedAt,
    }
}
