use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    EmployeeNo,
    Username,
    PasswordHash,
    Role,
    NoShowCount,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Shifts {
    Table,
    Id,
    Name,
    StartTime,
    EndTime,
    BreakStartTime,
    BreakEndTime,
    IsActive,
    MealPrice,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Canteens {
    Table,
    Id,
    Name,
    Capacity,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    UserId,
    ShiftId,
    CanteenId,
    OrderDate,
    OrderedAt,
    Status,
    QrToken,
    CheckInAt,
    CheckedInBy,
    CancelledBy,
    CancelReason,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Holidays {
    Table,
    Id,
    Name,
    Date,
    ShiftId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Blacklists {
    Table,
    Id,
    UserId,
    Reason,
    StartDate,
    EndDate,
    IsActive,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Settings {
    Table,
    Id,
    CutoffMode,
    CutoffDays,
    CutoffHours,
    WeeklyCutoffWeekday,
    WeeklyCutoffHour,
    WeeklyCutoffMinute,
    OrderableWeekdays,
    MaxWeeksAhead,
    MaxOrderDaysAhead,
    BlacklistStrikes,
    BlacklistDurationDays,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::EmployeeNo).string_len(32).not_null())
                    .col(ColumnDef::new(Users::Username).string_len(64).not_null())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string_len(16)
                            .not_null()
                            .default("employee"),
                    )
                    .col(
                        ColumnDef::new(Users::NoShowCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .col(ColumnDef::new(Users::UpdatedAt).timestamp_with_time_zone().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_users_employee_no")
                    .table(Users::Table)
                    .col(Users::EmployeeNo)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Shifts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Shifts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Shifts::Name).string_len(64).not_null())
                    .col(ColumnDef::new(Shifts::StartTime).time().not_null())
                    .col(ColumnDef::new(Shifts::EndTime).time().not_null())
                    .col(ColumnDef::new(Shifts::BreakStartTime).time().null())
                    .col(ColumnDef::new(Shifts::BreakEndTime).time().null())
                    .col(
                        ColumnDef::new(Shifts::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Shifts::MealPrice)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Shifts::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .col(ColumnDef::new(Shifts::UpdatedAt).timestamp_with_time_zone().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Canteens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Canteens::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Canteens::Name).string_len(64).not_null())
                    .col(ColumnDef::new(Canteens::Capacity).integer().null())
                    .col(
                        ColumnDef::new(Canteens::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Canteens::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Orders::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Orders::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Orders::ShiftId).big_integer().not_null())
                    .col(ColumnDef::new(Orders::CanteenId).big_integer().null())
                    .col(ColumnDef::new(Orders::OrderDate).date().not_null())
                    .col(
                        ColumnDef::new(Orders::OrderedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::Status)
                            .string_len(16)
                            .not_null()
                            .default("ordered"),
                    )
                    .col(ColumnDef::new(Orders::QrToken).string_len(64).not_null())
                    .col(ColumnDef::new(Orders::CheckInAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Orders::CheckedInBy).big_integer().null())
                    .col(ColumnDef::new(Orders::CancelledBy).big_integer().null())
                    .col(ColumnDef::new(Orders::CancelReason).string().null())
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .col(ColumnDef::new(Orders::UpdatedAt).timestamp_with_time_zone().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_user")
                            .from(Orders::Table, Orders::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_shift")
                            .from(Orders::Table, Orders::ShiftId)
                            .to(Shifts::Table, Shifts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_orders_qr_token")
                    .table(Orders::Table)
                    .col(Orders::QrToken)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 扫单按 (status, order_date) 查询
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("ix_orders_status_date")
                    .table(Orders::Table)
                    .col(Orders::Status)
                    .col(Orders::OrderDate)
                    .to_owned(),
            )
            .await?;

        // 同一用户同一天至多一个有效订单；部分唯一索引是最终权威，
        // 校验管道里的重复检查只是竞态前的预检
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS uq_orders_user_date_active \
                 ON orders (user_id, order_date) WHERE status <> 'cancelled'",
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Holidays::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Holidays::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Holidays::Name).string_len(64).not_null())
                    .col(ColumnDef::new(Holidays::Date).date().not_null())
                    .col(ColumnDef::new(Holidays::ShiftId).big_integer().null())
                    .col(
                        ColumnDef::new(Holidays::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_holidays_shift")
                            .from(Holidays::Table, Holidays::ShiftId)
                            .to(Shifts::Table, Shifts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("ix_holidays_date")
                    .table(Holidays::Table)
                    .col(Holidays::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Blacklists::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Blacklists::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Blacklists::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Blacklists::Reason).string().not_null())
                    .col(
                        ColumnDef::new(Blacklists::StartDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Blacklists::EndDate).timestamp_with_time_zone().null())
                    .col(
                        ColumnDef::new(Blacklists::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Blacklists::CreatedBy).big_integer().null())
                    .col(
                        ColumnDef::new(Blacklists::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_blacklists_user")
                            .from(Blacklists::Table, Blacklists::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("ix_blacklists_user_active")
                    .table(Blacklists::Table)
                    .col(Blacklists::UserId)
                    .col(Blacklists::IsActive)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Settings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Settings::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Settings::CutoffMode)
                            .string_len(16)
                            .not_null()
                            .default("per_shift"),
                    )
                    .col(
                        ColumnDef::new(Settings::CutoffDays)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Settings::CutoffHours)
                            .integer()
                            .not_null()
                            .default(12),
                    )
                    .col(
                        ColumnDef::new(Settings::WeeklyCutoffWeekday)
                            .small_integer()
                            .not_null()
                            .default(5),
                    )
                    .col(
                        ColumnDef::new(Settings::WeeklyCutoffHour)
                            .small_integer()
                            .not_null()
                            .default(17),
                    )
                    .col(
                        ColumnDef::new(Settings::WeeklyCutoffMinute)
                            .small_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Settings::OrderableWeekdays)
                            .string_len(32)
                            .not_null()
                            .default("1,2,3,4,5"),
                    )
                    .col(
                        ColumnDef::new(Settings::MaxWeeksAhead)
                            .integer()
                            .not_null()
                            .default(2),
                    )
                    .col(
                        ColumnDef::new(Settings::MaxOrderDaysAhead)
                            .integer()
                            .not_null()
                            .default(14),
                    )
                    .col(
                        ColumnDef::new(Settings::BlacklistStrikes)
                            .integer()
                            .not_null()
                            .default(3),
                    )
                    .col(
                        ColumnDef::new(Settings::BlacklistDurationDays)
                            .integer()
                            .not_null()
                            .default(30),
                    )
                    .col(ColumnDef::new(Settings::UpdatedAt).timestamp_with_time_zone().null())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Settings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Blacklists::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Holidays::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Canteens::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Shifts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
