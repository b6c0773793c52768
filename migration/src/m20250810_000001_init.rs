use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ========== STATIONS ==========
        manager
            .create_table(
                Table::create()
                    .table(Stations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Stations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Stations::NameEn).text().not_null().unique_key())
                    .col(
                        ColumnDef::new(Stations::NameKanji)
                            .text()
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        // ========== MEASUREMENT TYPES ==========
        manager
            .create_table(
                Table::create()
                    .table(MeasurementTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MeasurementTypes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MeasurementTypes::NameEn)
                            .text()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(MeasurementTypes::NameKanji)
                            .text()
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        // ========== MEASUREMENTS ==========
        manager
            .create_table(
                Table::create()
                    .table(Measurements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Measurements::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Measurements::Date).integer().not_null())
                    .col(ColumnDef::new(Measurements::StationId).integer().not_null())
                    .col(
                        ColumnDef::new(Measurements::MeasurementTypeId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Measurements::Lat).double().not_null())
                    .col(ColumnDef::new(Measurements::Lng).double().not_null())
                    .col(ColumnDef::new(Measurements::Unit).text().not_null())
                    .col(ColumnDef::new(Measurements::Hour).integer().not_null())
                    .col(ColumnDef::new(Measurements::Value).double())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_measurements_station")
                            .from(Measurements::Table, Measurements::StationId)
                            .to(Stations::Table, Stations::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_measurements_measurement_type")
                            .from(Measurements::Table, Measurements::MeasurementTypeId)
                            .to(MeasurementTypes::Table, MeasurementTypes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // One reading per station/type/day/hour; importers rely on this for ON CONFLICT
        manager
            .create_index(
                Index::create()
                    .name("unique_measurement")
                    .table(Measurements::Table)
                    .col(Measurements::Date)
                    .col(Measurements::StationId)
                    .col(Measurements::MeasurementTypeId)
                    .col(Measurements::Hour)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_measurements_station_type_date")
                    .table(Measurements::Table)
                    .col(Measurements::StationId)
                    .col(Measurements::MeasurementTypeId)
                    .col(Measurements::Date)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // ========== DAMS ==========
        manager
            .create_table(
                Table::create()
                    .table(Dams::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Dams::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Dams::JpName).text().not_null().unique_key())
                    .col(ColumnDef::new(Dams::EnName).text().not_null())
                    .to_owned(),
            )
            .await?;

        // ========== DAM LEVELS ==========
        manager
            .create_table(
                Table::create()
                    .table(DamLevels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DamLevels::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DamLevels::DamId).integer().not_null())
                    .col(
                        ColumnDef::new(DamLevels::ObservationTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DamLevels::DamValue).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_dam_levels_dam")
                            .from(DamLevels::Table, DamLevels::DamId)
                            .to(Dams::Table, Dams::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("unique_dam_level")
                    .table(DamLevels::Table)
                    .col(DamLevels::DamId)
                    .col(DamLevels::ObservationTime)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_dam_levels_observation_time")
                    .table(DamLevels::Table)
                    .col(DamLevels::ObservationTime)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Facts before dimensions
        manager
            .drop_table(Table::drop().table(DamLevels::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Dams::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(Measurements::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(MeasurementTypes::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Stations::Table).if_exists().to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum Stations {
    Table,
    Id,
    NameEn,
    NameKanji,
}

#[derive(DeriveIden)]
pub enum MeasurementTypes {
    Table,
    Id,
    NameEn,
    NameKanji,
}

#[derive(DeriveIden)]
pub enum Measurements {
    Table,
    Id,
    Date,
    StationId,
    MeasurementTypeId,
    Lat,
    Lng,
    Unit,
    Hour,
    Value,
}

#[derive(DeriveIden)]
pub enum Dams {
    Table,
    Id,
    JpName,
    EnName,
}

#[derive(DeriveIden)]
pub enum DamLevels {
    Table,
    Id,
    DamId,
    ObservationTime,
    DamValue,
}
