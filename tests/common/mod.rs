#![allow(dead_code)]

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use stockledger::config::AppConfig;
use stockledger::db::{establish_connection_from_app_config, run_migrations, DbPool};
use stockledger::entities::item::{self, ItemType, TrackingType};
use stockledger::entities::warehouse;
use stockledger::events::{process_events, EventSender};
use stockledger::InventoryCore;

/// Fresh in-memory database and a fully wired core. Each call gets its own
/// named shared-cache SQLite database so tests cannot see each other.
pub async fn setup_core() -> InventoryCore {
    setup_core_with(|_| {}).await
}

/// Same as [`setup_core`], with a hook to tweak the configuration first.
pub async fn setup_core_with(customize: impl FnOnce(&mut AppConfig)) -> InventoryCore {
    let url = format!(
        "sqlite:file:{}?mode=memory&cache=shared",
        Uuid::new_v4().simple()
    );
    let mut config = AppConfig::new(url, "test".to_string());
    customize(&mut config);

    let pool = establish_connection_from_app_config(&config)
        .await
        .expect("Failed to create DB pool");
    run_migrations(&pool).await.expect("Failed to run migrations");

    let (tx, rx) = mpsc::channel(config.event_channel_capacity);
    tokio::spawn(process_events(rx));

    InventoryCore::new(Arc::new(pool), config, EventSender::new(tx))
}

pub fn dec(value: i64) -> Decimal {
    Decimal::from(value)
}

pub async fn create_test_item(
    db: &DbPool,
    sku: &str,
    tracking_type: TrackingType,
    default_unit_cost: Decimal,
) -> item::Model {
    let item = item::ActiveModel {
        id: Set(Uuid::new_v4()),
        sku: Set(sku.to_string()),
        name: Set(format!("{} test item", sku)),
        item_type: Set(ItemType::SparePart),
        tracking_type: Set(tracking_type),
        unit_of_measure: Set("EA".to_string()),
        default_unit_cost: Set(default_unit_cost),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    };

    item.insert(db).await.expect("Failed to create item")
}

pub async fn create_test_warehouse(db: &DbPool, code: &str) -> warehouse::Model {
    let warehouse = warehouse::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(code.to_string()),
        name: Set(format!("{} warehouse", code)),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    };

    warehouse
        .insert(db)
        .await
        .expect("Failed to create warehouse")
}
