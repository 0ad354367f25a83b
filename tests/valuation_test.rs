mod common;

use common::{create_test_item, create_test_warehouse, dec, setup_core};
use rust_decimal::Decimal;
use stockledger::entities::item::TrackingType;
use stockledger::entities::stock_document::DocumentKind;
use stockledger::services::documents::{LineInput, NewDocument};
use stockledger::InventoryCore;
use uuid::Uuid;

async fn post_simple(
    core: &InventoryCore,
    kind: DocumentKind,
    warehouse_id: Uuid,
    item_id: Uuid,
    quantity: i64,
    unit_cost: i64,
    batch_number: Option<&str>,
) {
    let draft = core
        .documents
        .create_draft(NewDocument {
            kind,
            warehouse_id,
            dest_warehouse_id: None,
            counterpart_id: None,
            notes: None,
        })
        .await
        .expect("create draft");
    core.documents
        .add_line(
            draft.id,
            LineInput {
                item_id,
                quantity: dec(quantity),
                unit_cost: dec(unit_cost),
                batch_number: batch_number.map(str::to_string),
                serial_numbers: Vec::new(),
            },
        )
        .await
        .expect("add line");
    core.documents.post(draft.id).await.expect("post");
}

#[tokio::test]
async fn the_classic_costing_scenario() {
    let core = setup_core().await;
    let warehouse = create_test_warehouse(&core.db, "MAIN").await;
    let item = create_test_item(&core.db, "FILTER-11", TrackingType::None, dec(10)).await;

    // Receive 5 units at 8, then 5 units at 12.
    post_simple(
        &core,
        DocumentKind::GoodsReceipt,
        warehouse.id,
        item.id,
        5,
        8,
        None,
    )
    .await;
    post_simple(
        &core,
        DocumentKind::DirectPurchase,
        warehouse.id,
        item.id,
        5,
        12,
        None,
    )
    .await;

    let wac = core
        .valuation
        .weighted_average_cost(warehouse.id, item.id)
        .await
        .unwrap();
    assert_eq!(wac, Some(dec(10)));

    let last = core
        .valuation
        .last_receipt_cost(warehouse.id, item.id)
        .await
        .unwrap()
        .expect("a receipt exists");
    assert_eq!(last.0, dec(12));

    let rows = core.valuation.item_costing(warehouse.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.sku, "FILTER-11");
    assert_eq!(row.on_hand, dec(10));
    assert_eq!(row.weighted_average_cost, Some(dec(10)));
    assert_eq!(row.last_receipt_cost, Some(dec(12)));
    // Default cost 10 against WAC 10: variance 0%, present, not absent.
    assert_eq!(row.cost_variance_percent, Some(Decimal::ZERO));
}

#[tokio::test]
async fn variance_is_absent_for_zero_default_cost() {
    let core = setup_core().await;
    let warehouse = create_test_warehouse(&core.db, "MAIN").await;
    let item = create_test_item(&core.db, "SCRAP-00", TrackingType::None, dec(0)).await;

    post_simple(
        &core,
        DocumentKind::GoodsReceipt,
        warehouse.id,
        item.id,
        4,
        3,
        None,
    )
    .await;

    let rows = core.valuation.item_costing(warehouse.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].weighted_average_cost, Some(dec(3)));
    assert_eq!(rows[0].cost_variance_percent, None);
}

#[tokio::test]
async fn on_hand_is_the_signed_sum_of_history() {
    let core = setup_core().await;
    let warehouse = create_test_warehouse(&core.db, "MAIN").await;
    let item = create_test_item(&core.db, "HOSE-05", TrackingType::None, dec(2)).await;

    post_simple(&core, DocumentKind::GoodsReceipt, warehouse.id, item.id, 20, 2, None).await;
    post_simple(&core, DocumentKind::Dispatch, warehouse.id, item.id, 6, 2, None).await;
    post_simple(&core, DocumentKind::Requisition, warehouse.id, item.id, 3, 2, None).await;
    post_simple(&core, DocumentKind::Adjustment, warehouse.id, item.id, -1, 2, None).await;
    post_simple(&core, DocumentKind::SupplierReturn, warehouse.id, item.id, 2, 2, None).await;

    // 20 - 6 - 3 - 1 - 2 = 8
    assert_eq!(
        core.valuation.on_hand(warehouse.id, item.id, None).await.unwrap(),
        dec(8)
    );

    // Issues never shift the weighted average.
    assert_eq!(
        core.valuation
            .weighted_average_cost(warehouse.id, item.id)
            .await
            .unwrap(),
        Some(dec(2))
    );
}

#[tokio::test]
async fn batch_scoped_on_hand_narrows_to_one_batch() {
    let core = setup_core().await;
    let warehouse = create_test_warehouse(&core.db, "MAIN").await;
    let item = create_test_item(&core.db, "OIL-20", TrackingType::Batch, dec(7)).await;

    post_simple(
        &core,
        DocumentKind::GoodsReceipt,
        warehouse.id,
        item.id,
        10,
        7,
        Some("LOT-A"),
    )
    .await;
    post_simple(
        &core,
        DocumentKind::GoodsReceipt,
        warehouse.id,
        item.id,
        5,
        7,
        Some("LOT-B"),
    )
    .await;

    assert_eq!(
        core.valuation
            .on_hand(warehouse.id, item.id, Some("LOT-A"))
            .await
            .unwrap(),
        dec(10)
    );
    assert_eq!(
        core.valuation
            .on_hand(warehouse.id, item.id, Some("LOT-B"))
            .await
            .unwrap(),
        dec(5)
    );
    assert_eq!(
        core.valuation.on_hand(warehouse.id, item.id, None).await.unwrap(),
        dec(15)
    );
}

#[tokio::test]
async fn no_history_means_zero_on_hand_and_no_costs() {
    let core = setup_core().await;
    let warehouse = create_test_warehouse(&core.db, "MAIN").await;
    let item = create_test_item(&core.db, "GHOST-99", TrackingType::None, dec(1)).await;

    assert_eq!(
        core.valuation.on_hand(warehouse.id, item.id, None).await.unwrap(),
        Decimal::ZERO
    );
    assert_eq!(
        core.valuation
            .weighted_average_cost(warehouse.id, item.id)
            .await
            .unwrap(),
        None
    );
    assert_eq!(
        core.valuation
            .last_receipt_cost(warehouse.id, item.id)
            .await
            .unwrap(),
        None
    );
    assert!(core.valuation.item_costing(warehouse.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn ledger_reads_are_ordered_and_document_scoped() {
    let core = setup_core().await;
    let warehouse = create_test_warehouse(&core.db, "MAIN").await;
    let item = create_test_item(&core.db, "CHAIN-44", TrackingType::None, dec(4)).await;

    post_simple(&core, DocumentKind::GoodsReceipt, warehouse.id, item.id, 9, 4, None).await;
    post_simple(&core, DocumentKind::Dispatch, warehouse.id, item.id, 4, 4, None).await;

    let entries = core.ledger.entries(warehouse.id, item.id, None).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].occurred_at <= entries[1].occurred_at);
    assert_eq!(entries[0].quantity, dec(9));
    assert_eq!(entries[1].quantity, dec(-4));

    let by_doc = core
        .ledger
        .entries_for_document(entries[0].document_kind, entries[0].document_id)
        .await
        .unwrap();
    assert_eq!(by_doc.len(), 1);
    assert_eq!(by_doc[0].id, entries[0].id);
}
