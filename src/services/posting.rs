use rust_decimal::Decimal;
use uuid::Uuid;

use crate::entities::item::TrackingType;
use crate::entities::stock_document::{self, DocumentKind};
use crate::entities::stock_document_line;
use crate::entities::stock_movement::MovementType;
use crate::errors::ServiceError;

/// A planned movement for one ledger row, before document references are
/// attached.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementDraft {
    pub movement_type: MovementType,
    pub warehouse_id: Uuid,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub serial_number: Option<String>,
    pub batch_number: Option<String>,
}

/// The signed ledger quantity a line contributes at the source warehouse.
/// Adjustments pass their delta through unchanged; receipts are positive;
/// every issuing kind is negative.
pub fn signed_quantity(kind: DocumentKind, line_quantity: Decimal) -> Decimal {
    match kind {
        DocumentKind::Adjustment => line_quantity,
        DocumentKind::GoodsReceipt | DocumentKind::DirectPurchase => line_quantity,
        DocumentKind::Transfer
        | DocumentKind::SupplierReturn
        | DocumentKind::Dispatch
        | DocumentKind::Requisition => -line_quantity,
    }
}

/// The movement type a kind writes at the source warehouse.
pub fn movement_type_for(kind: DocumentKind) -> MovementType {
    match kind {
        DocumentKind::Adjustment => MovementType::Adjustment,
        DocumentKind::Transfer => MovementType::TransferOut,
        DocumentKind::GoodsReceipt | DocumentKind::DirectPurchase => MovementType::Receipt,
        DocumentKind::SupplierReturn => MovementType::SupplierReturn,
        DocumentKind::Dispatch => MovementType::Issue,
        DocumentKind::Requisition => MovementType::Consumption,
    }
}

/// Plans the ledger rows one line produces when its document posts.
///
/// Serial-tracked lines expand to one row per unit so each serial stays
/// individually traceable through the ledger; transfers produce a matched
/// out/in pair per row.
pub fn plan_line(
    document: &stock_document::Model,
    line: &stock_document_line::Model,
    tracking: TrackingType,
    serials: &[String],
) -> Result<Vec<MovementDraft>, ServiceError> {
    let kind = document.kind;
    let signed = signed_quantity(kind, line.quantity);
    let per_serial = tracking == TrackingType::Serial && !serials.is_empty();

    let unit = if signed >= Decimal::ZERO {
        Decimal::ONE
    } else {
        -Decimal::ONE
    };

    let mut drafts = Vec::new();

    if kind == DocumentKind::Transfer {
        let dest = document.dest_warehouse_id.ok_or_else(|| {
            ServiceError::InvalidOperation(
                "transfer document has no destination warehouse".to_string(),
            )
        })?;

        if per_serial {
            for serial in serials {
                drafts.push(MovementDraft {
                    movement_type: MovementType::TransferOut,
                    warehouse_id: document.warehouse_id,
                    quantity: -Decimal::ONE,
                    unit_cost: line.unit_cost,
                    serial_number: Some(serial.clone()),
                    batch_number: line.batch_number.clone(),
                });
                drafts.push(MovementDraft {
                    movement_type: MovementType::TransferIn,
                    warehouse_id: dest,
                    quantity: Decimal::ONE,
                    unit_cost: line.unit_cost,
                    serial_number: Some(serial.clone()),
                    batch_number: line.batch_number.clone(),
                });
            }
        } else {
            drafts.push(MovementDraft {
                movement_type: MovementType::TransferOut,
                warehouse_id: document.warehouse_id,
                quantity: -line.quantity,
                unit_cost: line.unit_cost,
                serial_number: None,
                batch_number: line.batch_number.clone(),
            });
            drafts.push(MovementDraft {
                movement_type: MovementType::TransferIn,
                warehouse_id: dest,
                quantity: line.quantity,
                unit_cost: line.unit_cost,
                serial_number: None,
                batch_number: line.batch_number.clone(),
            });
        }

        return Ok(drafts);
    }

    let movement_type = movement_type_for(kind);

    if per_serial {
        for serial in serials {
            drafts.push(MovementDraft {
                movement_type,
                warehouse_id: document.warehouse_id,
                quantity: unit,
                unit_cost: line.unit_cost,
                serial_number: Some(serial.clone()),
                batch_number: line.batch_number.clone(),
            });
        }
    } else {
        drafts.push(MovementDraft {
            movement_type,
            warehouse_id: document.warehouse_id,
            quantity: signed,
            unit_cost: line.unit_cost,
            serial_number: None,
            batch_number: line.batch_number.clone(),
        });
    }

    Ok(drafts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::stock_document::DocumentStatus;
    use chrono::Utc;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn document(kind: DocumentKind, dest: Option<Uuid>) -> stock_document::Model {
        stock_document::Model {
            id: Uuid::new_v4(),
            document_number: format!("{}000001", kind.prefix()),
            kind,
            status: DocumentStatus::Draft,
            warehouse_id: Uuid::new_v4(),
            dest_warehouse_id: dest,
            counterpart_id: None,
            notes: None,
            posted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(document_id: Uuid, quantity: Decimal) -> stock_document_line::Model {
        stock_document_line::Model {
            id: Uuid::new_v4(),
            document_id,
            item_id: Uuid::new_v4(),
            quantity,
            unit_cost: dec!(2.50),
            batch_number: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[rstest]
    #[case(DocumentKind::GoodsReceipt, MovementType::Receipt, Decimal::from(5))]
    #[case(DocumentKind::DirectPurchase, MovementType::Receipt, Decimal::from(5))]
    #[case(DocumentKind::SupplierReturn, MovementType::SupplierReturn, Decimal::from(-5))]
    #[case(DocumentKind::Dispatch, MovementType::Issue, Decimal::from(-5))]
    #[case(DocumentKind::Requisition, MovementType::Consumption, Decimal::from(-5))]
    fn single_leg_kinds_map_to_one_signed_movement(
        #[case] kind: DocumentKind,
        #[case] expected_type: MovementType,
        #[case] expected_quantity: Decimal,
    ) {
        let doc = document(kind, None);
        let line = line(doc.id, Decimal::from(5));

        let drafts = plan_line(&doc, &line, TrackingType::None, &[]).unwrap();

        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].movement_type, expected_type);
        assert_eq!(drafts[0].quantity, expected_quantity);
        assert_eq!(drafts[0].warehouse_id, doc.warehouse_id);
    }

    #[test]
    fn adjustments_pass_signed_deltas_through() {
        let doc = document(DocumentKind::Adjustment, None);

        let up = plan_line(&doc, &line(doc.id, Decimal::from(3)), TrackingType::None, &[]).unwrap();
        assert_eq!(up[0].quantity, Decimal::from(3));

        let down =
            plan_line(&doc, &line(doc.id, Decimal::from(-3)), TrackingType::None, &[]).unwrap();
        assert_eq!(down[0].quantity, Decimal::from(-3));
        assert_eq!(down[0].movement_type, MovementType::Adjustment);
    }

    #[test]
    fn transfers_emit_a_matched_out_in_pair() {
        let dest = Uuid::new_v4();
        let doc = document(DocumentKind::Transfer, Some(dest));
        let line = line(doc.id, Decimal::from(7));

        let drafts = plan_line(&doc, &line, TrackingType::None, &[]).unwrap();

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].movement_type, MovementType::TransferOut);
        assert_eq!(drafts[0].warehouse_id, doc.warehouse_id);
        assert_eq!(drafts[0].quantity, Decimal::from(-7));
        assert_eq!(drafts[1].movement_type, MovementType::TransferIn);
        assert_eq!(drafts[1].warehouse_id, dest);
        assert_eq!(drafts[1].quantity, Decimal::from(7));
    }

    #[test]
    fn transfer_without_destination_is_rejected() {
        let doc = document(DocumentKind::Transfer, None);
        let line = line(doc.id, Decimal::from(1));

        let err = plan_line(&doc, &line, TrackingType::None, &[]).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidOperation(_)));
    }

    #[test]
    fn serial_tracked_lines_expand_to_per_unit_movements() {
        let doc = document(DocumentKind::Dispatch, None);
        let line = line(doc.id, Decimal::from(3));
        let serials = vec!["SN-1".to_string(), "SN-2".to_string(), "SN-3".to_string()];

        let drafts = plan_line(&doc, &line, TrackingType::Serial, &serials).unwrap();

        assert_eq!(drafts.len(), 3);
        for (draft, serial) in drafts.iter().zip(&serials) {
            assert_eq!(draft.quantity, Decimal::from(-1));
            assert_eq!(draft.serial_number.as_deref(), Some(serial.as_str()));
        }
    }

    #[test]
    fn serial_tracked_transfer_moves_each_unit_through_both_warehouses() {
        let dest = Uuid::new_v4();
        let doc = document(DocumentKind::Transfer, Some(dest));
        let line = line(doc.id, Decimal::from(2));
        let serials = vec!["SN-A".to_string(), "SN-B".to_string()];

        let drafts = plan_line(&doc, &line, TrackingType::Serial, &serials).unwrap();

        assert_eq!(drafts.len(), 4);
        let outs: Vec<_> = drafts
            .iter()
            .filter(|d| d.movement_type == MovementType::TransferOut)
            .collect();
        let ins: Vec<_> = drafts
            .iter()
            .filter(|d| d.movement_type == MovementType::TransferIn)
            .collect();
        assert_eq!(outs.len(), 2);
        assert_eq!(ins.len(), 2);
        assert!(outs.iter().all(|d| d.warehouse_id == doc.warehouse_id));
        assert!(ins.iter().all(|d| d.warehouse_id == dest));
    }
}
