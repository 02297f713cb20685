use market_lens_core::opportunity::PriorityLabel;
use market_lens_core::white_space::{
    detect_white_space, prioritize_white_space, white_space_table, WhiteSpaceRow,
    WHITE_SPACE_COLUMNS,
};
use market_lens_core::{CellValue, Table};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Fixtures
// ===========================================================================

/// Transaction-level purchases: (manufacturer, hospital, city, quantity).
fn purchases() -> Table {
    let rows: Vec<Vec<CellValue>> = [
        ("Target Co", "H1", "Suzhou", dec!(120)),
        ("Rival A", "H1", "Suzhou", dec!(280)),
        ("Rival B", "H2", "Suzhou", dec!(100)),
        ("Target Co", "H3", "Wuxi", dec!(10)),
        ("Rival A", "H3", "Wuxi", dec!(190)),
        ("Rival B", "H4", "Nanjing", dec!(900)),
        ("Target Co", "H5", "Changzhou", dec!(75)),
        ("Rival A", "H5", "Changzhou", dec!(-40)),
        ("Rival A", "H6", "Changzhou", dec!(25)),
    ]
    .iter()
    .map(|(m, h, c, q)| {
        vec![
            CellValue::from(*m),
            CellValue::from(*h),
            CellValue::from(*c),
            (*q).into(),
        ]
    })
    .collect();
    Table::new(
        vec![
            "manufacturer".into(),
            "hospital".into(),
            "city".into(),
            "quantity".into(),
        ],
        rows,
    )
    .unwrap()
}

fn city_gaps() -> Vec<WhiteSpaceRow> {
    detect_white_space(&purchases(), "manufacturer", "city", "quantity", "Target Co")
}

// ===========================================================================
// Detection
// ===========================================================================

#[test]
fn test_city_white_space() {
    let rows = city_gaps();
    let expected = vec![
        WhiteSpaceRow {
            entity_id: "Nanjing".into(),
            grouping_total: dec!(900),
            target_captured_volume: Decimal::ZERO,
            target_share: Decimal::ZERO,
        },
        WhiteSpaceRow {
            entity_id: "Wuxi".into(),
            grouping_total: dec!(200),
            target_captured_volume: dec!(10),
            target_share: dec!(5),
        },
        WhiteSpaceRow {
            entity_id: "Suzhou".into(),
            grouping_total: dec!(500),
            target_captured_volume: dec!(120),
            target_share: dec!(24),
        },
        WhiteSpaceRow {
            entity_id: "Changzhou".into(),
            grouping_total: dec!(100),
            target_captured_volume: dec!(75),
            target_share: dec!(75),
        },
    ];
    assert_eq!(rows, expected);
}

#[test]
fn test_target_name_is_trimmed() {
    let padded = detect_white_space(&purchases(), "manufacturer", "city", "quantity", "  Target Co ");
    assert_eq!(padded, city_gaps());
}

#[test]
fn test_shares_bounded() {
    for grouping in ["city", "hospital"] {
        for row in detect_white_space(&purchases(), "manufacturer", grouping, "quantity", "Target Co") {
            assert!(row.target_share >= Decimal::ZERO && row.target_share <= dec!(100));
            assert!(row.target_captured_volume <= row.grouping_total);
        }
    }
}

#[test]
fn test_missing_metric_column() {
    assert!(detect_white_space(&purchases(), "manufacturer", "city", "amount", "Target Co").is_empty());
}

// ===========================================================================
// Export and ranking
// ===========================================================================

#[test]
fn test_export_columns() {
    let table = white_space_table(&city_gaps()).unwrap();
    assert_eq!(table.columns(), &WHITE_SPACE_COLUMNS);
    assert_eq!(table.len(), 4);
    assert_eq!(table.cell(1, 3), &CellValue::Number(dec!(5)));
}

#[test]
fn test_prioritized_cities() {
    let ranked = prioritize_white_space(&city_gaps(), 3);
    assert_eq!(ranked.len(), 3);
    for r in &ranked {
        let source = city_gaps().into_iter().find(|g| g.entity_id == r.entity_id).unwrap();
        assert_eq!(r.total_volume, source.grouping_total);
        assert_eq!(r.current_share, source.target_share);
        assert_eq!(r.target_volume, Some(source.target_captured_volume));
    }
    // Nanjing has no foothold at all, so its feasibility and composite are zero
    assert!(ranked.iter().all(|r| r.entity_id != "Nanjing"
        || (r.composite_score.is_zero() && r.priority_label == PriorityLabel::Watch)));
}

#[test]
fn test_prioritize_empty_rows() {
    assert!(prioritize_white_space(&[], 10).is_empty());
}
