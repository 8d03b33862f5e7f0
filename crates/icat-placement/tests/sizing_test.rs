//! Sizing and argument parsing behaviour of placements

use icat_graphics::MAX_CELLS;
use icat_placement::{parse_cell_count, CellExtent, PlacementError, PlacementSizer};
use icat_tty::TerminalSize;
use proptest::prelude::*;
use test_case::test_case;

/// 10x10 px cells
fn terminal() -> TerminalSize {
    TerminalSize::new(40, 120, 1200, 400)
}

#[test_case("1" => Some(1); "smallest")]
#[test_case("42" => Some(42); "plain number")]
#[test_case("297" => Some(297); "largest")]
#[test_case("0297" => Some(297); "leading zero")]
#[test_case("0" => None; "zero")]
#[test_case("298" => None; "over the cell limit")]
#[test_case("-3" => None; "negative")]
#[test_case("+3" => None; "explicit sign")]
#[test_case(" 3" => None; "whitespace")]
#[test_case("3.5" => None; "fraction")]
#[test_case("abc" => None; "not a number")]
#[test_case("" => None; "empty")]
#[test_case("99999999999999999999" => None; "overflow")]
fn test_parse_cell_count(input: &str) -> Option<u16> {
    match parse_cell_count(input) {
        Ok(n) => Some(n),
        Err(PlacementError::InvalidGeometry(_)) => None,
        Err(e) => panic!("Unexpected error: {e}"),
    }
}

#[test_case(500, 250, None, Some(5) => CellExtent { columns: 10, rows: 5 }; "rows only")]
#[test_case(500, 250, Some(30), None => CellExtent { columns: 30, rows: 15 }; "columns only")]
#[test_case(500, 250, None, None => CellExtent { columns: 10, rows: 5 }; "default rows")]
#[test_case(500, 250, Some(4), Some(40) => CellExtent { columns: 4, rows: 40 }; "both given")]
#[test_case(100, 1000, None, Some(10) => CellExtent { columns: 1, rows: 10 }; "tall image")]
fn test_size_table(
    width: u32,
    height: u32,
    columns: Option<u16>,
    rows: Option<u16>,
) -> CellExtent {
    PlacementSizer::default()
        .size(width, height, &terminal(), columns, rows)
        .unwrap()
}

#[test]
fn test_error_messages_name_the_input() {
    let err = parse_cell_count("12x").unwrap_err();
    assert!(err.to_string().contains("\"12x\""), "{err}");
}

proptest! {
    /// With only rows given, the derived column count follows the image's
    /// aspect ratio to within rounding.
    #[test]
    fn prop_rows_override_preserves_aspect(
        width in 1u32..4000,
        height in 1u32..4000,
        rows in 1u16..60,
    ) {
        let extent = PlacementSizer::default()
            .size(width, height, &terminal(), None, Some(rows))
            .unwrap();

        prop_assert_eq!(extent.rows, rows);
        let exact = f64::from(rows) * f64::from(width) / f64::from(height);
        let columns = f64::from(extent.columns);
        if exact < 1.0 {
            prop_assert_eq!(extent.columns, 1);
        } else if exact > f64::from(MAX_CELLS) {
            prop_assert_eq!(extent.columns, MAX_CELLS);
        } else {
            prop_assert!((columns - exact).abs() <= 0.5 + 1e-6, "{} vs {}", columns, exact);
        }
    }

    #[test]
    fn prop_extent_is_always_in_range(
        width in 1u32..100_000,
        height in 1u32..100_000,
        columns in proptest::option::of(1u16..=297),
        rows in proptest::option::of(1u16..=297),
    ) {
        let extent = PlacementSizer::default()
            .size(width, height, &terminal(), columns, rows)
            .unwrap();
        prop_assert!((1..=MAX_CELLS).contains(&extent.columns));
        prop_assert!((1..=MAX_CELLS).contains(&extent.rows));
    }
}
