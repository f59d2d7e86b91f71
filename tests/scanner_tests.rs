// tests/scanner_tests.rs
// Region scanning: kinds, positions, elision of empty regions and errors

use japaya::parser::{scan_bytes, scan_reader, Position, Region, RegionKind, ScanError};
use proptest::prelude::*;

fn region(kind: RegionKind, start: (usize, usize), end: (usize, usize), data: &str) -> Region {
    Region {
        kind,
        start: Position::new(start.0, start.1),
        end: Position::new(end.0, end.1),
        data: data.as_bytes().to_vec(),
    }
}

#[cfg(test)]
mod scanner_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn regions(input: &str) -> Vec<Region> {
        let unit = scan_bytes(input.as_bytes()).expect("scan should succeed");
        assert_eq!(unit.data, input.as_bytes(), "unit keeps the full source");
        unit.regions
    }

    #[test]
    fn test_host_only_is_one_region() {
        assert_eq!(
            regions("class A {}\n"),
            vec![region(RegionKind::Host, (0, 0), (1, 0), "class A {}\n")]
        );
    }

    #[test]
    fn test_statement_only() {
        assert_eq!(
            regions("`x`"),
            vec![region(RegionKind::Statement, (0, 1), (0, 2), "x")]
        );
    }

    #[test]
    fn test_host_statement_host_positions() {
        assert_eq!(
            regions("a `x` b"),
            vec![
                region(RegionKind::Host, (0, 0), (0, 2), "a "),
                region(RegionKind::Statement, (0, 3), (0, 4), "x"),
                region(RegionKind::Host, (0, 5), (0, 7), " b"),
            ]
        );
    }

    #[test]
    fn test_block_spanning_lines() {
        assert_eq!(
            regions("A ```\npy\n``` Z"),
            vec![
                region(RegionKind::Host, (0, 0), (0, 2), "A "),
                region(RegionKind::Block, (0, 5), (2, 0), "\npy\n"),
                region(RegionKind::Host, (2, 3), (2, 5), " Z"),
            ]
        );
    }

    #[test]
    fn test_adjacent_statements_have_no_host_between() {
        assert_eq!(
            regions("`a``b`"),
            vec![
                region(RegionKind::Statement, (0, 1), (0, 2), "a"),
                region(RegionKind::Statement, (0, 4), (0, 5), "b"),
            ]
        );
    }

    #[test]
    fn test_empty_statement_and_block_vanish() {
        assert!(regions("``").is_empty());
        assert!(regions("``````").is_empty());
        assert!(regions("").is_empty());
    }

    #[test]
    fn test_columns_count_bytes() {
        // "é" is two bytes in UTF-8.
        assert_eq!(
            regions("é`x`"),
            vec![
                region(RegionKind::Host, (0, 0), (0, 2), "é"),
                region(RegionKind::Statement, (0, 3), (0, 4), "x"),
            ]
        );
    }

    #[test]
    fn test_newline_inside_statement_moves_lines() {
        assert_eq!(
            regions("`a\nb` c"),
            vec![
                region(RegionKind::Statement, (0, 1), (1, 1), "a\nb"),
                region(RegionKind::Host, (1, 2), (1, 4), " c"),
            ]
        );
    }

    #[test]
    fn test_unterminated_statement_reports_opening() {
        let err = scan_bytes(b"x\n`a").unwrap_err();
        assert_eq!(err.position, Position::new(1, 0));
        assert!(err.message.contains("statement"), "got {:?}", err.message);
    }

    #[test]
    fn test_unterminated_block_reports_opening() {
        let err = scan_bytes(b"```abc").unwrap_err();
        assert_eq!(err.position, Position::new(0, 0));
        assert!(err.message.contains("block"), "got {:?}", err.message);
    }

    #[test]
    fn test_block_closed_by_single_is_unterminated() {
        let err = scan_bytes(b"ok\n  ```print(1)`").unwrap_err();
        assert_eq!(err.position, Position::new(1, 2));
    }

    #[test]
    fn test_parse_error_display_has_position() {
        let err = scan_bytes(b"x\n`a").unwrap_err();
        assert_eq!(
            err.to_string(),
            "parse error at line 1, col 0: unterminated python statement (missing closing `)"
        );
    }

    #[test]
    fn test_scan_reader_matches_scan_bytes() {
        let input = "int x = `1+2`;\n```print('hi')```\n";
        let from_reader = scan_reader(input.as_bytes()).unwrap();
        let from_bytes = scan_bytes(input.as_bytes()).unwrap();
        assert_eq!(from_reader, from_bytes);
    }

    #[test]
    fn test_scan_reader_surfaces_parse_errors() {
        let err = scan_reader("`open".as_bytes()).unwrap_err();
        assert!(matches!(err, ScanError::Parse(_)));
    }
}

#[derive(Debug, Clone)]
enum Piece {
    Host(String),
    Statement(String),
    Block(String),
}

fn piece() -> impl Strategy<Value = Piece> {
    prop_oneof![
        "[a-z {};\n]{1,12}".prop_map(Piece::Host),
        "[a-z0-9+ \n]{1,8}".prop_map(Piece::Statement),
        "[a-z0-9()'` \n]{1,12}"
            .prop_filter("no closing run inside a block", |s| !s.contains("``")
                && !s.ends_with('`')
                && !s.starts_with('`'))
            .prop_map(Piece::Block),
    ]
}

/// Merge neighbouring host pieces, which the scanner reports as one region.
fn normalize(pieces: Vec<Piece>) -> Vec<Piece> {
    let mut out: Vec<Piece> = Vec::new();
    for p in pieces {
        match (out.last_mut(), p) {
            (Some(Piece::Host(prev)), Piece::Host(next)) => prev.push_str(&next),
            (_, p) => out.push(p),
        }
    }
    out
}

fn render(pieces: &[Piece]) -> String {
    pieces
        .iter()
        .map(|p| match p {
            Piece::Host(s) => s.clone(),
            Piece::Statement(s) => format!("`{}`", s),
            Piece::Block(s) => format!("```{}```", s),
        })
        .collect()
}

/// Offset of a position within `input`.
fn offset_of(input: &[u8], pos: Position) -> usize {
    let mut line = 0;
    let mut col = 0;
    for (i, b) in input.iter().enumerate() {
        if line == pos.line && col == pos.column {
            return i;
        }
        if *b == b'\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
    }
    input.len()
}

proptest! {
    #[test]
    fn prop_delimiter_free_input_is_one_host_region(input in "[^`]{1,64}") {
        let unit = scan_bytes(input.as_bytes()).unwrap();
        prop_assert_eq!(unit.regions.len(), 1);
        prop_assert_eq!(unit.regions[0].kind, RegionKind::Host);
        prop_assert_eq!(&unit.regions[0].data, &input.as_bytes().to_vec());
    }

    #[test]
    fn prop_regions_match_the_pieces_they_came_from(pieces in prop::collection::vec(piece(), 0..10)) {
        let pieces = normalize(pieces);
        let input = render(&pieces);
        let unit = scan_bytes(input.as_bytes()).unwrap();

        prop_assert_eq!(unit.regions.len(), pieces.len());
        for (r, p) in unit.regions.iter().zip(&pieces) {
            let (kind, text) = match p {
                Piece::Host(s) => (RegionKind::Host, s),
                Piece::Statement(s) => (RegionKind::Statement, s),
                Piece::Block(s) => (RegionKind::Block, s),
            };
            prop_assert_eq!(r.kind, kind);
            prop_assert_eq!(&r.data, &text.as_bytes().to_vec());
        }
    }

    #[test]
    fn prop_positions_address_the_region_bytes(pieces in prop::collection::vec(piece(), 0..10)) {
        let input = render(&normalize(pieces));
        let bytes = input.as_bytes();
        let unit = scan_bytes(bytes).unwrap();

        let mut last_end = 0;
        for r in &unit.regions {
            let start = offset_of(bytes, r.start);
            let end = offset_of(bytes, r.end);
            prop_assert!(start >= last_end, "regions overlap or go backwards");
            prop_assert!(end > start, "empty region emitted");
            prop_assert_eq!(&bytes[start..end], r.data.as_slice());
            last_end = end;
        }
    }
}
