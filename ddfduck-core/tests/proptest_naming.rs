//! Property-based tests for naming, filename parsing and grouping.

use proptest::prelude::*;

use ddfduck_core::annotate::column_comment;
use ddfduck_core::grouping::{group_datapoints, parse_datapoint_filename};
use ddfduck_core::naming::{TableKind, escape_literal, sanitize_table_name};
use ddfduck_core::{Concept, DatapointSignature};

fn ident() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,12}"
}

// --- Table names ---

proptest! {
    #[test]
    fn sanitize_is_idempotent(name in "\\PC{0,40}") {
        let once = sanitize_table_name(&name);
        prop_assert_eq!(sanitize_table_name(&once), once);
    }

    #[test]
    fn sanitize_output_is_a_plain_identifier(name in "\\PC{0,40}") {
        let out = sanitize_table_name(&name);
        prop_assert!(out.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        prop_assert!(!out.starts_with(|c: char| c.is_ascii_digit()));
    }

    #[test]
    fn escaped_literal_has_no_lone_quotes(text in "\\PC{0,40}") {
        let escaped = escape_literal(&text);
        prop_assert_eq!(escaped.replace("''", ""), text.replace('\'', ""));
    }

    #[test]
    fn table_kind_follows_prefix(suffix in ident()) {
        prop_assert_eq!(TableKind::of(&format!("entities_{suffix}")), TableKind::Entity);
        prop_assert_eq!(TableKind::of(&format!("datapoints_{suffix}")), TableKind::Datapoint);
        prop_assert_eq!(TableKind::of(&format!("metadata_{suffix}")), TableKind::Metadata);
    }
}

// --- Datapoint file names ---

proptest! {
    #[test]
    fn datapoint_filename_round_trips_signature(
        indicator in ident(),
        dims in prop::collection::vec(ident(), 0..4),
    ) {
        prop_assume!(indicator != "by");
        let filename = if dims.is_empty() {
            format!("ddf--datapoints--{indicator}.csv")
        } else {
            format!("ddf--datapoints--{indicator}--by--{}.csv", dims.join("--"))
        };
        let sig = parse_datapoint_filename(&filename);
        prop_assert_eq!(sig, DatapointSignature { indicator, dimensions: dims });
    }

    #[test]
    fn foreign_filename_keeps_whole_stem(stem in "[a-z][a-z0-9_]{0,20}") {
        let sig = parse_datapoint_filename(&format!("{stem}.csv"));
        prop_assert_eq!(&sig.indicator, &stem);
        prop_assert!(sig.dimensions.is_empty());
        prop_assert_eq!(sig.group_key(), stem);
    }

    #[test]
    fn grouping_partitions_all_files(
        indicators in prop::collection::vec(ident(), 1..6),
        copies in 1usize..4,
    ) {
        let mut files = Vec::new();
        for (i, indicator) in indicators.iter().enumerate() {
            for c in 0..copies {
                files.push(format!("d{i}_{c}/ddf--datapoints--{indicator}--by--geo--time.csv"));
            }
        }

        let groups = group_datapoints(&files);
        let total: usize = groups.iter().map(|g| g.files.len()).sum();
        prop_assert_eq!(total, files.len());

        let keys: Vec<_> = groups.iter().map(|g| g.key.clone()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(keys, sorted);
    }

    #[test]
    fn dimension_order_changes_group(a in "[a-z]{1,8}", b in "[a-z]{1,8}", indicator in ident()) {
        prop_assume!(a != b && indicator != "by");
        let files = vec![
            format!("ddf--datapoints--{indicator}--by--{a}--{b}.csv"),
            format!("ddf--datapoints--{indicator}--by--{b}--{a}.csv"),
        ];
        prop_assert_eq!(group_datapoints(&files).len(), 2);
    }
}

// --- Column comments ---

proptest! {
    #[test]
    fn column_comment_starts_with_name(
        name in "[A-Za-z ]{1,20}",
        description in "[A-Za-z ]{0,30}",
        unit in "[a-z]{0,8}",
    ) {
        let concept = Concept {
            name: name.clone(),
            description,
            unit: unit.clone(),
            ..Concept::bare("x")
        };
        let comment = column_comment(&concept);
        prop_assert!(comment.starts_with(&name));
        prop_assert_eq!(comment.contains("(Unit: "), !unit.is_empty());
    }
}
