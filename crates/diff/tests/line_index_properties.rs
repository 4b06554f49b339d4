//! Property-based coverage for the diff iterator's line-index monotonicity
//! and windowing invariants (spec.md §8), grounded on
//! `core-render/tests/scheduler_properties.rs`'s `proptest!` style.

use proptest::prelude::*;

use viewer_diff::{
    iterate, ChangeRun, DiffStyle, Expansion, FileContents, FileDiff, FileStatus, Hunk, HunkRun,
    LineRecord, ViewWindow,
};

fn sample_diff(leading: usize, trailing: usize) -> FileDiff {
    let del_total = leading + 2 + trailing;
    let add_total = leading + 3 + trailing;
    let deletion_lines: Vec<String> = (0..del_total).map(|i| format!("d{i}")).collect();
    let addition_lines: Vec<String> = (0..add_total).map(|i| format!("a{i}")).collect();
    let hunk = Hunk {
        deletion_start: leading,
        deletion_count: 2,
        addition_start: leading,
        addition_count: 3,
        deletion_line_index: leading,
        addition_line_index: leading,
        unified_line_start: 0,
        unified_line_count: 5,
        split_line_start: 0,
        split_line_count: 3,
        collapsed_before: leading,
        hunk_content: vec![HunkRun::Change(ChangeRun {
            deletion_start: leading,
            deletion_count: 2,
            addition_start: leading,
            addition_count: 3,
        })],
        deletion_no_newline_at_eof: false,
        addition_no_newline_at_eof: false,
    };
    FileDiff {
        old: FileContents::new("f", "old"),
        new: FileContents::new("f", "new"),
        hunks: vec![hunk],
        addition_lines,
        deletion_lines,
        is_partial: false,
        file_status: FileStatus::Modified,
        old_path: None,
    }
}

proptest! {
    // Every emitted row's unified/split line index strictly increases over
    // the previous row, regardless of how much leading/trailing context
    // surrounds the hunk.
    #[test]
    fn line_indices_strictly_increase(leading in 0usize..30, trailing in 0usize..30) {
        let diff = sample_diff(leading, trailing);
        let mut records: Vec<LineRecord> = Vec::new();

        iterate(&diff, DiffStyle::Unified, None, &Expansion::All, 0, &mut |record| {
            records.push(record);
            false
        }).unwrap();

        let mut last_unified: Option<usize> = None;
        let mut last_split: Option<usize> = None;
        for record in &records {
            let meta = record.addition_line.or(record.deletion_line).unwrap();
            if let Some(prev) = last_unified {
                prop_assert!(meta.unified_line_index > prev);
            }
            if let Some(prev) = last_split {
                prop_assert!(meta.split_line_index > prev);
            }
            last_unified = Some(meta.unified_line_index);
            last_split = Some(meta.split_line_index);
        }
    }

    // A window's emitted rows are exactly the ones `spec.md` §4.1's
    // half-open `[starting_line, starting_line + total_lines)` describes:
    // no more, no fewer, than the full unwindowed walk's row count allows.
    #[test]
    fn windowed_row_count_never_exceeds_total_lines(
        leading in 0usize..20,
        trailing in 0usize..20,
        start in 0usize..10,
        len in 1usize..10,
    ) {
        let diff = sample_diff(leading, trailing);
        let mut windowed_count = 0usize;
        iterate(
            &diff,
            DiffStyle::Unified,
            Some(ViewWindow::new(start, Some(len))),
            &Expansion::All,
            0,
            &mut |_| {
                windowed_count += 1;
                false
            },
        ).unwrap();
        prop_assert!(windowed_count <= len);
    }
}
