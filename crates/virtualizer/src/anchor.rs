//! Scroll anchor capture/restore (`spec.md` §4.5 "Scroll anchor"): preserves
//! the user's visual position across DOM mutations that change heights,
//! since upstream height *estimates* can be wrong and only get corrected
//! once rows are actually measured.

use viewer_ast::LineIndex;

use crate::instance_trait::VirtualInstance;
use viewer_instance::InstanceId;

/// Either a concrete mounted row to track, or (when no row is a good
/// candidate) a fallback to the instance's own top/bottom edge.
#[derive(Debug, Clone, Copy, PartialEq)]
enum AnchorTarget {
    Row(LineIndex),
    FileEdge,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollAnchor {
    instance_id: InstanceId,
    target: AnchorTarget,
    absolute_offset: f64,
}

/// Picks the visible instance whose top is closest to, but not above, the
/// viewport top, then that instance's topmost mounted data row. Falls back
/// to the instance's file top (or bottom, if the whole file is already
/// above the viewport) when no row is mounted yet.
pub fn capture_anchor(instances: &[&dyn VirtualInstance], viewport_top: f64) -> Option<ScrollAnchor> {
    let visible: Vec<&&dyn VirtualInstance> = instances.iter().filter(|i| i.is_visible()).collect();
    if visible.is_empty() {
        return None;
    }

    let candidate = visible
        .iter()
        .filter(|i| i.file_top() <= viewport_top)
        .max_by(|a, b| a.file_top().partial_cmp(&b.file_top()).unwrap())
        .or_else(|| visible.iter().min_by(|a, b| a.file_top().partial_cmp(&b.file_top()).unwrap()))?;

    match candidate.topmost_data_row() {
        Some(line_index) => {
            let offset = candidate.row_offset_from_top(line_index)?;
            Some(ScrollAnchor {
                instance_id: candidate.id(),
                target: AnchorTarget::Row(line_index),
                absolute_offset: candidate.file_top() + offset,
            })
        }
        None => {
            let file_bottom = candidate.file_top() + candidate.file_height();
            let edge = if file_bottom < viewport_top { file_bottom } else { candidate.file_top() };
            Some(ScrollAnchor {
                instance_id: candidate.id(),
                target: AnchorTarget::FileEdge,
                absolute_offset: edge,
            })
        }
    }
}

/// After rendering, finds the same row (or edge) and returns how far it
/// moved — `0.0` if it didn't move, or if the anchor's instance is gone.
pub fn restore_delta(anchor: &ScrollAnchor, instances: &[&dyn VirtualInstance]) -> f64 {
    let Some(instance) = instances.iter().find(|i| i.id() == anchor.instance_id) else {
        return 0.0;
    };

    let new_absolute = match anchor.target {
        AnchorTarget::Row(line_index) => match instance.row_offset_from_top(line_index) {
            Some(offset) => instance.file_top() + offset,
            None => return 0.0,
        },
        AnchorTarget::FileEdge => instance.file_top(),
    };

    new_absolute - anchor.absolute_offset
}
