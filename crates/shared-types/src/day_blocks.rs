//! Day layout rules shared by the server and its clients.
//!
//! A day is partitioned into contiguous hourly blocks: sorted by start hour,
//! each block ends exactly where the next one starts. Nothing here touches
//! storage; the server validates every candidate layout with
//! [`validate_layout`] and clients use [`resize`] to keep a layout contiguous
//! while the user drags a boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Earliest hour a block may start at.
pub const DAY_START_HOUR: i32 = 0;
/// Latest hour a block may end at.
pub const DAY_END_HOUR: i32 = 24;

const WEEKDAY_BOUNDARIES: &[i32] = &[8, 11, 12, 15, 16, 19, 20, 22];
const WEEKEND_BOUNDARIES: &[i32] = &[8, 11, 14, 16, 18];

/// A half-open `[start_hour, end_hour)` interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourSpan {
    pub start_hour: i32,
    pub end_hour: i32,
}

impl HourSpan {
    pub fn new(start_hour: i32, end_hour: i32) -> Self {
        HourSpan {
            start_hour,
            end_hour,
        }
    }
}

/// Anything carrying a mutable hour span.
pub trait HourRange {
    fn start_hour(&self) -> i32;
    fn end_hour(&self) -> i32;
    fn set_start_hour(&mut self, hour: i32);
    fn set_end_hour(&mut self, hour: i32);

    fn span(&self) -> HourSpan {
        HourSpan::new(self.start_hour(), self.end_hour())
    }
}

impl HourRange for HourSpan {
    fn start_hour(&self) -> i32 {
        self.start_hour
    }

    fn end_hour(&self) -> i32 {
        self.end_hour
    }

    fn set_start_hour(&mut self, hour: i32) {
        self.start_hour = hour;
    }

    fn set_end_hour(&mut self, hour: i32) {
        self.end_hour = hour;
    }
}

/// Predefined block layouts used to seed or reset a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayTemplate {
    #[default]
    Weekday,
    Weekend,
}

impl DayTemplate {
    pub fn as_str(&self) -> &str {
        match self {
            DayTemplate::Weekday => "weekday",
            DayTemplate::Weekend => "weekend",
        }
    }

    /// Only `"weekend"` selects the weekend layout; every other name, or no
    /// name at all, falls back to the weekday layout.
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("weekend") => DayTemplate::Weekend,
            _ => DayTemplate::Weekday,
        }
    }

    pub fn boundaries(&self) -> &'static [i32] {
        match self {
            DayTemplate::Weekday => WEEKDAY_BOUNDARIES,
            DayTemplate::Weekend => WEEKEND_BOUNDARIES,
        }
    }

    /// The template's blocks in order; index doubles as sort order.
    pub fn spans(&self) -> Vec<HourSpan> {
        self.boundaries()
            .windows(2)
            .map(|pair| HourSpan::new(pair[0], pair[1]))
            .collect()
    }
}

/// Which edge of a block is being moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("Invalid schedule: a day needs at least one block")]
    Empty,

    #[error("Block {position}: start time must be before end time ({start_hour} >= {end_hour})")]
    EmptySpan {
        position: usize,
        start_hour: i32,
        end_hour: i32,
    },

    #[error("Block {position}: hours must lie within {}..={}", DAY_START_HOUR, DAY_END_HOUR)]
    OutOfDay { position: usize },

    #[error("Invalid schedule: blocks must be continuous with no gap or overlap (block ends at {end_hour}, next starts at {next_start_hour})")]
    GapOrOverlap { end_hour: i32, next_start_hour: i32 },

    #[error("Block {position} does not exist in this day")]
    NoSuchBlock { position: usize },

    #[error("The {0} of the day is fixed")]
    FixedAnchor(&'static str),
}

/// Check that `blocks` form a contiguous, non-overlapping day.
///
/// Candidates are considered in start-hour order regardless of input order.
/// Positions in errors are 1-based within that order.
pub fn validate_layout<B: HourRange>(blocks: &[B]) -> Result<(), LayoutError> {
    if blocks.is_empty() {
        return Err(LayoutError::Empty);
    }

    let mut spans: Vec<HourSpan> = blocks.iter().map(HourRange::span).collect();
    spans.sort_by_key(|span| span.start_hour);

    for (idx, span) in spans.iter().enumerate() {
        let position = idx + 1;
        if span.start_hour < DAY_START_HOUR || span.end_hour > DAY_END_HOUR {
            return Err(LayoutError::OutOfDay { position });
        }
        if span.start_hour >= span.end_hour {
            return Err(LayoutError::EmptySpan {
                position,
                start_hour: span.start_hour,
                end_hour: span.end_hour,
            });
        }
    }

    for pair in spans.windows(2) {
        if pair[0].end_hour != pair[1].start_hour {
            return Err(LayoutError::GapOrOverlap {
                end_hour: pair[0].end_hour,
                next_start_hour: pair[1].start_hour,
            });
        }
    }

    Ok(())
}

/// Move one boundary of `blocks[index]` to `hour`, dragging the neighbouring
/// block's opposite boundary along so the day stays contiguous.
///
/// `blocks` must already be sorted by start hour. The first block's start and
/// the last block's end anchor the day and cannot be moved. The result is not
/// validated; run [`validate_layout`] before submitting it.
pub fn resize<B: HourRange>(
    blocks: &mut [B],
    index: usize,
    boundary: Boundary,
    hour: i32,
) -> Result<(), LayoutError> {
    let last = match blocks.len().checked_sub(1) {
        Some(last) if index <= last => last,
        _ => {
            return Err(LayoutError::NoSuchBlock {
                position: index + 1,
            })
        }
    };

    match boundary {
        Boundary::Start => {
            if index == 0 {
                return Err(LayoutError::FixedAnchor("start"));
            }
            blocks[index - 1].set_end_hour(hour);
            blocks[index].set_start_hour(hour);
        }
        Boundary::End => {
            if index == last {
                return Err(LayoutError::FixedAnchor("end"));
            }
            blocks[index + 1].set_start_hour(hour);
            blocks[index].set_end_hour(hour);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weekday() -> Vec<HourSpan> {
        DayTemplate::Weekday.spans()
    }

    #[test]
    fn test_weekday_template_covers_eight_to_ten() {
        let spans = weekday();
        assert_eq!(spans.len(), 7);
        assert_eq!(spans.first().map(|s| s.start_hour), Some(8));
        assert_eq!(spans.last().map(|s| s.end_hour), Some(22));
        assert_eq!(spans[2], HourSpan::new(12, 15));
        assert!(validate_layout(&spans).is_ok());
    }

    #[test]
    fn test_weekend_template_covers_eight_to_six() {
        let spans = DayTemplate::Weekend.spans();
        assert_eq!(
            spans,
            vec![
                HourSpan::new(8, 11),
                HourSpan::new(11, 14),
                HourSpan::new(14, 16),
                HourSpan::new(16, 18),
            ]
        );
        assert!(validate_layout(&spans).is_ok());
    }

    #[test]
    fn test_template_from_name() {
        assert_eq!(DayTemplate::from_name(Some("weekend")), DayTemplate::Weekend);
        assert_eq!(DayTemplate::from_name(Some("weekday")), DayTemplate::Weekday);
        assert_eq!(DayTemplate::from_name(Some("holiday")), DayTemplate::Weekday);
        assert_eq!(DayTemplate::from_name(None), DayTemplate::Weekday);
    }

    #[test]
    fn test_validate_ignores_input_order() {
        let mut spans = weekday();
        spans.reverse();
        assert!(validate_layout(&spans).is_ok());
    }

    #[test]
    fn test_validate_rejects_gap() {
        let mut spans = weekday();
        spans[2].end_hour = 14;

        let err = validate_layout(&spans).unwrap_err();
        assert_eq!(
            err,
            LayoutError::GapOrOverlap {
                end_hour: 14,
                next_start_hour: 15
            }
        );
        assert!(err.to_string().contains("gap or overlap"));
    }

    #[test]
    fn test_validate_rejects_overlap() {
        let mut spans = weekday();
        spans[0].end_hour = 12;
        assert!(matches!(
            validate_layout(&spans),
            Err(LayoutError::GapOrOverlap { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_inverted_block() {
        let spans = vec![HourSpan::new(8, 11), HourSpan::new(11, 11)];
        assert_eq!(
            validate_layout(&spans),
            Err(LayoutError::EmptySpan {
                position: 2,
                start_hour: 11,
                end_hour: 11
            })
        );
    }

    #[test]
    fn test_validate_rejects_hours_outside_day() {
        let spans = vec![HourSpan::new(20, 25)];
        assert_eq!(
            validate_layout(&spans),
            Err(LayoutError::OutOfDay { position: 1 })
        );
    }

    #[test]
    fn test_validate_rejects_empty_day() {
        let spans: Vec<HourSpan> = Vec::new();
        assert_eq!(validate_layout(&spans), Err(LayoutError::Empty));
    }

    #[test]
    fn test_resize_end_moves_next_start() {
        let mut spans = weekday();
        resize(&mut spans, 2, Boundary::End, 14).unwrap();

        assert_eq!(spans[2], HourSpan::new(12, 14));
        assert_eq!(spans[3], HourSpan::new(14, 16));
        assert!(validate_layout(&spans).is_ok());
    }

    #[test]
    fn test_resize_start_moves_previous_end() {
        let mut spans = weekday();
        resize(&mut spans, 4, Boundary::Start, 17).unwrap();

        assert_eq!(spans[3], HourSpan::new(15, 17));
        assert_eq!(spans[4], HourSpan::new(17, 19));
        assert!(validate_layout(&spans).is_ok());
    }

    #[test]
    fn test_resize_refuses_anchors() {
        let mut spans = weekday();
        assert_eq!(
            resize(&mut spans, 0, Boundary::Start, 7),
            Err(LayoutError::FixedAnchor("start"))
        );
        assert_eq!(
            resize(&mut spans, 6, Boundary::End, 23),
            Err(LayoutError::FixedAnchor("end"))
        );
        assert_eq!(spans, weekday());
    }

    #[test]
    fn test_resize_past_neighbour_is_caught_by_validation() {
        let mut spans = weekday();
        // 11-12 block swallowed entirely: coupling still applies, validation rejects
        resize(&mut spans, 0, Boundary::End, 13).unwrap();
        assert_eq!(spans[1], HourSpan::new(13, 12));
        assert!(matches!(
            validate_layout(&spans),
            Err(LayoutError::EmptySpan { .. })
        ));
    }

    #[test]
    fn test_resize_unknown_index() {
        let mut spans = weekday();
        assert_eq!(
            resize(&mut spans, 9, Boundary::End, 12),
            Err(LayoutError::NoSuchBlock { position: 10 })
        );
    }
}
