//! Highway geometry derived from the display area.
//!
//! Notes spawn at the right edge and travel left towards the perfect line.
//! The time a note needs to reach the perfect line depends only on the note
//! pace setting, never on the window width: a wider window makes notes
//! faster, not slower to arrive.

use serde::{Deserialize, Serialize};

use hero_domain::song_data::DEFAULT_NOTE_PACE;
use hero_domain::LANE_COUNT;

/// Seconds from spawn to the perfect line at the default note pace.
pub const TIME_TO_REACH_END_SECONDS: f32 = 3.0;
/// Perfect line as a fraction of width from the left edge.
pub const PERFECT_POSITION_FRACTION: f32 = 0.15;
pub const LANE_SPACING: f32 = 4.0;

/// Half-width of each judgment window in milliseconds.
pub const PERFECT_TOLERANCE_MS: f32 = 33.0;
pub const GREAT_TOLERANCE_MS: f32 = 92.0;
pub const GOOD_TOLERANCE_MS: f32 = 142.0;
pub const BOO_TOLERANCE_MS: f32 = 225.0;

/// Hit feedback labels rise at this speed for their whole lifetime.
pub const FEEDBACK_LIFETIME_SECONDS: f32 = 0.9;
pub const FEEDBACK_RISE_PER_SECOND: f32 = 40.0;
const VERTICAL_PADDING_FRACTION: f32 = 0.5;

const MIN_DIMENSION: f32 = 1.0;

/// Closed position interval `[start, end]` on the x axis.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct TimingWindow {
    pub start: f32,
    pub end: f32,
}

impl TimingWindow {
    fn around(center: f32, tolerance_ms: f32, speed: f32) -> Self {
        let half_width = tolerance_ms / 1000.0 * speed;
        Self {
            start: center - half_width,
            end: center + half_width,
        }
    }

    pub fn contains(&self, position: f32) -> bool {
        position >= self.start && position <= self.end
    }

    pub fn width(&self) -> f32 {
        self.end - self.start
    }
}

/// The four nested judgment windows, tightest first.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct TimingWindows {
    pub perfect: TimingWindow,
    pub great: TimingWindow,
    pub good: TimingWindow,
    pub boo: TimingWindow,
}

impl TimingWindows {
    pub fn at_speed(perfect_x: f32, travel_speed: f32) -> Self {
        Self {
            perfect: TimingWindow::around(perfect_x, PERFECT_TOLERANCE_MS, travel_speed),
            great: TimingWindow::around(perfect_x, GREAT_TOLERANCE_MS, travel_speed),
            good: TimingWindow::around(perfect_x, GOOD_TOLERANCE_MS, travel_speed),
            boo: TimingWindow::around(perfect_x, BOO_TOLERANCE_MS, travel_speed),
        }
    }

    /// Left edge of the widest window. Unhit notes past it are misses.
    pub fn late_edge(&self) -> f32 {
        self.boo.start
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct WindowInfo {
    pub width: f32,
    pub height: f32,
    pub lane_count: usize,
    pub has_queue_lane: bool,
    pub note_width: f32,
    pub note_height: f32,
    pub lane_spacing: f32,
    pub vertical_padding: f32,
    pub spawn_x: f32,
    pub perfect_x: f32,
    pub destroy_x: f32,
    /// Pixels per second of wall-clock time.
    pub travel_speed: f32,
    pub windows: TimingWindows,
}

impl WindowInfo {
    /// Pure function of its inputs; pace is clamped to the accepted range by
    /// the caller through `SongData::effective_note_pace`.
    pub fn calculate(width: f32, height: f32, note_pace: i32, show_queue_lane: bool) -> Self {
        let width = sanitize(width);
        let height = sanitize(height);
        let lane_count = if show_queue_lane {
            LANE_COUNT + 1
        } else {
            LANE_COUNT
        };

        let vertical_padding =
            FEEDBACK_RISE_PER_SECOND * FEEDBACK_LIFETIME_SECONDS * VERTICAL_PADDING_FRACTION;
        let usable = height - 2.0 * vertical_padding - LANE_SPACING * (lane_count - 1) as f32;
        let note_height = (usable / lane_count as f32).max(MIN_DIMENSION);
        let note_width = note_height;

        let spawn_x = width;
        let perfect_x = width * PERFECT_POSITION_FRACTION;
        let pace_scale = note_pace.max(1) as f32 / DEFAULT_NOTE_PACE as f32;
        let travel_speed = (spawn_x - perfect_x) / TIME_TO_REACH_END_SECONDS * pace_scale;
        let windows = TimingWindows::at_speed(perfect_x, travel_speed);
        let destroy_x = (-note_width).min(windows.late_edge() - MIN_DIMENSION);

        Self {
            width,
            height,
            lane_count,
            has_queue_lane: show_queue_lane,
            note_width,
            note_height,
            lane_spacing: LANE_SPACING,
            vertical_padding,
            spawn_x,
            perfect_x,
            destroy_x,
            travel_speed,
            windows,
        }
    }

    /// Top edge of a note lane. The queue lane, when shown, sits above lane 0.
    pub fn lane_y(&self, lane: usize) -> f32 {
        let row = if self.has_queue_lane { lane + 1 } else { lane };
        self.row_y(row)
    }

    pub fn queue_lane_y(&self) -> Option<f32> {
        self.has_queue_lane.then(|| self.row_y(0))
    }

    fn row_y(&self, row: usize) -> f32 {
        self.vertical_padding + row as f32 * (self.note_height + self.lane_spacing)
    }

    pub fn seconds_to_perfect(&self) -> f32 {
        (self.spawn_x - self.perfect_x) / self.travel_speed
    }

    /// Keeps a note inside the travel range after a resize.
    pub fn clamp_position(&self, position: f32) -> f32 {
        position.clamp(self.destroy_x, self.spawn_x)
    }
}

fn sanitize(dimension: f32) -> f32 {
    if dimension.is_finite() {
        dimension.max(MIN_DIMENSION)
    } else {
        MIN_DIMENSION
    }
}
