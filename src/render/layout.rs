//! Layout collaborator interface and the lane-based reference layout.
//! The scheduler tells the layout what is on stage; the layout decides where it goes.

use serde::Deserialize;

use crate::core::comment::{Comment, MotionMode};
use crate::core::time::Time;

/// A comment placed on the stage at snapshot time.
/// Coordinates are in stage pixels, origin top-left, `x`/`y` at the comment's top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub comment: Comment,
    pub x: f64,
    pub y: f64,
    pub width: f64,
}

/// Renderable state of the overlay at one virtual time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub time: Time,
    pub width: u32,
    pub height: u32,
    /// Back to front.
    pub items: Vec<Placement>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Arranges active comments on the stage.
///
/// `feed` is called on every frame a comment is visited while on stage, so a
/// repeated feed means "still active", not "new comment".
pub trait Layout: Send {
    /// Stage dimensions changed.
    fn set_stage_size(&mut self, _width: u32, _height: u32) {}

    /// Drop every active comment (the timeline jumped).
    fn reset(&mut self);

    fn feed(&mut self, comment: &Comment);

    /// Move everything to `now` and describe the result.
    fn advance_and_snapshot(&mut self, now: Time) -> Snapshot;

    /// Number of comments currently on stage.
    fn active_count(&self) -> usize;
}

/// Lane layout parameters
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LaneLayoutConfig {
    /// Height of one lane in pixels.
    pub lane_height: f64,
}

impl Default for LaneLayoutConfig {
    fn default() -> Self {
        Self { lane_height: 28.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LaneGroup {
    Scroll,
    Reverse,
    Top,
    Bottom,
}

impl From<MotionMode> for LaneGroup {
    fn from(mode: MotionMode) -> Self {
        match mode {
            MotionMode::Scroll => LaneGroup::Scroll,
            MotionMode::Reverse => LaneGroup::Reverse,
            MotionMode::Top => LaneGroup::Top,
            MotionMode::Bottom => LaneGroup::Bottom,
        }
    }
}

#[derive(Debug, Clone)]
struct Occupant {
    comment: Comment,
    group: LaneGroup,
    lane: usize,
}

impl Occupant {
    /// Pixels per millisecond for a comment crossing a stage of `stage_width`.
    fn speed(&self, stage_width: f64) -> f64 {
        travel_speed(&self.comment, stage_width)
    }
}

fn travel_speed(comment: &Comment, stage_width: f64) -> f64 {
    if comment.duration() <= 0 {
        return 0.0;
    }
    (stage_width + comment.width()) / comment.duration() as f64
}

/// Splits the stage into horizontal lanes and gives each comment one.
///
/// Scrolling comments share a lane once the previous occupant has fully
/// entered the stage and cannot be caught before it leaves. Pinned comments
/// need an empty lane. With no free lane the least crowded one is reused.
#[derive(Debug, Clone)]
pub struct LaneLayout {
    config: LaneLayoutConfig,
    stage_width: f64,
    stage_height: f64,
    active: Vec<Occupant>,
}

impl LaneLayout {
    pub fn new(config: LaneLayoutConfig) -> Self {
        Self {
            config,
            stage_width: 0.0,
            stage_height: 0.0,
            active: Vec::new(),
        }
    }

    /// Number of lanes that fit on the stage (at least one).
    pub fn lane_count(&self) -> usize {
        if self.config.lane_height <= 0.0 {
            return 1;
        }
        ((self.stage_height / self.config.lane_height).floor() as usize).max(1)
    }

    fn is_active(&self, comment: &Comment) -> bool {
        self.active.iter().any(|o| o.comment.id() == comment.id())
    }

    fn lane_is_free(&self, group: LaneGroup, lane: usize, comment: &Comment) -> bool {
        let mut occupants = self
            .active
            .iter()
            .filter(|o| o.group == group && o.lane == lane);

        match group {
            LaneGroup::Top | LaneGroup::Bottom => occupants.next().is_none(),
            LaneGroup::Scroll | LaneGroup::Reverse => occupants.all(|o| {
                let elapsed = (comment.appear_time() - o.comment.appear_time()) as f64;
                let occupant_speed = o.speed(self.stage_width);
                let entered = occupant_speed * elapsed >= o.comment.width();

                let speed = travel_speed(comment, self.stage_width);
                let caught = speed > occupant_speed
                    && speed > 0.0
                    && (comment.appear_time() as f64 + self.stage_width / speed)
                        < o.comment.end_time() as f64;

                entered && !caught
            }),
        }
    }

    fn choose_lane(&self, comment: &Comment) -> usize {
        let group = LaneGroup::from(comment.mode());
        let lanes = self.lane_count();

        if let Some(lane) = (0..lanes).find(|&lane| self.lane_is_free(group, lane, comment)) {
            return lane;
        }

        (0..lanes)
            .min_by_key(|&lane| {
                self.active
                    .iter()
                    .filter(|o| o.group == group && o.lane == lane)
                    .count()
            })
            .unwrap_or(0)
    }

    fn place(&self, occupant: &Occupant, now: Time) -> Placement {
        let width = occupant.comment.width();
        let elapsed = (now - occupant.comment.appear_time()) as f64;
        let speed = occupant.speed(self.stage_width);
        let lane_top = occupant.lane as f64 * self.config.lane_height;

        let (x, y) = match occupant.group {
            LaneGroup::Scroll => (self.stage_width - speed * elapsed, lane_top),
            LaneGroup::Reverse => (speed * elapsed - width, lane_top),
            LaneGroup::Top => ((self.stage_width - width) / 2.0, lane_top),
            LaneGroup::Bottom => (
                (self.stage_width - width) / 2.0,
                self.stage_height - lane_top - self.config.lane_height,
            ),
        };

        Placement {
            comment: occupant.comment.clone(),
            x,
            y,
            width,
        }
    }
}

impl Default for LaneLayout {
    fn default() -> Self {
        Self::new(LaneLayoutConfig::default())
    }
}

impl Layout for LaneLayout {
    fn set_stage_size(&mut self, width: u32, height: u32) {
        self.stage_width = f64::from(width);
        self.stage_height = f64::from(height);
        let lanes = self.lane_count();
        for occupant in &mut self.active {
            occupant.lane = occupant.lane.min(lanes - 1);
        }
    }

    fn reset(&mut self) {
        self.active.clear();
    }

    fn feed(&mut self, comment: &Comment) {
        if self.is_active(comment) {
            return;
        }
        let lane = self.choose_lane(comment);
        self.active.push(Occupant {
            comment: comment.clone(),
            group: LaneGroup::from(comment.mode()),
            lane,
        });
    }

    fn advance_and_snapshot(&mut self, now: Time) -> Snapshot {
        self.active.retain(|o| o.comment.is_active_at(now));
        let items = self.active.iter().map(|o| self.place(o, now)).collect();

        Snapshot {
            time: now,
            width: self.stage_width as u32,
            height: self.stage_height as u32,
            items,
        }
    }

    fn active_count(&self) -> usize {
        self.active.len()
    }
}
