use crate::assets::loader::DEFAULT_FRAME_DURATION_MS;
use crate::foundation::error::{GifweaveError, GifweaveResult};

/// One timeline cell: either empty or a material placed at an offset.
///
/// "No material" is a typed state, never a sentinel index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FrameSlot {
    #[default]
    Empty,
    Filled {
        material: usize,
        x: i32,
        y: i32,
    },
}

impl FrameSlot {
    pub fn filled(material: usize, x: i32, y: i32) -> Self {
        Self::Filled { material, x, y }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn material(&self) -> Option<usize> {
        match self {
            Self::Empty => None,
            Self::Filled { material, .. } => Some(*material),
        }
    }
}

/// An ordered run of frame-slots sharing a timeline-wide position offset.
#[derive(Clone, Debug, PartialEq)]
pub struct Timeline {
    pub name: String,
    pub offset_x: i32,
    pub offset_y: i32,
    slots: Vec<FrameSlot>,
}

impl Timeline {
    fn new(name: impl Into<String>, slot_count: usize) -> Self {
        Self {
            name: name.into(),
            offset_x: 0,
            offset_y: 0,
            slots: vec![FrameSlot::Empty; slot_count],
        }
    }

    pub fn slots(&self) -> &[FrameSlot] {
        &self.slots
    }

    pub fn slot(&self, frame: usize) -> Option<&FrameSlot> {
        self.slots.get(frame)
    }
}

/// Shared timebase plus N parallel timelines of frame-slots.
///
/// Every mutation below preserves the alignment invariant: each timeline's
/// slot count equals the timebase length, and the main-timeline index stays
/// valid while at least one timeline exists.
#[derive(Clone, Debug, PartialEq)]
pub struct MultiTimeline {
    durations_ms: Vec<u32>,
    timelines: Vec<Timeline>,
    main_index: usize,
    default_duration_ms: u32,
}

impl Default for MultiTimeline {
    fn default() -> Self {
        Self::new("Timeline_1", 0, DEFAULT_FRAME_DURATION_MS)
    }
}

impl MultiTimeline {
    /// Create a model with one timeline and `frame_count` frames of
    /// `default_duration_ms` each.
    pub fn new(
        initial_timeline_name: impl Into<String>,
        frame_count: usize,
        default_duration_ms: u32,
    ) -> Self {
        Self {
            durations_ms: vec![default_duration_ms; frame_count],
            timelines: vec![Timeline::new(initial_timeline_name, frame_count)],
            main_index: 0,
            default_duration_ms,
        }
    }

    // ---- timeline operations ----

    /// Append a timeline padded with empty slots; an empty name becomes
    /// `Timeline_{n}`. Returns the new index.
    pub fn add_timeline(&mut self, name: impl Into<String>) -> usize {
        let mut name = name.into();
        if name.is_empty() {
            name = format!("Timeline_{}", self.timelines.len() + 1);
        }
        self.timelines
            .push(Timeline::new(name, self.durations_ms.len()));
        self.timelines.len() - 1
    }

    /// Remove a timeline. The last remaining timeline cannot be removed; the
    /// main index is clamped back into range if it fell off the end.
    pub fn remove_timeline(&mut self, index: usize) -> GifweaveResult<()> {
        self.check_timeline(index)?;
        if self.timelines.len() == 1 {
            return Err(GifweaveError::validation(
                "cannot remove the last remaining timeline",
            ));
        }
        self.timelines.remove(index);
        if self.main_index >= self.timelines.len() {
            self.main_index = self.timelines.len() - 1;
        }
        Ok(())
    }

    /// Reorder timelines; the main designation follows the moved timeline.
    pub fn move_timeline(&mut self, from: usize, to: usize) -> GifweaveResult<()> {
        self.check_timeline(from)?;
        self.check_timeline(to)?;
        if from == to {
            return Ok(());
        }
        let timeline = self.timelines.remove(from);
        self.timelines.insert(to, timeline);

        if self.main_index == from {
            self.main_index = to;
        } else if from < self.main_index && self.main_index <= to {
            self.main_index -= 1;
        } else if to <= self.main_index && self.main_index < from {
            self.main_index += 1;
        }
        Ok(())
    }

    /// Designate the main timeline. Out-of-range indices are ignored;
    /// callers that care should validate first.
    pub fn set_main_timeline(&mut self, index: usize) {
        if index < self.timelines.len() {
            self.main_index = index;
        }
    }

    pub fn main_index(&self) -> usize {
        self.main_index
    }

    pub fn main_timeline(&self) -> &Timeline {
        &self.timelines[self.main_index]
    }

    pub fn timeline(&self, index: usize) -> Option<&Timeline> {
        self.timelines.get(index)
    }

    pub fn timelines(&self) -> &[Timeline] {
        &self.timelines
    }

    pub fn timeline_count(&self) -> usize {
        self.timelines.len()
    }

    pub fn set_timeline_offset(&mut self, index: usize, x: i32, y: i32) -> GifweaveResult<()> {
        self.check_timeline(index)?;
        self.timelines[index].offset_x = x;
        self.timelines[index].offset_y = y;
        Ok(())
    }

    pub fn rename_timeline(&mut self, index: usize, name: impl Into<String>) -> GifweaveResult<()> {
        self.check_timeline(index)?;
        self.timelines[index].name = name.into();
        Ok(())
    }

    // ---- timebase operations (each propagates to every timeline) ----

    /// Append `count` frames of `duration_ms` (model default when `None`)
    /// and an empty slot to every timeline. `count == 0` is a no-op.
    pub fn add_timebase_frames(&mut self, count: usize, duration_ms: Option<u32>) {
        let position = self.durations_ms.len();
        self.insert_timebase_frames(position, count, duration_ms);
    }

    /// Insert `count` frames at `position` (clamped to `0..=len`), keeping
    /// every timeline aligned.
    pub fn insert_timebase_frames(
        &mut self,
        position: usize,
        count: usize,
        duration_ms: Option<u32>,
    ) {
        if count == 0 {
            return;
        }
        let position = position.min(self.durations_ms.len());
        let duration = duration_ms.unwrap_or(self.default_duration_ms);

        self.durations_ms
            .splice(position..position, std::iter::repeat_n(duration, count));
        for timeline in &mut self.timelines {
            timeline
                .slots
                .splice(position..position, std::iter::repeat_n(FrameSlot::Empty, count));
        }
    }

    /// Remove the frames at `positions` from the timebase and from every
    /// timeline. Positions are removed in descending order so earlier
    /// removals cannot shift later ones; duplicates and out-of-range
    /// positions are ignored.
    pub fn remove_timebase_frames(&mut self, positions: &[usize]) {
        let mut sorted = positions.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();

        for position in sorted {
            if position >= self.durations_ms.len() {
                continue;
            }
            self.durations_ms.remove(position);
            for timeline in &mut self.timelines {
                timeline.slots.remove(position);
            }
        }
    }

    /// Move one frame of the timebase (duration plus every timeline's slot).
    /// Out-of-range indices make this a no-op.
    pub fn move_timebase_frame(&mut self, from: usize, to: usize) {
        let len = self.durations_ms.len();
        if from >= len || to >= len || from == to {
            return;
        }
        let duration = self.durations_ms.remove(from);
        self.durations_ms.insert(to, duration);
        for timeline in &mut self.timelines {
            let slot = timeline.slots.remove(from);
            timeline.slots.insert(to, slot);
        }
    }

    /// Duplicate the frame at `position` directly after itself in the
    /// timebase and every timeline.
    pub fn duplicate_timebase_frame(&mut self, position: usize) -> GifweaveResult<()> {
        self.check_frame(position)?;
        let duration = self.durations_ms[position];
        self.durations_ms.insert(position + 1, duration);
        for timeline in &mut self.timelines {
            let slot = timeline.slots[position];
            timeline.slots.insert(position + 1, slot);
        }
        Ok(())
    }

    /// Pad a single timeline with empty slots up to `length`. Used when a
    /// non-main timeline was edited independently and must not run shorter
    /// than the timebase.
    pub fn ensure_timeline_length(&mut self, timeline_index: usize, length: usize) -> GifweaveResult<()> {
        self.check_timeline(timeline_index)?;
        let slots = &mut self.timelines[timeline_index].slots;
        while slots.len() < length {
            slots.push(FrameSlot::Empty);
        }
        Ok(())
    }

    pub fn set_timebase_duration(&mut self, position: usize, duration_ms: u32) -> GifweaveResult<()> {
        self.check_frame(position)?;
        self.durations_ms[position] = duration_ms;
        Ok(())
    }

    pub fn set_all_durations(&mut self, duration_ms: u32) {
        for duration in &mut self.durations_ms {
            *duration = duration_ms;
        }
    }

    pub fn set_default_duration(&mut self, duration_ms: u32) {
        self.default_duration_ms = duration_ms;
    }

    pub fn default_duration_ms(&self) -> u32 {
        self.default_duration_ms
    }

    // ---- slot operations ----

    pub fn set_slot(
        &mut self,
        timeline_index: usize,
        frame: usize,
        slot: FrameSlot,
    ) -> GifweaveResult<()> {
        self.check_timeline(timeline_index)?;
        self.check_frame(frame)?;
        self.timelines[timeline_index].slots[frame] = slot;
        Ok(())
    }

    pub fn clear_slot(&mut self, timeline_index: usize, frame: usize) -> GifweaveResult<()> {
        self.set_slot(timeline_index, frame, FrameSlot::Empty)
    }

    pub fn slot(&self, timeline_index: usize, frame: usize) -> Option<&FrameSlot> {
        self.timelines.get(timeline_index)?.slot(frame)
    }

    // ---- read contract ----

    /// Filled placements for one frame, bottom-to-top in timeline order,
    /// each position shifted by its timeline's offset. This is the sole read
    /// contract the compositor depends on.
    pub fn iter_frame_layers(&self, frame: usize) -> Vec<(usize, i32, i32)> {
        let mut layers = Vec::new();
        for timeline in &self.timelines {
            if let Some(FrameSlot::Filled { material, x, y }) = timeline.slot(frame) {
                layers.push((
                    *material,
                    x + timeline.offset_x,
                    y + timeline.offset_y,
                ));
            }
        }
        layers
    }

    pub fn frame_count(&self) -> usize {
        self.durations_ms.len()
    }

    pub fn durations(&self) -> &[u32] {
        &self.durations_ms
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.durations_ms.iter().map(|&d| u64::from(d)).sum()
    }

    /// Highest material index referenced by any filled slot, if any.
    pub fn max_referenced_material(&self) -> Option<usize> {
        self.timelines
            .iter()
            .flat_map(|t| t.slots.iter())
            .filter_map(FrameSlot::material)
            .max()
    }

    fn check_timeline(&self, index: usize) -> GifweaveResult<()> {
        if index >= self.timelines.len() {
            return Err(GifweaveError::validation(format!(
                "timeline index {index} out of range (model has {})",
                self.timelines.len()
            )));
        }
        Ok(())
    }

    fn check_frame(&self, position: usize) -> GifweaveResult<()> {
        if position >= self.durations_ms.len() {
            return Err(GifweaveError::validation(format!(
                "frame position {position} out of range (timebase has {})",
                self.durations_ms.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composition/timeline.rs"]
mod tests;
