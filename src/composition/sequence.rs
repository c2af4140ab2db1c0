use crate::assets::loader::DEFAULT_FRAME_DURATION_MS;
use crate::foundation::error::{GifweaveError, GifweaveResult};

/// One frame of the simple sequence model: a material shown for a duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SequenceEntry {
    pub material: usize,
    pub duration_ms: u32,
}

/// The simple one-material-per-frame animation model.
///
/// Entries are addressed by index; all reordering goes through explicit
/// `insert`/`remove`/`move_entry` operations on the owned vector.
#[derive(Clone, Debug)]
pub struct FrameSequence {
    entries: Vec<SequenceEntry>,
    default_duration_ms: u32,
}

impl Default for FrameSequence {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_DURATION_MS)
    }
}

impl FrameSequence {
    pub fn new(default_duration_ms: u32) -> Self {
        Self {
            entries: Vec::new(),
            default_duration_ms,
        }
    }

    /// Append a frame showing `material` for the default duration.
    pub fn push(&mut self, material: usize) -> usize {
        self.push_with_duration(material, self.default_duration_ms)
    }

    pub fn push_with_duration(&mut self, material: usize, duration_ms: u32) -> usize {
        self.entries.push(SequenceEntry {
            material,
            duration_ms,
        });
        self.entries.len() - 1
    }

    /// Insert at `position` (clamped to the end) with the default duration.
    pub fn insert(&mut self, position: usize, material: usize) {
        let position = position.min(self.entries.len());
        self.entries.insert(
            position,
            SequenceEntry {
                material,
                duration_ms: self.default_duration_ms,
            },
        );
    }

    pub fn remove(&mut self, position: usize) -> GifweaveResult<SequenceEntry> {
        self.check_position(position)?;
        Ok(self.entries.remove(position))
    }

    pub fn move_entry(&mut self, from: usize, to: usize) -> GifweaveResult<()> {
        self.check_position(from)?;
        self.check_position(to)?;
        if from != to {
            let entry = self.entries.remove(from);
            self.entries.insert(to, entry);
        }
        Ok(())
    }

    /// Insert a copy of the entry at `position` directly after it; returns
    /// the copy's index.
    pub fn duplicate(&mut self, position: usize) -> GifweaveResult<usize> {
        self.check_position(position)?;
        let entry = self.entries[position];
        self.entries.insert(position + 1, entry);
        Ok(position + 1)
    }

    pub fn set_duration(&mut self, position: usize, duration_ms: u32) -> GifweaveResult<()> {
        self.check_position(position)?;
        self.entries[position].duration_ms = duration_ms;
        Ok(())
    }

    pub fn set_all_durations(&mut self, duration_ms: u32) {
        for entry in &mut self.entries {
            entry.duration_ms = duration_ms;
        }
    }

    /// Replace the whole sequence with `pattern`, one default-duration frame
    /// per material index.
    pub fn set_pattern(&mut self, pattern: &[usize]) {
        self.entries = pattern
            .iter()
            .map(|&material| SequenceEntry {
                material,
                duration_ms: self.default_duration_ms,
            })
            .collect();
    }

    /// Repeat the current sequence `times` times in total.
    pub fn repeat(&mut self, times: usize) -> GifweaveResult<()> {
        if times == 0 {
            return Err(GifweaveError::validation("repeat count must be >= 1"));
        }
        let base = self.entries.clone();
        for _ in 1..times {
            self.entries.extend(base.iter().copied());
        }
        Ok(())
    }

    pub fn reverse(&mut self) {
        self.entries.reverse();
    }

    pub fn get(&self, position: usize) -> Option<&SequenceEntry> {
        self.entries.get(position)
    }

    pub fn entries(&self) -> &[SequenceEntry] {
        &self.entries
    }

    pub fn pattern(&self) -> Vec<usize> {
        self.entries.iter().map(|e| e.material).collect()
    }

    pub fn durations(&self) -> Vec<u32> {
        self.entries.iter().map(|e| e.duration_ms).collect()
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.duration_ms)).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn default_duration_ms(&self) -> u32 {
        self.default_duration_ms
    }

    pub fn set_default_duration(&mut self, duration_ms: u32) {
        self.default_duration_ms = duration_ms;
    }

    fn check_position(&self, position: usize) -> GifweaveResult<()> {
        if position >= self.entries.len() {
            return Err(GifweaveError::validation(format!(
                "sequence position {position} out of range (len {})",
                self.entries.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composition/sequence.rs"]
mod tests;
