use std::sync::OnceLock;

use crate::backend::RawOutput;
use crate::error::BenchError;

/// Fixed-length arena of write-once result slots, addressed by request index.
///
/// Each slot is filled by exactly one writer; readers only see the slots
/// after the dispatcher's join/barrier, through [`ResultSlots::into_outputs`].
#[derive(Debug)]
pub struct ResultSlots {
    slots: Vec<OnceLock<RawOutput>>,
}

impl ResultSlots {
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| OnceLock::new()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Stores `output` at `index`. Returns `false` if the slot was already filled
    /// or the index is out of range.
    pub fn fill(&self, index: usize, output: RawOutput) -> bool {
        match self.slots.get(index) {
            Some(slot) => slot.set(output).is_ok(),
            None => false,
        }
    }

    /// Like [`ResultSlots::fill`], but a rejected write is an error.
    pub fn store(&self, index: usize, output: RawOutput) -> Result<(), BenchError> {
        if self.fill(index, output) {
            Ok(())
        } else {
            Err(BenchError::RejectedResult { index })
        }
    }

    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|slot| slot.get().is_some()).count()
    }

    /// Consumes the arena; fails on the first empty slot.
    pub fn into_outputs(self) -> Result<Vec<RawOutput>, BenchError> {
        self.slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.into_inner()
                    .ok_or(BenchError::MissingResult { index })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_write_once() {
        let slots = ResultSlots::new(2);
        assert!(slots.fill(1, RawOutput::new("b")));
        assert!(!slots.fill(1, RawOutput::new("again")));
        assert!(!slots.fill(2, RawOutput::new("out of range")));
        assert_eq!(slots.filled(), 1);
    }

    #[test]
    fn rejected_store_is_an_error() {
        let slots = ResultSlots::new(1);
        slots.store(0, RawOutput::new("a")).unwrap();
        assert!(matches!(
            slots.store(0, RawOutput::new("b")),
            Err(BenchError::RejectedResult { index: 0 })
        ));
        assert!(matches!(
            slots.store(3, RawOutput::new("c")),
            Err(BenchError::RejectedResult { index: 3 })
        ));
        assert_eq!(slots.into_outputs().unwrap()[0].text, "a");
    }

    #[test]
    fn empty_slot_is_never_silently_dropped() {
        let slots = ResultSlots::new(3);
        slots.fill(0, RawOutput::new("a"));
        slots.fill(2, RawOutput::new("c"));
        assert!(matches!(
            slots.into_outputs(),
            Err(BenchError::MissingResult { index: 1 })
        ));
    }

    #[test]
    fn outputs_follow_index_order() {
        let slots = ResultSlots::new(3);
        for index in [2, 0, 1] {
            slots.fill(index, RawOutput::new(index.to_string()));
        }
        let texts: Vec<String> = slots
            .into_outputs()
            .unwrap()
            .into_iter()
            .map(|o| o.text)
            .collect();
        assert_eq!(texts, ["0", "1", "2"]);
    }
}
