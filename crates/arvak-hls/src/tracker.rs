//! Clean/dirty bookkeeping for the qubits of the circuit being synthesized.
//!
//! The tracker is a plain value indexed by global qubit. Recursive synthesis
//! calls receive a clone; the parent decides which parts of the child's view
//! to adopt with [`QubitTracker::replace_state`].

use arvak_ir::QubitId;

/// Per-qubit state: clean (known |0⟩) or dirty, and enabled or disabled.
///
/// Disabled qubits are never offered as ancillas and are not counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QubitTracker {
    clean: Vec<bool>,
    enabled: Vec<bool>,
}

impl QubitTracker {
    /// Track `num_qubits` enabled qubits, all clean or all dirty.
    pub fn new(num_qubits: usize, initially_clean: bool) -> Self {
        Self {
            clean: vec![initially_clean; num_qubits],
            enabled: vec![true; num_qubits],
        }
    }

    /// Number of tracked qubits, enabled or not.
    pub fn num_qubits(&self) -> usize {
        self.clean.len()
    }

    /// True if `qubit` is known to be |0⟩.
    pub fn is_clean(&self, qubit: QubitId) -> bool {
        self.clean.get(qubit.index()).copied().unwrap_or(false)
    }

    /// True if `qubit` may be lent out as an ancilla.
    pub fn is_enabled(&self, qubit: QubitId) -> bool {
        self.enabled.get(qubit.index()).copied().unwrap_or(false)
    }

    /// Mark qubits as being in an unknown state.
    pub fn set_dirty(&mut self, qubits: &[QubitId]) {
        self.set(qubits, |t, i| t.clean[i] = false);
    }

    /// Mark qubits as being |0⟩.
    pub fn set_clean(&mut self, qubits: &[QubitId]) {
        self.set(qubits, |t, i| t.clean[i] = true);
    }

    /// Remove qubits from availability.
    pub fn disable(&mut self, qubits: &[QubitId]) {
        self.set(qubits, |t, i| t.enabled[i] = false);
    }

    /// Make qubits available again.
    pub fn enable(&mut self, qubits: &[QubitId]) {
        self.set(qubits, |t, i| t.enabled[i] = true);
    }

    fn set(&mut self, qubits: &[QubitId], mut update: impl FnMut(&mut Self, usize)) {
        for q in qubits {
            if q.index() < self.num_qubits() {
                update(self, q.index());
            }
        }
    }

    fn available<'a>(&'a self, ignored: &'a [QubitId]) -> impl Iterator<Item = usize> + 'a {
        (0..self.num_qubits()).filter(move |&i| self.enabled[i] && !ignored.contains(&QubitId(i)))
    }

    /// Number of enabled clean qubits outside `ignored`.
    pub fn num_clean(&self, ignored: &[QubitId]) -> usize {
        self.available(ignored).filter(|&i| self.clean[i]).count()
    }

    /// Number of enabled dirty qubits outside `ignored`.
    pub fn num_dirty(&self, ignored: &[QubitId]) -> usize {
        self.available(ignored).filter(|&i| !self.clean[i]).count()
    }

    /// Pick up to `count` enabled qubits outside `ignored`, clean ones first.
    ///
    /// The tracker itself is not modified; callers mark what they use.
    pub fn borrow(&self, count: usize, ignored: &[QubitId]) -> Vec<QubitId> {
        let clean = self.available(ignored).filter(|&i| self.clean[i]);
        let dirty = self.available(ignored).filter(|&i| !self.clean[i]);
        clean.chain(dirty).take(count).map(QubitId).collect()
    }

    /// Copy the clean state of `qubits` from `other`.
    pub fn replace_state(&mut self, other: &QubitTracker, qubits: &[QubitId]) {
        for q in qubits {
            let i = q.index();
            if i < self.num_qubits() && i < other.num_qubits() {
                self.clean[i] = other.clean[i];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arvak_ir::qubits;

    #[test]
    fn test_counts_respect_ignored_and_disabled() {
        let mut tracker = QubitTracker::new(6, true);
        tracker.set_dirty(&qubits([0, 1]));
        tracker.disable(&qubits([5]));

        assert_eq!(tracker.num_clean(&[]), 3);
        assert_eq!(tracker.num_dirty(&[]), 2);
        assert_eq!(tracker.num_clean(&qubits([2])), 2);
        assert_eq!(tracker.num_dirty(&qubits([0])), 1);

        tracker.enable(&qubits([5]));
        assert_eq!(tracker.num_clean(&[]), 4);
    }

    #[test]
    fn test_borrow_prefers_clean_qubits() {
        let mut tracker = QubitTracker::new(5, false);
        tracker.set_clean(&qubits([3, 4]));
        tracker.disable(&qubits([4]));

        let borrowed = tracker.borrow(3, &qubits([0]));
        assert_eq!(borrowed, qubits([3, 1, 2]));
        assert_eq!(tracker.borrow(10, &[]).len(), 4);
    }

    #[test]
    fn test_clone_is_independent() {
        let parent = QubitTracker::new(3, true);
        let mut child = parent.clone();
        child.set_dirty(&qubits([0, 1, 2]));
        child.disable(&qubits([0]));

        assert_eq!(parent.num_clean(&[]), 3);
        assert!(parent.is_enabled(QubitId(0)));
        assert!(!child.is_enabled(QubitId(0)));
    }

    #[test]
    fn test_replace_state_copies_only_given_qubits() {
        let mut parent = QubitTracker::new(4, true);
        let mut child = parent.clone();
        child.set_dirty(&qubits([1, 2, 3]));

        parent.replace_state(&child, &qubits([2]));
        assert!(parent.is_clean(QubitId(1)));
        assert!(!parent.is_clean(QubitId(2)));
        assert!(parent.is_clean(QubitId(3)));
    }

    #[test]
    fn test_out_of_range_qubits_are_ignored() {
        let mut tracker = QubitTracker::new(2, true);
        tracker.set_dirty(&qubits([7]));
        assert_eq!(tracker.num_clean(&[]), 2);
        assert!(!tracker.is_clean(QubitId(7)));
    }
}
