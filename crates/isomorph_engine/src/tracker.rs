//! Cycle tracking.
//!
//! The tracker holds one frame per composite pair on the current recursion
//! path. A pair is only re-entered when both references were entered
//! together in the same frame; any other revisit means the two graphs do
//! not cycle in tandem.

use isomorph_core::{Path, RefId};
use std::ops::{Deref, DerefMut};

#[derive(Debug, Clone)]
struct Frame {
    subject: RefId,
    expectation: RefId,
    path: Path,
}

/// Outcome of entering a pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// Pair pushed; [`CycleTracker::leave`] pops it
    Continue,
    /// Both references are active in the same frame
    AlreadyVisited {
        /// Path where the pair was first entered
        target: Path,
    },
    /// Only one side (or both sides at different frames) refers back
    Asymmetric {
        /// Path where the subject reference is active, if it is
        subject_target: Option<Path>,
        /// Path where the expectation reference is active, if it is
        expectation_target: Option<Path>,
    },
}

/// A pair that was not entered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revisit {
    /// Both graphs cycle back to the same frame
    InTandem {
        /// Path where the pair was first entered
        target: Path,
    },
    /// The graphs do not cycle in tandem
    Asymmetric {
        /// Path where the subject reference is active, if it is
        subject_target: Option<Path>,
        /// Path where the expectation reference is active, if it is
        expectation_target: Option<Path>,
    },
}

/// Stack of active (subject, expectation) reference pairs
#[derive(Debug, Default)]
pub struct CycleTracker {
    frames: Vec<Frame>,
}

impl CycleTracker {
    /// Create an empty tracker
    #[must_use]
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Number of active frames
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Try to enter a pair at `path`
    pub fn enter(&mut self, subject: RefId, expectation: RefId, path: &Path) -> Entry {
        let by_subject = self.frames.iter().position(|f| f.subject == subject);
        let by_expectation = self.frames.iter().position(|f| f.expectation == expectation);

        match (by_subject, by_expectation) {
            (None, None) => {
                self.frames.push(Frame {
                    subject,
                    expectation,
                    path: path.clone(),
                });
                Entry::Continue
            }
            (Some(s), Some(e)) if s == e => Entry::AlreadyVisited {
                target: self.frames[s].path.clone(),
            },
            (s, e) => Entry::Asymmetric {
                subject_target: s.map(|i| self.frames[i].path.clone()),
                expectation_target: e.map(|i| self.frames[i].path.clone()),
            },
        }
    }

    /// Pop the frame pushed by the matching [`enter`](Self::enter)
    pub fn leave(&mut self, subject: RefId, expectation: RefId) {
        let frame = self.frames.pop();
        debug_assert!(
            frame
                .as_ref()
                .is_some_and(|f| f.subject == subject && f.expectation == expectation),
            "unbalanced cycle tracker leave"
        );
    }
}

impl AsMut<CycleTracker> for CycleTracker {
    fn as_mut(&mut self) -> &mut CycleTracker {
        self
    }
}

/// Scope of an entered pair; leaves the tracker when dropped
pub struct TrackerGuard<'a, S: AsMut<CycleTracker>> {
    owner: &'a mut S,
    subject: RefId,
    expectation: RefId,
}

impl<'a, S: AsMut<CycleTracker>> TrackerGuard<'a, S> {
    fn adopt(owner: &'a mut S, subject: RefId, expectation: RefId) -> Self {
        Self {
            owner,
            subject,
            expectation,
        }
    }
}

impl<S: AsMut<CycleTracker>> Deref for TrackerGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.owner
    }
}

impl<S: AsMut<CycleTracker>> DerefMut for TrackerGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.owner
    }
}

impl<S: AsMut<CycleTracker>> Drop for TrackerGuard<'_, S> {
    fn drop(&mut self) {
        self.owner.as_mut().leave(self.subject, self.expectation);
    }
}

/// Enter a pair on the tracker owned by `owner`, returning a guard that
/// borrows the owner for the duration of the descent.
///
/// # Errors
///
/// Returns the kind of revisit when the pair is not entered
pub fn enter_scoped<'a, S: AsMut<CycleTracker>>(
    owner: &'a mut S,
    subject: RefId,
    expectation: RefId,
    path: &Path,
) -> Result<TrackerGuard<'a, S>, Revisit> {
    match owner.as_mut().enter(subject, expectation, path) {
        Entry::Continue => Ok(TrackerGuard::adopt(owner, subject, expectation)),
        Entry::AlreadyVisited { target } => Err(Revisit::InTandem { target }),
        Entry::Asymmetric {
            subject_target,
            expectation_target,
        } => Err(Revisit::Asymmetric {
            subject_target,
            expectation_target,
        }),
    }
}
