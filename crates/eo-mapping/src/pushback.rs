//! Forward-only sequence with a single-slot pushback.

use tracing::trace;

use wms_common::{WmsError, WmsResult};

/// Where the sequence stands with respect to pushback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushbackState {
    /// Nothing read yet.
    Fresh,
    /// The last call to `next` produced an item; one pushback is allowed.
    Read,
    /// An item sits in the slot and will be returned by the next `next`.
    PushedBack,
    /// The underlying sequence ran dry.
    Exhausted,
}

/// Wraps an iterator so the most recently read item can be handed back once.
///
/// The buffered item lives in `slot`; `state` says whether pushing back is
/// currently legal. Pushing back twice in a row, or before anything was
/// read, fails with `WmsError::PushbackViolation`.
#[derive(Debug)]
pub struct PushbackIter<I: Iterator> {
    inner: I,
    slot: Option<I::Item>,
    state: PushbackState,
}

impl<I: Iterator> PushbackIter<I> {
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            slot: None,
            state: PushbackState::Fresh,
        }
    }

    pub fn state(&self) -> PushbackState {
        self.state
    }

    /// Return `item` to the front of the sequence.
    pub fn push_back(&mut self, item: I::Item) -> WmsResult<()> {
        if self.state != PushbackState::Read {
            return Err(WmsError::PushbackViolation);
        }
        trace!("Pushed back one item");
        self.slot = Some(item);
        self.state = PushbackState::PushedBack;
        Ok(())
    }
}

impl<I: Iterator> Iterator for PushbackIter<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        if let Some(item) = self.slot.take() {
            self.state = PushbackState::Read;
            return Some(item);
        }
        match self.inner.next() {
            Some(item) => {
                self.state = PushbackState::Read;
                Some(item)
            }
            None => {
                self.state = PushbackState::Exhausted;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let buffered = usize::from(self.slot.is_some());
        let (lo, hi) = self.inner.size_hint();
        (
            lo.saturating_add(buffered),
            hi.and_then(|h| h.checked_add(buffered)),
        )
    }
}
