//! Quote-scan state machine shared by every `qstrlen` tier.
//!
//! The scalar reference feeds it one byte at a time. Vector drivers skip over
//! runs that hold neither `\` nor `"` with [`QuoteScan::skip_content`] and
//! only step byte by byte around those two characters, so both drivers agree
//! on every transition.

use core::ops::ControlFlow;

use crate::QuoteError;

/// Where a [`QuoteScan`] is within the quoted string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteState {
    /// Nothing consumed yet; the next byte must be the opening `"`.
    #[default]
    AwaitOpen,
    /// Inside the string, outside an escape.
    Content,
    /// The previous byte was an unconsumed `\`.
    Escape,
}

/// Running state of a quoted-string scan: the position in the string and the
/// number of logical content bytes seen so far.
///
/// ```rust
/// use simdstr::{QuoteError, QuoteScan};
///
/// let mut scan = QuoteScan::new();
/// for &b in br#""a\"b"#.iter() {
///     assert_eq!(scan.step(b), None);
/// }
/// assert_eq!(scan.len(), 3);
/// assert_eq!(scan.finish(), Err(QuoteError::Unterminated));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuoteScan {
    state: QuoteState,
    len: usize,
}

impl QuoteScan {
    /// A scan that has not consumed any byte.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: QuoteState::AwaitOpen,
            len: 0,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> QuoteState {
        self.state
    }

    /// Logical content bytes counted so far. An escape pair counts once.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether no content byte has been counted yet.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Consume one byte.
    ///
    /// Returns `Some` once the scan is over: `Ok(len)` on the closing quote,
    /// `Err` on a malformed opening or escape. Returns `None` while more input
    /// is needed.
    #[inline]
    pub fn step(&mut self, byte: u8) -> Option<Result<usize, QuoteError>> {
        match self.state {
            QuoteState::AwaitOpen => {
                if byte != b'"' {
                    return Some(Err(QuoteError::MissingOpenQuote));
                }
                self.state = QuoteState::Content;
            }
            QuoteState::Content => match byte {
                b'"' => return Some(Ok(self.len)),
                b'\\' => self.state = QuoteState::Escape,
                _ => self.len += 1,
            },
            QuoteState::Escape => {
                if byte != b'\\' && byte != b'"' {
                    return Some(Err(QuoteError::InvalidEscape(byte)));
                }
                self.len += 1;
                self.state = QuoteState::Content;
            }
        }
        None
    }

    /// Count `n` content bytes at once. The caller guarantees the run holds
    /// neither `\` nor `"`.
    #[inline]
    pub fn skip_content(&mut self, n: usize) {
        debug_assert_eq!(self.state, QuoteState::Content);
        self.len += n;
    }

    /// End of input reached without a terminating byte.
    ///
    /// # Errors
    ///
    /// Always returns the error matching the state the input ended in.
    pub const fn finish(self) -> Result<usize, QuoteError> {
        Err(match self.state {
            QuoteState::AwaitOpen => QuoteError::MissingOpenQuote,
            QuoteState::Content => QuoteError::Unterminated,
            QuoteState::Escape => QuoteError::DanglingEscape,
        })
    }

    /// Step bytes of `src` starting at `pos` until the scan ends or is back in
    /// [`QuoteState::Content`] after at least one byte.
    ///
    /// Vector drivers call this on the `\` or `"` they located. Continues with
    /// the position after the bytes consumed, or breaks with the result.
    #[inline]
    pub(crate) fn resolve(
        &mut self,
        src: &[u8],
        mut pos: usize,
    ) -> ControlFlow<Result<usize, QuoteError>, usize> {
        loop {
            let Some(&byte) = src.get(pos) else {
                return ControlFlow::Break(self.finish());
            };
            if let Some(done) = self.step(byte) {
                return ControlFlow::Break(done);
            }
            pos += 1;
            if self.state == QuoteState::Content {
                return ControlFlow::Continue(pos);
            }
        }
    }

    /// Step every byte of `src[pos..]` and finish.
    #[inline]
    pub(crate) fn run(mut self, src: &[u8], pos: usize) -> Result<usize, QuoteError> {
        for &byte in &src[pos..] {
            if let Some(done) = self.step(byte) {
                return done;
            }
        }
        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_pair_counts_once() {
        let mut scan = QuoteScan::new();
        assert_eq!(scan.step(b'"'), None);
        assert_eq!(scan.step(b'\\'), None);
        assert_eq!(scan.state(), QuoteState::Escape);
        assert!(scan.is_empty());
        assert_eq!(scan.step(b'\\'), None);
        assert_eq!(scan.state(), QuoteState::Content);
        assert_eq!(scan.len(), 1);
        assert_eq!(scan.step(b'"'), Some(Ok(1)));
    }

    #[test]
    fn finish_reports_state() {
        assert_eq!(QuoteScan::new().finish(), Err(QuoteError::MissingOpenQuote));

        let mut scan = QuoteScan::new();
        scan.step(b'"');
        assert_eq!(scan.finish(), Err(QuoteError::Unterminated));
        scan.step(b'\\');
        assert_eq!(scan.finish(), Err(QuoteError::DanglingEscape));
    }

    #[test]
    fn resolve_stops_back_in_content() {
        let src = br#""ab\"c""#;
        let mut scan = QuoteScan::new();
        assert_eq!(scan.resolve(src, 0), ControlFlow::Continue(1));
        scan.skip_content(2);
        assert_eq!(scan.resolve(src, 3), ControlFlow::Continue(5));
        assert_eq!(scan.len(), 3);
        scan.skip_content(1);
        assert_eq!(scan.resolve(src, 6), ControlFlow::Break(Ok(4)));
    }

    #[test]
    fn resolve_at_end_of_input() {
        let mut scan = QuoteScan::new();
        assert_eq!(scan.resolve(b"\"\\", 0), ControlFlow::Continue(1));
        assert_eq!(
            scan.resolve(b"\"\\", 1),
            ControlFlow::Break(Err(QuoteError::DanglingEscape))
        );
    }
}
