//! Execution suspension for deferred blocks.
//!
//! A [`Suspension`] is held while the host walks the body of a `deferred:`
//! block. Every statement offered to [`Suspension::intercept`] is refused
//! with [`Interrupt::Suspended`], so nothing in the body runs. Leaving the
//! scope through [`Suspension::exit`] turns that signal back into a normal
//! exit while letting real failures through.

use std::cell::Cell;

use latebind_core::{LatebindError, Span};
use latebind_parser::Stmt;
use tracing::trace;

/// Control-flow signal raised inside a suspended block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interrupt {
    /// A statement was stopped before running.
    Suspended { line: u32 },
    /// Something other than the suspension went wrong.
    Failed(LatebindError),
}

impl From<LatebindError> for Interrupt {
    fn from(error: LatebindError) -> Self {
        Interrupt::Failed(error)
    }
}

/// Scoped guard that keeps a block body from executing.
#[derive(Debug)]
pub struct Suspension {
    marker: Span,
    intercepted: Cell<usize>,
}

impl Suspension {
    /// Enter the block opened at `marker`.
    pub fn enter(marker: Span) -> Self {
        trace!(line = marker.line, "suspending deferred block");
        Self {
            marker,
            intercepted: Cell::new(0),
        }
    }

    /// Span of the statement that opened the block.
    pub fn marker(&self) -> Span {
        self.marker
    }

    /// Refuse to run `stmt`.
    pub fn intercept(&self, stmt: &Stmt<'_>) -> Result<(), Interrupt> {
        self.intercepted.set(self.intercepted.get() + 1);
        Err(Interrupt::Suspended {
            line: stmt.span().line,
        })
    }

    /// Number of statements refused so far.
    pub fn intercepted(&self) -> usize {
        self.intercepted.get()
    }

    /// Leave the block.
    ///
    /// A suspended or untouched body exits normally; any other failure is
    /// propagated.
    pub fn exit(self, outcome: Result<(), Interrupt>) -> Result<Span, LatebindError> {
        match outcome {
            Ok(()) | Err(Interrupt::Suspended { .. }) => {
                trace!(
                    line = self.marker.line,
                    intercepted = self.intercepted.get(),
                    "leaving deferred block"
                );
                Ok(self.marker)
            }
            Err(Interrupt::Failed(error)) => Err(error),
        }
    }

    /// Walk `body` under suspension and exit.
    pub fn run(marker: Span, body: &[Stmt<'_>]) -> Result<Span, LatebindError> {
        let suspension = Self::enter(marker);
        let outcome = body.iter().try_for_each(|stmt| suspension.intercept(stmt));
        suspension.exit(outcome)
    }
}
