//! Two-phase passport/destination selection.
//!
//! All changes go through the transition methods on [`SelectionStateMachine`],
//! which keep passport and destination distinct at every step.

use crate::codes::{Iso2Code, is_selectable};

/// Which slot the next map click fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    AwaitingPassport,
    AwaitingDestination,
}

/// What happens after a destination is picked on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Back to passport selection, ready for the next pair.
    #[default]
    Cycle,
    /// Stay on destination selection; further clicks swap the destination.
    PinnedDestination,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionState {
    passport: Option<Iso2Code>,
    destination: Option<Iso2Code>,
    phase: Phase,
}

impl SelectionState {
    pub fn passport(&self) -> Option<&Iso2Code> {
        self.passport.as_ref()
    }

    pub fn destination(&self) -> Option<&Iso2Code> {
        self.destination.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Passport or destination equals `code`.
    pub fn is_selected(&self, code: &Iso2Code) -> bool {
        self.passport.as_ref() == Some(code) || self.destination.as_ref() == Some(code)
    }

    /// Both slots filled.
    pub fn pair(&self) -> Option<(&Iso2Code, &Iso2Code)> {
        self.passport.as_ref().zip(self.destination.as_ref())
    }
}

/// Outcome of one transition, for the caller to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    PassportSelected {
        passport: Iso2Code,
        /// False when the same passport was picked again; visa data stays valid.
        changed: bool,
        /// The old destination equalled the new passport and was dropped.
        cleared_destination: bool,
    },
    /// A pair is complete; its details should be shown.
    DestinationSelected { destination: Iso2Code },
    /// Destination equal to passport. Nothing changed; warn the user.
    SameCountryRejected(Iso2Code),
    /// Code that can never be selected (Antarctica).
    Ignored(Iso2Code),
    DestinationCleared,
    /// Passport and destination both dropped; back to the initial state.
    SelectionCleared,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionStateMachine {
    state: SelectionState,
    mode: SelectionMode,
}

impl SelectionStateMachine {
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            state: SelectionState::default(),
            mode,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// A resolved map click: fills whichever slot the phase points at.
    pub fn select(&mut self, code: Iso2Code) -> Transition {
        match self.state.phase {
            Phase::AwaitingPassport => self.select_passport(code),
            Phase::AwaitingDestination => {
                let transition = self.select_destination(code);
                if matches!(transition, Transition::DestinationSelected { .. })
                    && self.mode == SelectionMode::Cycle
                {
                    self.state.phase = Phase::AwaitingPassport;
                }
                transition
            }
        }
    }

    /// Set the passport directly (map phase one, or the search box).
    pub fn select_passport(&mut self, code: Iso2Code) -> Transition {
        if !is_selectable(&code) {
            return Transition::Ignored(code);
        }

        let changed = self.state.passport.as_ref() != Some(&code);
        let cleared_destination = self.state.destination.as_ref() == Some(&code);
        if cleared_destination {
            self.state.destination = None;
        }
        self.state.passport = Some(code.clone());
        self.state.phase = Phase::AwaitingDestination;

        tracing::debug!(passport = %code, changed, cleared_destination, "passport selected");
        Transition::PassportSelected {
            passport: code,
            changed,
            cleared_destination,
        }
    }

    /// Set the destination without touching the phase. Used by the search
    /// box; map clicks go through [`select`](Self::select).
    pub fn select_destination(&mut self, code: Iso2Code) -> Transition {
        if !is_selectable(&code) {
            return Transition::Ignored(code);
        }
        if self.state.passport.as_ref() == Some(&code) {
            tracing::debug!(code = %code, "destination equals passport");
            return Transition::SameCountryRejected(code);
        }

        self.state.destination = Some(code.clone());
        tracing::debug!(destination = %code, "destination selected");
        Transition::DestinationSelected { destination: code }
    }

    /// Drop the destination and wait for a passport click again.
    pub fn reset(&mut self) -> Transition {
        self.state.destination = None;
        self.state.phase = Phase::AwaitingPassport;
        Transition::DestinationCleared
    }

    /// Forget the whole pair, passport included.
    pub fn clear(&mut self) -> Transition {
        self.state = SelectionState::default();
        Transition::SelectionCleared
    }
}
