use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Lifecycle of a round template within a job opening.
///
/// Each round flows through: LOCKED → UNLOCKED → ACTIVE → CONFIRMED.
/// The ordering is meaningful: a later state never moves back to an earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundState {
    Locked,
    Unlocked,
    Active,
    Confirmed,
}

impl fmt::Display for RoundState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundState::Locked => write!(f, "LOCKED"),
            RoundState::Unlocked => write!(f, "UNLOCKED"),
            RoundState::Active => write!(f, "ACTIVE"),
            RoundState::Confirmed => write!(f, "CONFIRMED"),
        }
    }
}

/// Commands that drive a round through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundCommand {
    /// The previous round progressed into this one.
    Unlock,
    /// Status work started on the round.
    Activate,
    /// The round template was confirmed server-side.
    Confirm,
}

impl fmt::Display for RoundCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundCommand::Unlock => write!(f, "unlock"),
            RoundCommand::Activate => write!(f, "activate"),
            RoundCommand::Confirm => write!(f, "confirm"),
        }
    }
}

/// The result of applying a command to a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The round moved to a new state.
    Advanced { from: RoundState, to: RoundState },
    /// The command was accepted but the state is already at or past its target.
    Unchanged(RoundState),
}

impl Transition {
    pub fn state(&self) -> RoundState {
        match self {
            Transition::Advanced { to, .. } => *to,
            Transition::Unchanged(state) => *state,
        }
    }
}

/// Pure transition table for [`RoundState`].
pub struct RoundStateMachine;

impl RoundStateMachine {
    /// Compute the transition for `command` applied in `state`.
    ///
    /// - `Locked` only accepts `Unlock`; a round must be progressed into
    ///   before it can be worked on or confirmed.
    /// - `Unlocked` may be activated or confirmed directly.
    /// - `Confirmed` is terminal and accepts every command as a no-op, which
    ///   is what makes confirmation idempotent.
    pub fn next(state: RoundState, command: RoundCommand) -> Result<Transition, PipelineError> {
        let target = match (state, command) {
            (RoundState::Locked, RoundCommand::Unlock) => RoundState::Unlocked,
            (RoundState::Locked, _) => {
                return Err(PipelineError::InvalidTransition { state, command });
            }
            (RoundState::Unlocked, RoundCommand::Unlock) => RoundState::Unlocked,
            (RoundState::Unlocked, RoundCommand::Activate) => RoundState::Active,
            (RoundState::Unlocked, RoundCommand::Confirm) => RoundState::Confirmed,
            (RoundState::Active, RoundCommand::Confirm) => RoundState::Confirmed,
            (RoundState::Active, _) => RoundState::Active,
            (RoundState::Confirmed, _) => RoundState::Confirmed,
        };

        if target == state {
            Ok(Transition::Unchanged(state))
        } else {
            Ok(Transition::Advanced {
                from: state,
                to: target,
            })
        }
    }

    /// Initial state of a template as observed in a fresh listing.
    pub fn initial(is_active: bool, is_first: bool) -> RoundState {
        if is_active {
            RoundState::Confirmed
        } else if is_first {
            RoundState::Unlocked
        } else {
            RoundState::Locked
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advance(state: RoundState, command: RoundCommand) -> RoundState {
        RoundStateMachine::next(state, command).unwrap().state()
    }

    #[test]
    fn happy_path_walks_all_states() {
        let mut state = RoundState::Locked;

        state = advance(state, RoundCommand::Unlock);
        assert_eq!(state, RoundState::Unlocked);

        state = advance(state, RoundCommand::Activate);
        assert_eq!(state, RoundState::Active);

        state = advance(state, RoundCommand::Confirm);
        assert_eq!(state, RoundState::Confirmed);
    }

    #[test]
    fn locked_round_rejects_work_and_confirmation() {
        for command in [RoundCommand::Activate, RoundCommand::Confirm] {
            let err = RoundStateMachine::next(RoundState::Locked, command).unwrap_err();
            assert!(matches!(
                err,
                PipelineError::InvalidTransition {
                    state: RoundState::Locked,
                    ..
                }
            ));
        }
    }

    #[test]
    fn confirmed_is_terminal() {
        for command in [
            RoundCommand::Unlock,
            RoundCommand::Activate,
            RoundCommand::Confirm,
        ] {
            assert_eq!(
                RoundStateMachine::next(RoundState::Confirmed, command).unwrap(),
                Transition::Unchanged(RoundState::Confirmed)
            );
        }
    }

    #[test]
    fn unlocked_round_can_be_confirmed_directly() {
        let t = RoundStateMachine::next(RoundState::Unlocked, RoundCommand::Confirm).unwrap();
        assert_eq!(
            t,
            Transition::Advanced {
                from: RoundState::Unlocked,
                to: RoundState::Confirmed
            }
        );
    }

    #[test]
    fn active_never_moves_backwards() {
        assert_eq!(
            advance(RoundState::Active, RoundCommand::Unlock),
            RoundState::Active
        );
    }

    #[test]
    fn initial_state_from_listing() {
        assert_eq!(RoundStateMachine::initial(false, true), RoundState::Unlocked);
        assert_eq!(RoundStateMachine::initial(false, false), RoundState::Locked);
        assert_eq!(RoundStateMachine::initial(true, false), RoundState::Confirmed);
    }

    #[test]
    fn state_display() {
        assert_eq!(RoundState::Locked.to_string(), "LOCKED");
        assert_eq!(RoundState::Unlocked.to_string(), "UNLOCKED");
        assert_eq!(RoundState::Active.to_string(), "ACTIVE");
        assert_eq!(RoundState::Confirmed.to_string(), "CONFIRMED");
    }
}
