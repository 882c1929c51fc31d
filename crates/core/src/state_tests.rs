// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::str::FromStr;

#[yare::parameterized(
    requested = { JobState::Requested, "Requested" },
    created = { JobState::Created, "Created" },
    deployed = { JobState::Deployed, "Deployed" },
    succeeded = { JobState::Succeeded, "Succeeded" },
    failed = { JobState::Failed, "Failed" },
)]
fn display_is_title_case(state: JobState, expected: &str) {
    assert_eq!(state.to_string(), expected);
}

#[test]
fn serde_round_trip_matches_display() {
    for state in JobState::ALL {
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, format!("\"{state}\""));
        let back: JobState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}

#[yare::parameterized(
    requested = { JobState::Requested, false },
    created = { JobState::Created, false },
    deployed = { JobState::Deployed, false },
    succeeded = { JobState::Succeeded, true },
    failed = { JobState::Failed, true },
)]
fn terminal_states(state: JobState, terminal: bool) {
    assert_eq!(state.is_terminal(), terminal);
}

#[test]
fn from_str_rejects_lower_case() {
    let err = JobState::from_str("failed").unwrap_err();
    assert!(err.to_string().contains("failed"));
}

#[test]
fn from_str_round_trips() {
    for state in JobState::ALL {
        assert_eq!(JobState::from_str(&state.to_string()).unwrap(), state);
    }
}
