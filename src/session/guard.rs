// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use super::State;

pub(crate) const LOGIN_LOCATION: &str = "login";
pub(crate) const HOME_LOCATION: &str = "/";

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Decision {
    /// The session has not been hydrated; no answer is possible yet.
    Wait,
    Proceed,
    Redirect {
        to: &'static str,
        from: Option<String>,
    },
}

/// Only an access token counts as being logged in. A missing cached profile
/// does not.
pub(crate) fn protected(state: &State, location: &str) -> Decision {
    if !state.has_hydrated {
        Decision::Wait
    } else if state.is_authenticated() {
        Decision::Proceed
    } else {
        Decision::Redirect {
            to: LOGIN_LOCATION,
            from: Some(location.to_owned()),
        }
    }
}

pub(crate) fn public_only(state: &State) -> Decision {
    if !state.has_hydrated {
        Decision::Wait
    } else if state.is_authenticated() {
        Decision::Redirect {
            to: HOME_LOCATION,
            from: None,
        }
    } else {
        Decision::Proceed
    }
}
