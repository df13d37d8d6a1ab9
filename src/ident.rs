//! Identifier validation and alias generation.
//!
//! The remote query language accepts a wider grammar than the one
//! enforced here (backtick-quoted names with spaces, for instance).
//! This check is a safety net against queries that would be rejected by
//! the remote parser after the network round trip, not a full grammar.

use rand::distributions::Uniform;
use rand::Rng;
use tracing::warn;

use crate::error::{Error, Result};

/// Length of generated aliases.
pub const ALIAS_LEN: usize = 10;

/// What [`validate`] does when a name fails the grammar check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OnInvalid {
    /// Return [`Error::InvalidIdentifier`].
    #[default]
    Raise,
    /// Log a warning and report the name as invalid.
    Warn,
}

/// Options for [`validate`].
#[derive(Clone, Copy, Debug)]
pub struct ValidateOptions {
    /// Whether an absent name counts as valid. Labels, relations, and
    /// aliases are all optional, so this defaults to `true`.
    pub allow_absent: bool,
    /// Failure policy.
    pub on_invalid: OnInvalid,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            allow_absent: true,
            on_invalid: OnInvalid::Raise,
        }
    }
}

/// Returns whether `name` matches `^[A-Za-z_][0-9A-Za-z_]*$`.
pub fn is_valid(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validates an optional identifier against the grammar.
///
/// Returns `Ok(true)` for a valid (or acceptably absent) name. On an
/// invalid name the behavior follows `opts.on_invalid`: either an
/// [`Error::InvalidIdentifier`] or a logged warning plus `Ok(false)`.
pub fn validate(name: Option<&str>, opts: ValidateOptions) -> Result<bool> {
    let offense = match name {
        None if opts.allow_absent => None,
        None => Some("found absent identifier".to_owned()),
        Some(name) if is_valid(name) => None,
        Some(name) => Some(format!("'{name}'")),
    };

    let Some(offense) = offense else {
        return Ok(true);
    };

    match opts.on_invalid {
        OnInvalid::Raise => Err(Error::InvalidIdentifier(offense)),
        OnInvalid::Warn => {
            warn!(identifier = %offense, "invalid identifier");
            Ok(false)
        }
    }
}

/// Replaces every character outside `[0-9A-Za-z]` with an underscore.
///
/// Callers use this to repair almost-valid names (a leading digit still
/// fails validation afterwards).
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Returns a random [`ALIAS_LEN`]-character lowercase alias.
///
/// Uniqueness across a graph is best-effort; callers needing guaranteed
/// uniqueness must supply their own aliases.
pub fn random_alias() -> String {
    rand::thread_rng()
        .sample_iter(Uniform::new_inclusive(b'a', b'z'))
        .take(ALIAS_LEN)
        .map(char::from)
        .collect()
}
