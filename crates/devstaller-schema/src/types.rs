//! Newtype wrappers for string identifiers, providing compile-time type safety.
//!
//! All newtypes serialize/deserialize as plain strings so builder files and
//! JSON output stay readable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string.
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Return the inner string as a slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<String> for $name {
            fn eq(&self, other: &String) -> bool {
                self.0 == *other
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_newtype!(
    /// Opaque token naming an extension or feature, e.g. `DataPusher+` or `enable-ssh`.
    OptionId
);

string_newtype!(
    /// CKAN release the installer should check out. Compared only for equality.
    CkanVersion
);

/// Punctuation allowed inside a command token besides letters and digits.
/// None of these is special to a POSIX shell in the middle of a word.
const TOKEN_PUNCTUATION: &[char] = &['+', '-', '_', '.', ':', '/', '@', ',', '=', '%'];

/// Whether `s` can be pasted unquoted into the installer command as a single
/// flag value: non-empty, not starting with `-` (which the installer would
/// read as a flag), and made only of characters no shell interprets.
pub fn is_command_token(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('-')
        && s
            .chars()
            .all(|c| c.is_alphanumeric() || TOKEN_PUNCTUATION.contains(&c))
}
