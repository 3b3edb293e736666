// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use chrono::{DateTime, Utc};
use std::{error, fmt, io, result};


/// laptrace's result type `Result` carries a `Fubar` on failure.
pub type Result<T> = result::Result<T, Fubar>;


/// Error bubbled out of the timing engine.
///
/// Lookups that are expected to miss (timestamp search, track matching) return
/// `Option` instead and never produce a `Fubar`. What is left here are the
/// failures a caller has to act upon.
///
/// It is recommended to produce `Fubar::Catalog` errors through the `fubar!`
/// macro, which accepts the same parameters as `format!` and returns an
/// `Err(Fubar::Catalog)`.
///
/// FUBAR: Fucked Up Beyond All {Recognition, Repair, Reason}
#[derive(Clone, Debug, PartialEq)]
pub enum Fubar {
  /// Interpolation requested for `at`, which lies outside of `[start, end]`.
  OutOfRange {
    at:    DateTime<Utc>,
    start: DateTime<Utc>,
    end:   DateTime<Utc>,
  },
  /// No GPS sample was accurate enough to pick a track from the catalog.
  UnmatchedTrack,
  /// The track catalog could not be read or parsed.
  Catalog(String),
}

impl fmt::Display for Fubar {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Self::OutOfRange { at, start, end } => {
        write!(f, "{} is out of range [{}, {}]", at, start, end)
      }
      Self::UnmatchedTrack => {
        write!(f, "no sample accurate enough to match a known track")
      }
      Self::Catalog(msg) => write!(f, "track catalog: {}", msg),
    }
  }
}

impl error::Error for Fubar {}


/// This macro - internal use only - generates the implementation of the
/// `From` trait for `Fubar` for a given list of types.
macro_rules! implement_from {
  ($($ErrType:ty),*) => {$(
    impl From<$ErrType> for Fubar {
      fn from(error: $ErrType) -> Self {
        Self::Catalog(error.to_string())
      }
    }
  )*}
}

// here the macro is called with a list of types used in our codebase
implement_from!(serde_json::Error, io::Error);


/// The `fubar!` macro provides an easy way to return formatted catalog errors
/// from functions returning a `Result`:
///
/// ```ignore
/// match track.sectors().len() {
///   0 => fubar!("track '{}' has no sectors", track.name()),
///   _ => Ok(()),
/// }
/// ```
#[macro_export]
macro_rules! fubar {
  ($($arg:tt)*) => {
    Err($crate::Fubar::Catalog(format!($($arg)*)))
  }
}


/// The `ensure!` macro makes sure a condition is true, and if not, returns
/// early with whatever `fubar!` produces for the remaining arguments:
///
/// ```ignore
/// fn check(name: &str) -> Result<()> {
///   ensure!(!name.is_empty(), "track without a name");
///   Ok(())
/// }
/// ```
#[macro_export]
macro_rules! ensure {
  ($cond:expr, $($arg:tt)*) => {
    if !($cond) { return $crate::fubar!($($arg)*) }
  }
}
