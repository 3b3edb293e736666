// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::{Fubar, Interpolate, Result, Timed};
use chrono::{DateTime, Utc};
use std::{iter::FromIterator, ops::Range, slice, vec};


/// Returns the index `i` for which `samples[i].time <= t < samples[i + 1].time`.
///
/// `None` is returned if there are less than two samples or `t` lies outside
/// of `[samples[0].time, samples[last].time]`. A `t` exactly on the last
/// timestamp yields the second to last index, so `i + 1` is always valid.
pub fn find_index<T>(t: DateTime<Utc>, samples: &[Timed<T>]) -> Option<usize> {
  if samples.len() < 2 {
    return None;
  }
  if t < samples[0].time || t > samples[samples.len() - 1].time {
    return None;
  }

  // invariant: samples[start].time <= t, and t < samples[stop].time unless
  // stop is the last index
  let (mut start, mut stop) = (0, samples.len() - 1);
  while stop > start + 1 {
    let mid = start + (stop - start) / 2;
    if t < samples[mid].time {
      stop = mid;
    } else {
      start = mid;
    }
  }
  Some(start)
}

/// Linear interpolation of the sample at `t` between `a` and `b`.
///
/// Fails with `Fubar::OutOfRange` if `t` is not within `[a.time, b.time]`;
/// there is no clamping.
pub fn interpolate<T>(t: DateTime<Utc>,
                      a: &Timed<T>,
                      b: &Timed<T>)
                      -> Result<Timed<T>>
  where T: Interpolate + Clone
{
  if t < a.time || t > b.time {
    return Err(Fubar::OutOfRange { at:    t,
                                   start: a.time,
                                   end:   b.time, });
  }

  let span = nanos(b.time - a.time);
  if span == 0 {
    return Ok(Timed::new(t, a.value.clone()));
  }
  let ratio = nanos(t - a.time) as f64 / span as f64;
  Ok(Timed::new(t, a.value.interpolate(&b.value, ratio)))
}

fn nanos(d: chrono::Duration) -> i64 {
  d.num_nanoseconds().unwrap_or(i64::MAX)
}


/// A time ordered sequence of samples of one kind, e.g. all GPS fixes of a
/// recording.
///
/// The ordering is not checked. Channels built by the `telemetry` module are
/// sorted by construction; callers pushing their own samples are responsible
/// for keeping it that way.
#[derive(Clone, Debug, PartialEq)]
pub struct Channel<T> {
  samples: Vec<Timed<T>>,
}

impl<T> Default for Channel<T> {
  fn default() -> Self {
    Self { samples: Vec::new() }
  }
}

impl<T> Channel<T> {
  pub fn new(samples: Vec<Timed<T>>) -> Self {
    Self { samples }
  }

  pub fn push(&mut self, sample: Timed<T>) {
    self.samples.push(sample);
  }

  pub fn samples(&self) -> &[Timed<T>] {
    &self.samples
  }

  pub fn len(&self) -> usize {
    self.samples.len()
  }

  pub fn is_empty(&self) -> bool {
    self.samples.is_empty()
  }

  pub fn first(&self) -> Option<&Timed<T>> {
    self.samples.first()
  }

  pub fn last(&self) -> Option<&Timed<T>> {
    self.samples.last()
  }

  pub fn get(&self, idx: usize) -> Option<&Timed<T>> {
    self.samples.get(idx)
  }

  pub fn iter(&self) -> slice::Iter<'_, Timed<T>> {
    self.samples.iter()
  }

  /// Adjacent sample pairs in time order, the way the lap counter eats them.
  pub fn pairs(&self) -> impl Iterator<Item = (&Timed<T>, &Timed<T>)> {
    self.samples.windows(2).map(|pair| (&pair[0], &pair[1]))
  }

  /// Samples within `range`, clipped to the channel length.
  pub fn slice(&self, range: Range<usize>) -> &[Timed<T>] {
    let end = range.end.min(self.samples.len());
    let start = range.start.min(end);
    &self.samples[start..end]
  }

  pub fn find_index(&self, t: DateTime<Utc>) -> Option<usize> {
    find_index(t, &self.samples)
  }

  /// Moves every sample `by` forward in time.
  pub(crate) fn shift(&mut self, by: chrono::Duration) {
    for sample in &mut self.samples {
      sample.time = sample.time + by;
    }
  }
}

impl<T> Channel<T> where T: Interpolate + Clone
{
  /// Interpolated sample at `t`, `None` if `t` is outside of the channel.
  pub fn at(&self, t: DateTime<Utc>) -> Option<Timed<T>> {
    let idx = self.find_index(t)?;
    interpolate(t, &self.samples[idx], &self.samples[idx + 1]).ok()
  }
}

impl<T> FromIterator<Timed<T>> for Channel<T> {
  fn from_iter<I: IntoIterator<Item = Timed<T>>>(iter: I) -> Self {
    Self::new(iter.into_iter().collect())
  }
}

impl<T> IntoIterator for Channel<T> {
  type IntoIter = vec::IntoIter<Timed<T>>;
  type Item = Timed<T>;

  fn into_iter(self) -> Self::IntoIter {
    self.samples.into_iter()
  }
}

impl<'a, T> IntoIterator for &'a Channel<T> {
  type IntoIter = slice::Iter<'a, Timed<T>>;
  type Item = &'a Timed<T>;

  fn into_iter(self) -> Self::IntoIter {
    self.samples.iter()
  }
}
