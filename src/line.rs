// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::{PositionFix, Timed};
use chrono::{DateTime, Duration, Utc};
use getset::CopyGetters;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;


/// Earth radius in meters as used by the great circle distance.
pub const EARTH_RADIUS: f64 = 6_378_100.0;

/// Fixes farther away from a line than this (in meters) never count as a
/// crossing, no matter on which side they are.
pub const PROXIMITY_THRESHOLD: f64 = 8.0;


/// Two points defining a gate, e.g. a start line or a sector line. Also used
/// as a bounding box with the minimum corner in `p1` and the maximum in `p2`.
///
/// Serialized as `[lat1, lon1, lat2, lon2]`.
#[derive(Clone,
           Copy,
           Debug,
           Default,
           PartialEq,
           CopyGetters,
           Serialize,
           Deserialize)]
#[getset(get_copy = "pub")]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Line {
  p1: PositionFix,
  p2: PositionFix,
}

impl Line {
  pub fn new(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Self {
    Self { p1: PositionFix::new(lat1, lon1),
           p2: PositionFix::new(lat2, lon2), }
  }

  /// Both ends at the origin, which is what an undefined line looks like.
  pub fn is_zero(&self) -> bool {
    self.p1.is_zero() && self.p2.is_zero()
  }

  /// Both ends on the same spot. Such a line has no sides.
  pub fn is_degenerate(&self) -> bool {
    self.p1.latitude() == self.p2.latitude()
    && self.p1.longitude() == self.p2.longitude()
  }

  pub fn midpoint(&self) -> PositionFix {
    PositionFix::new((self.p1.latitude() + self.p2.latitude()) / 2.0,
                     (self.p1.longitude() + self.p2.longitude()) / 2.0)
  }

  /// Half plane `fix` lies in, `1.0` or `-1.0`. A fix exactly on the line
  /// counts as `1.0`.
  pub fn side(&self, fix: &PositionFix) -> f64 {
    let cross = (fix.latitude() - self.p1.latitude())
                * (self.p2.longitude() - self.p1.longitude())
                - (fix.longitude() - self.p1.longitude())
                  * (self.p2.latitude() - self.p1.latitude());
    if cross >= 0.0 {
      1.0
    } else {
      -1.0
    }
  }

  /// Signed distance in meters between `fix` and the middle of the line.
  ///
  /// This stands in for the perpendicular distance, which is fine as long as
  /// the line is short, and gates are a few dozen meters at most.
  pub fn to(&self, fix: &PositionFix) -> f64 {
    self.side(fix) * distance(&self.midpoint(), fix)
  }
}

impl From<[f64; 4]> for Line {
  fn from([lat1, lon1, lat2, lon2]: [f64; 4]) -> Self {
    Self::new(lat1, lon1, lat2, lon2)
  }
}

impl From<Line> for [f64; 4] {
  fn from(line: Line) -> Self {
    [line.p1.latitude(),
     line.p1.longitude(),
     line.p2.latitude(),
     line.p2.longitude()]
  }
}


/// haversin(θ)
fn hsin(theta: f64) -> f64 {
  (theta / 2.0).sin().powi(2)
}

/// Great circle distance in meters between `a` and `b` using the Haversine
/// formula on a spherical earth.
pub fn distance(a: &PositionFix, b: &PositionFix) -> f64 {
  let (la1, lo1) = (a.latitude() * PI / 180.0, a.longitude() * PI / 180.0);
  let (la2, lo2) = (b.latitude() * PI / 180.0, b.longitude() * PI / 180.0);

  let h = hsin(la2 - la1) + la1.cos() * la2.cos() * hsin(lo2 - lo1);
  2.0 * EARTH_RADIUS * h.sqrt().asin()
}

/// Instant at which the vehicle went over `line` between the time adjacent
/// fixes `a` and `b`, or `None` if it did not.
///
/// Both fixes must be within `PROXIMITY_THRESHOLD` of the line, otherwise a
/// side change is taken as noise. The instant is interpolated by the
/// distances of both fixes to the line.
pub fn crossed(line: &Line,
               a: &Timed<PositionFix>,
               b: &Timed<PositionFix>)
               -> Option<DateTime<Utc>> {
  if line.is_degenerate() {
    return None;
  }

  let (side_a, side_b) = (line.to(&a.value), line.to(&b.value));
  // a fix right on the line was counted by the pair ending on it
  if side_a == 0.0 || side_a * side_b > 0.0 {
    return None;
  }
  if side_a.abs() > PROXIMITY_THRESHOLD || side_b.abs() > PROXIMITY_THRESHOLD
  {
    debug!(side_a, side_b, "side change too far from line, ignored");
    return None;
  }

  let ratio = side_a.abs() / (side_a.abs() + side_b.abs());
  let span = (b.time - a.time).num_nanoseconds()? as f64;
  Some(a.time + Duration::nanoseconds((span * ratio + 0.5) as i64))
}


#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;
  use pretty_assertions::assert_eq;


  fn at(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_726_304_000, 0).unwrap() + Duration::milliseconds(ms)
  }

  fn fix(ms: i64, lat: f64, lon: f64) -> Timed<PositionFix> {
    Timed::new(at(ms), PositionFix::new(lat, lon))
  }

  // one meter in degrees on the equator for the test radius
  fn meters(m: f64) -> f64 {
    m / EARTH_RADIUS * 180.0 / PI
  }

  #[test]
  fn line_test() {
    let line = Line::new(1.0, 2.0, 3.0, 4.0);
    assert_eq!(1.0, line.p1().latitude());
    assert_eq!(4.0, line.p2().longitude());
    assert_eq!(PositionFix::new(2.0, 3.0), line.midpoint());
    assert_eq!(false, line.is_zero());
    assert_eq!(false, line.is_degenerate());

    assert_eq!(true, Line::default().is_zero());
    assert_eq!(true, Line::default().is_degenerate());
    assert_eq!(true, Line::new(1.0, 1.0, 1.0, 1.0).is_degenerate());
  }

  #[test]
  fn side_test() {
    let line = Line::new(0.0, 0.0, 0.0, 1.0);
    assert_eq!(1.0, line.side(&PositionFix::new(0.5, 0.5)));
    assert_eq!(-1.0, line.side(&PositionFix::new(-0.5, 0.5)));
    // on the line resolves to 1
    assert_eq!(1.0, line.side(&PositionFix::new(0.0, 0.5)));
  }

  #[test]
  fn distance_test() {
    let a = PositionFix::new(0.0, 0.0);
    assert_eq!(0.0, distance(&a, &a));

    // a quarter of the meridian
    let pole = PositionFix::new(90.0, 0.0);
    let quarter = EARTH_RADIUS * PI / 2.0;
    assert!((distance(&a, &pole) - quarter).abs() < 1e-6);

    // Ancenis start line is roughly 7.6 m long
    let start = Line::new(47.39503548385757,
                          -1.1856938139621283,
                          47.3949784858503,
                          -1.1856306643524066);
    let length = distance(&start.p1(), &start.p2());
    assert!(length > 7.0 && length < 8.5, "{}", length);
  }

  #[test]
  fn to_test() {
    let line = Line::new(0.0, -0.5, 0.0, 0.5);
    let north = PositionFix::new(meters(3.0), 0.0);
    let south = PositionFix::new(-meters(5.0), 0.0);

    assert!((line.to(&north) - 3.0).abs() < 1e-6);
    assert!((line.to(&south) + 5.0).abs() < 1e-6);
  }

  #[test]
  fn crossed_test() {
    let line = Line::new(0.0, 0.0, 0.0, 1.0);
    // the middle of the line sits at longitude 0.5
    let a = fix(0, -meters(2.0), 0.5);
    let b = fix(1_000, meters(6.0), 0.5);

    let t = crossed(&line, &a, &b).unwrap();
    assert!(a.time < t && t < b.time);
    // 2 m of 8 m in total: a quarter of the way
    assert!((t - at(250)).num_microseconds().unwrap().abs() < 10);

    // and back again
    let t = crossed(&line, &b, &fix(2_000, -meters(2.0), 0.5)).unwrap();
    assert!((t - at(1_750)).num_microseconds().unwrap().abs() < 10);
  }

  #[test]
  fn crossed_same_side_test() {
    let line = Line::new(0.0, 0.0, 0.0, 1.0);
    let a = fix(0, meters(2.0), 0.5);
    let b = fix(1_000, meters(1.0), 0.5);
    assert_eq!(None, crossed(&line, &a, &b));
  }

  #[test]
  fn crossed_too_far_test() {
    let line = Line::new(0.0, 0.0, 0.0, 1.0);
    let a = fix(0, -meters(2.0), 0.5);
    let b = fix(1_000, meters(9.0), 0.5);
    assert_eq!(None, crossed(&line, &a, &b));

    let a = fix(0, -meters(8.5), 0.5);
    let b = fix(1_000, meters(1.0), 0.5);
    assert_eq!(None, crossed(&line, &a, &b));
  }

  #[test]
  fn crossed_on_line_test() {
    let line = Line::new(0.0, 0.0, 0.0, 1.0);
    let a = fix(0, -meters(2.0), 0.5);
    let on = fix(1_000, 0.0, 0.5);
    let b = fix(2_000, meters(2.0), 0.5);

    // counted once, when arriving on the line
    assert_eq!(Some(at(1_000)), crossed(&line, &a, &on));
    assert_eq!(None, crossed(&line, &on, &b));
    assert_eq!(None, crossed(&line, &on, &on));
  }

  #[test]
  fn crossed_degenerate_test() {
    let line = Line::new(0.0, 0.5, 0.0, 0.5);
    let a = fix(0, -meters(1.0), 0.5);
    let b = fix(1_000, meters(1.0), 0.5);
    assert_eq!(None, crossed(&line, &a, &b));
  }

  #[test]
  fn serde_test() {
    let line: Line = serde_json::from_str("[1.5, 2.5, 3.5, 4.5]").unwrap();
    assert_eq!(Line::new(1.5, 2.5, 3.5, 4.5), line);
    assert_eq!("[1.5,2.5,3.5,4.5]", serde_json::to_string(&line).unwrap());
  }
}
