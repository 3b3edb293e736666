// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use chrono::{DateTime, Utc};
use getset::CopyGetters;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;


/// Linear blend between two values of the same kind, `ratio` in `[0, 1]`.
pub trait Interpolate {
  fn interpolate(&self, other: &Self, ratio: f64) -> Self;
}

impl Interpolate for f64 {
  fn interpolate(&self, other: &Self, ratio: f64) -> Self {
    self + (other - self) * ratio
  }
}


/// Raw GPS payload as it comes out of the telemetry stream, five values per
/// sample and no accuracy of its own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Gps5 {
  pub latitude:  f64,
  pub longitude: f64,
  pub altitude:  f64,
  pub speed_2d:  f64,
  pub speed_3d:  f64,
}


/// A GPS fix enriched with the horizontal accuracy of the record it came
/// with. Latitude and longitude are in degrees, speeds in m/s, altitude in
/// meters and accuracy in centimeters.
#[derive(Clone,
           Copy,
           Debug,
           Default,
           PartialEq,
           CopyGetters,
           Serialize,
           Deserialize)]
#[getset(get_copy = "pub")]
pub struct PositionFix {
  latitude:  f64,
  longitude: f64,
  #[serde(default)]
  altitude:  f64,
  #[serde(default)]
  speed_2d:  f64,
  #[serde(default)]
  speed_3d:  f64,
  #[serde(default)]
  accuracy:  u16,
}

impl PositionFix {
  /// Fix with only a position, everything else zeroed.
  pub fn new(latitude: f64, longitude: f64) -> Self {
    Self { latitude,
           longitude,
           ..Default::default() }
  }

  pub fn from_gps5(raw: Gps5, accuracy: u16) -> Self {
    Self { latitude: raw.latitude,
           longitude: raw.longitude,
           altitude: raw.altitude,
           speed_2d: raw.speed_2d,
           speed_3d: raw.speed_3d,
           accuracy }
  }

  #[cfg(test)]
  fn with_speed(self, speed_3d: f64) -> Self {
    Self { speed_3d, ..self }
  }

  pub fn with_accuracy(self, accuracy: u16) -> Self {
    Self { accuracy, ..self }
  }

  /// Both coordinates exactly at the origin.
  pub fn is_zero(&self) -> bool {
    self.latitude == 0.0 && self.longitude == 0.0
  }
}

impl Interpolate for PositionFix {
  fn interpolate(&self, other: &Self, ratio: f64) -> Self {
    let accuracy = f64::from(self.accuracy).interpolate(&f64::from(other.accuracy),
                                                        ratio);
    Self { latitude:  self.latitude.interpolate(&other.latitude, ratio),
           longitude: self.longitude.interpolate(&other.longitude, ratio),
           altitude:  self.altitude.interpolate(&other.altitude, ratio),
           speed_2d:  self.speed_2d.interpolate(&other.speed_2d, ratio),
           speed_3d:  self.speed_3d.interpolate(&other.speed_3d, ratio),
           accuracy:  accuracy.round() as u16, }
  }
}


/// Accelerometer reading in m/s².
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Accel {
  pub x: f64,
  pub y: f64,
  pub z: f64,
}

impl Accel {
  pub fn new(x: f64, y: f64, z: f64) -> Self {
    Self { x, y, z }
  }

  /// Pitch in degrees, see NXP application note AN3461.
  pub fn pitch(&self) -> f64 {
    let tan_pitch = -self.x / (self.y * self.y + self.z * self.z).sqrt();
    tan_pitch.atan() * 180.0 / PI
  }

  /// Roll in degrees, see NXP application note AN3461. The small share of `x`
  /// keeps the denominator away from zero when the sensor stands upright.
  pub fn roll(&self) -> f64 {
    let sign = if self.z < 0.0 { -1.0 } else { 1.0 };
    let tan_roll =
      self.y / (sign * (0.01 * self.x * self.x + self.z * self.z).sqrt());
    tan_roll.atan() * 180.0 / PI
  }
}

impl Interpolate for Accel {
  fn interpolate(&self, other: &Self, ratio: f64) -> Self {
    Self { x: self.x.interpolate(&other.x, ratio),
           y: self.y.interpolate(&other.y, ratio),
           z: self.z.interpolate(&other.z, ratio), }
  }
}


/// A value together with the absolute time it was sampled at.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Timed<T> {
  pub time:  DateTime<Utc>,
  pub value: T,
}

impl<T> Timed<T> {
  pub fn new(time: DateTime<Utc>, value: T) -> Self {
    Self { time, value }
  }
}
