// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::{line, Line, PositionFix, Result, Timed};
use chrono::{DateTime, Utc};
use eyre::WrapErr;
use getset::Getters;
use serde::{Deserialize, Serialize};
use std::{fs,
          path::{Path, PathBuf}};
use tracing::debug;


/// Fixes with an accuracy of this many centimeters or worse are ignored when
/// looking for the track a session was recorded on.
pub const ACCURACY_THRESHOLD: u16 = 10_000;

const BUILTIN_CATALOG: &str = include_str!("../data/tracks.json");


/// A circuit: where laps start, where sectors split and which area the
/// overlay map covers.
#[derive(Clone, Debug, PartialEq, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct Track {
  name:      String,
  #[serde(default, rename = "logofile", skip_serializing_if = "Option::is_none")]
  logo_file: Option<String>,
  #[serde(default, rename = "logomask", skip_serializing_if = "Option::is_none")]
  logo_mask: Option<String>,
  start:     Line,
  #[serde(default)]
  sectors:   Vec<Line>,
  #[serde(default)]
  limits:    Line,
}

impl Track {
  pub fn new(name: &str, start: Line, sectors: Vec<Line>, limits: Line) -> Self {
    Self { name: name.to_string(),
           logo_file: None,
           logo_mask: None,
           start,
           sectors,
           limits }
  }

  /// Signed distance in meters from `fix` to the start line.
  pub fn to(&self, fix: &PositionFix) -> f64 {
    self.start.to(fix)
  }

  /// Instant the start line was crossed between `a` and `b`, if it was.
  pub fn new_lap_start(&self,
                       a: &Timed<PositionFix>,
                       b: &Timed<PositionFix>)
                       -> Option<DateTime<Utc>> {
    line::crossed(&self.start, a, b)
  }

  /// Name usable in file names.
  pub fn short_name(&self) -> String {
    self.name.replace(' ', "")
  }

  /// Location of the aerial map of this track within `dir`.
  pub fn image_file_name(&self, dir: &Path) -> PathBuf {
    dir.join(format!("{}.png", self.short_name()))
  }
}


/// The catalog of known tracks. Build it once and hand it around by
/// reference, it never changes afterwards.
#[derive(Clone, Debug, Default, PartialEq, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct World {
  tracks: Vec<Track>,
}

impl World {
  pub fn new(tracks: Vec<Track>) -> Self {
    Self { tracks }
  }

  /// Catalog shipped with the crate.
  pub fn builtin() -> Result<Self> {
    Self::from_json(BUILTIN_CATALOG)
  }

  /// Parses a catalog from its JSON representation.
  pub fn from_json(json: &str) -> Result<Self> {
    let world: Self = serde_json::from_str(json)?;
    for track in &world.tracks {
      ensure!(!track.name.is_empty(), "track without a name");
      ensure!(!track.start.is_degenerate(),
              "start line of '{}' has zero length",
              track.name);
      ensure!(track.sectors.iter().all(|sector| !sector.is_degenerate()),
              "sector line of '{}' has zero length",
              track.name);
    }
    Ok(world)
  }

  /// Reads a catalog file.
  pub fn load(path: &Path) -> eyre::Result<Self> {
    let json = fs::read_to_string(path).wrap_err_with(|| {
                                         format!("unable to read track \
                                                  catalog ({})",
                                                 path.display())
                                       })?;
    Self::from_json(&json).wrap_err_with(|| {
                            format!("invalid track catalog ({})",
                                    path.display())
                          })
  }

  pub fn track(&self, name: &str) -> Option<&Track> {
    self.tracks.iter().find(|track| track.name == name)
  }

  /// The track whose start line came closest to any sufficiently accurate
  /// fix of `fixes`. `None` if no fix passed the accuracy filter.
  pub fn get_track<'a, I>(&self, fixes: I) -> Option<&Track>
    where I: IntoIterator<Item = &'a Timed<PositionFix>>
  {
    let accurate: Vec<&PositionFix> =
      fixes.into_iter()
           .map(|fix| &fix.value)
           .filter(|fix| fix.accuracy() < ACCURACY_THRESHOLD)
           .collect();

    let mut best: Option<(&Track, f64)> = None;
    for track in &self.tracks {
      for fix in &accurate {
        let d = track.to(fix).abs();
        if best.map_or(true, |(_, min)| d < min) {
          best = Some((track, d));
        }
      }
    }

    if let Some((track, d)) = best {
      debug!("matched track '{}', {:.1}m from its start line", track.name, d);
    }
    best.map(|(track, _)| track)
  }
}


/// Bounding box of `fixes`, minimum corner in `p1` and maximum in `p2`.
pub fn extract_limits<'a, I>(fixes: I) -> Line
  where I: IntoIterator<Item = &'a Timed<PositionFix>>
{
  let mut fixes = fixes.into_iter().map(|fix| fix.value);
  let first = match fixes.next() {
    Some(fix) => fix,
    None => return Line::default(),
  };

  let (mut min_lat, mut min_lon) = (first.latitude(), first.longitude());
  let (mut max_lat, mut max_lon) = (min_lat, min_lon);
  for fix in fixes {
    min_lat = min_lat.min(fix.latitude());
    min_lon = min_lon.min(fix.longitude());
    max_lat = max_lat.max(fix.latitude());
    max_lon = max_lon.max(fix.longitude());
  }
  Line::new(min_lat, min_lon, max_lat, max_lon)
}

/// Ground resolution of a zoom level 20 map tile at latitude `lat`.
pub fn meter_per_pixel(lat: f64) -> f64 {
  40_075_016.686 * (lat.to_radians().cos()).abs() / 2f64.powi(20 + 8)
}
