// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::{extract_limits,
            telemetry::{accl_with_time, gps_with_time},
            Accel,
            Channel,
            Fubar,
            LapCounter,
            Line,
            PositionFix,
            Record,
            Result,
            Timed,
            Track,
            World};
use chrono::{DateTime, Utc};
use getset::Getters;
use std::ops::RangeInclusive;
use tracing::info;


/// Number of GPS samples looked back when deriving the acceleration from the
/// speed.
pub const ACC_DELTA: usize = 12;


/// One recording, analyzed: the reconstructed channels, the track it was
/// driven on and the laps counted on it.
#[derive(Clone, Debug, Getters)]
pub struct Run<'w> {
  #[getset(get = "pub")]
  gps:  Channel<PositionFix>,
  #[getset(get = "pub")]
  accl: Channel<Accel>,
  #[getset(get = "pub")]
  laps: LapCounter<'w>,
}

impl<'w> Run<'w> {
  /// Rebuilds the channels of `records`, picks the matching track from
  /// `world` and counts the laps driven on it.
  pub fn analyze(world: &'w World, records: &[Record]) -> Result<Self> {
    let gps = gps_with_time(records);
    let accl = accl_with_time(records);

    let track = world.get_track(&gps).ok_or(Fubar::UnmatchedTrack)?;
    info!("{} gps and {} accl samples recorded on {}",
          gps.len(),
          accl.len(),
          track.name());

    Ok(Self::on_track(track, gps, accl))
  }

  /// Counts laps on a known `track`, skipping the catalog lookup.
  pub fn on_track(track: &'w Track,
                  gps: Channel<PositionFix>,
                  accl: Channel<Accel>)
                  -> Self {
    let mut laps = LapCounter::new(track);
    for (prev, current) in gps.pairs() {
      laps.update(prev, current);
    }
    info!("{} laps completed on {}",
          laps.completed_laps().len(),
          track.name());

    Self { gps, accl, laps }
  }

  pub fn track(&self) -> &'w Track {
    self.laps.track()
  }

  /// Bounding box of the whole GPS trace.
  pub fn limits(&self) -> Line {
    extract_limits(&self.gps)
  }

  /// Indices into the GPS channel covering lap `lap`, from the sample at its
  /// start to the sample at the start of the next lap. The lap in progress
  /// runs to the end of the channel. `None` for laps that never started.
  pub fn lap_range(&self, lap: usize) -> Option<RangeInclusive<usize>> {
    let start = (*self.laps.crossings(lap)?.first()?)?;
    let first = self.gps.find_index(start)?;
    match self.laps.lap_bounds(lap) {
      Some((_, stop)) => Some(first..=self.gps.find_index(stop)?),
      None if lap == self.laps.current() => Some(first..=self.gps.len() - 1),
      None => None,
    }
  }

  /// GPS fixes of lap `lap`, see `lap_range`.
  pub fn lap_fixes(&self, lap: usize) -> Option<&[Timed<PositionFix>]> {
    self.lap_range(lap).map(|range| &self.gps.samples()[range])
  }

  /// Speed in m/s of GPS sample `idx`.
  pub fn speed(&self, idx: usize) -> Option<f64> {
    self.gps.get(idx).map(|fix| fix.value.speed_3d())
  }

  /// Longitudinal acceleration in m/s² at GPS sample `idx`, the speed change
  /// over the last `ACC_DELTA` samples. The first sample looks ahead by one
  /// instead.
  pub fn acceleration(&self, idx: usize) -> Option<f64> {
    if idx >= self.gps.len() || self.gps.len() < 2 {
      return None;
    }

    let start = self.gps.get(idx.saturating_sub(ACC_DELTA))?;
    let stop = self.gps.get(idx.max(1))?;
    let secs = (stop.time - start.time).num_microseconds()? as f64 / 1e6;
    if secs == 0.0 {
      return None;
    }
    Some((stop.value.speed_3d() - start.value.speed_3d()) / secs)
  }

  /// Position at `t`, e.g. the timestamp of a video frame.
  pub fn position_at(&self, t: DateTime<Utc>) -> Option<Timed<PositionFix>> {
    self.gps.at(t)
  }

  pub fn accl_at(&self, t: DateTime<Utc>) -> Option<Timed<Accel>> {
    self.accl.at(t)
  }
}


#[cfg(test)]
mod tests {
  use super::{super::{line::EARTH_RADIUS, Gps5, SectorStatus},
              *};
  use chrono::{Duration, TimeZone};
  use pretty_assertions::assert_eq;
  use std::f64::consts::PI;


  // (start, duration) of each lap in seconds; the last one is cut short
  const LAPS: [(i64, i64); 3] = [(0, 30), (30, 27), (57, 33)];
  const LAST_RECORD: i64 = 80;

  fn at(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_726_304_000, 0).unwrap() + Duration::milliseconds(ms)
  }

  fn degrees(meters: f64) -> f64 {
    meters / EARTH_RADIUS * 180.0 / PI
  }

  fn gate(x: f64) -> Line {
    Line::new(-degrees(5.0), degrees(x), degrees(5.0), degrees(x))
  }

  fn world() -> World {
    World::new(vec![Track::new("Far Away",
                               Line::new(45.0, 1.0, 45.0001, 1.0),
                               vec![],
                               Line::default()),
                    Track::new("Equator Ring",
                               gate(0.0),
                               vec![gate(100.0), gate(200.0)],
                               Line::default())])
  }

  // 300 m of straight road driven eastwards from 20 m before the start line,
  // then teleported back for the next lap
  fn drive(ms: i64) -> Gps5 {
    let (start, duration) = *LAPS.iter()
                                 .rev()
                                 .find(|(start, _)| ms >= start * 1_000)
                                 .unwrap();
    let speed = 300.0 / duration as f64;
    let x = -20.0 + speed * (ms - start * 1_000) as f64 / 1_000.0;
    Gps5 { longitude: degrees(x),
           speed_3d: speed,
           ..Default::default() }
  }

  fn records(accuracy: u16) -> Vec<Record> {
    (0..=LAST_RECORD).map(|s| {
                       let gps = (0..4).map(|j| drive(s * 1_000 + j * 250))
                                       .collect();
                       Record::new(at(s * 1_000))
                         .with_gps(gps, accuracy)
                         .with_accl(vec![Accel::new(0.0, 0.0, 9.81); 10])
                     })
                     .collect()
  }

  fn ms(d: Duration) -> i64 {
    (d.num_microseconds().unwrap() as f64 / 1_000.0).round() as i64
  }

  #[test]
  fn analyze_test() {
    let world = world();
    let run = Run::analyze(&world, &records(300)).unwrap();

    assert_eq!("Equator Ring", run.track().name());
    assert_eq!(4 * (LAST_RECORD as usize + 1), run.gps().len());
    assert_eq!(10 * (LAST_RECORD as usize + 1), run.accl().len());

    let laps: Vec<(usize, i64)> = run.laps()
                                     .completed_laps()
                                     .into_iter()
                                     .map(|(lap, duration)| (lap, ms(duration)))
                                     .collect();
    assert_eq!(vec![(1, 29_800), (2, 27_400)], laps);
    assert_eq!(3, run.laps().current());
    assert_eq!(Some(2), run.laps().best_lap());
    assert_eq!(27_400, ms(run.laps().theoretical_best()));
  }

  #[test]
  fn sector_status_test() {
    use SectorStatus::*;

    let world = world();
    let run = Run::analyze(&world, &records(300)).unwrap();

    let splits: Vec<Option<i64>> = run.laps()
                                      .split_times(2)
                                      .unwrap()
                                      .into_iter()
                                      .map(|split| split.map(ms))
                                      .collect();
    assert_eq!(vec![Some(9_000), Some(9_000), Some(9_400)], splits);
    assert_eq!(&[NewBest, NewBest, NewBest], run.laps().prev_status());
    // lap 3 ends before the second sector line
    assert_eq!(&[Behind, Neutral, Neutral], run.laps().sector_status());
  }

  #[test]
  fn unmatched_test() {
    let world = world();
    assert_eq!(Some(Fubar::UnmatchedTrack),
               Run::analyze(&world, &records(10_000)).err());
    assert_eq!(Some(Fubar::UnmatchedTrack),
               Run::analyze(&world, &[]).err());
  }

  #[test]
  fn lap_fixes_test() {
    let world = world();
    let run = Run::analyze(&world, &records(300)).unwrap();

    // from the fix on the start line up to the last one before the next start
    assert_eq!(Some(8..=127), run.lap_range(1));
    let fixes = run.lap_fixes(1).unwrap();
    assert_eq!(120, fixes.len());
    assert_eq!(at(2_000), fixes[0].time);
    assert_eq!(at(31_750), fixes[119].time);

    assert_eq!(None, run.lap_fixes(0));
    assert_eq!(None, run.lap_fixes(4));
  }

  #[test]
  fn lap_in_progress_test() {
    let world = world();
    let run = Run::analyze(&world, &records(300)).unwrap();

    // lap 3 started at 59.2s and is still running when the recording ends
    let current = run.laps().current();
    assert_eq!(3, current);
    assert_eq!(Some(236..=323), run.lap_range(current));
    let fixes = run.lap_fixes(current).unwrap();
    assert_eq!(at(59_000), fixes[0].time);
    assert_eq!(run.gps().last(), fixes.last());
  }

  #[test]
  fn speed_acceleration_test() {
    let world = world();
    let run = Run::analyze(&world, &records(300)).unwrap();

    assert_eq!(Some(10.0), run.speed(8));
    assert_eq!(None, run.speed(run.gps().len()));

    assert_eq!(Some(0.0), run.acceleration(0));
    assert_eq!(Some(0.0), run.acceleration(8));
    // three seconds after a 10 m/s sample at 27.25s, now at 300/27 m/s
    let acc = run.acceleration(121).unwrap();
    assert!((acc - (300.0 / 27.0 - 10.0) / 3.0).abs() < 1e-9, "{}", acc);
    assert_eq!(None, run.acceleration(run.gps().len()));
  }

  #[test]
  fn position_at_test() {
    let world = world();
    let run = Run::analyze(&world, &records(300)).unwrap();

    let fix = run.position_at(at(2_125)).unwrap();
    assert_eq!(at(2_125), fix.time);
    assert!((fix.value.longitude() - degrees(1.25)).abs() < 1e-12);
    assert_eq!(None, run.position_at(at(-1)));

    let accl = run.accl_at(at(500)).unwrap();
    assert_eq!(9.81, accl.value.z);

    let limits = run.limits();
    assert!((limits.p1().longitude() - degrees(-20.0)).abs() < 1e-12);
    assert_eq!(0.0, limits.p2().latitude());
  }

  #[test]
  fn on_track_test() {
    let world = world();
    let track = world.track("Equator Ring").unwrap();
    let gps = gps_with_time(&records(300));
    let run = Run::on_track(track, gps, Channel::default());

    assert_eq!(2, run.laps().completed_laps().len());
    assert_eq!(None, run.accl_at(at(0)));
  }
}
