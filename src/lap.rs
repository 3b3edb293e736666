// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Jonas Reitemeyer <jonas@bmc-labs.com>
//   Florian Eich <florian@bmc-labs.com>

use super::{format::duration_to_chrono, line, PositionFix, Timed, Track};
use chrono::{DateTime, Duration, Utc};
use getset::{CopyGetters, Getters};
use tracing::{debug, info, trace};


/// How the last pass through a sector compares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectorStatus {
  /// Faster than in the best lap.
  Ahead,
  /// Not driven yet in this lap.
  Neutral,
  /// Slower than (or as fast as) in the best lap, or no best lap yet.
  Behind,
  /// Fastest ever.
  NewBest,
}

impl SectorStatus {
  pub fn code(self) -> i8 {
    match self {
      Self::Ahead => -1,
      Self::Neutral => 0,
      Self::Behind => 1,
      Self::NewBest => 2,
    }
  }
}

impl Default for SectorStatus {
  fn default() -> Self {
    Self::Neutral
  }
}


/// One entry per timing line of a lap: index 0 is the start, index `i + 1`
/// the crossing of sector line `i`. `None` until crossed.
pub type Crossings = Vec<Option<DateTime<Utc>>>;


/// Keeps lap and sector times of one session on one track.
///
/// A track with `n` sector lines has `n + 1` splits: start to first sector,
/// sector to sector, and last sector back to the start. The last split of a
/// lap is only known when the next lap starts, and so is its status.
///
/// Best times are kept as `Option`, so a split that never completed reads as
/// `None` and not as a zero duration.
#[derive(Clone, Debug, PartialEq, CopyGetters, Getters)]
pub struct LapCounter<'t> {
  track:         &'t Track,
  /// Crossings of all laps so far. Lap 0 is whatever was driven before the
  /// first start line crossing.
  #[getset(get = "pub")]
  laps:          Vec<Crossings>,
  best:          Option<usize>,
  best_duration: Option<Duration>,
  #[getset(get = "pub")]
  best_sectors:  Vec<Option<Duration>>,
  /// Index of the lap in progress.
  #[getset(get_copy = "pub")]
  current:       usize,
  status:        Vec<SectorStatus>,
  prev_status:   Vec<SectorStatus>,
}

impl<'t> LapCounter<'t> {
  pub fn new(track: &'t Track) -> Self {
    let splits = track.sectors().len() + 1;
    Self { track,
           laps: vec![vec![None; splits]],
           best: None,
           best_duration: None,
           best_sectors: vec![None; splits],
           current: 0,
           status: vec![SectorStatus::Neutral; splits],
           prev_status: vec![SectorStatus::Neutral; splits] }
  }

  pub fn track(&self) -> &'t Track {
    self.track
  }

  /// Feeds the next pair of time adjacent fixes. Pairs must come in time
  /// order, nothing is checked here.
  pub fn update(&mut self,
                prev: &Timed<PositionFix>,
                current: &Timed<PositionFix>) {
    let track = self.track;

    if let Some(start) = track.new_lap_start(prev, current) {
      debug!("start line crossed at {}", start);
      self.finish_lap(start);
    }

    for (idx, sector) in track.sectors().iter().enumerate() {
      let cross = match line::crossed(sector, prev, current) {
        Some(cross) => cross,
        None => continue,
      };
      debug!("sector line {} crossed at {}", idx, cross);

      // TODO reject sector lines crossed out of order (needs a direction per
      // line in the catalog)
      let lap = self.current;
      self.laps[lap][idx + 1] = Some(cross);
      let from = self.laps[lap][idx];
      if let Some(from) = from {
        self.update_sector(idx, cross - from, None);
      }
    }
  }

  fn finish_lap(&mut self, start: DateTime<Utc>) {
    let lap = self.current;

    if let Some(lap_start) = self.laps[lap][0] {
      let duration = start - lap_start;
      if self.best_duration.map_or(true, |best| duration < best) {
        self.best_duration = Some(duration);
        self.best = Some(lap);
      }
    }

    let last = self.track.sectors().len();
    if last > 0 {
      if let Some(from) = self.laps[lap][last] {
        self.update_sector(last, start - from, Some(start));
      }
    }

    self.laps.push(vec![None; last + 1]);
    self.current += 1;
    self.laps[self.current][0] = Some(start);

    self.prev_status.clone_from(&self.status);
    for status in &mut self.status {
      *status = SectorStatus::Neutral;
    }

    if let Some(summary) = self.lap_summary(lap) {
      info!("{}", summary);
    }
  }

  /// Records `duration` for split `idx` and works out its status. `next_start`
  /// is only needed for the last split, which ends on the next lap's start.
  fn update_sector(&mut self,
                   idx: usize,
                   duration: Duration,
                   next_start: Option<DateTime<Utc>>) {
    if self.best_sectors[idx].map_or(true, |best| duration < best) {
      self.best_sectors[idx] = Some(duration);
      self.status[idx] = SectorStatus::NewBest;
      trace!("split {} new best {}", idx, duration_to_chrono(duration));
      return;
    }

    let best_lap = match self.best {
      Some(best_lap) => best_lap,
      None => {
        self.status[idx] = SectorStatus::Behind;
        return;
      }
    };
    let best = &self.laps[best_lap];
    let from = match best[idx] {
      Some(from) => from,
      None => return,
    };
    // the best lap ends where the one after it starts, unless it is the lap
    // being finished right now
    let to = if idx + 1 == best.len() {
      self.laps
          .get(best_lap + 1)
          .and_then(|next| next[0])
          .or(next_start)
    } else {
      best[idx + 1]
    };

    // nothing to compare against if the best lap misses this split
    if let Some(before) = to.map(|to| to - from)
                            .filter(|before| *before != Duration::zero())
    {
      self.status[idx] = if duration < before {
        SectorStatus::Ahead
      } else {
        SectorStatus::Behind
      };
      trace!("split {} {:?}", idx, self.status[idx]);
    }
  }

  /// Index of the best lap, 0 as long as no lap was completed.
  pub fn best(&self) -> usize {
    self.best.unwrap_or(0)
  }

  pub fn best_lap(&self) -> Option<usize> {
    self.best
  }

  pub fn best_time(&self) -> Option<Duration> {
    self.best_duration
  }

  /// Statuses of the lap in progress.
  pub fn sector_status(&self) -> &[SectorStatus] {
    &self.status
  }

  /// Statuses of the previous lap, including its last split.
  pub fn prev_status(&self) -> &[SectorStatus] {
    &self.prev_status
  }

  /// Time spent in the current lap at `t`, zero before the first start.
  pub fn current_time(&self, t: DateTime<Utc>) -> Duration {
    match self.laps[self.current][0] {
      Some(start) if self.current > 0 => t - start,
      _ => Duration::zero(),
    }
  }

  /// Duration of the previous lap.
  pub fn prev_time(&self) -> Option<Duration> {
    let lap = self.current.checked_sub(1)?;
    self.lap_time(lap)
  }

  /// Sum of the best time of every split. Zero until each split was driven
  /// completely at least once.
  pub fn theoretical_best(&self) -> Duration {
    self.best_sectors
        .iter()
        .try_fold(Duration::zero(), |sum, best| best.map(|best| sum + best))
        .unwrap_or_else(Duration::zero)
  }

  /// Crossing times of lap `lap`, start first.
  pub fn crossings(&self, lap: usize) -> Option<&[Option<DateTime<Utc>>]> {
    self.laps.get(lap).map(|crossings| crossings.as_slice())
  }

  /// Start of lap `lap` and start of the one after it, if both are known.
  pub fn lap_bounds(&self, lap: usize) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = (*self.laps.get(lap)?.first()?)?;
    let stop = (*self.laps.get(lap + 1)?.first()?)?;
    Some((start, stop))
  }

  pub fn lap_time(&self, lap: usize) -> Option<Duration> {
    self.lap_bounds(lap).map(|(start, stop)| stop - start)
  }

  /// All completed laps with their duration.
  pub fn completed_laps(&self) -> Vec<(usize, Duration)> {
    (0..self.laps.len()).filter_map(|lap| {
                          self.lap_time(lap).map(|duration| (lap, duration))
                        })
                        .collect()
  }

  /// Split durations of lap `lap`, `None` where a line was missed. Empty for
  /// tracks without sector lines.
  pub fn split_times(&self, lap: usize) -> Option<Vec<Option<Duration>>> {
    let crossings = self.laps.get(lap)?;
    let last = crossings.len() - 1;
    if last == 0 {
      return Some(Vec::new());
    }

    let next_start = self.laps.get(lap + 1).and_then(|next| next[0]);
    let splits = (0..=last).map(|idx| {
                             let to = if idx == last {
                               next_start
                             } else {
                               crossings[idx + 1]
                             };
                             match (crossings[idx], to) {
                               (Some(from), Some(to)) => Some(to - from),
                               _ => None,
                             }
                           })
                           .collect();
    Some(splits)
  }

  /// One line status of lap `lap`: number, lap time and every split, each as
  /// `M:SS.CC`. Unknown times print as zero.
  pub fn lap_summary(&self, lap: usize) -> Option<String> {
    let splits = self.split_times(lap)?;
    let duration = self.lap_time(lap).unwrap_or_else(Duration::zero);

    let mut summary = format!("Lap {:02} {}", lap, duration_to_chrono(duration));
    for (idx, split) in splits.into_iter().enumerate() {
      let split = split.unwrap_or_else(Duration::zero);
      summary.push_str(&format!(" S{:02} {}",
                                idx + 1,
                                duration_to_chrono(split)));
    }
    Some(summary)
  }
}
