// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::{Accel, Channel, Gps5, PositionFix, Timed};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;


/// Records are nominally one second apart; anything beyond this is a gap in
/// the recording (sensor restart, card hiccup).
pub const MAX_RECORD_GAP: i64 = 2;


/// One coarse telemetry record as handed over by the stream decoder. It
/// covers roughly one second and bundles all samples gathered in that time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
  /// Absolute record time, `None` when the device had no clock fix yet.
  pub time:         Option<DateTime<Utc>>,
  pub gps:          Vec<Gps5>,
  /// Horizontal accuracy of all GPS samples of this record in cm.
  pub gps_accuracy: u16,
  pub accl:         Vec<Accel>,
}

impl Record {
  pub fn new(time: DateTime<Utc>) -> Self {
    Self { time: Some(time),
           ..Default::default() }
  }

  pub fn with_gps(self, gps: Vec<Gps5>, gps_accuracy: u16) -> Self {
    Self { gps, gps_accuracy, ..self }
  }

  pub fn with_accl(self, accl: Vec<Accel>) -> Self {
    Self { accl, ..self }
  }
}


/// Flattens the GPS samples of all `records` into one channel of timestamped
/// fixes, each carrying the accuracy of its record.
pub fn gps_with_time(records: &[Record]) -> Channel<PositionFix> {
  with_time(records, |record| {
    record.gps
          .iter()
          .map(|&raw| PositionFix::from_gps5(raw, record.gps_accuracy))
          .collect()
  })
}

/// Flattens the accelerometer samples of all `records` into one channel.
pub fn accl_with_time(records: &[Record]) -> Channel<Accel> {
  with_time(records, |record| record.accl.clone())
}

/// Spreads the values `extract` pulls out of each record evenly over the time
/// until the next record.
///
/// Records without a time or without values are skipped. The last record is
/// assumed to last one second. If the next record is more than
/// `MAX_RECORD_GAP` seconds away, the record is squeezed into the last second
/// before the next one and everything emitted so far is moved forward by the
/// same amount, which keeps the channel sorted.
pub fn with_time<T, F>(records: &[Record], extract: F) -> Channel<T>
  where F: Fn(&Record) -> Vec<T>
{
  let second = Duration::seconds(1);
  let mut channel = Channel::default();

  for (idx, record) in records.iter().enumerate() {
    let time = match record.time {
      Some(time) => time,
      None => continue,
    };
    let values = extract(record);
    if values.is_empty() {
      continue;
    }

    let (mut start, mut delta) = (time, second);
    if let Some(next) = records.get(idx + 1).and_then(|next| next.time) {
      delta = next - time;
      if delta > Duration::seconds(MAX_RECORD_GAP) {
        warn!("{}s gap in telemetry after {}, shifting {} samples",
              delta.num_milliseconds() as f64 / 1000.0,
              time,
              channel.len());
        channel.shift(delta - second);
        start = next - second;
        delta = second;
      }
    }

    let delta = delta.num_nanoseconds().unwrap_or(0);
    let count = values.len() as i64;
    for (j, value) in values.into_iter().enumerate() {
      let offset = Duration::nanoseconds((j as i64 * delta) / count);
      channel.push(Timed::new(start + offset, value));
    }
  }

  channel
}
