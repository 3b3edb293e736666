// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use chrono::Duration;


/// Formats `d` the way a stopwatch shows it, `M:SS.CC`. Digits below the
/// centisecond are cut off, not rounded.
pub fn duration_to_chrono(d: Duration) -> String {
  let ms = d.num_milliseconds();
  let m = ms / (60 * 1_000);
  let s = (ms - m * 60 * 1_000) / 1_000;
  let cs = (ms - (m * 60 + s) * 1_000) / 10;
  format!("{}:{:02}.{:02}", m, s, cs)
}
