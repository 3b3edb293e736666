// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

#[macro_use]
mod fubar;
mod channel;
mod format;
mod lap;
pub mod line;
mod run;
mod sample;
pub mod telemetry;
pub mod track;

pub use channel::{find_index, interpolate, Channel};
pub use format::duration_to_chrono;
pub use fubar::{Fubar, Result};
pub use lap::{Crossings, LapCounter, SectorStatus};
pub use line::{crossed, distance, Line};
pub use run::{Run, ACC_DELTA};
pub use sample::{Accel, Gps5, Interpolate, PositionFix, Timed};
pub use telemetry::Record;
pub use track::{extract_limits, meter_per_pixel, Track, World};
