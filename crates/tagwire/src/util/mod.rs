//! Utility modules for tagwire.

pub mod ticks;

pub use ticks::{
    date_time_to_ticks, ticks_to_date_time, ticks_to_time_delta, time_delta_to_ticks,
};
