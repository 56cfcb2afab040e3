pub mod calibration;
pub mod channel;
pub mod compose;
pub mod consts;
pub mod correction;
pub mod error;
pub mod filters;
pub mod io;
pub mod pipeline;
pub mod ratio;
pub mod results;
pub mod stats;
