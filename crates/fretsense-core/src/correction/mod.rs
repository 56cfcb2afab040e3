pub mod background;

pub use background::{
    subtract_background, subtract_background_stack, BackgroundSettings, FloorPolicy,
};
