//! Public entry points tying the stages together per data source.

mod context;
mod ergot;
mod weather;

pub use context::PipelineContext;
pub use ergot::{run_ergot_pipeline, ErgotConfig};
pub use weather::run_calendar_pipeline;
