pub mod airings;
pub mod etl;
pub mod pipeline;
pub mod timefmt;
pub mod xmltv;

pub use crate::domain::model::{
    AiringOutcome, ChannelLineup, ProgrammeRecord, SkipReason, TransformResult,
};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
