mod build;
mod bump;
mod detect;
mod discover;
mod fetch;
mod propagate;
mod publish;
mod push;
mod tag;

pub use build::BuildDirtyStage;
pub use bump::BumpStage;
pub use detect::DetectChangesStage;
pub use discover::DiscoverStage;
pub use fetch::FetchCleanStage;
pub use propagate::PropagateStage;
pub use publish::PublishStage;
pub use push::PushStage;
pub use tag::TagStage;
