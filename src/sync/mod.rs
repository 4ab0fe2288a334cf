//! Resource synchronization
//!
//! Coordinates multi-resource operations (roadmaps, sprint plans, versioned
//! updates) against a [`ProjectAdapter`](crate::adapter::ProjectAdapter).

mod report;
mod synchronizer;

pub use report::{
    BatchFailure, BatchPosition, BatchReport, LinkFailure, RoadmapMilestone,
    RoadmapMilestoneInput, RoadmapResult, SprintPlan,
};
pub use synchronizer::ResourceSynchronizer;
