pub mod blocks;
pub mod builder;
pub mod checklist;
pub mod input;
pub mod model;

pub use blocks::{allocate, BlockType, Ratios, StudyBlock};
pub use builder::{builder_for, AgentPlanBuilder, HeuristicPlanBuilder, PlanBuilder};
pub use checklist::render_checklist;
pub use input::{PlanInput, PlanStrategy};
pub use model::{DayPlan, PlanReasoning, StudyPlan};
