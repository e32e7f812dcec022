use chrono::{Days, NaiveDate};
use crate::content::curated_tasks;
use crate::difficulty::{advise, Difficulty};
use crate::energy::{classify_day, BeastStreak, DayType};
use crate::pipeline::Stage;
use crate::plan::blocks::{build_blocks, Ratios, StudyBlock};
use crate::plan::input::PlanStrategy;
use crate::plan::model::DayPlan;

/// A planning strategy. Both strategies share the same classifiers,
/// allocator and advisor; they differ only in which stages run.
pub trait PlanBuilder: Send + Sync {
    fn strategy(&self) -> PlanStrategy;

    /// Stages in execution order.
    fn stages(&self) -> &'static [Stage];

    /// Whether the task generator may call the external content source.
    fn enriches_content(&self) -> bool {
        self.stages().contains(&Stage::TaskGenerator)
    }
}

/// Direct rules-based planner with curated tasks.
pub struct HeuristicPlanBuilder;

impl PlanBuilder for HeuristicPlanBuilder {
    fn strategy(&self) -> PlanStrategy {
        PlanStrategy::Heuristic
    }

    fn stages(&self) -> &'static [Stage] {
        &[Stage::Analyzer, Stage::Tutor, Stage::Planner]
    }
}

/// Full four-stage pipeline with AI task enrichment.
pub struct AgentPlanBuilder;

impl PlanBuilder for AgentPlanBuilder {
    fn strategy(&self) -> PlanStrategy {
        PlanStrategy::Agent
    }

    fn stages(&self) -> &'static [Stage] {
        &Stage::ALL
    }
}

pub fn builder_for(strategy: PlanStrategy) -> &'static dyn PlanBuilder {
    match strategy {
        PlanStrategy::Heuristic => &HeuristicPlanBuilder,
        PlanStrategy::Agent => &AgentPlanBuilder,
    }
}

/// Expected energy the day after `day_type`: beast days drain one point,
/// light days restore one.
pub fn project_energy(energy: u8, day_type: DayType) -> u8 {
    let next = match day_type {
        DayType::Beast => energy.saturating_sub(1),
        DayType::Minimum | DayType::Recovery => energy + 1,
        DayType::Normal => energy,
    };
    next.clamp(1, 5)
}

/// Blocks for one day with curated tasks filled in.
pub fn draft_blocks(
    budget: u32,
    ratios: &Ratios,
    day_type: DayType,
    energy: u8,
    topic: &str,
    difficulty: Difficulty,
) -> (Vec<StudyBlock>, Vec<String>) {
    let (mut blocks, notes) = build_blocks(budget, ratios, day_type, energy, topic, difficulty);
    for block in &mut blocks {
        block.tasks = curated_tasks(block.block_type, topic, difficulty);
    }
    (blocks, notes)
}

/// Inputs shared by every day after the first.
pub struct FollowingDays<'a> {
    pub start: NaiveDate,
    pub count: u32,
    pub topic: &'a str,
    pub budget: u32,
    pub mastery: Option<u8>,
    pub struggling: bool,
}

/// Plan days `1..count` after a first day of `first_type` at `first_energy`.
///
/// Each day is classified against the history plus every day planned before
/// it, with the beast streak carried forward.
pub fn plan_following_days(
    days: &FollowingDays<'_>,
    history: &[DayType],
    first_energy: u8,
    first_type: DayType,
    streak: BeastStreak,
) -> Vec<DayPlan> {
    let mut history = history.to_vec();
    history.push(first_type);
    let mut energy = first_energy;
    let mut previous = first_type;
    let mut streak = streak;
    let mut planned = Vec::new();

    for day_index in 1..days.count {
        energy = project_energy(energy, previous);
        let decision = classify_day(energy, &history, streak);
        let day_type = decision.day_type;
        let difficulty = advise(days.mastery, energy, days.struggling).level;
        let ratios = Ratios::select(day_type, days.struggling);
        let (blocks, _) = draft_blocks(days.budget, &ratios, day_type, energy, days.topic, difficulty);

        planned.push(DayPlan {
            day_index,
            date: days
                .start
                .checked_add_days(Days::new(day_index as u64))
                .unwrap_or(days.start),
            energy,
            day_type,
            intensity_level: day_type.intensity_level(),
            difficulty,
            time_budget_minutes: days.budget,
            blocks,
        });

        history.push(day_type);
        streak = decision.streak;
        previous = day_type;
    }

    planned
}
