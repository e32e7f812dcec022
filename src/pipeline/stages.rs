use std::collections::HashMap;
use chrono::Days;
use crate::content::{curated_tasks, fetch_tasks, ContentRequest};
use crate::difficulty::advise;
use crate::energy::{classify_day, classify_mode, BeastStreak, DayType};
use crate::error::PlanError;
use crate::pipeline::context::{Analysis, Focus, PlanContext, TutorAdvice};
use crate::pipeline::{ContentDeps, StageDeps};
use crate::plan::blocks::{BlockType, Ratios};
use crate::plan::builder::{draft_blocks, plan_following_days, FollowingDays};
use crate::plan::model::{DayPlan, PlanReasoning, StudyPlan};
use crate::sessions::day_type_history;

/// Days of session history consulted for day-type rules.
const SESSION_LOOKBACK_DAYS: u64 = 14;

fn resolve_focus(ctx: &PlanContext, deps: &StageDeps<'_>) -> Result<Focus, PlanError> {
    let input = &ctx.input;

    if let Some(id) = &input.concept_id {
        return Ok(match deps.graph.get(id) {
            Some(node) => Focus {
                concept_id: Some(node.id.clone()),
                topic: node.title.clone(),
                prerequisites: deps.graph.prerequisite_titles(&node.id),
                reason: format!("requested concept '{}'", node.id),
            },
            None => Focus {
                concept_id: Some(id.clone()),
                topic: if input.topic.trim().is_empty() { id.clone() } else { input.topic.clone() },
                prerequisites: Vec::new(),
                reason: format!("requested concept '{}' (not in curriculum)", id),
            },
        });
    }

    let in_phase = deps.graph.in_phase(input.phase);
    if in_phase.is_empty() {
        return Ok(Focus {
            concept_id: None,
            topic: input.topic.clone(),
            prerequisites: Vec::new(),
            reason: format!("free topic; curriculum has no phase {} concepts", input.phase),
        });
    }

    // prefetch mastery for the phase and its prerequisites
    let mut known: HashMap<String, u8> = HashMap::new();
    for node in &in_phase {
        for id in std::iter::once(&node.id).chain(node.dependency_ids.iter()) {
            if known.contains_key(id) {
                continue;
            }
            if let Some(record) = deps.store.get_mastery(&input.user_id, id)? {
                known.insert(id.clone(), record.mastery_score);
            }
        }
    }

    let node = deps
        .graph
        .next_in_phase(input.phase, |id| known.get(id).copied())
        .ok_or_else(|| PlanError::stage_failed("phase has concepts but none selectable", "analyzer"))?;

    Ok(Focus {
        concept_id: Some(node.id.clone()),
        topic: node.title.clone(),
        prerequisites: deps.graph.prerequisite_titles(&node.id),
        reason: format!(
            "next concept in phase {} at mastery {}",
            input.phase,
            known.get(&node.id).map_or("none".to_string(), |m| m.to_string())
        ),
    })
}

/// Resolve curriculum position, energy mode and time constraints.
pub fn analyze(ctx: &PlanContext, deps: &StageDeps<'_>) -> Result<PlanContext, PlanError> {
    let input = &ctx.input;
    let focus = resolve_focus(ctx, deps)?;

    let record = deps.store.get_mastery(&input.user_id, focus.mastery_key())?;
    let mastery = record.as_ref().map(|r| r.mastery_score);
    let struggling = record.as_ref().is_some_and(|r| r.struggling);

    let lookback = deps.rules.max_beast_days.max(3);
    let energy_log = deps.store.recent_energy(&input.user_id, input.date, lookback)?;
    let mode = classify_mode(&energy_log, input.energy, input.date, deps.rules);

    let since = input
        .date
        .checked_sub_days(Days::new(SESSION_LOOKBACK_DAYS))
        .unwrap_or(input.date);
    let sessions = deps.store.recent_sessions(&input.user_id, since, input.date)?;
    let history = day_type_history(&sessions, input.date);

    let budget_minutes = mode
        .budget_cap()
        .map_or(input.time_budget_minutes, |cap| cap.min(input.time_budget_minutes));

    let log = format!(
        "analyzer: focus '{}' ({}), mastery {:?}, struggling {}, mode {}, {} prior sessions, budget {} min",
        focus.topic,
        focus.reason,
        mastery,
        struggling,
        mode.mode.as_str(),
        history.len(),
        budget_minutes
    );

    Ok(ctx.with_analysis(
        Analysis {
            focus,
            mastery,
            struggling,
            mode,
            budget_minutes,
            history,
        },
        log,
    ))
}

/// Choose day type, difficulty and block mix.
pub fn tutor(ctx: &PlanContext) -> Result<PlanContext, PlanError> {
    let analysis = ctx.analysis()?;
    let energy = ctx.input.energy;

    let decision = classify_day(energy, &analysis.history, BeastStreak::from_history(&analysis.history));
    let (day_type, mode_note) = analysis.mode.adjust_day(decision.day_type);
    let streak = if day_type == decision.day_type {
        decision.streak
    } else {
        BeastStreak(0)
    };

    let mut day_type_reason = decision.reason.clone();
    if let Some(note) = &mode_note {
        day_type_reason.push_str("; ");
        day_type_reason.push_str(note);
    }

    let difficulty = advise(analysis.mastery, energy, analysis.struggling);
    let ratios = Ratios::select(day_type, analysis.struggling);
    let block_sequence: Vec<BlockType> = ratios
        .sequence()
        .into_iter()
        .filter(|b| !(*b == BlockType::Practice && day_type == DayType::Recovery && energy <= 1))
        .collect();

    let log = format!(
        "tutor: {} day, {} difficulty, {} ratios, blocks [{}]",
        day_type.as_str(),
        difficulty.level.as_str(),
        ratios.name,
        block_sequence.iter().map(|b| b.as_str()).collect::<Vec<_>>().join(", ")
    );

    Ok(ctx.with_advice(
        TutorAdvice {
            day_type,
            day_type_reason,
            streak,
            difficulty,
            ratios,
            block_sequence,
        },
        log,
    ))
}

/// Allocate the budget and assemble the draft plan.
pub fn plan(ctx: &PlanContext) -> Result<PlanContext, PlanError> {
    let input = &ctx.input;
    let analysis = ctx.analysis()?;
    let advice = ctx.advice()?;
    let topic = analysis.focus.topic.as_str();
    let difficulty = advice.difficulty.level;

    let (blocks, mut allocation_notes) = draft_blocks(
        analysis.budget_minutes,
        &advice.ratios,
        advice.day_type,
        input.energy,
        topic,
        difficulty,
    );
    if analysis.budget_minutes < input.time_budget_minutes {
        allocation_notes.insert(
            0,
            format!(
                "budget capped from {} to {} min by {}",
                input.time_budget_minutes,
                analysis.budget_minutes,
                analysis.mode.mode.as_str()
            ),
        );
    }

    let multi_day = if input.generate_week_plan {
        let first = DayPlan {
            day_index: 0,
            date: input.date,
            energy: input.energy,
            day_type: advice.day_type,
            intensity_level: advice.day_type.intensity_level(),
            difficulty,
            time_budget_minutes: analysis.budget_minutes,
            blocks: blocks.clone(),
        };
        let following = plan_following_days(
            &FollowingDays {
                start: input.date,
                count: input.day_count(),
                topic,
                budget: analysis.budget_minutes,
                mastery: analysis.mastery,
                struggling: analysis.struggling,
            },
            &analysis.history,
            input.energy,
            advice.day_type,
            advice.streak,
        );
        Some(std::iter::once(first).chain(following).collect::<Vec<_>>())
    } else {
        None
    };

    let focus_reason = if analysis.focus.prerequisites.is_empty() {
        analysis.focus.reason.clone()
    } else {
        format!("{}; builds on {}", analysis.focus.reason, analysis.focus.prerequisites.join(", "))
    };

    let plan = StudyPlan {
        user_id: input.user_id.clone(),
        topic: topic.to_string(),
        concept_id: analysis.focus.concept_id.clone(),
        phase: input.phase,
        energy: input.energy,
        date: input.date,
        time_budget_minutes: analysis.budget_minutes,
        day_type: advice.day_type,
        intensity_level: advice.day_type.intensity_level(),
        system_mode: analysis.mode.mode,
        difficulty,
        blocks,
        reasoning: PlanReasoning {
            system_mode: Some(analysis.mode.mode),
            mode_message: analysis.mode.message.clone(),
            constraints: analysis.mode.constraints.clone(),
            day_type_reason: advice.day_type_reason.clone(),
            difficulty_reason: advice.difficulty.reasoning.clone(),
            focus_reason,
            allocation_notes,
        },
        multi_day,
    };

    let log = format!(
        "planner: {} blocks, {} min{}",
        plan.blocks.len(),
        plan.total_minutes(),
        plan.multi_day
            .as_ref()
            .map_or(String::new(), |d| format!(", {} days", d.len()))
    );
    Ok(ctx.with_plan(plan, log))
}

/// Attach AI-sourced tasks when the content source answers in time.
///
/// Never fails because of the content source: on any upstream error the
/// curated tasks stand and the fallback is recorded.
pub async fn generate_tasks(ctx: &PlanContext, content: &ContentDeps<'_>) -> Result<PlanContext, PlanError> {
    let mut plan = ctx.plan()?.clone();

    // curated tasks are the floor for every block
    for block in plan.blocks.iter_mut().filter(|b| b.tasks.is_empty()) {
        block.tasks = curated_tasks(block.block_type, &plan.topic, plan.difficulty);
    }

    let request = ContentRequest {
        user_id: plan.user_id.clone(),
        topic: plan.topic.clone(),
        subtopics: ctx.input.subtopics.clone(),
        difficulty: plan.difficulty,
    };

    let log = match fetch_tasks(
        content.source,
        content.cache,
        content.metrics,
        &request,
        content.timeout,
        content.now,
    )
    .await
    {
        Ok(tasks) => {
            let slots = plan.blocks.len().max(1);
            for (i, task) in tasks.iter().enumerate() {
                if let Some(block) = plan.blocks.get_mut(i % slots) {
                    block.ai_augmented_tasks.get_or_insert_with(Vec::new).push(task.clone());
                }
            }
            format!("task generator: {} suggested tasks from {}", tasks.len(), content.source.name())
        }
        Err(e) => {
            content.metrics.record_fallback();
            tracing::warn!(
                user_id = %plan.user_id,
                topic = %plan.topic,
                error = %e,
                "Content source failed, keeping curated tasks"
            );
            format!("task generator: curated tasks only ({})", e)
        }
    };

    plan.sync_first_day();
    Ok(ctx.with_plan(plan, log))
}
