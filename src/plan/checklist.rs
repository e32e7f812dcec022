use std::fmt::Write;
use crate::plan::blocks::StudyBlock;
use crate::plan::model::StudyPlan;

fn render_blocks(out: &mut String, blocks: &[StudyBlock]) {
    for block in blocks {
        let _ = writeln!(
            out,
            "[{}] {} min - {}",
            block.block_type.as_str(),
            block.duration_minutes,
            block.description
        );
        for task in &block.tasks {
            let _ = writeln!(out, "    [ ] {}", task);
        }
        for task in block.ai_augmented_tasks.iter().flatten() {
            let _ = writeln!(out, "    [ ] {} (suggested)", task);
        }
    }
}

/// Plain-text checklist for a plan. Deterministic for a given plan.
pub fn render_checklist(plan: &StudyPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Study plan: {} ({})", plan.topic, plan.date);
    let _ = writeln!(
        out,
        "Mode {} | {} day (intensity {}) | energy {}/5 | difficulty {}",
        plan.system_mode.as_str(),
        plan.day_type.as_str(),
        plan.intensity_level,
        plan.energy,
        plan.difficulty.as_str()
    );
    for constraint in &plan.reasoning.constraints {
        let _ = writeln!(out, "! {}", constraint);
    }

    match &plan.multi_day {
        Some(days) => {
            for day in days {
                let _ = writeln!(
                    out,
                    "\n== Day {} - {} - {} day - energy {} - {} min ==",
                    day.day_index + 1,
                    day.date,
                    day.day_type.as_str(),
                    day.energy,
                    day.time_budget_minutes
                );
                render_blocks(&mut out, &day.blocks);
            }
        }
        None => {
            let _ = writeln!(out, "\nTotal: {} min", plan.time_budget_minutes);
            render_blocks(&mut out, &plan.blocks);
        }
    }

    out
}
