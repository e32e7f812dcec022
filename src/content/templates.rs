use crate::difficulty::Difficulty;
use crate::plan::blocks::BlockType;

/// Deterministic task list for a block. Never empty.
pub fn curated_tasks(block: BlockType, topic: &str, difficulty: Difficulty) -> Vec<String> {
    let mut tasks = match block {
        BlockType::Intake => vec![
            format!("Skim an overview of {} and note three key terms", topic),
            format!("Write down one question you expect {} to answer", topic),
        ],
        BlockType::Theory => vec![
            format!("Read the main explanation of {} and restate it in your own words", topic),
            format!("Trace one worked example of {} step by step", topic),
        ],
        BlockType::Practice => match difficulty {
            Difficulty::Easy => vec![
                format!("Redo a worked example of {} without looking", topic),
                format!("Solve two introductory exercises on {}", topic),
            ],
            Difficulty::Medium => vec![
                format!("Solve three standard exercises on {}", topic),
                format!("Explain where each solution on {} could go wrong", topic),
            ],
            Difficulty::Hard => vec![
                format!("Solve two challenging problems on {} under time pressure", topic),
                format!("Combine {} with a previous topic in one problem", topic),
            ],
        },
        BlockType::Summary => vec![
            format!("Write a five-sentence summary of {}", topic),
            "List what is still unclear for the next session".to_string(),
        ],
    };

    if block == BlockType::Theory && difficulty == Difficulty::Hard {
        tasks.push(format!("Derive one result about {} from first principles", topic));
    }
    tasks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_block_has_tasks() {
        for block in BlockType::ALL {
            for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
                let tasks = curated_tasks(block, "tries", difficulty);
                assert!(!tasks.is_empty());
                assert_eq!(tasks, curated_tasks(block, "tries", difficulty));
            }
        }
    }
}
