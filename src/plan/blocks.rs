use serde::{Deserialize, Serialize};
use crate::difficulty::Difficulty;
use crate::energy::DayType;

/// Minutes are allocated in steps of this size.
pub const SLOT_MINUTES: u32 = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Intake,
    Theory,
    Practice,
    Summary,
}

impl BlockType {
    /// Allocation order.
    pub const ALL: [BlockType; 4] = [
        BlockType::Intake,
        BlockType::Theory,
        BlockType::Practice,
        BlockType::Summary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Intake => "intake",
            BlockType::Theory => "theory",
            BlockType::Practice => "practice",
            BlockType::Summary => "summary",
        }
    }

    fn index(self) -> usize {
        match self {
            BlockType::Intake => 0,
            BlockType::Theory => 1,
            BlockType::Practice => 2,
            BlockType::Summary => 3,
        }
    }

    pub fn describe(&self, topic: &str) -> String {
        match self {
            BlockType::Intake => format!("Read or watch an introduction to {}", topic),
            BlockType::Theory => format!("Work through the core ideas of {} and take notes", topic),
            BlockType::Practice => format!("Solve exercises on {}", topic),
            BlockType::Summary => format!("Summarize what you learned about {} and list open questions", topic),
        }
    }
}

/// Share of the budget per block, in `BlockType::ALL` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ratios {
    pub name: &'static str,
    pub shares: [f64; 4],
}

impl Ratios {
    pub const DEFAULT: Ratios = Ratios { name: "default", shares: [0.20, 0.40, 0.30, 0.10] };
    pub const LOW_INTENSITY: Ratios = Ratios { name: "low-intensity", shares: [0.35, 0.35, 0.00, 0.30] };
    pub const BEAST: Ratios = Ratios { name: "beast", shares: [0.15, 0.30, 0.45, 0.10] };
    pub const STRUGGLING: Ratios = Ratios { name: "struggling", shares: [0.30, 0.40, 0.20, 0.10] };

    /// Low intensity first, then struggle, then beast.
    pub fn select(day_type: DayType, struggling: bool) -> Ratios {
        if day_type.is_low_intensity() {
            Ratios::LOW_INTENSITY
        } else if struggling {
            Ratios::STRUGGLING
        } else if day_type == DayType::Beast {
            Ratios::BEAST
        } else {
            Ratios::DEFAULT
        }
    }

    pub fn share(&self, block: BlockType) -> f64 {
        self.shares[block.index()]
    }

    /// Block types with a non-zero share, in order.
    pub fn sequence(&self) -> Vec<BlockType> {
        BlockType::ALL.into_iter().filter(|b| self.share(*b) > 0.0).collect()
    }

    fn without(mut self, block: BlockType) -> Ratios {
        self.shares[block.index()] = 0.0;
        self
    }
}

/// One timed segment of a plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StudyBlock {
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub duration_minutes: u32,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    pub tasks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_augmented_tasks: Option<Vec<String>>,
}

fn round_half_up(x: f64) -> u32 {
    // epsilon absorbs binary error in products like 60 * 0.1
    (x + 0.5 + 1e-9).floor().max(0.0) as u32
}

/// Split `budget` minutes by `ratios` into multiples of five that sum
/// exactly to the budget. `budget` must itself be a multiple of five.
pub fn allocate(budget: u32, ratios: &Ratios) -> [u32; 4] {
    let slots = budget as f64 / SLOT_MINUTES as f64;
    let mut durations = ratios.shares.map(|r| round_half_up(slots * r) * SLOT_MINUTES);

    while durations.iter().sum::<u32>() > budget {
        match durations.iter_mut().find(|d| **d >= SLOT_MINUTES) {
            Some(d) => *d -= SLOT_MINUTES,
            None => break,
        }
    }

    let largest = ratios
        .shares
        .iter()
        .enumerate()
        .fold(0, |best, (i, r)| if *r > ratios.shares[best] { i } else { best });
    while durations.iter().sum::<u32>() + SLOT_MINUTES <= budget {
        durations[largest] += SLOT_MINUTES;
    }

    durations
}

/// Allocate and wrap the non-empty slots into blocks. Tasks start empty.
///
/// Practice is dropped entirely on a recovery day at energy 1; its share
/// is redistributed through the shortfall rule.
pub fn build_blocks(
    budget: u32,
    ratios: &Ratios,
    day_type: DayType,
    energy: u8,
    topic: &str,
    difficulty: Difficulty,
) -> (Vec<StudyBlock>, Vec<String>) {
    let mut notes = Vec::new();
    let ratios = if day_type == DayType::Recovery && energy <= 1 && ratios.share(BlockType::Practice) > 0.0 {
        notes.push("practice omitted on a recovery day at energy 1".to_string());
        ratios.without(BlockType::Practice)
    } else {
        *ratios
    };

    let durations = allocate(budget, &ratios);
    notes.push(format!(
        "{} ratios over {} min -> {}",
        ratios.name,
        budget,
        BlockType::ALL
            .iter()
            .zip(durations.iter())
            .map(|(b, d)| format!("{} {}", b.as_str(), d))
            .collect::<Vec<_>>()
            .join(", ")
    ));

    let blocks = BlockType::ALL
        .into_iter()
        .zip(durations)
        .filter(|(_, minutes)| *minutes > 0)
        .map(|(block_type, duration_minutes)| StudyBlock {
            block_type,
            duration_minutes,
            description: block_type.describe(topic),
            difficulty: match block_type {
                BlockType::Theory | BlockType::Practice => Some(difficulty),
                _ => None,
            },
            tasks: Vec::new(),
            ai_augmented_tasks: None,
        })
        .collect();

    (blocks, notes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixty_minutes_default_split() {
        assert_eq!(allocate(60, &Ratios::DEFAULT), [10, 25, 20, 5]);
    }

    #[test]
    fn overflow_is_taken_from_the_first_block() {
        // 25 min default rounds to 5 + 10 + 10 + 5 = 30
        assert_eq!(allocate(25, &Ratios::DEFAULT), [0, 10, 10, 5]);
        assert_eq!(allocate(15, &Ratios::DEFAULT), [5, 5, 5, 0]);
    }

    #[test]
    fn shortfall_goes_to_the_largest_share() {
        // 20 min low intensity rounds to 5 + 5 + 0 + 5; intake wins the tie
        assert_eq!(allocate(20, &Ratios::LOW_INTENSITY), [10, 5, 0, 5]);
    }

    #[test]
    fn selection_order() {
        assert_eq!(Ratios::select(DayType::Recovery, true), Ratios::LOW_INTENSITY);
        assert_eq!(Ratios::select(DayType::Beast, true), Ratios::STRUGGLING);
        assert_eq!(Ratios::select(DayType::Beast, false), Ratios::BEAST);
        assert_eq!(Ratios::select(DayType::Normal, false), Ratios::DEFAULT);
    }

    #[test]
    fn zero_blocks_are_dropped() {
        let (blocks, _) = build_blocks(60, &Ratios::LOW_INTENSITY, DayType::Minimum, 2, "sorting", Difficulty::Easy);
        let types: Vec<BlockType> = blocks.iter().map(|b| b.block_type).collect();
        assert_eq!(types, vec![BlockType::Intake, BlockType::Theory, BlockType::Summary]);
        assert_eq!(blocks.iter().map(|b| b.duration_minutes).sum::<u32>(), 60);
    }

    #[test]
    fn recovery_at_energy_one_has_no_practice() {
        let (blocks, notes) = build_blocks(90, &Ratios::DEFAULT, DayType::Recovery, 1, "heaps", Difficulty::Easy);
        assert!(blocks.iter().all(|b| b.block_type != BlockType::Practice));
        assert_eq!(blocks.iter().map(|b| b.duration_minutes).sum::<u32>(), 90);
        assert!(notes[0].contains("practice omitted"));
    }
}
