use serde::{Deserialize, Serialize};

pub const MAX_INSTRUCTION_CHARS: usize = 40;
pub const COLLAPSED_STEP_COUNT: usize = 5;

/// One maneuver from the external directions provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    pub instruction: String,
    /// `[longitude, latitude]` where the maneuver starts.
    pub location: [f64; 2],
}

pub fn shorten_instruction(instruction: &str) -> String {
    if instruction.chars().count() > MAX_INSTRUCTION_CHARS {
        let head: String = instruction.chars().take(MAX_INSTRUCTION_CHARS).collect();
        format!("{}...", head)
    } else {
        instruction.to_string()
    }
}

/// Numbered step lines. Collapsed lists stop after five steps and end with a
/// "+ N more steps..." line.
pub fn summarize_steps(steps: &[RouteStep], expanded: bool) -> Vec<String> {
    let shown = if expanded { steps.len() } else { steps.len().min(COLLAPSED_STEP_COUNT) };
    let mut lines: Vec<String> = steps[..shown]
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {}", i + 1, shorten_instruction(&s.instruction)))
        .collect();
    if shown < steps.len() {
        lines.push(format!("+ {} more steps...", steps.len() - shown));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps(n: usize) -> Vec<RouteStep> {
        (0..n)
            .map(|i| RouteStep { instruction: format!("Step {}", i), location: [-73.56, 45.50] })
            .collect()
    }

    #[test]
    fn test_long_instruction_is_truncated() {
        let s = "Turn left onto Boulevard De Maisonneuve Ouest, then continue";
        let short = shorten_instruction(s);
        assert_eq!(short, "Turn left onto Boulevard De Maisonneuve ...");
        assert_eq!(shorten_instruction("Turn left onto Bordeaux"), "Turn left onto Bordeaux");
    }

    #[test]
    fn test_collapsed_list_counts_remaining_steps() {
        let lines = summarize_steps(&steps(8), false);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "1. Step 0");
        assert_eq!(lines[5], "+ 3 more steps...");

        assert_eq!(summarize_steps(&steps(8), true).len(), 8);
        assert_eq!(summarize_steps(&steps(5), false).len(), 5);
        assert!(summarize_steps(&[], false).is_empty());
    }
}
