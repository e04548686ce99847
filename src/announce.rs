//! Exam announcement rendering.
use crate::bucket::BucketPlan;
use crate::select::Pick;
use crate::statement::problem_url;

const RULES: [&str; 6] = [
    "Open the problem directory in your editor.",
    "Edit the starter file in that directory.",
    "Run `boj run` to check the sample cases.",
    "Submit with `boj submit`.",
    "Web searches are limited to standard library documentation.",
    "Share a short summary of your approach within 5 minutes after the exam.",
];

/// Markdown announcement for participants.
pub fn render_announcement(picks: &[Pick], duration_minutes: u32, plan: &BucketPlan) -> String {
    let mut lines = vec![
        "# Mock Coding Test".to_string(),
        String::new(),
        format!("- **Time limit**: {duration_minutes} minutes"),
        format!("- **Problems**: {}", picks.len()),
        String::new(),
        "## Buckets".to_string(),
    ];
    lines.extend(
        plan.buckets
            .iter()
            .map(|bucket| format!("- {}: {} x {}", bucket.name, bucket.range, bucket.count)),
    );
    lines.push(String::new());
    lines.push("## Rules".to_string());
    lines.extend(RULES.iter().map(|rule| format!("- {rule}")));
    lines.push(String::new());
    lines.push("## Problems".to_string());
    for (idx, pick) in picks.iter().enumerate() {
        let candidate = &pick.candidate;
        lines.push(format!(
            "**Q{}. [{}] {}** ({})  \n{}",
            idx + 1,
            candidate.problem_id,
            candidate.title(),
            candidate.tier_label(),
            problem_url(candidate.problem_id)
        ));
    }
    lines.join("\n")
}

/// One line per pick for the terminal.
pub fn render_console_listing(picks: &[Pick]) -> Vec<String> {
    picks
        .iter()
        .enumerate()
        .map(|(idx, pick)| {
            let candidate = &pick.candidate;
            format!(
                "Q{}. [{}] {} ({}) -> {}",
                idx + 1,
                candidate.problem_id,
                candidate.title(),
                candidate.tier_label(),
                problem_url(candidate.problem_id)
            )
        })
        .collect()
}
