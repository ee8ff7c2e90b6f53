//! Chat summary posted after a character is created

use super::validation::ExpectedTemplates;

pub fn character_summary(
    character_name: &str,
    templates: &ExpectedTemplates,
    succeeded: &[String],
    failed: &[String],
) -> String {
    let mut summary = format!(
        "{character_name} the {} {} ({}) has joined the party.",
        templates.race, templates.class, templates.background
    );
    if !failed.is_empty() {
        summary.push_str(&format!(
            " Advancement incomplete for: {}. A GM should review the character sheet.",
            failed.join(", ")
        ));
    } else if !succeeded.is_empty() {
        summary.push_str(&format!(" Advanced: {}.", succeeded.join(", ")));
    }
    summary
}
