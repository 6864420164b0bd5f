//! System prompt component.
//!
//! Supplies the fixed constraints, resources and best practices that go into
//! an agent's system prompt.

/// Static system prompt content.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPrompt;

impl SystemPrompt {
    pub fn new() -> Self {
        Self
    }

    /// Hard limits on what the agent may do.
    pub fn constraints(&self) -> impl Iterator<Item = &'static str> {
        [
            "Exclusively use the commands listed below.",
            "You can only act proactively, and are unable to start background jobs or \
             set up webhooks for yourself. \
             Take this into account when planning your actions.",
            "You are unable to interact with physical objects. \
             If this is absolutely necessary to fulfill a task or objective or \
             to complete a step, you must ask the user to do it for you. \
             If the user refuses this, and there is no other way to achieve your \
             goals, you must terminate to avoid wasting time and energy.",
        ]
        .into_iter()
    }

    /// What the agent can draw on.
    pub fn resources(&self) -> impl Iterator<Item = &'static str> {
        [
            "You are a Large Language Model, trained on millions of pages of text, \
             including a lot of factual knowledge. Make use of this factual knowledge \
             to avoid unnecessary gathering of information.",
        ]
        .into_iter()
    }

    /// How the agent should work.
    pub fn best_practices(&self) -> impl Iterator<Item = &'static str> {
        [
            "Continuously review and analyze your actions to ensure \
             you are performing to the best of your abilities.",
            "Constructively self-criticize your big-picture behavior constantly.",
            "Reflect on past decisions and strategies to refine your approach.",
            "Every command has a cost, so be smart and efficient. \
             Aim to complete tasks in the least number of steps.",
            "Only make use of your information gathering abilities to find \
             information that you don't yet have knowledge of.",
        ]
        .into_iter()
    }

    /// Assemble all three lists into numbered prompt sections.
    pub fn render(&self) -> String {
        [
            ("Constraints", self.constraints().collect::<Vec<_>>()),
            ("Resources", self.resources().collect()),
            ("Best practices", self.best_practices().collect()),
        ]
        .iter()
        .map(|(title, items)| render_section(title, items))
        .collect::<Vec<_>>()
        .join("\n")
    }
}

fn render_section(title: &str, items: &[&str]) -> String {
    let mut section = format!("## {}\n", title);
    for (i, item) in items.iter().enumerate() {
        section.push_str(&format!("{}. {}\n", i + 1, item));
    }
    section
}
