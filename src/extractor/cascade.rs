use tracing::trace;

/// One heuristic of a cascade.
pub struct Step<C> {
    pub name: &'static str,
    pub run: fn(&C) -> Option<String>,
}

/// Ordered heuristics for one field; the first non-empty result wins.
pub struct Cascade<C> {
    field: &'static str,
    steps: Vec<Step<C>>,
}

impl<C> Cascade<C> {
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, name: &'static str, run: fn(&C) -> Option<String>) -> Self {
        self.steps.push(Step { name, run });
        self
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name).collect()
    }

    /// Run steps in order and return the first trimmed, non-empty value.
    pub fn run(&self, ctx: &C) -> Option<String> {
        self.run_named(ctx).map(|(_, value)| value)
    }

    /// Like [`Cascade::run`], also naming the step that produced the value.
    pub fn run_named(&self, ctx: &C) -> Option<(&'static str, String)> {
        for step in &self.steps {
            let value = (step.run)(ctx)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());
            if let Some(value) = value {
                trace!(field = self.field, step = step.name, "cascade step matched");
                return Some((step.name, value));
            }
        }
        trace!(field = self.field, "no cascade step matched");
        None
    }
}
