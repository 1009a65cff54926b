use std::fmt;

/// What one reconcile pass did to one buildpack
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceOutcome {
    Created,
    Adopted,
    Updated,
    Unchanged,
    Failed(String),
}

/// Summary of an apply run
#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    pub outcomes: Vec<(String, ResourceOutcome)>,
}

impl ApplyReport {
    pub fn count(&self, matches: impl Fn(&ResourceOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| matches(o)).count()
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ResourceOutcome::Failed(_)))
    }

    /// Whether any buildpack may have been written remotely
    pub fn wrote(&self) -> bool {
        self.count(|o| *o != ResourceOutcome::Unchanged) > 0
    }

    pub fn outcome(&self, name: &str) -> Option<&ResourceOutcome> {
        self.outcomes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, outcome)| outcome)
    }
}

impl fmt::Display for ApplyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} adopted, {} updated, {} unchanged, {} failed",
            self.count(|o| *o == ResourceOutcome::Created),
            self.count(|o| *o == ResourceOutcome::Adopted),
            self.count(|o| *o == ResourceOutcome::Updated),
            self.count(|o| *o == ResourceOutcome::Unchanged),
            self.failed()
        )
    }
}
