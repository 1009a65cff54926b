use crate::platform::Buildpack;
use std::fmt;

/// A buildpack field that is converged through `update`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Position,
    Enabled,
    Locked,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Name => "name",
            Field::Position => "position",
            Field::Enabled => "enabled",
            Field::Locked => "locked",
        };
        f.write_str(name)
    }
}

/// Fields whose observed value differs from the desired one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldDiff {
    fields: Vec<Field>,
}

impl FieldDiff {
    /// Compare by value; two unset tri-state fields are equal
    pub fn between(observed: &Buildpack, desired: &Buildpack) -> Self {
        let mut fields = Vec::new();
        if observed.name != desired.name {
            fields.push(Field::Name);
        }
        if observed.position != desired.position {
            fields.push(Field::Position);
        }
        if observed.enabled != desired.enabled {
            fields.push(Field::Enabled);
        }
        if observed.locked != desired.locked {
            fields.push(Field::Locked);
        }
        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
}

impl fmt::Display for FieldDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.fields.iter().map(|field| field.to_string()).collect();
        f.write_str(&names.join(", "))
    }
}

/// Whether the artifact has to be packaged and uploaded again
///
/// An empty desired filename means no artifact is managed.
pub fn needs_upload(observed: &Buildpack, desired: &Buildpack) -> bool {
    !desired.filename.is_empty() && desired.filename != observed.filename
}
