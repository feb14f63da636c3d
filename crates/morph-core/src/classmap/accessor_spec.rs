//! How one step of a field path is read and written.

use std::fmt;

use crate::errors::{MappingError, MappingResult};

/// Name used for self-access in a path.
pub const SELF_PATH: &str = "this";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AccessorKind {
    /// Direct slot access; ignores visibility and any getter/setter.
    Field,
    /// Getter/setter pair. Explicit method names override the
    /// `get_<name>` / `set_<name>` convention.
    Property {
        getter: Option<String>,
        setter: Option<String>,
    },
    /// Entry of a map value, keyed by `key` or else by the step name.
    MapEntry { key: Option<String> },
    /// The owning object itself.
    SelfRef,
}

impl AccessorKind {
    pub fn property() -> Self {
        Self::Property {
            getter: None,
            setter: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessorSpec {
    pub name: String,
    pub kind: AccessorKind,
    /// Element index into a list, set or array held by the step.
    pub index: Option<usize>,
}

impl AccessorSpec {
    pub fn new(name: impl Into<String>, kind: AccessorKind) -> Self {
        Self {
            name: name.into(),
            kind,
            index: None,
        }
    }

    pub fn is_self(&self) -> bool {
        matches!(self.kind, AccessorKind::SelfRef)
    }

    pub fn is_indexed(&self) -> bool {
        self.index.is_some()
    }

    /// Key used when the step is a map entry.
    pub fn map_key(&self) -> &str {
        match &self.kind {
            AccessorKind::MapEntry { key: Some(key) } => key,
            _ => &self.name,
        }
    }
}

/// Ordered chain of accessor steps, e.g. `address.lines[0]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    steps: Vec<AccessorSpec>,
}

impl FieldPath {
    /// Parse a dotted path. Every step defaults to property access; `this`
    /// alone means self-access.
    pub fn parse(path: &str) -> MappingResult<Self> {
        let path = path.trim();
        if path.is_empty() {
            return Err(MappingError::configuration("empty field path"));
        }
        if path == SELF_PATH {
            return Ok(Self::self_ref());
        }
        let steps = path
            .split('.')
            .map(|segment| parse_step(path, segment))
            .collect::<MappingResult<Vec<_>>>()?;
        Ok(Self { steps })
    }

    pub fn self_ref() -> Self {
        Self {
            steps: vec![AccessorSpec::new(SELF_PATH, AccessorKind::SelfRef)],
        }
    }

    pub fn from_steps(steps: Vec<AccessorSpec>) -> MappingResult<Self> {
        if steps.is_empty() {
            return Err(MappingError::configuration("empty field path"));
        }
        Ok(Self { steps })
    }

    /// Replace the accessor kind of the last step.
    pub fn with_kind(mut self, kind: AccessorKind) -> Self {
        if let Some(last) = self.steps.last_mut() {
            last.kind = kind;
        }
        self
    }

    pub fn steps(&self) -> &[AccessorSpec] {
        &self.steps
    }

    pub fn last(&self) -> &AccessorSpec {
        // Construction guarantees at least one step.
        &self.steps[self.steps.len() - 1]
    }

    /// Name of the final step; the property name used by wildcard matching.
    pub fn leaf_name(&self) -> &str {
        &self.last().name
    }

    pub fn is_deep(&self) -> bool {
        self.steps.len() > 1
    }

    pub fn is_self(&self) -> bool {
        self.steps.len() == 1 && self.steps[0].is_self()
    }
}

fn parse_step(path: &str, segment: &str) -> MappingResult<AccessorSpec> {
    let bad = |why: &str| MappingError::configuration(format!("invalid field path '{path}': {why}"));
    let (name, index) = match segment.find('[') {
        Some(open) => {
            let close = segment
                .strip_suffix(']')
                .ok_or_else(|| bad("unterminated index"))?;
            let index = close[open + 1..]
                .trim()
                .parse::<usize>()
                .map_err(|_| bad("index is not a number"))?;
            (&segment[..open], Some(index))
        }
        None => (segment, None),
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(bad("empty segment"));
    }
    Ok(AccessorSpec {
        name: name.to_string(),
        kind: AccessorKind::property(),
        index,
    })
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&step.name)?;
            if let Some(index) = step.index {
                write!(f, "[{index}]")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_deep_indexed_paths() {
        let path = FieldPath::parse("address.lines[2].text").unwrap();
        assert!(path.is_deep());
        assert_eq!(path.steps().len(), 3);
        assert_eq!(path.steps()[1].name, "lines");
        assert_eq!(path.steps()[1].index, Some(2));
        assert_eq!(path.leaf_name(), "text");
        assert_eq!(path.to_string(), "address.lines[2].text");
    }

    #[test]
    fn this_is_self_access() {
        let path = FieldPath::parse("this").unwrap();
        assert!(path.is_self());
        assert!(!path.is_deep());
    }

    #[test]
    fn rejects_malformed_paths() {
        for bad in ["", "a..b", "a[x]", "a[1", "[0]"] {
            assert!(FieldPath::parse(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn with_kind_only_touches_last_step() {
        let path = FieldPath::parse("a.b").unwrap().with_kind(AccessorKind::Field);
        assert_eq!(path.steps()[0].kind, AccessorKind::property());
        assert_eq!(path.steps()[1].kind, AccessorKind::Field);
    }
}
