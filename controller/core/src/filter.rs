use ahash::AHashSet;

/// Namespaces that are never reconciled.
///
/// Loaded once at startup and immutable for the process lifetime, so
/// unsynchronized concurrent reads are safe. Membership is an exact name
/// match; configured names are trimmed of surrounding whitespace when the
/// set is built.
#[derive(Clone, Debug, Default)]
pub struct ExclusionSet(AHashSet<String>);

impl ExclusionSet {
    pub fn is_excluded(&self, namespace: &str) -> bool {
        self.0.contains(namespace)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<String> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
        )
    }
}

/// Parses the comma-separated `--ignore-namespaces` flag value.
impl std::str::FromStr for ExclusionSet {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.split(',').map(String::from).collect())
    }
}
