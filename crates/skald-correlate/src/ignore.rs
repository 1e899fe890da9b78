use globset::{Glob, GlobSet, GlobSetBuilder};

/// Compiled ignore rules for file-change paths.
#[derive(Debug)]
pub struct IgnoreRules {
    set: GlobSet,
}

impl IgnoreRules {
    pub fn new(patterns: &[String]) -> anyhow::Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(Glob::new(pattern)?);
        }
        Ok(Self {
            set: builder.build()?,
        })
    }

    /// Whether a path is excluded from correlation. Separators are
    /// normalized so Windows paths match the same globs.
    pub fn is_ignored(&self, path: &str) -> bool {
        let normalized = path.replace('\\', "/");
        self.set.is_match(&normalized)
    }
}
