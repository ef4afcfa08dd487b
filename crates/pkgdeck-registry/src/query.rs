use pkgdeck_core::PackageManifest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub include_all_versions: bool,
    pub include_prerelease: bool,
    pub count: usize,
    pub skip: usize,
}

impl SearchQuery {
    pub fn new(term: impl Into<String>, count: usize) -> Self {
        Self {
            term: term.into(),
            include_all_versions: false,
            include_prerelease: false,
            count,
            skip: 0,
        }
    }

    pub fn page(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_all_versions(mut self, include: bool) -> Self {
        self.include_all_versions = include;
        self
    }

    pub fn with_prerelease(mut self, include: bool) -> Self {
        self.include_prerelease = include;
        self
    }

    /// Case-insensitive substring match on the id or any tag. An empty term
    /// matches every package.
    pub fn matches(&self, manifest: &PackageManifest) -> bool {
        let needle = self.term.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return true;
        }
        manifest.id.to_ascii_lowercase().contains(&needle)
            || manifest
                .tags
                .iter()
                .any(|tag| tag.to_ascii_lowercase().contains(&needle))
    }

    pub fn admits_version(&self, manifest: &PackageManifest) -> bool {
        self.include_prerelease || !manifest.is_prerelease()
    }
}
