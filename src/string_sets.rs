//! Resolution of the target and exclusion substrings used for classification.
//!
//! Three tiers decide which substrings end up in each set:
//! user keep strings beat user delete strings, which beat the built-in
//! defaults. Resolution happens once, before the walk, and produces an
//! immutable [`StringSets`] that the classifier borrows.

/// Substrings whose presence marks a file as worth keeping by default.
///
/// Captures preprocessed images in any output space, brain masks, confounds,
/// the HTML report with its SVG figures, and CodeCarbon emissions.
pub const DEFAULT_TARGETS: &[&str] = &[
    "preproc",
    "brain_mask",
    "confounds",
    "html",
    "svg",
    "emissions",
];

/// Always excluded, otherwise report index files slip through on "html".
pub const ALWAYS_EXCLUDED: &str = "index";

/// Directories whose contents are purged regardless of target matches.
pub const SPECIAL_DIR_MARKERS: &[&str] = &["single_subject", "fsaverage"];

/// True when either string contains the other.
fn overlaps(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

/// Pushes `value` unless an equal entry is already present.
fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|existing| existing == value) {
        list.push(value.to_string());
    }
}

/// The resolved, read-only substring sets for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringSets {
    targets: Vec<String>,
    exclusions: Vec<String>,
    keep: Vec<String>,
}

impl StringSets {
    /// Resolves the built-in defaults against the user's keep and delete lists.
    ///
    /// 1. A delete string overlapping any keep string is dropped.
    /// 2. `"index"` is added to the surviving exclusions, whatever the keep
    ///    strings say.
    /// 3. A default target overlapping an exclusion is dropped.
    /// 4. Keep strings are appended to the targets.
    ///
    /// Entries are expected to be validated already (see
    /// [`crate::config::parse_string_list`]).
    pub fn resolve(also_keep: &[String], also_delete: &[String]) -> Self {
        Self::resolve_with_defaults(DEFAULT_TARGETS, also_keep, also_delete)
    }

    /// Same as [`StringSets::resolve`] with a custom default target list.
    pub fn resolve_with_defaults(
        defaults: &[&str],
        also_keep: &[String],
        also_delete: &[String],
    ) -> Self {
        let mut keep = Vec::new();
        for keep_string in also_keep {
            push_unique(&mut keep, keep_string);
        }

        let mut exclusions = Vec::new();
        for del_string in also_delete {
            if keep.iter().any(|k| overlaps(k, del_string)) {
                log::debug!("'{}' dropped from exclusions: overridden by a keep string", del_string);
                continue;
            }
            push_unique(&mut exclusions, del_string);
        }
        push_unique(&mut exclusions, ALWAYS_EXCLUDED);

        let mut targets = Vec::new();
        for target in defaults {
            if exclusions.iter().any(|e| overlaps(e, target)) {
                log::debug!("default target '{}' dropped: overridden by an exclusion", target);
                continue;
            }
            push_unique(&mut targets, target);
        }
        for keep_string in &keep {
            push_unique(&mut targets, keep_string);
        }

        Self {
            targets,
            exclusions,
            keep,
        }
    }

    /// Substrings that make a file a retention candidate.
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Substrings that force removal.
    pub fn exclusions(&self) -> &[String] {
        &self.exclusions
    }

    /// The user's keep strings, the only override inside special directories.
    pub fn keep(&self) -> &[String] {
        &self.keep
    }

    /// True when the user supplied at least one keep string. Special
    /// directories are only walked file by file in that case.
    pub fn has_keep_list(&self) -> bool {
        !self.keep.is_empty()
    }

    /// Exclusions supplied by the user, i.e. everything except `"index"`.
    pub fn user_exclusions(&self) -> impl Iterator<Item = &str> {
        self.exclusions
            .iter()
            .map(String::as_str)
            .filter(|e| *e != ALWAYS_EXCLUDED)
    }

    /// True when `file_name` contains any target substring.
    ///
    /// # Examples
    ///
    /// ```
    /// use fmriprep_cleanup::StringSets;
    ///
    /// let sets = StringSets::default();
    /// assert!(sets.matches_target("sub-01_desc-preproc_bold.nii.gz"));
    /// assert!(!sets.matches_target("sub-01_bold.json"));
    /// ```
    pub fn matches_target(&self, file_name: &str) -> bool {
        self.targets.iter().any(|t| file_name.contains(t.as_str()))
    }

    pub fn matches_exclusion(&self, file_name: &str) -> bool {
        self.exclusions.iter().any(|e| file_name.contains(e.as_str()))
    }

    pub fn matches_keep(&self, file_name: &str) -> bool {
        self.keep.iter().any(|k| file_name.contains(k.as_str()))
    }
}

impl Default for StringSets {
    fn default() -> Self {
        Self::resolve(&[], &[])
    }
}
