//! Dead-code classification: check sites whose required flag value is
//! unsatisfiable under the theory.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::info;

use crate::analysis::theory::EncodedTheory;
use crate::model::{CheckSite, CheckSiteSet, DeadRegion};

/// Classifies check sites and code paths as reachable or dead.
pub struct DeadCodeFinder<'a> {
    theory: &'a EncodedTheory,
}

impl<'a> DeadCodeFinder<'a> {
    pub fn new(theory: &'a EncodedTheory) -> Self {
        Self { theory }
    }

    /// Classify every check site independently.
    pub fn find(&self, sites: &CheckSiteSet) -> Vec<DeadRegion> {
        let regions: Vec<DeadRegion> = sites
            .sites
            .iter()
            .filter_map(|site| self.check_site(site))
            .collect();
        info!(count = regions.len(), "dead-code classification complete");
        regions
    }

    /// A non-negated check gates code that runs when the flag is on, so the
    /// required value at a site is the negation of its polarity.
    pub fn check_site(&self, site: &CheckSite) -> Option<DeadRegion> {
        let required_value = !site.negated;
        let required: BTreeMap<String, bool> =
            [(site.flag_name.clone(), required_value)].into_iter().collect();
        if self.theory.session.is_satisfiable(&required) {
            return None;
        }
        let reason = if required_value {
            format!(
                "Code requires '{}' to be enabled, but it is always disabled",
                site.flag_name
            )
        } else {
            format!(
                "Code requires '{}' to be disabled, but it is always enabled",
                site.flag_name
            )
        };
        Some(DeadRegion {
            file: site.file.clone(),
            start_line: site.start_line,
            end_line: site.end_line.max(site.start_line),
            required,
            reason,
            snippet: site.snippet.clone(),
        })
    }

    /// Bulk form for a composite path: is a region requiring this whole
    /// assignment reachable?
    pub fn check_path(
        &self,
        required: &BTreeMap<String, bool>,
        file: &Path,
        start_line: u32,
        end_line: u32,
    ) -> Option<DeadRegion> {
        if self.theory.session.is_satisfiable(required) {
            return None;
        }
        let described: Vec<String> = required
            .iter()
            .map(|(flag, value)| format!("{flag}={value}"))
            .collect();
        Some(DeadRegion {
            file: file.to_path_buf(),
            start_line,
            end_line,
            required: required.clone(),
            reason: format!("Path requires impossible state: {}", described.join(", ")),
            snippet: String::new(),
        })
    }
}
