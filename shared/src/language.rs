use std::collections::HashMap;

use super::*;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageTotal {
    pub color: Option<String>,
    pub size: u64,
}

/// Byte size per language over all repositories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageStats {
    pub total_size: u64,
    pub languages: HashMap<String, LanguageTotal>,
}

impl LanguageStats {
    pub fn aggregate(repositories: &[Repository]) -> Self {
        let mut stats = Self::default();

        for edge in repositories.iter().flat_map(|repo| &repo.languages) {
            let total = stats.languages.entry(edge.name.clone()).or_default();
            total.size += edge.size;
            // A language keeps the same color everywhere, the last one seen is as good as any.
            if edge.color.is_some() {
                total.color.clone_from(&edge.color);
            }
            stats.total_size += edge.size;
        }

        stats
    }

    pub fn total_languages(&self) -> usize {
        self.languages.len()
    }

    /// Fraction of the total byte size, `0.0..=1.0`.
    pub fn share(&self, language: &str) -> f64 {
        match self.languages.get(language) {
            Some(total) if self.total_size > 0 => total.size as f64 / self.total_size as f64,
            _ => 0.0,
        }
    }

    /// Largest first; ties ordered by name.
    pub fn by_size(&self) -> Vec<(&str, &LanguageTotal)> {
        let mut languages: Vec<_> = self
            .languages
            .iter()
            .map(|(name, total)| (name.as_str(), total))
            .collect();
        languages.sort_by(|(a_name, a), (b_name, b)| b.size.cmp(&a.size).then(a_name.cmp(b_name)));
        languages
    }
}

/// How many repositories use each language as their primary one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguagePerRepo {
    /// Repositories that have a primary language at all.
    pub total: u32,
    pub counts: HashMap<String, u32>,
}

impl LanguagePerRepo {
    pub fn calculate(repositories: &[Repository]) -> Self {
        let mut result = Self::default();

        for language in repositories
            .iter()
            .filter_map(|repo| repo.primary_language.as_ref())
        {
            *result.counts.entry(language.clone()).or_default() += 1;
            result.total += 1;
        }

        result
    }

    pub fn share(&self, language: &str) -> f64 {
        match self.counts.get(language) {
            Some(count) if self.total > 0 => *count as f64 / self.total as f64,
            _ => 0.0,
        }
    }

    /// Most repositories first; ties ordered by name.
    pub fn by_count(&self) -> Vec<(&str, u32)> {
        let mut languages: Vec<_> = self
            .counts
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        languages.sort_by(|(a_name, a), (b_name, b)| b.cmp(a).then(a_name.cmp(b_name)));
        languages
    }

    pub fn top(&self) -> Option<(&str, u32)> {
        self.by_count().into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(name: &str, color: Option<&str>, size: u64) -> LanguageEdge {
        LanguageEdge {
            name: name.to_string(),
            color: color.map(ToString::to_string),
            size,
        }
    }

    fn repo(name: &str, primary: Option<&str>, languages: Vec<LanguageEdge>) -> Repository {
        Repository {
            name: name.to_string(),
            url: format!("https://github.com/octo/{name}"),
            owner: "octo".to_string(),
            is_fork: false,
            is_private: false,
            primary_language: primary.map(ToString::to_string),
            languages,
        }
    }

    #[test]
    fn aggregate_sizes_and_colors() {
        let repositories = vec![
            repo(
                "a",
                Some("Rust"),
                vec![edge("Rust", Some("#dea584"), 700), edge("Shell", None, 100)],
            ),
            repo(
                "b",
                Some("Go"),
                vec![edge("Go", Some("#00ADD8"), 200), edge("Shell", Some("#89e051"), 0)],
            ),
        ];

        let stats = LanguageStats::aggregate(&repositories);

        assert_eq!(stats.total_size, 1000);
        assert_eq!(stats.total_languages(), 3);
        assert_eq!(
            stats.languages["Shell"],
            LanguageTotal {
                color: Some("#89e051".to_string()),
                size: 100
            }
        );
        assert!((stats.share("Rust") - 0.7).abs() < f64::EPSILON);
        assert_eq!(stats.share("Haskell"), 0.0);

        let order: Vec<_> = stats.by_size().into_iter().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["Rust", "Go", "Shell"]);
    }

    #[test]
    fn empty_repositories_have_no_share() {
        let stats = LanguageStats::aggregate(&[repo("a", None, vec![])]);

        assert_eq!(stats.total_size, 0);
        assert_eq!(stats.share("Rust"), 0.0);
    }

    #[test]
    fn primary_language_shares_sum_to_one() {
        let repositories = vec![
            repo("a", Some("Rust"), vec![]),
            repo("b", Some("Rust"), vec![]),
            repo("c", Some("Go"), vec![]),
            repo("d", Some("Rust"), vec![]),
            repo("e", Some("TypeScript"), vec![]),
            repo("f", Some("Go"), vec![]),
            repo("g", None, vec![]),
        ];

        let per_repo = LanguagePerRepo::calculate(&repositories);

        assert_eq!(per_repo.total, 6);
        assert_eq!(per_repo.top(), Some(("Rust", 3)));
        let sum: f64 = per_repo
            .by_count()
            .iter()
            .map(|(name, _)| per_repo.share(name) * 100.0)
            .sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn top_language_ties_resolve_by_name() {
        let repositories = vec![repo("a", Some("Zig"), vec![]), repo("b", Some("C"), vec![])];

        assert_eq!(LanguagePerRepo::calculate(&repositories).top(), Some(("C", 1)));
    }
}
