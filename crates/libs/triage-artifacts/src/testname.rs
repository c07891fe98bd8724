//! Test name normalization.

use std::sync::LazyLock;

use regex::Regex;

static SUITE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[Suite:[^\]]*\]").expect("valid regex"));
static SKIPPED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[Skipped:[^\]]*\]").expect("valid regex"));
static SPACES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid regex"));

/// Strip environment-specific annotations from a test name so the same
/// logical test is recognized across suites and runs.
///
/// Removes bracketed `Suite:`/`Skipped:` annotations, collapses runs of
/// horizontal whitespace, and trims. Idempotent.
pub fn normalize(name: &str) -> String {
    let name = SUITE_RE.replace_all(name, "");
    let name = SKIPPED_RE.replace_all(&name, "");
    let name = SPACES_RE.replace_all(&name, " ");
    name.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_annotations_and_collapses_whitespace() {
        assert_eq!(normalize("[Suite:foo] some  test [Skipped:bar]"), "some test");
        assert_eq!(
            normalize("[sig-storage] mounts volumes [Suite:openshift/conformance/parallel]"),
            "[sig-storage] mounts volumes"
        );
        assert_eq!(normalize("\tleading and trailing\t "), "leading and trailing");
    }

    #[test]
    fn plain_names_pass_through() {
        assert_eq!(normalize("TestBuildIndex"), "TestBuildIndex");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        for name in [
            "[Suite:foo] some  test [Skipped:bar]",
            "a  b\tc",
            " [Suite:x][Skipped:y] ",
            "unannotated test name",
        ] {
            let once = normalize(name);
            assert_eq!(normalize(&once), once);
        }
    }
}
