//! Hostname intersection and precedence.

use std::cmp::Ordering;

pub fn is_wildcard(hostname: &str) -> bool {
    hostname.starts_with("*.")
}

/// Returns the more specific of two hostnames if either one matches the
/// other.
///
/// A wildcard matches any hostname ending with its suffix, including other
/// wildcards with a longer suffix.
pub fn intersect<'h>(a: &'h str, b: &'h str) -> Option<&'h str> {
    if a == b {
        return Some(a);
    }
    if let Some(suffix) = a.strip_prefix('*') {
        if b.ends_with(suffix) {
            return Some(b);
        }
    }
    if let Some(suffix) = b.strip_prefix('*') {
        if a.ends_with(suffix) {
            return Some(a);
        }
    }
    None
}

/// Computes the hostnames a route is served on through a listener.
///
/// Returns `None` if the route declares hostnames and none of them are
/// compatible with the listener's hostname.
pub fn compatible(listener: Option<&str>, route: &[String]) -> Option<Vec<String>> {
    let Some(listener) = listener else {
        return Some(route.to_vec());
    };

    if route.is_empty() {
        return Some(vec![listener.to_string()]);
    }

    let hostnames = route
        .iter()
        .filter_map(|h| intersect(listener, h))
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    if hostnames.is_empty() {
        return None;
    }
    Some(hostnames)
}

/// Orders two hostnames by precedence; `Less` means `a` is matched first.
///
/// Exact hostnames precede wildcards, wildcards with more labels precede
/// those with fewer, and otherwise longer hostnames win.
pub fn cmp_precedence(a: &str, b: &str) -> Ordering {
    match (is_wildcard(a), is_wildcard(b)) {
        (false, true) => return Ordering::Less,
        (true, false) => return Ordering::Greater,
        (true, true) => {
            let labels = b.split('.').count().cmp(&a.split('.').count());
            if labels != Ordering::Equal {
                return labels;
            }
        }
        (false, false) => {}
    }
    b.len().cmp(&a.len())
}

/// Compares two hostname lists element-wise after ordering each by
/// precedence.
///
/// When every pair ties and one list runs out, the longer list ranks first:
/// its remaining hostnames outrank having none. Lists only tie when they have
/// the same length and pairwise-equal precedence.
pub fn cmp_lists(a: &[String], b: &[String]) -> Ordering {
    let a = sorted(a);
    let b = sorted(b);
    a.iter()
        .zip(b.iter())
        .map(|(a, b)| cmp_precedence(a, b))
        .find(|o| o.is_ne())
        .unwrap_or_else(|| b.len().cmp(&a.len()))
}

fn sorted(hostnames: &[String]) -> Vec<&str> {
    let mut sorted = hostnames.iter().map(String::as_str).collect::<Vec<_>>();
    sorted.sort_by(|a, b| cmp_precedence(a, b).then_with(|| a.cmp(b)));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a.example.com", "a.example.com", Some("a.example.com"))]
    #[case("*.example.com", "a.example.com", Some("a.example.com"))]
    #[case("a.example.com", "*.example.com", Some("a.example.com"))]
    #[case("*.example.com", "a.b.example.com", Some("a.b.example.com"))]
    #[case("*.example.com", "*.b.example.com", Some("*.b.example.com"))]
    #[case("*.example.com", "example.com", None)]
    #[case("a.example.com", "b.example.com", None)]
    #[case("*.example.com", "a.example.org", None)]
    fn intersections(#[case] a: &str, #[case] b: &str, #[case] expected: Option<&str>) {
        assert_eq!(intersect(a, b), expected);
    }

    #[test]
    fn compatible_with_unrestricted_listener() {
        let route = vec!["a.example.com".to_string(), "*.example.org".to_string()];
        assert_eq!(compatible(None, &route), Some(route.clone()));
        assert_eq!(compatible(None, &[]), Some(vec![]));
    }

    #[test]
    fn route_without_hostnames_inherits_listener() {
        assert_eq!(
            compatible(Some("*.example.com"), &[]),
            Some(vec!["*.example.com".to_string()])
        );
    }

    #[test]
    fn compatible_filters_route_hostnames() {
        let route = vec![
            "a.example.com".to_string(),
            "a.example.org".to_string(),
            "*.b.example.com".to_string(),
        ];
        assert_eq!(
            compatible(Some("*.example.com"), &route),
            Some(vec![
                "a.example.com".to_string(),
                "*.b.example.com".to_string()
            ])
        );
        assert_eq!(compatible(Some("c.example.net"), &route), None);
    }

    #[test]
    fn exact_beats_wildcard() {
        assert_eq!(
            cmp_precedence("a.example.com", "*.example.com"),
            Ordering::Less
        );
        assert_eq!(
            cmp_precedence("*.example.com", "a.example.com"),
            Ordering::Greater
        );
        // Even a much shorter exact hostname precedes a wildcard.
        assert_eq!(cmp_precedence("a.io", "*.long.example.com"), Ordering::Less);
    }

    #[test]
    fn more_wildcard_labels_win() {
        assert_eq!(cmp_precedence("*.a.b.com", "*.b.com"), Ordering::Less);
        assert_eq!(cmp_precedence("*.b.com", "*.a.b.com"), Ordering::Greater);
    }

    #[test]
    fn equal_labels_tie_break_on_length() {
        assert_eq!(cmp_precedence("*.abc.com", "*.ab.com"), Ordering::Less);
        assert_eq!(cmp_precedence("*.ab.com", "*.cd.com"), Ordering::Equal);
        assert_eq!(cmp_precedence("api.example.com", "example.com"), Ordering::Less);
    }

    #[test]
    fn lists_compare_by_best_hostname_first() {
        let exact = vec!["*.example.com".to_string(), "api.example.com".to_string()];
        let wildcard = vec!["*.example.com".to_string()];
        assert_eq!(cmp_lists(&exact, &wildcard), Ordering::Less);
        assert_eq!(cmp_lists(&wildcard, &exact), Ordering::Greater);
    }

    #[test]
    fn longer_list_wins_once_shorter_is_exhausted() {
        let short = vec!["api.example.com".to_string()];
        let long = vec!["api.example.com".to_string(), "*.example.com".to_string()];
        assert_eq!(cmp_lists(&short, &long), Ordering::Greater);
        assert_eq!(cmp_lists(&long, &short), Ordering::Less);
        assert_eq!(cmp_lists(&[], &long), Ordering::Greater);
        assert_eq!(cmp_lists(&[], &[]), Ordering::Equal);
    }

    #[test]
    fn list_order_is_transitive() {
        let lists = [
            vec!["a.example.com".to_string()],
            vec!["a.example.com".to_string(), "*.example.com".to_string()],
            vec!["a.example.com".to_string(), "*.com".to_string()],
            vec!["*.example.com".to_string(), "a.example.com".to_string()],
            vec![],
        ];
        for a in &lists {
            for b in &lists {
                assert_eq!(cmp_lists(a, b), cmp_lists(b, a).reverse(), "{a:?} {b:?}");
                for c in &lists {
                    if cmp_lists(a, b).is_le() && cmp_lists(b, c).is_le() {
                        assert!(cmp_lists(a, c).is_le(), "{a:?} {b:?} {c:?}");
                    }
                }
            }
        }
    }
}
