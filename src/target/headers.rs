use super::{FetchTarget, HeaderSet, RequestParams};
use crate::TargetResult;

/// Resolves a target into request parameters with a fixed header set merged in
///
/// Fixed headers win over headers the target already carries; names are
/// compared without regard to ASCII case. Headers the fixed set does not
/// mention pass through untouched. Without a fixed set the target's own
/// parameters are returned as they are.
///
/// # Example
///
/// ```
/// use sumi_tide::target::{inject_headers, FetchTarget, HeaderSet};
///
/// let mut fixed = HeaderSet::new();
/// fixed.insert("User-Agent".to_string(), "tide".to_string());
///
/// let target = FetchTarget::from("https://example.com/");
/// let params = inject_headers(&target, Some(&fixed)).unwrap();
/// assert_eq!(params.header("user-agent"), Some("tide"));
/// ```
pub fn inject_headers(target: &FetchTarget, fixed: Option<&HeaderSet>) -> TargetResult<RequestParams> {
    let mut params = target.to_params()?;

    if let Some(fixed) = fixed {
        for (name, value) in fixed {
            params.set_header(name, value);
        }
    }

    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_set(pairs: &[(&str, &str)]) -> HeaderSet {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_fixed_headers_win() {
        let mut params = RequestParams::new("https", "example.com", "/");
        params.headers = header_set(&[("A", "2"), ("B", "3")]);
        let target = FetchTarget::Params(params);

        let fixed = header_set(&[("A", "1")]);
        let merged = inject_headers(&target, Some(&fixed)).unwrap();

        assert_eq!(merged.headers, header_set(&[("A", "1"), ("B", "3")]));
    }

    #[test]
    fn test_fixed_headers_override_other_case() {
        let mut params = RequestParams::new("https", "example.com", "/");
        params.headers = header_set(&[("accept", "*/*")]);
        let target = FetchTarget::Params(params);

        let fixed = header_set(&[("Accept", "text/html")]);
        let merged = inject_headers(&target, Some(&fixed)).unwrap();

        assert_eq!(merged.headers, header_set(&[("Accept", "text/html")]));
    }

    #[test]
    fn test_no_fixed_headers_passes_through() {
        let mut params = RequestParams::new("https", "example.com", "/page");
        params.headers = header_set(&[("X-Trace", "abc")]);
        let target = FetchTarget::Params(params.clone());

        let merged = inject_headers(&target, None).unwrap();
        assert_eq!(merged, params);
    }

    #[test]
    fn test_bare_address_gains_headers() {
        let target = FetchTarget::from("https://example.com/page");
        let fixed = header_set(&[("Cookie", "a=b")]);

        let merged = inject_headers(&target, Some(&fixed)).unwrap();
        assert_eq!(merged.host, "example.com");
        assert_eq!(merged.path, "/page");
        assert_eq!(merged.header("cookie"), Some("a=b"));
    }

    #[test]
    fn test_target_is_not_mutated() {
        let target = FetchTarget::from("https://example.com/");
        let fixed = header_set(&[("A", "1")]);

        let _ = inject_headers(&target, Some(&fixed)).unwrap();
        assert_eq!(target, FetchTarget::from("https://example.com/"));
    }

    #[test]
    fn test_invalid_target_fails() {
        let target = FetchTarget::from("mailto:someone@example.com");
        assert!(inject_headers(&target, None).is_err());
    }
}
