use crate::IdentifierError;
use std::fmt;
use url::Url;

/// Most path segments an arXiv identifier can carry (`archive/number`)
const MAX_SEGMENTS: usize = 2;

/// A normalized arXiv identifier
///
/// Holds the identifier path exactly as the e-print endpoint expects it:
/// `2308.01234v1` for new-style ids, `astro-ph/0701212v1` for legacy ids
/// that carry their archive name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArxivId(String);

impl ArxivId {
    /// Normalizes the `<id>` of a listing entry
    ///
    /// Accepts an abstract-page URL or a bare identifier. For URLs, every
    /// path segment after the last `abs` segment belongs to the identifier.
    ///
    /// | Input | `as_str()` | `file_stem()` |
    /// |-------|------------|---------------|
    /// | `http://arxiv.org/abs/2308.01234v1` | `2308.01234v1` | `2308.01234v1` |
    /// | `http://arxiv.org/abs/astro-ph/0701212v1` | `astro-ph/0701212v1` | `astro-ph0701212v1` |
    /// | `hep-th/9901001` | `hep-th/9901001` | `hep-th9901001` |
    /// | `http://arxiv.org/api/errors#bad_query` | error: no `abs` segment | |
    ///
    /// # Examples
    ///
    /// ```
    /// use arxiv_catchup::feed::ArxivId;
    ///
    /// let id = ArxivId::from_entry_id("http://arxiv.org/abs/astro-ph/0701212v1").unwrap();
    /// assert_eq!(id.as_str(), "astro-ph/0701212v1");
    /// assert_eq!(id.file_stem(), "astro-ph0701212v1");
    /// ```
    pub fn from_entry_id(raw: &str) -> Result<Self, IdentifierError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(IdentifierError::Empty);
        }

        let segments: Vec<String> = if raw.contains("://") {
            let url = Url::parse(raw)
                .map_err(|_| IdentifierError::InvalidCharacter(raw.to_string()))?;
            let path: Vec<&str> = url.path_segments().map(|s| s.collect()).unwrap_or_default();
            let abs = path
                .iter()
                .rposition(|segment| *segment == "abs")
                .ok_or_else(|| IdentifierError::MissingAbsSegment(raw.to_string()))?;
            path[abs + 1..]
                .iter()
                .filter(|segment| !segment.is_empty())
                .map(|segment| segment.to_string())
                .collect()
        } else {
            raw.split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect()
        };

        Self::from_segments(raw, &segments)
    }

    fn from_segments(raw: &str, segments: &[String]) -> Result<Self, IdentifierError> {
        if segments.is_empty() {
            return Err(IdentifierError::Empty);
        }

        if segments.len() > MAX_SEGMENTS {
            return Err(IdentifierError::TooManySegments(raw.to_string()));
        }

        for segment in segments {
            let valid_chars = segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
            if !valid_chars || segment.chars().all(|c| c == '.') {
                return Err(IdentifierError::InvalidCharacter(raw.to_string()));
            }
        }

        Ok(Self(segments.join("/")))
    }

    /// The identifier path used in artifact URLs
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem-safe stem: the identifier with separators removed
    pub fn file_stem(&self) -> String {
        self.0.replace('/', "")
    }
}

impl fmt::Display for ArxivId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_style_id() {
        let id = ArxivId::from_entry_id("http://arxiv.org/abs/2308.01234v1").unwrap();
        assert_eq!(id.as_str(), "2308.01234v1");
        assert_eq!(id.file_stem(), "2308.01234v1");
    }

    #[test]
    fn test_legacy_id_keeps_archive() {
        let id = ArxivId::from_entry_id("http://arxiv.org/abs/astro-ph/0701212v1").unwrap();
        assert_eq!(id.as_str(), "astro-ph/0701212v1");
        assert_eq!(id.file_stem(), "astro-ph0701212v1");
    }

    #[test]
    fn test_https_and_trailing_slash() {
        let id = ArxivId::from_entry_id("https://arxiv.org/abs/2308.01234v2/").unwrap();
        assert_eq!(id.as_str(), "2308.01234v2");
    }

    #[test]
    fn test_bare_ids() {
        assert_eq!(
            ArxivId::from_entry_id("2308.01234").unwrap().as_str(),
            "2308.01234"
        );
        assert_eq!(
            ArxivId::from_entry_id(" hep-th/9901001 ").unwrap().as_str(),
            "hep-th/9901001"
        );
    }

    #[test]
    fn test_error_entry_has_no_abs_segment() {
        let result = ArxivId::from_entry_id("http://arxiv.org/api/errors#incorrect_id_format");
        assert!(matches!(result, Err(IdentifierError::MissingAbsSegment(_))));
    }

    #[test]
    fn test_rejects_empty_and_bad_input() {
        assert_eq!(ArxivId::from_entry_id(""), Err(IdentifierError::Empty));
        assert_eq!(
            ArxivId::from_entry_id("http://arxiv.org/abs/"),
            Err(IdentifierError::Empty)
        );
        assert!(matches!(
            ArxivId::from_entry_id("2308.01234 v1"),
            Err(IdentifierError::InvalidCharacter(_))
        ));
        assert!(matches!(
            ArxivId::from_entry_id("../0701212"),
            Err(IdentifierError::InvalidCharacter(_))
        ));
        assert!(matches!(
            ArxivId::from_entry_id("a/b/c"),
            Err(IdentifierError::TooManySegments(_))
        ));
    }
}
