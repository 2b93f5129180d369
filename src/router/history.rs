/// The base path the client-side history lives under.
///
/// Stored without a trailing slash, so the default base `/` becomes the empty
/// string and `/app/` becomes `/app`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    base: String,
}

impl History {
    pub fn new(base: &str) -> Self {
        let base = base.trim();
        let base = base.split(['?', '#']).next().unwrap_or_default();
        let base = base.trim_end_matches('/');

        let base = if base.is_empty() || base.starts_with('/') {
            base.to_string()
        } else {
            format!("/{base}")
        };

        Self { base }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Removes the base from an incoming path, `None` when the path lives
    /// outside of it. The comparison ignores ASCII case.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.base.is_empty() {
            return Some(path);
        }

        let head = path.get(..self.base.len())?;
        if !head.eq_ignore_ascii_case(&self.base) {
            return None;
        }

        match &path[self.base.len()..] {
            "" => Some("/"),
            rest if rest.starts_with('/') => Some(rest),
            _ => None,
        }
    }

    /// Prefixes a table location (starting with `/`) with the base.
    pub fn href(&self, location: &str) -> String {
        format!("{}{}", self.base, location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_base_is_empty() {
        assert_eq!(History::new("/").base(), "");
        assert_eq!(History::new("").base(), "");
    }

    #[test]
    fn base_is_normalized() {
        assert_eq!(History::new("/app/").base(), "/app");
        assert_eq!(History::new("app").base(), "/app");
        assert_eq!(History::new(" /app/reader/ ").base(), "/app/reader");
    }

    #[test]
    fn strip_requires_a_segment_boundary() {
        let history = History::new("/app");
        assert_eq!(history.strip("/app"), Some("/"));
        assert_eq!(history.strip("/app/user/feeds"), Some("/user/feeds"));
        assert_eq!(history.strip("/APP/confirm"), Some("/confirm"));
        assert_eq!(history.strip("/apple"), None);
        assert_eq!(history.strip("/user/feeds"), None);
    }

    #[test]
    fn href_prefixes_the_base() {
        assert_eq!(History::new("/").href("/user/feeds"), "/user/feeds");
        assert_eq!(History::new("/app/").href("/user/feeds"), "/app/user/feeds");
    }
}
