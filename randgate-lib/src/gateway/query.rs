/// Query parameters parsed once per request.
pub(crate) struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub(crate) fn parse(query: Option<&str>) -> Self {
        let pairs = match query {
            Some(q) => url::form_urlencoded::parse(q.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
            None => Vec::new(),
        };
        Self(pairs)
    }

    /// First value for `name`, if present.
    pub(crate) fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs_and_percent_encoding() {
        let params = QueryParams::parse(Some("n=32&fmt=json&api_key=a%20b"));
        assert_eq!(params.get("n"), Some("32"));
        assert_eq!(params.get("fmt"), Some("json"));
        assert_eq!(params.get("api_key"), Some("a b"));
        assert_eq!(params.get("sig"), None);
    }

    #[test]
    fn first_value_wins_for_repeated_keys() {
        let params = QueryParams::parse(Some("n=1&n=2"));
        assert_eq!(params.get("n"), Some("1"));
    }

    #[test]
    fn handles_missing_query() {
        let params = QueryParams::parse(None);
        assert_eq!(params.get("n"), None);
    }
}
