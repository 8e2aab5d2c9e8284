use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters escaped when embedding a resource path in a URL or in markup.
/// Slashes stay literal so the path remains routable; the other exemptions
/// are the RFC 3986 unreserved set.
const PATH_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-escapes a resource path. The output contains no HTML
/// metacharacters, so it is safe both as a URL component and inside an
/// attribute value, and a later HTML-escaping pass leaves it unchanged.
pub fn url_escape(path: &str) -> String {
    utf8_percent_encode(path, PATH_ESCAPE).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_slashes_and_unreserved_characters() {
        assert_eq!(url_escape("a/b-c_d.ipynb"), "a/b-c_d.ipynb");
    }

    #[test]
    fn escapes_html_metacharacters() {
        assert_eq!(url_escape(r#"<b>&"x"#), "%3Cb%3E%26%22x");
    }

    #[test]
    fn escapes_spaces_and_unicode() {
        assert_eq!(url_escape("my notebook.ipynb"), "my%20notebook.ipynb");
        assert_eq!(url_escape("é.ipynb"), "%C3%A9.ipynb");
    }
}
