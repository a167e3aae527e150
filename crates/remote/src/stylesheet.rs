//! Request building and response scanning for the stylesheet endpoint.

use fontweave_types::{FontStyle, FontWeight};
use url::Url;

/// Builds the stylesheet request for one face.
///
/// Normal faces use `family=<Family>:wght@<weight>`; italic faces use the
/// axis tuple form `family=<Family>:ital,wght@1,<weight>`.
pub fn stylesheet_request_url(base: &Url, family: &str, weight: FontWeight, style: FontStyle) -> Url {
    let spec = match style {
        FontStyle::Normal => format!("{}:wght@{}", family, weight),
        FontStyle::Italic => format!("{}:ital,wght@1,{}", family, weight),
    };
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("family", &spec)
        .append_pair("display", "swap");
    url
}

/// Finds the font binary URL in a stylesheet response.
///
/// Responses list one `@font-face` block per unicode subset, each preceded by
/// a `/* subset */` comment. The `latin` block is preferred; otherwise the
/// first `src` declaration with a `url(...)` wins. Relative URLs are resolved
/// against `base`.
pub fn extract_font_url(css: &str, base: &Url) -> Option<Url> {
    let lower = css.to_ascii_lowercase();
    let latin = lower
        .find("/* latin */")
        .and_then(|start| find_src_url(&css[start..], &lower[start..]));
    let raw = latin.or_else(|| find_src_url(css, &lower))?;
    match base.join(raw) {
        Ok(url) => Some(url),
        Err(e) => {
            log::debug!("Ignoring unparsable font URL '{}': {}", raw, e);
            None
        }
    }
}

fn find_src_url<'a>(css: &'a str, lower: &str) -> Option<&'a str> {
    let mut pos = 0;
    while let Some(idx) = lower[pos..].find("src") {
        pos += idx + "src".len();
        let after = lower[pos..].trim_start();
        if !after.starts_with(':') {
            continue;
        }
        let value_start = lower.len() - after.len() + 1;
        let value = &lower[value_start..];
        let Some(url_at) = value.find("url(") else {
            continue;
        };
        // The url must belong to this declaration.
        if value[..url_at].contains([';', '}']) {
            continue;
        }
        let open = value_start + url_at + "url(".len();
        let Some(len) = lower[open..].find(')') else {
            continue;
        };
        let raw = css[open..open + len].trim().trim_matches(['"', '\'']).trim();
        if !raw.is_empty() {
            return Some(raw);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://fonts.example.com/css2").unwrap()
    }

    fn family_param(url: &Url) -> String {
        url.query_pairs()
            .find(|(k, _)| k == "family")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default()
    }

    #[test]
    fn builds_weight_and_italic_queries() {
        let normal = stylesheet_request_url(&base(), "Open Sans", FontWeight::BOLD, FontStyle::Normal);
        assert_eq!(family_param(&normal), "Open Sans:wght@700");
        assert!(normal.as_str().contains("family=Open+Sans"));
        assert!(normal.as_str().ends_with("&display=swap"));

        let italic = stylesheet_request_url(&base(), "Lora", FontWeight::REGULAR, FontStyle::Italic);
        assert_eq!(family_param(&italic), "Lora:ital,wght@1,400");
    }

    #[test]
    fn prefers_the_latin_subset() {
        let css = r#"
/* cyrillic */
@font-face {
  font-family: 'Roboto';
  src: url(https://fonts.example.com/s/roboto/cyrillic.ttf) format('truetype');
}
/* latin-ext */
@font-face {
  font-family: 'Roboto';
  src: url(https://fonts.example.com/s/roboto/latin-ext.ttf) format('truetype');
}
/* latin */
@font-face {
  font-family: 'Roboto';
  src: url("https://fonts.example.com/s/roboto/latin.ttf") format('truetype');
}
"#;
        let url = extract_font_url(css, &base()).unwrap();
        assert_eq!(url.as_str(), "https://fonts.example.com/s/roboto/latin.ttf");
    }

    #[test]
    fn falls_back_to_the_first_src_and_resolves_relative_urls() {
        let css = "@font-face { font-family: X; src : url('files/x.ttf') format('truetype'); }";
        let url = extract_font_url(css, &base()).unwrap();
        assert_eq!(url.as_str(), "https://fonts.example.com/files/x.ttf");
    }

    #[test]
    fn no_src_url_means_nothing_to_fetch() {
        assert!(extract_font_url("@font-face { font-family: X; src: local(X); }", &base()).is_none());
        assert!(extract_font_url("", &base()).is_none());
    }
}
