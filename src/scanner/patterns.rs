use regex::Regex;
use std::sync::OnceLock;

/// Textual forms that switch an object on, `{name}` stands for the object name
pub const ACTIVATION_PATTERNS: &[&str] = &[
    "{name}.SetActive(true)",
    "{name}.activeSelf = true",
    "{name}.activeInHierarchy",
    "SetActiveRecursively({name}, true)",
    "{name}.gameObject.SetActive(true)",
    "{name}.gameObject.activeSelf = true",
    "{name}.gameObject.activeInHierarchy",
    "SetActiveRecursively({name}.gameObject, true)",
];

fn load_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"Resources\.Load(?:Async)?(?:<[^>]*>)?\(\s*"([^"]*)"\s*[,)]"#)
            .expect("load pattern is valid")
    })
}

fn load_all_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"Resources\.LoadAll(?:<[^>]*>)?\(\s*"([^"]*)"\s*[,)]"#)
            .expect("load-all pattern is valid")
    })
}

/// String literals passed as the path of single-asset load calls.
///
/// A literal followed by anything but `,` or `)` is a computed path and is
/// skipped.
pub fn load_literals(text: &str) -> Vec<String> {
    load_regex()
        .captures_iter(text)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// String literals passed to load-everything-under calls
pub fn load_all_literals(text: &str) -> Vec<String> {
    load_all_regex()
        .captures_iter(text)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}
