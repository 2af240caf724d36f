//! Published port extraction from Dockerfile `EXPOSE` directives

use std::sync::LazyLock;

use regex::Regex;

static EXPOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"EXPOSE (\d+)(?:/\w+)?").expect("EXPOSE pattern is valid")
});

/// Every port declared by an `EXPOSE` directive, in document order.
///
/// Comment lines are ignored. Values are not range-checked.
pub fn extract_ports(dockerfile: &str) -> Vec<String> {
    dockerfile
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .flat_map(|line| EXPOSE.captures_iter(line))
        .map(|caps| caps[1].to_string())
        .collect()
}

/// The port to publish: the last `EXPOSE` wins
pub fn extract_port(dockerfile: &str) -> Option<String> {
    extract_ports(dockerfile).pop()
}
