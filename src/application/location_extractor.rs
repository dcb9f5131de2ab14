// Pulls an origin/destination pair out of free chat text
use crate::domain::route::DirectionRequest;

const TRIGGER: &str = "directions";

pub trait LocationExtractor: Send + Sync {
    fn extract_locations(&self, text: &str) -> Option<DirectionRequest>;
}

/// Understands "directions to X from Y" and "directions from X to Y".
#[derive(Debug, Clone, Default)]
pub struct PatternExtractor;

impl LocationExtractor for PatternExtractor {
    fn extract_locations(&self, text: &str) -> Option<DirectionRequest> {
        let rest = strip_prefix_ignore_case(text.trim(), TRIGGER)?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let rest = rest.trim_start();

        if let Some(tail) = strip_prefix_ignore_case(rest, "to ") {
            let (destination, origin) = split_once_ignore_case(tail, " from ")?;
            build(origin, destination)
        } else if let Some(tail) = strip_prefix_ignore_case(rest, "from ") {
            let (origin, destination) = split_once_ignore_case(tail, " to ")?;
            build(origin, destination)
        } else {
            None
        }
    }
}

fn build(origin: &str, destination: &str) -> Option<DirectionRequest> {
    let origin = origin.trim();
    let destination = destination.trim();
    if origin.is_empty() || destination.is_empty() {
        return None;
    }
    Some(DirectionRequest::new(origin, destination))
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

fn split_once_ignore_case<'a>(text: &'a str, separator: &str) -> Option<(&'a str, &'a str)> {
    let index = text.to_ascii_lowercase().find(separator)?;
    Some((&text[..index], &text[index + separator.len()..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Option<DirectionRequest> {
        PatternExtractor.extract_locations(text)
    }

    #[test]
    fn test_to_from_form() {
        assert_eq!(
            extract("directions to Portland from Seattle"),
            Some(DirectionRequest::new("Seattle", "Portland"))
        );
    }

    #[test]
    fn test_from_to_form() {
        assert_eq!(
            extract("Directions from 1 Infinite Loop, Cupertino TO San Francisco Airport"),
            Some(DirectionRequest::new(
                "1 Infinite Loop, Cupertino",
                "San Francisco Airport"
            ))
        );
    }

    #[test]
    fn test_no_match() {
        assert_eq!(extract("hello there"), None);
        assert_eq!(extract("directions to Portland"), None);
        assert_eq!(extract("directionsto Portland from Seattle"), None);
        assert_eq!(extract("directions to  from Seattle"), None);
        assert_eq!(extract(""), None);
    }
}
