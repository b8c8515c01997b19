use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use crate::content::{ContentRegion, Segment};
use crate::search::PendingHighlight;

/// Case-insensitive literal pattern for a user-typed term.
pub fn pattern_for(term: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()
}

/// Splits one text node around every match. Returns `None` when nothing matched.
fn split_matches(pattern: &Regex, text: &str) -> Option<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut last = 0;

    for m in pattern.find_iter(text) {
        if m.is_empty() {
            continue;
        }
        if m.start() > last {
            segments.push(Segment {
                text: text[last..m.start()].to_string(),
                emphasis: false,
            });
        }
        segments.push(Segment {
            text: m.as_str().to_string(),
            emphasis: true,
        });
        last = m.end();
    }

    if segments.is_empty() {
        return None;
    }
    if last < text.len() {
        segments.push(Segment {
            text: text[last..].to_string(),
            emphasis: false,
        });
    }
    Some(segments)
}

/// Emphasizes every occurrence of `term` in the region's text nodes and
/// focuses the first one. Returns how many occurrences were marked.
pub fn highlight(region: &mut ContentRegion, term: &str) -> usize {
    if term.is_empty() {
        return 0;
    }
    let pattern = match pattern_for(term) {
        Ok(pattern) => pattern,
        Err(e) => {
            warn!("could not build highlight pattern for {:?}: {}", term, e);
            return 0;
        }
    };

    let mut marked = 0;
    for block in region.blocks_mut() {
        let mut rebuilt = Vec::with_capacity(block.segments.len());
        for segment in block.segments.drain(..) {
            if segment.emphasis {
                rebuilt.push(segment);
                continue;
            }
            match split_matches(&pattern, &segment.text) {
                Some(parts) => {
                    marked += parts.iter().filter(|p| p.emphasis).count();
                    rebuilt.extend(parts);
                }
                None => rebuilt.push(segment),
            }
        }
        block.segments = rebuilt;
    }

    if let Some(first) = region.first_emphasis() {
        region.set_focus(first);
    }
    marked
}

/// Runs after every completed swap. Consumes the pending slot whether or
/// not anything matches.
pub fn on_swap(region: &mut ContentRegion, pending: &mut Option<PendingHighlight>) -> usize {
    let Some(highlight_request) = pending.take() else {
        debug!("no pending highlight for {}", region.path());
        return 0;
    };

    let marked = highlight(region, &highlight_request.term);
    debug!(
        term = %highlight_request.term,
        results = highlight_request.results.len(),
        marked,
        "highlighted search term in {}",
        region.path()
    );
    marked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(term: &str) -> Option<PendingHighlight> {
        Some(PendingHighlight {
            term: term.to_string(),
            results: Vec::new(),
        })
    }

    #[test]
    fn test_single_match_then_cleared() {
        let mut region = ContentRegion::from_html("/home", "<p>the cat sat</p>");
        let mut slot = pending("cat");

        assert_eq!(on_swap(&mut region, &mut slot), 1);
        assert!(slot.is_none());
        assert_eq!(region.emphasis_count(), 1);

        let segments = &region.blocks()[0].segments;
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1].text, "cat");
        assert!(segments[1].emphasis);

        let mut next = ContentRegion::from_html("/about", "<p>another cat</p>");
        assert_eq!(on_swap(&mut next, &mut slot), 0);
        assert_eq!(next.emphasis_count(), 0);
    }

    #[test]
    fn test_case_insensitive_keeps_original_text() {
        let mut region = ContentRegion::from_html("/home", "<p>Rust and RUST and rust</p>");
        assert_eq!(highlight(&mut region, "rust"), 3);
        assert_eq!(region.plain_text(), "Rust and RUST and rust");
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let mut region = ContentRegion::from_html("/home", "<p>costs $5 (or c++?)</p>");
        assert_eq!(highlight(&mut region, "c++?"), 1);
        assert_eq!(highlight(&mut region, "(."), 0);
    }

    #[test]
    fn test_no_match_still_clears_slot() {
        let mut region = ContentRegion::from_html("/home", "<p>nothing here</p>");
        let mut slot = pending("zebra");

        assert_eq!(on_swap(&mut region, &mut slot), 0);
        assert!(slot.is_none());
        assert_eq!(region.take_focus(), None);
    }

    #[test]
    fn test_focus_on_first_match() {
        let html = "<h1>Intro</h1><p>plain</p><p>found it</p><p>found again</p>";
        let mut region = ContentRegion::from_html("/home", html);

        assert_eq!(highlight(&mut region, "found"), 2);
        assert_eq!(region.take_focus(), Some(2));
        assert_eq!(region.take_focus(), None);
    }

    #[test]
    fn test_matches_do_not_cross_text_nodes() {
        let mut region = ContentRegion::from_html("/home", "<p>ca<em>t</em></p>");
        assert_eq!(highlight(&mut region, "cat"), 0);
    }
}
