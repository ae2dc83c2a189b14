//! Metadata block parsing.
//!
//! A scroll carries its metadata in the *last* contiguous block of `%` comment
//! lines. Blank lines never break a block; any other non-comment line discards
//! what was gathered so far. A typical trailer looks like:
//!
//! ```text
//! \LaTeX\ code ...
//!
//! % @source Author: Title
//! % @source Lemma 3.2, p. 41
//! % @type proposition, definition
//! % counter-example, analysis, TopOloGY
//! ```
//!
//! which yields type `proposition`, tags `counter-example`, `analysis` and
//! `topology`, two citations, and `definition` as a hidden search term.

use serde::{Deserialize, Serialize};

use crate::constants::COMMENT_PREFIX;
use crate::error::{Result, ScrollError};
use crate::types::{Metadata, Scroll, ScrollId};

const SOURCE_DIRECTIVE: &str = "@source ";
const HIDDEN_DIRECTIVE: &str = "@hidden ";
const TYPE_DIRECTIVE: &str = "@type ";

/// What to do when a metadata block declares `@type` on more than one line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateTypePolicy {
    /// Keep the first declaration and ignore later ones.
    #[default]
    KeepFirst,
    /// Fail with [`ScrollError::DuplicateType`].
    Reject,
}

/// Parse raw scroll source into a [`Scroll`].
pub fn parse_scroll(id: ScrollId, source: &str, policy: DuplicateTypePolicy) -> Result<Scroll> {
    let metadata = parse_metadata(source, policy)?;
    Ok(Scroll {
        id,
        content: strip_comments(source),
        metadata,
    })
}

pub fn parse_metadata(source: &str, policy: DuplicateTypePolicy) -> Result<Metadata> {
    let mut metadata = Metadata::default();
    let mut type_declared = false;

    for line in metadata_lines(source) {
        if let Some(rest) = line.strip_prefix(HIDDEN_DIRECTIVE) {
            metadata
                .hidden
                .extend(split_list(rest).map(ToString::to_string));
        } else if let Some(rest) = line.strip_prefix(SOURCE_DIRECTIVE) {
            metadata.sources.push(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix(TYPE_DIRECTIVE) {
            let mut declared = split_list(rest);
            let Some(first) = declared.next() else {
                continue;
            };
            if type_declared {
                if policy == DuplicateTypePolicy::Reject {
                    return Err(ScrollError::DuplicateType {
                        first: metadata.scroll_type.clone(),
                        second: first.to_string(),
                    });
                }
                continue;
            }
            type_declared = true;
            metadata.scroll_type = first.to_string();
            // Secondary types only matter for searching.
            metadata
                .hidden
                .extend(declared.map(ToString::to_string));
        } else if line.starts_with('@') {
            metadata.other_directives.push(line.to_string());
        } else {
            metadata
                .tags
                .extend(split_list(line).map(str::to_lowercase));
        }
    }

    Ok(metadata)
}

/// Lines of the final comment block with the leading `%` and whitespace removed.
fn metadata_lines(source: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    for line in source.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !trimmed.starts_with(COMMENT_PREFIX) {
            lines.clear();
            continue;
        }
        let stripped =
            trimmed.trim_start_matches(|c: char| c == COMMENT_PREFIX || c == ' ' || c == '\t');
        if !stripped.is_empty() {
            lines.push(stripped);
        }
    }
    lines
}

fn split_list(line: &str) -> impl Iterator<Item = &str> {
    line.split(',').map(str::trim).filter(|item| !item.is_empty())
}

/// Drop every paragraph that starts with a comment, which removes the metadata block.
pub fn strip_comments(source: &str) -> String {
    let mut content = String::new();
    for paragraph in source.split("\n\n") {
        let trimmed = paragraph.trim();
        if trimmed.starts_with(COMMENT_PREFIX) {
            continue;
        }
        content.push_str(trimmed);
        content.push_str("\n\n");
    }
    content.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\\begin{lemma}\nEvery compact metric space is complete.\n\\end{lemma}\n\n\
% @source Munkres: Topology\n\
% @source Lemma 3.2, p. 41\n\
% @type lemma, theorem\n\
% @hidden heine, borel\n\
% @see zorn\n\
% Analysis, TopOloGY\n";

    #[test]
    fn parses_all_directive_kinds() {
        let meta = parse_metadata(SAMPLE, DuplicateTypePolicy::KeepFirst).unwrap();
        assert_eq!(meta.scroll_type, "lemma");
        assert_eq!(meta.sources, vec!["Munkres: Topology", "Lemma 3.2, p. 41"]);
        assert!(meta.tags.contains("analysis"));
        assert!(meta.tags.contains("topology"));
        assert_eq!(meta.tags.len(), 2);
        assert!(meta.hidden.contains("heine"));
        assert!(meta.hidden.contains("borel"));
        assert!(meta.hidden.contains("theorem"), "secondary types stay searchable");
        assert_eq!(meta.other_directives, vec!["@see zorn"]);
    }

    #[test]
    fn only_the_last_comment_block_counts() {
        let doc = "% @type definition\n% early, tags\n\\textbf{body}\n% @type lemma\n% late\n";
        let meta = parse_metadata(doc, DuplicateTypePolicy::Reject).unwrap();
        assert_eq!(meta.scroll_type, "lemma");
        assert_eq!(meta.tags.iter().collect::<Vec<_>>(), vec!["late"]);
    }

    #[test]
    fn blank_lines_do_not_split_a_block() {
        let doc = "body\n\n% @type remark\n\n% tagged\n";
        let meta = parse_metadata(doc, DuplicateTypePolicy::KeepFirst).unwrap();
        assert_eq!(meta.scroll_type, "remark");
        assert!(meta.tags.contains("tagged"));
    }

    #[test]
    fn undeclared_type_is_empty() {
        let meta = parse_metadata("just text\n% some, tags\n", DuplicateTypePolicy::KeepFirst)
            .unwrap();
        assert!(meta.scroll_type.is_empty());
    }

    #[test]
    fn duplicate_type_keeps_first_by_default() {
        let doc = "x\n% @type lemma\n% @type theorem\n";
        let meta = parse_metadata(doc, DuplicateTypePolicy::KeepFirst).unwrap();
        assert_eq!(meta.scroll_type, "lemma");
        assert!(!meta.hidden.contains("theorem"));
    }

    #[test]
    fn duplicate_type_rejected_under_reject_policy() {
        let doc = "x\n% @type lemma\n% @type theorem\n";
        let err = parse_metadata(doc, DuplicateTypePolicy::Reject).unwrap_err();
        match err {
            ScrollError::DuplicateType { first, second } => {
                assert_eq!(first, "lemma");
                assert_eq!(second, "theorem");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn single_type_accepted_under_reject_policy() {
        let meta = parse_metadata(SAMPLE, DuplicateTypePolicy::Reject).unwrap();
        assert_eq!(meta.scroll_type, "lemma");
    }

    #[test]
    fn content_excludes_metadata_paragraphs() {
        let scroll = parse_scroll(
            ScrollId::from("compact"),
            SAMPLE,
            DuplicateTypePolicy::KeepFirst,
        )
        .unwrap();
        assert_eq!(
            scroll.content,
            "\\begin{lemma}\nEvery compact metric space is complete.\n\\end{lemma}"
        );
        assert_eq!(scroll.id.as_str(), "compact");
    }

    #[test]
    fn comment_markers_and_indentation_are_stripped() {
        let doc = "body\n  %%\t @source Halmos\n";
        let meta = parse_metadata(doc, DuplicateTypePolicy::KeepFirst).unwrap();
        assert_eq!(meta.sources, vec!["Halmos"]);
    }
}
