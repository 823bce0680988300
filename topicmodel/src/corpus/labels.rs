use itertools::Itertools;
use crate::model::{DocumentId, TopicId};

/// Splits an input line into its optional label restriction and the text.
///
/// A line may start with `[l1 l2 ...]`. Label tokens that are no integers are
/// reported and skipped, as are labels `>= topic_limit` when a limit is known.
/// If `unlabeled` is set any present label list is discarded.
/// An empty label set is returned as [None], the document is unrestricted then.
pub fn split_labels(line: &str, unlabeled: bool, topic_limit: Option<usize>, document: DocumentId) -> (Option<Vec<TopicId>>, &str) {
    let trimmed = line.trim_start();
    let Some(rest) = trimmed.strip_prefix('[') else {
        return (None, line)
    };
    let Some((labels, text)) = rest.split_once(']') else {
        log::warn!("The label list of document {document} is not closed, the line is read as plain text.");
        return (None, line)
    };
    if unlabeled {
        return (None, text)
    }

    let labels = labels
        .split_whitespace()
        .filter_map(|value| {
            match value.parse::<TopicId>() {
                Ok(label) => {
                    match topic_limit {
                        Some(limit) if label >= limit => {
                            log::warn!("The label {label} of document {document} exceeds the {limit} topics and is dropped.");
                            None
                        }
                        _ => Some(label)
                    }
                }
                Err(_) => {
                    log::warn!("Unknown document label ( {value} ) for document {document}.");
                    None
                }
            }
        })
        .sorted_unstable()
        .dedup()
        .collect_vec();

    if labels.is_empty() {
        log::debug!("The document {document} has no valid labels and is not restricted.");
        (None, text)
    } else {
        (Some(labels), text)
    }
}

/// Formats labels the way [split_labels] reads them.
pub fn format_labels(labels: &[TopicId]) -> String {
    format!("[{}]", labels.iter().join(" "))
}
