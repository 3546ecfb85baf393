/// Reduces per-chunk category labels to one label per file.
///
/// The winner is the label seen most often. Ties go to the label that was
/// seen first.
///
/// # Examples
///
/// ```
/// use desksort::resolver::resolve;
///
/// let labels = vec!["A".to_string(), "A".to_string(), "B".to_string()];
/// assert_eq!(resolve(&labels), Some("A".to_string()));
/// ```
pub fn resolve(labels: &[String]) -> Option<String> {
    // (label, count) in first-seen order
    let mut tally: Vec<(&str, usize)> = Vec::new();
    for label in labels {
        match tally.iter_mut().find(|(seen, _)| *seen == label.as_str()) {
            Some((_, count)) => *count += 1,
            None => tally.push((label.as_str(), 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (label, count) in tally {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label.to_string())
}
