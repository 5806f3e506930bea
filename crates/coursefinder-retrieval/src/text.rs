/// Split text into lower-cased alphanumeric words, dropping one-character words.
///
/// Shared by the local embedding and BM25 so that both sides of a hybrid
/// score see the same terms.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().nth(1).is_some())
        .map(str::to_lowercase)
        .collect()
}
