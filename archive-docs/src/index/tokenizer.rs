/// Splits text on anything that is not alphanumeric and lowercases each term.
///
/// Documents and queries go through the same function so their vectors share a
/// vocabulary.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
}
