/// Levenshtein edit distance over chars, using two rows of O(min(m,n)) space.
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let (a, b) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let n = b.len();

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0usize; n + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Lowercase and collapse a description to alphanumeric words.
pub fn normalize_description(s: &str) -> String {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Merchant identity of a description: its words minus store numbers,
/// reference codes and dates. Falls back to the normalized description when
/// every word carries a digit.
pub fn merchant_key(s: &str) -> String {
    let normalized = normalize_description(s);
    let words: Vec<&str> = normalized
        .split(' ')
        .filter(|w| !w.is_empty() && !w.chars().any(|c| c.is_ascii_digit()))
        .collect();
    if words.is_empty() {
        normalized
    } else {
        words.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_are_zero() {
        assert_eq!(levenshtein_distance("abc", "abc"), 0);
        assert_eq!(levenshtein_distance("", ""), 0);
    }

    #[test]
    fn empty_string_is_length_of_other() {
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", ""), 3);
    }

    #[test]
    fn single_edits() {
        assert_eq!(levenshtein_distance("cat", "bat"), 1);
        assert_eq!(levenshtein_distance("abc", "abcd"), 1);
        assert_eq!(levenshtein_distance("abcd", "abc"), 1);
    }

    #[test]
    fn counts_chars_not_bytes() {
        assert_eq!(levenshtein_distance("café", "cafe"), 1);
    }

    #[test]
    fn commutative() {
        assert_eq!(
            levenshtein_distance("amazon", "amzn"),
            levenshtein_distance("amzn", "amazon")
        );
    }

    #[test]
    fn normalize_strips_punctuation() {
        assert_eq!(normalize_description("AMZN Mktp US*2K4"), "amzn mktp us 2k4");
        assert_eq!(normalize_description("  STARBUCKS   #123 "), "starbucks 123");
    }

    #[test]
    fn merchant_key_drops_store_numbers() {
        assert_eq!(merchant_key("STARBUCKS #123"), "starbucks");
        assert_eq!(merchant_key("STARBUCKS #456"), "starbucks");
        assert_eq!(merchant_key("NETFLIX.COM 866-579-7172 CA"), "netflix com ca");
        assert_eq!(merchant_key("12345"), "12345");
    }
}
