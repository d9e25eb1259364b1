use crate::checker::dictionary::Dictionary;

/// Generate spelling suggestions for `word` from `dictionary`, cheapest
/// strategies first. Suggestions keep the capitalization of the input.
pub fn generate(word: &str, dictionary: &Dictionary, max_suggestions: usize) -> Vec<String> {
    if max_suggestions == 0 {
        return Vec::new();
    }

    let lower = word.to_lowercase();
    let char_len = lower.chars().count();
    let mut suggestions: Vec<String> = Vec::new();

    // 1. Words sharing the first three characters
    if char_len >= 3 {
        let mut prefix_matches = dictionary.words_with_prefix(char_prefix(&lower, 3));
        prefix_matches.retain(|w| edit_distance(&lower, w) <= 2);
        push_ranked(&mut suggestions, &lower, prefix_matches, max_suggestions);
    }

    if suggestions.len() >= max_suggestions {
        return finish(word, suggestions, max_suggestions);
    }

    // 2. Single deletions, transpositions and common replacements
    for transform in generate_transformations(&lower) {
        if dictionary.contains(&transform) && !suggestions.contains(&transform) {
            suggestions.push(transform);
            if suggestions.len() >= max_suggestions {
                return finish(word, suggestions, max_suggestions);
            }
        }
    }

    // 3. A shorter shared prefix with a looser distance bound
    if char_len >= 2 {
        let mut prefix_matches = dictionary.words_with_prefix(char_prefix(&lower, 2));
        prefix_matches.retain(|w| edit_distance(&lower, w) <= 3);
        push_ranked(&mut suggestions, &lower, prefix_matches, max_suggestions);
    }

    // 4. Very short words: a bounded scan over words of similar length
    if suggestions.len() < max_suggestions && char_len <= 3 {
        let mut candidates = dictionary.words_near_length(char_len, 100);
        candidates.retain(|w| edit_distance(&lower, w) <= 2);
        push_ranked(&mut suggestions, &lower, candidates, max_suggestions);
    }

    finish(word, suggestions, max_suggestions)
}

/// Rank arbitrary candidates by edit distance to `word` (distance <= 2).
pub fn rank_candidates<'a, I>(word: &str, candidates: I, max_suggestions: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let lower = word.to_lowercase();
    let candidates: Vec<String> = candidates
        .into_iter()
        .filter(|c| edit_distance(&lower, c) <= 2)
        .map(String::from)
        .collect();

    let mut suggestions = Vec::new();
    push_ranked(&mut suggestions, &lower, candidates, max_suggestions);
    finish(word, suggestions, max_suggestions)
}

fn push_ranked(suggestions: &mut Vec<String>, word: &str, mut candidates: Vec<String>, max: usize) {
    candidates.sort_by(|a, b| {
        edit_distance(word, a)
            .cmp(&edit_distance(word, b))
            .then_with(|| a.cmp(b))
    });

    for candidate in candidates {
        if suggestions.len() >= max {
            break;
        }
        if candidate != word && !suggestions.contains(&candidate) {
            suggestions.push(candidate);
        }
    }
}

fn finish(original: &str, mut suggestions: Vec<String>, max: usize) -> Vec<String> {
    suggestions.truncate(max);
    suggestions
        .into_iter()
        .map(|s| restore_case(original, &s))
        .collect()
}

fn char_prefix(word: &str, chars: usize) -> &str {
    match word.char_indices().nth(chars) {
        Some((idx, _)) => &word[..idx],
        None => word,
    }
}

/// Carry the capitalization of `original` over to `suggestion`.
fn restore_case(original: &str, suggestion: &str) -> String {
    let mut chars = original.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() => {
            if original.chars().count() > 1 && chars.all(|c| !c.is_lowercase()) {
                return suggestion.to_uppercase();
            }
            let mut s = suggestion.chars();
            match s.next() {
                Some(head) => head.to_uppercase().chain(s).collect(),
                None => String::new(),
            }
        }
        _ => suggestion.to_string(),
    }
}

/// Calculate Levenshtein distance between two strings
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    // two rolling rows instead of the full matrix
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}

/// Generate common transformations of a word
fn generate_transformations(word: &str) -> Vec<String> {
    let mut transformations = Vec::new();
    let chars: Vec<char> = word.chars().collect();

    // Deletions
    for i in 0..chars.len() {
        let mut new_word = chars.clone();
        new_word.remove(i);
        transformations.push(new_word.iter().collect());
    }

    // Transpositions (swap adjacent)
    for i in 0..chars.len().saturating_sub(1) {
        let mut new_word = chars.clone();
        new_word.swap(i, i + 1);
        transformations.push(new_word.iter().collect());
    }

    // Replacements (common typos)
    let common_replacements = [
        ('a', 'e'),
        ('e', 'i'),
        ('i', 'o'),
        ('o', 'u'),
        ('b', 'v'),
        ('c', 'k'),
        ('f', 'v'),
        ('g', 'j'),
        ('m', 'n'),
        ('s', 'z'),
        ('t', 'd'),
    ];

    for (i, &ch) in chars.iter().enumerate() {
        for &(from, to) in &common_replacements {
            if ch == from {
                let mut new_word = chars.clone();
                new_word[i] = to;
                transformations.push(new_word.iter().collect());
            }
        }
    }

    transformations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("hello", "hello"), 0);
        assert_eq!(edit_distance("hello", "hallo"), 1);
        assert_eq!(edit_distance("hello", "hullo"), 1);
        assert_eq!(edit_distance("hello", "world"), 4);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("fatigue", "fatigué"), 1);
    }

    #[test]
    fn test_transformations() {
        let transforms = generate_transformations("hello");
        assert!(transforms.contains(&"hllo".to_string())); // deletion
        assert!(transforms.contains(&"ehllo".to_string())); // transposition
    }

    #[test]
    fn test_generate_from_dictionary() {
        let dict = Dictionary::from_words(["this", "thesis", "these", "test"]).unwrap();
        let suggestions = generate("Thiss", &dict, 3);
        assert_eq!(suggestions.first().map(String::as_str), Some("This"));
        assert!(suggestions.len() <= 3);
    }

    #[test]
    fn test_multibyte_prefix_does_not_panic() {
        let dict = Dictionary::from_words(["été", "étude"]).unwrap();
        let suggestions = generate("étéé", &dict, 5);
        assert_eq!(suggestions.first().map(String::as_str), Some("été"));
    }

    #[test]
    fn test_rank_candidates_restores_case() {
        let ranked = rank_candidates("TST", ["test", "tot", "banana"], 5);
        assert_eq!(ranked, vec!["TEST", "TOT"]);
    }
}
