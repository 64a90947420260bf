/// Case-insensitive palindrome check that ignores whitespace. Text with no
/// non-whitespace characters is not a palindrome.
pub fn is_palindrome(text: &str) -> bool {
    let chars: Vec<char> = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();

    !chars.is_empty() && chars.iter().eq(chars.iter().rev())
}

#[cfg(test)]
mod tests {
    use super::is_palindrome;

    #[test]
    fn palindromes() {
        for text in ["radar", "a", "aa", "Radar", "  too hot to  hoot  ", "Never odd or even"] {
            assert!(is_palindrome(text), "{text:?}");
        }
    }

    #[test]
    fn not_palindromes() {
        for text in ["sword", "ab", "radär", "", "   "] {
            assert!(!is_palindrome(text), "{text:?}");
        }
    }
}
