//! 문자열 유사도.
//!
//! 소문자화한 두 문자열의 Levenshtein 거리를 긴 쪽 길이로 정규화한다.
//! 길이는 바이트가 아닌 `char` 단위 (일본어 OCR 텍스트).

/// 편집 거리 (삽입/삭제/치환 비용 1), 두 행 DP
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            let deletion = prev[j + 1] + 1;
            let insertion = curr[j] + 1;
            curr[j + 1] = substitution.min(deletion).min(insertion);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// 정규화 유사도 `1 − levenshtein(lower(a), lower(b)) / max(len)` ∈ [0, 1]
///
/// 둘 다 비어 있으면 1.0.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();

    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }

    let distance = levenshtein(&a, &b);
    (1.0 - distance as f64 / longest as f64).clamp(0.0, 1.0)
}
