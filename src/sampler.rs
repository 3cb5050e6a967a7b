/// Evenly spaced frame indices to keep from a sequence of `len` frames.
///
/// `max_count == 0` keeps everything. Otherwise index `i` of the result is
/// `floor(i * len / max_count)`, so the first frame is always kept and the
/// result never holds more than `min(max_count, len)` strictly increasing
/// indices.
pub fn sample(len: usize, max_count: usize) -> Vec<usize> {
    if max_count == 0 || max_count >= len {
        return (0..len).collect();
    }

    (0..max_count).map(|i| i * len / max_count).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hundred_into_ten() {
        let indices = sample(100, 10);
        assert_eq!(indices.len(), 10);
        assert_eq!(indices[0], 0);
        assert!(indices.windows(2).all(|w| w[0] < w[1]));
        assert!(indices.iter().all(|&i| i < 100));
        assert_eq!(indices, vec![0, 10, 20, 30, 40, 50, 60, 70, 80, 90]);
    }

    #[test]
    fn zero_keeps_all() {
        assert_eq!(sample(5, 0), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn never_exceeds_length() {
        assert_eq!(sample(3, 10), vec![0, 1, 2]);
        assert_eq!(sample(4, 4), vec![0, 1, 2, 3]);
    }

    #[test]
    fn uneven_stride_floors() {
        assert_eq!(sample(50, 10), vec![0, 5, 10, 15, 20, 25, 30, 35, 40, 45]);
        assert_eq!(sample(10, 3), vec![0, 3, 6]);
        assert_eq!(sample(7, 2), vec![0, 3]);
    }

    #[test]
    fn empty_sequence() {
        assert!(sample(0, 0).is_empty());
        assert!(sample(0, 5).is_empty());
    }
}
