/// A run of columns `[start, start + width)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub width: usize,
}

impl Span {
    pub fn end(&self) -> usize {
        self.start + self.width
    }
}

/// Splits `width` columns among `weights` in proportion to each weight.
///
/// Boundaries are placed at `floor(width * cumulative / total)`, so the
/// spans are contiguous and always add up to exactly `width`. Rounding is
/// absorbed by whichever boundary it lands on; small weights may get zero
/// columns. If all weights are zero every span is empty.
pub fn partition(weights: &[u64], width: usize) -> Vec<Span> {
    let total: u128 = weights.iter().map(|&w| w as u128).sum();
    if total == 0 {
        return vec![Span::default(); weights.len()];
    }
    let mut spans = Vec::with_capacity(weights.len());
    let mut cumulative: u128 = 0;
    let mut last = 0usize;
    for &w in weights {
        cumulative += w as u128;
        let pos = (width as u128 * cumulative / total) as usize;
        spans.push(Span {
            start: last,
            width: pos - last,
        });
        last = pos;
    }
    spans
}
