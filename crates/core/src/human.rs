pub fn human_bytes(b: impl Into<u64>) -> String {
    let b = b.into();
    if b < 1024 {
        return format!("{} B", b);
    }
    let mut n = b as f64;
    let units = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
    let mut u = 0;
    while n >= 1024.0 && u < units.len() - 1 {
        n /= 1024.0;
        u += 1;
    }
    format!("{:.2} {}", n, units[u])
}

pub fn human_count(c: impl Into<u64>) -> String {
    let c = c.into();
    if c < 1000 {
        return c.to_string();
    }
    let mut n = c as f64;
    let units = ["", "k", "M", "G", "T"];
    let mut u = 0;
    while n >= 1000.0 && u < units.len() - 1 {
        n /= 1000.0;
        u += 1;
    }
    format!("{:.2}{}", n, units[u])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes() {
        assert_eq!(human_bytes(0u64), "0 B");
        assert_eq!(human_bytes(1023u64), "1023 B");
        assert_eq!(human_bytes(1024u64), "1.00 KiB");
        assert_eq!(human_bytes(1536u64), "1.50 KiB");
        assert_eq!(human_bytes(5u64 * 1024 * 1024 * 1024), "5.00 GiB");
    }

    #[test]
    fn counts() {
        assert_eq!(human_count(999u64), "999");
        assert_eq!(human_count(1234u64), "1.23k");
        assert_eq!(human_count(2_500_000u64), "2.50M");
    }
}
