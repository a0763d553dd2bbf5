//! Text views of an aggregated tree. Rendering never mutates the tree.

use chrono::{DateTime, Local};

use crate::config::{RenderOptions, View};
use crate::human::{human_bytes, human_count};
use crate::model::TreeNode;
use crate::treemap::partition;

pub fn render(node: &TreeNode, options: &RenderOptions) -> String {
    match options.view {
        View::Blocks => render_blocks(node, options.width, options.max_depth),
        View::Summary => render_summary(node),
        View::Dump => render_dump(node, options.max_depth),
    }
}

/// Label centered between brackets and padded with `fill` to exactly
/// `width` columns, clipped if it does not fit. When the padding is odd the
/// extra column goes left if the inner width is odd and right otherwise.
fn bar(width: usize, label: &str, fill: char) -> String {
    match width {
        0 => String::new(),
        1 => "|".to_string(),
        _ => {
            let inner = width - 2;
            let label: String = label.chars().take(inner).collect();
            let pad = inner - label.chars().count();
            let left = pad / 2 + (pad & inner & 1);
            let mut s = String::with_capacity(width);
            s.push('[');
            s.extend(std::iter::repeat(fill).take(left));
            s.push_str(&label);
            s.extend(std::iter::repeat(fill).take(pad - left));
            s.push(']');
            s
        }
    }
}

/// Nested bar chart `width` columns wide. Each directory gets three rows
/// (name, allocated size, total size) and its subdirectories share the
/// columns below it in proportion to their total size, in name order. The
/// share of files directly in a directory stays blank on the right.
pub fn render_blocks(node: &TreeNode, width: usize, max_depth: usize) -> String {
    if width < 1 {
        return String::new();
    }
    let mut lines = vec!["_".repeat(width)];
    lines.extend(block_lines(node, width, max_depth));
    lines.join("\n")
}

fn block_lines(node: &TreeNode, width: usize, depth_left: usize) -> Vec<String> {
    if width < 1 {
        return Vec::new();
    }
    let mut lines = vec![
        bar(width, &node.name, ' '),
        bar(width, &human_bytes(node.total.allocated), ' '),
        bar(width, &human_bytes(node.total.bytes), '_'),
    ];
    if depth_left == 0 || node.children.is_empty() {
        return lines;
    }

    let mut weights: Vec<u64> = node.children.values().map(|c| c.total.bytes).collect();
    weights.push(node.own.bytes);
    let spans = partition(&weights, width);
    let blocks: Vec<(usize, Vec<String>)> = node
        .children
        .values()
        .zip(&spans)
        .map(|(child, span)| (span.width, block_lines(child, span.width, depth_left - 1)))
        .collect();

    let height = blocks.iter().map(|(_, b)| b.len()).max().unwrap_or(0);
    for i in 0..height {
        let mut line = String::with_capacity(width);
        for (w, block) in &blocks {
            match block.get(i) {
                Some(row) => line.push_str(row),
                None => line.extend(std::iter::repeat(' ').take(*w)),
            }
        }
        lines.push(format!("{:<width$}", line, width = width));
    }
    lines
}

fn size_label(node: &TreeNode) -> String {
    format!(
        "{} ({}):",
        human_bytes(node.total.bytes),
        human_bytes(node.total.allocated)
    )
}

/// One line for `node`, then one per direct child, largest allocated size
/// first. Sizes are right-aligned to a common width.
pub fn render_summary(node: &TreeNode) -> String {
    let mut children: Vec<&TreeNode> = node.children.values().collect();
    children.sort_by(|a, b| b.total.allocated.cmp(&a.total.allocated));

    let wide = children
        .iter()
        .map(|c| size_label(c).chars().count())
        .chain(std::iter::once(size_label(node).chars().count()))
        .max()
        .unwrap_or(0);

    let mut lines = vec![format!("+{:>wide$} {}", size_label(node), node.name, wide = wide)];
    for child in children {
        lines.push("|".to_string());
        lines.push(format!("`-{:>wide$} {}", size_label(child), child.name, wide = wide));
    }
    lines.join("\n")
}

/// Detailed per-node report down to `max_depth` levels below `node`.
pub fn render_dump(node: &TreeNode, max_depth: usize) -> String {
    let mut lines = Vec::new();
    dump_into(node, 0, max_depth, &mut lines);
    lines.join("\n")
}

fn dump_into(node: &TreeNode, level: usize, max_depth: usize, lines: &mut Vec<String>) {
    let indent = "    ".repeat(level);
    lines.push(format!(
        "{indent}{level}: {} files, {} folders, {} ({}) '{}'",
        human_count(node.total.files),
        human_count(node.folders),
        human_bytes(node.total.bytes),
        human_bytes(node.total.allocated),
        node.name,
    ));
    match &node.largest {
        Some(f) => lines.push(format!("{indent}    largest: '{}' ({})", f.name, human_bytes(f.size))),
        None => lines.push(format!("{indent}    largest: none")),
    }
    match &node.oldest {
        Some(f) => lines.push(format!("{indent}    oldest:  '{}' ({})", f.name, format_timestamp(f.timestamp))),
        None => lines.push(format!("{indent}    oldest:  none")),
    }
    if level < max_depth {
        for child in node.children.values() {
            dump_into(child, level + 1, max_depth, lines);
        }
    }
}

fn format_timestamp(ts: f64) -> String {
    DateTime::from_timestamp(ts.floor() as i64, 0)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| format!("{ts}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::SizePolicy;

    fn leaf(name: &str, size: u64) -> TreeNode {
        let mut node = TreeNode::new(name);
        node.add_file(&format!("{name}.bin"), SizePolicy::disabled().file_stats(size), Some(size as f64));
        node.mark_aggregated();
        node
    }

    fn two_children(a: u64, b: u64) -> TreeNode {
        let mut root = TreeNode::new("/r");
        root.add_dir(leaf("a", a));
        root.add_dir(leaf("b", b));
        root.mark_aggregated();
        root
    }

    #[test]
    fn bar_centers_and_clips() {
        assert_eq!(bar(10, "hello", '-'), "[-hello--]");
        assert_eq!(bar(5, "toolong", ' '), "[too]");
        assert_eq!(bar(2, "x", ' '), "[]");
        assert_eq!(bar(1, "x", ' '), "|");
        assert_eq!(bar(0, "x", ' '), "");
    }

    #[test]
    fn odd_padding_side_follows_inner_width() {
        // inner 7, pad 3: extra column on the left
        assert_eq!(bar(9, "abcd", '-'), "[--abcd-]");
        // inner 8, pad 3: extra column on the right
        assert_eq!(bar(10, "abcde", '-'), "[-abcde--]");
        assert_eq!(bar(7, "ab", '_'), "[__ab_]");
    }

    #[test]
    fn blocks_split_proportionally() {
        let out = render_blocks(&two_children(300, 100), 40, 1);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 7);
        assert!(lines.iter().all(|l| l.chars().count() == 40), "{out}");
        assert_eq!(lines[0], "_".repeat(40));
        assert!(lines[1].contains("/r"));
        assert!(lines[3].contains("400 B"));
        // a spans [0, 30), b spans [30, 40)
        assert_eq!(&lines[4][29..31], "][");
        assert!(lines[4][..30].contains('a'));
        assert!(lines[6][..30].contains("300 B"));
        assert!(lines[6][30..].contains("100 B"));
    }

    #[test]
    fn depth_limit_stops_recursion() {
        let out = render_blocks(&two_children(300, 100), 40, 0);
        assert_eq!(out.lines().count(), 4);
    }

    #[test]
    fn zero_width_renders_nothing() {
        assert_eq!(render_blocks(&two_children(1, 1), 0, 3), "");
    }

    #[test]
    fn zero_total_with_children_does_not_divide_by_zero() {
        let mut root = TreeNode::new("/r");
        root.add_dir(TreeNode::new("empty"));
        root.add_dir(TreeNode::new("also-empty"));
        let out = render_blocks(&root, 40, 5);
        assert_eq!(out.lines().count(), 4);
    }

    #[test]
    fn own_files_leave_blank_share() {
        let mut root = TreeNode::new("/r");
        root.add_file("own", SizePolicy::disabled().file_stats(100), None);
        root.add_dir(leaf("a", 300));
        let out = render_blocks(&root, 40, 1);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines.iter().all(|l| l.chars().count() == 40));
        assert_eq!(lines[4][29..], format!("]{}", " ".repeat(10)));
    }

    #[test]
    fn uneven_child_heights_are_padded() {
        let mut a = TreeNode::new("a");
        a.add_dir(leaf("deep", 200));
        let mut root = TreeNode::new("/r");
        root.add_dir(a);
        root.add_dir(leaf("b", 200));
        let out = render_blocks(&root, 40, 5);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 1 + 3 + 6);
        assert!(lines.iter().all(|l| l.chars().count() == 40));
        assert_eq!(&lines[9][20..], " ".repeat(20));
    }

    #[test]
    fn summary_sorts_by_allocated_size() {
        let out = render_summary(&two_children(5, 300));
        assert_eq!(
            out,
            "+305 B (305 B): /r\n|\n`-300 B (300 B): b\n|\n`-    5 B (5 B): a"
        );
    }

    #[test]
    fn dump_lists_extremes() {
        let out = render_dump(&two_children(5, 300), 1);
        assert!(out.starts_with("0: 2 files, 3 folders, 305 B (305 B) '/r'"), "{out}");
        assert!(out.contains("largest: 'b.bin' (300 B)"));
        assert!(out.contains("oldest:  'a.bin'"));
        assert!(out.contains("    1: 1 files, 1 folders, 5 B (5 B) 'a'"));
    }

    #[test]
    fn dump_respects_depth() {
        let out = render_dump(&two_children(5, 300), 0);
        assert_eq!(out.lines().count(), 3);
    }

    #[test]
    fn empty_directory_dump_says_none() {
        let out = render_dump(&TreeNode::new("/e"), 0);
        assert!(out.contains("largest: none"));
        assert!(out.contains("oldest:  none"));
    }
}
