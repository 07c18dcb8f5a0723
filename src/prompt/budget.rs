//! Fitting per-file diff blocks into a character budget.

/// Content lines every kept file retains, budget permitting or not.
pub const MIN_CONTEXT_LINES: usize = 3;

/// What was cut to fit the budget.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TruncationReport {
    /// Files whose hunks were shortened, in diff order.
    pub truncated_files: Vec<String>,
    /// Files left out entirely, in diff order.
    pub dropped_files: Vec<String>,
    /// Characters before truncation.
    pub original_length: usize,
    /// Characters after truncation.
    pub rendered_length: usize,
}

/// One file's header line plus its (already sanitised) content lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlock {
    pub path: String,
    pub header: String,
    pub lines: Vec<String>,
    /// Additions plus deletions; decides priority and budget share.
    pub changed_lines: usize,
}

impl FileBlock {
    fn min_keep(&self) -> usize {
        self.lines.len().min(MIN_CONTEXT_LINES)
    }

    /// Rendered length when keeping the first `keep` lines.
    fn cost(&self, keep: usize) -> usize {
        let body: usize = self.lines[..keep].iter().map(|l| char_len(l) + 1).sum();
        char_len(&self.header) + body + marker_cost(self.lines.len() - keep)
    }

    fn render(&self, keep: usize) -> String {
        let mut out = self.header.clone();
        for line in &self.lines[..keep] {
            out.push('\n');
            out.push_str(line);
        }
        let omitted = self.lines.len() - keep;
        if omitted > 0 {
            out.push('\n');
            out.push_str(&marker(omitted));
        }
        out
    }
}

fn marker(omitted: usize) -> String {
    format!("... [{} more lines truncated]", omitted)
}

fn marker_cost(omitted: usize) -> usize {
    if omitted == 0 { 0 } else { char_len(&marker(omitted)) + 1 }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Join blocks, truncating them to fit `max_len` characters when needed.
///
/// Lowest-priority files (fewest changed lines, later position on ties)
/// are dropped until the minimum rendering of the rest fits; at least one
/// file is always kept, even if it alone exceeds the budget. The spare
/// budget is shared between kept files by their share of changed lines.
pub fn fit_blocks(blocks: &[FileBlock], max_len: usize) -> (String, Option<TruncationReport>) {
    let full = blocks
        .iter()
        .map(|b| b.render(b.lines.len()))
        .collect::<Vec<_>>()
        .join("\n");
    let original_length = char_len(&full);
    if original_length <= max_len {
        return (full, None);
    }

    let mut priority: Vec<usize> = (0..blocks.len()).collect();
    priority.sort_by(|&a, &b| {
        blocks[b]
            .changed_lines
            .cmp(&blocks[a].changed_lines)
            .then(a.cmp(&b))
    });

    let min_total = |kept: &[usize]| -> usize {
        kept.iter()
            .map(|&i| blocks[i].cost(blocks[i].min_keep()))
            .sum::<usize>()
            + kept.len().saturating_sub(1)
    };

    let mut kept = priority;
    let mut dropped = Vec::new();
    while kept.len() > 1 && min_total(&kept) > max_len {
        if let Some(last) = kept.pop() {
            dropped.push(last);
        }
    }

    let spare = max_len.saturating_sub(min_total(&kept));
    let total_changed: usize = kept.iter().map(|&i| blocks[i].changed_lines).sum();

    let mut keep_counts: Vec<Option<usize>> = vec![None; blocks.len()];
    for &i in &kept {
        let block = &blocks[i];
        let share = if total_changed == 0 {
            spare / kept.len()
        } else {
            spare * block.changed_lines / total_changed
        };

        let min_keep = block.min_keep();
        let header_cost = char_len(&block.header);
        let allowance = block.cost(min_keep) + share;
        let mut body_cost: usize = block.lines[..min_keep].iter().map(|l| char_len(l) + 1).sum();
        let mut keep = min_keep;
        while keep < block.lines.len() {
            let next_body = body_cost + char_len(&block.lines[keep]) + 1;
            let next_cost = header_cost + next_body + marker_cost(block.lines.len() - keep - 1);
            if next_cost > allowance {
                break;
            }
            body_cost = next_body;
            keep += 1;
        }
        keep_counts[i] = Some(keep);
    }

    let mut truncated_files = Vec::new();
    let mut rendered_blocks = Vec::new();
    for (block, keep) in blocks.iter().zip(&keep_counts) {
        if let Some(keep) = *keep {
            if keep < block.lines.len() {
                truncated_files.push(block.path.clone());
            }
            rendered_blocks.push(block.render(keep));
        }
    }
    let rendered = rendered_blocks.join("\n");

    dropped.sort_unstable();
    let report = TruncationReport {
        truncated_files,
        dropped_files: dropped.into_iter().map(|i| blocks[i].path.clone()).collect(),
        original_length,
        rendered_length: char_len(&rendered),
    };
    (rendered, Some(report))
}
