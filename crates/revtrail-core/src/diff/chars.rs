//! Character-level diff.
//!
//! Myers' O(ND) algorithm over Unicode scalar values, in linear space: each
//! level finds the middle snake of the edit graph and recurses on both
//! halves. Within each changed run deletions are emitted before insertions,
//! and adjacent spans of the same kind are merged, so `"Bob" -> "Bill"`
//! yields `= "B"`, `- "ob"`, `+ "ill"`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanOp {
    Equal,
    Insert,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSpan {
    pub op: SpanOp,
    pub text: String,
}

impl DiffSpan {
    pub fn new(op: SpanOp, text: impl Into<String>) -> Self {
        Self {
            op,
            text: text.into(),
        }
    }
}

/// Diff `old` against `new`
pub fn diff_chars(old: &str, new: &str) -> Vec<DiffSpan> {
    let a: Vec<char> = old.chars().collect();
    let b: Vec<char> = new.chars().collect();

    let mut script = Script::default();
    edit_script(&a, &b, &mut script);
    script.finish()
}

/// Accumulates edits, holding back each changed run until it is closed so
/// deletions can be placed ahead of insertions.
#[derive(Default)]
struct Script {
    spans: Vec<DiffSpan>,
    deleted: String,
    inserted: String,
}

impl Script {
    fn equal(&mut self, chars: &[char]) {
        if chars.is_empty() {
            return;
        }
        self.flush();
        push(&mut self.spans, SpanOp::Equal, chars.iter().collect());
    }

    fn delete(&mut self, chars: &[char]) {
        self.deleted.extend(chars);
    }

    fn insert(&mut self, chars: &[char]) {
        self.inserted.extend(chars);
    }

    fn flush(&mut self) {
        let deleted = std::mem::take(&mut self.deleted);
        let inserted = std::mem::take(&mut self.inserted);
        push(&mut self.spans, SpanOp::Delete, deleted);
        push(&mut self.spans, SpanOp::Insert, inserted);
    }

    fn finish(mut self) -> Vec<DiffSpan> {
        self.flush();
        self.spans
    }
}

fn push(spans: &mut Vec<DiffSpan>, op: SpanOp, text: String) {
    if text.is_empty() {
        return;
    }
    match spans.last_mut() {
        Some(last) if last.op == op => last.text.push_str(&text),
        _ => spans.push(DiffSpan::new(op, text)),
    }
}

fn edit_script(a: &[char], b: &[char], script: &mut Script) {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();

    script.equal(&a[..prefix]);
    let (a_mid, b_mid) = (&a[prefix..a.len() - suffix], &b[prefix..b.len() - suffix]);

    if a_mid.is_empty() || b_mid.is_empty() {
        script.delete(a_mid);
        script.insert(b_mid);
    } else {
        match middle_snake(a_mid, b_mid) {
            Some((x, y)) if (x, y) != (0, 0) && (x, y) != (a_mid.len(), b_mid.len()) => {
                edit_script(&a_mid[..x], &b_mid[..y], script);
                edit_script(&a_mid[x..], &b_mid[y..], script);
            }
            _ => {
                script.delete(a_mid);
                script.insert(b_mid);
            }
        }
    }

    script.equal(&a[a.len() - suffix..]);
}

/// Split point where the forward and reverse searches meet, or `None` when
/// the inputs share no characters
fn middle_snake(a: &[char], b: &[char]) -> Option<(usize, usize)> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max_d = (n + m + 1) / 2;
    let offset = max_d;
    let width = 2 * max_d + 2;
    // furthest x reached on each diagonal k, indexed by offset + k; -1 is unreached
    let mut forward = vec![-1isize; width as usize];
    let mut reverse = vec![-1isize; width as usize];
    forward[(offset + 1) as usize] = 0;
    reverse[(offset + 1) as usize] = 0;

    let delta = n - m;
    let front = delta % 2 != 0;
    let (mut k1_start, mut k1_end, mut k2_start, mut k2_end) = (0, 0, 0, 0);

    for d in 0..max_d {
        let mut k1 = -d + k1_start;
        while k1 <= d - k1_end {
            let k1_index = (offset + k1) as usize;
            let mut x1 = if k1 == -d
                || (k1 != d && forward[k1_index - 1] < forward[k1_index + 1])
            {
                forward[k1_index + 1]
            } else {
                forward[k1_index - 1] + 1
            };
            let mut y1 = x1 - k1;
            while x1 < n && y1 < m && a[x1 as usize] == b[y1 as usize] {
                x1 += 1;
                y1 += 1;
            }
            forward[k1_index] = x1;

            if x1 > n {
                k1_end += 2;
            } else if y1 > m {
                k1_start += 2;
            } else if front {
                let k2_index = offset + delta - k1;
                if (0..width).contains(&k2_index) && reverse[k2_index as usize] != -1 {
                    let x2 = n - reverse[k2_index as usize];
                    if x1 >= x2 {
                        return Some((x1 as usize, y1 as usize));
                    }
                }
            }
            k1 += 2;
        }

        let mut k2 = -d + k2_start;
        while k2 <= d - k2_end {
            let k2_index = (offset + k2) as usize;
            let mut x2 = if k2 == -d
                || (k2 != d && reverse[k2_index - 1] < reverse[k2_index + 1])
            {
                reverse[k2_index + 1]
            } else {
                reverse[k2_index - 1] + 1
            };
            let mut y2 = x2 - k2;
            while x2 < n && y2 < m && a[(n - x2 - 1) as usize] == b[(m - y2 - 1) as usize] {
                x2 += 1;
                y2 += 1;
            }
            reverse[k2_index] = x2;

            if x2 > n {
                k2_end += 2;
            } else if y2 > m {
                k2_start += 2;
            } else if !front {
                let k1_index = offset + delta - k2;
                if (0..width).contains(&k1_index) && forward[k1_index as usize] != -1 {
                    let x1 = forward[k1_index as usize];
                    let y1 = offset + x1 - k1_index;
                    if x1 >= n - x2 {
                        return Some((x1 as usize, y1 as usize));
                    }
                }
            }
            k2 += 2;
        }
    }
    None
}

/// Text on the old side: equal and deleted spans
pub fn old_text(spans: &[DiffSpan]) -> String {
    spans
        .iter()
        .filter(|s| s.op != SpanOp::Insert)
        .map(|s| s.text.as_str())
        .collect()
}

/// Text on the new side: equal and inserted spans
pub fn new_text(spans: &[DiffSpan]) -> String {
    spans
        .iter()
        .filter(|s| s.op != SpanOp::Delete)
        .map(|s| s.text.as_str())
        .collect()
}
