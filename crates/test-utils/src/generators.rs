//! Test data generators for drainage grids and value patterns.
//!
//! All generators return values in file order: rows of constant `y`, with
//! `x` varying fastest.

/// Creates a grid where each cell holds `x + 10 * y`.
///
/// ```
/// use test_utils::create_index_pattern;
///
/// let grid = create_index_pattern(2, 3);
/// assert_eq!(grid, vec![0.0, 1.0, 10.0, 11.0, 20.0, 21.0]);
/// ```
pub fn create_index_pattern(nx: usize, ny: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(nx * ny);
    for y in 0..ny {
        for x in 0..nx {
            data.push((x + 10 * y) as f64);
        }
    }
    data
}

/// Creates ranks `1..=nx*ny` numbered in file order.
pub fn create_row_major_ranks(nx: usize, ny: usize) -> Vec<f64> {
    (1..=nx * ny).map(|r| r as f64).collect()
}

/// Creates a `Next` array for row-major ranks where every cell drains
/// directly to the last rank, which is the only outlet.
pub fn create_single_outlet_next(nx: usize, ny: usize) -> Vec<f64> {
    let n = nx * ny;
    (1..=n)
        .map(|r| if r == n { 0.0 } else { n as f64 })
        .collect()
}

/// Creates ranks and `Next` for `columns` independent chains, one per
/// column of an `columns x length` grid.
///
/// Each column drains toward `y = 0`; the cell at `y = 0` is the outlet.
/// Ranks are assigned column by column from the top of each chain so that
/// every rank drains to a higher one.
pub fn create_column_chains(columns: usize, length: usize) -> (Vec<f64>, Vec<f64>) {
    let mut rank = vec![0.0; columns * length];
    let mut next = vec![0.0; columns * length];
    let mut r = 1usize;
    for x in 0..columns {
        for y in (0..length).rev() {
            rank[y * columns + x] = r as f64;
            next[y * columns + x] = if y == 0 { 0.0 } else { (r + 1) as f64 };
            r += 1;
        }
    }
    (rank, next)
}

/// Formats values as an r2c block, one line per row.
pub fn format_block(values: &[f64], nx: usize) -> String {
    let mut out = String::new();
    for row in values.chunks(nx.max(1)) {
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_outlet_next() {
        let next = create_single_outlet_next(3, 3);
        assert_eq!(next[0], 9.0);
        assert_eq!(next[8], 0.0);
        assert_eq!(next.iter().filter(|&&v| v == 0.0).count(), 1);
    }

    #[test]
    fn test_column_chains() {
        let (rank, next) = create_column_chains(2, 3);
        // Column 0: y=2 -> rank 1, y=1 -> rank 2, y=0 -> rank 3 (outlet)
        assert_eq!(rank[2 * 2], 1.0);
        assert_eq!(next[2 * 2], 2.0);
        assert_eq!(rank[0], 3.0);
        assert_eq!(next[0], 0.0);
        // Column 1 starts at rank 4
        assert_eq!(rank[2 * 2 + 1], 4.0);
        assert_eq!(rank[1], 6.0);
        assert_eq!(next[1], 0.0);
    }

    #[test]
    fn test_format_block() {
        assert_eq!(format_block(&[1.0, 2.5, 3.0, 4.0], 2), "1 2.5\n3 4\n");
    }
}
