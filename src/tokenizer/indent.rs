/// Columns occupied by one tab.
pub const TAB_WIDTH: usize = 4;

/// Smallest width accepted for an action line directly under `trigger:`.
pub const ACTION_WIDTH: usize = TAB_WIDTH;

/// Indentation width of `line` in columns.
pub fn width(line: &str) -> usize {
    line.chars()
        .map_while(|c| match c {
            '\t' => Some(TAB_WIDTH),
            ' ' => Some(1),
            _ => None,
        })
        .sum()
}
