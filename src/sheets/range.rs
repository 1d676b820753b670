use std::fmt;

/// Spreadsheet column letter for a zero-based index: 0 -> A, 25 -> Z, 26 -> AA.
pub fn column_letter(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Sheet title as it must appear in A1 notation.
///
/// Titles made of letters, digits and underscores pass through unless they
/// would read as a cell reference (`A1`, `R1C1`). Anything else is
/// single-quoted with embedded quotes doubled.
pub fn quote_title(title: &str) -> String {
    let plain = !title.is_empty()
        && title.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !is_cell_reference(title);
    match plain {
        true => title.to_string(),
        false => format!("'{}'", title.replace('\'', "''")),
    }
}

/// `A1` style (one to three letters then digits) or `R1C1` style.
fn is_cell_reference(text: &str) -> bool {
    let letters = text.chars().take_while(char::is_ascii_alphabetic).count();
    let a1 = (1..=3).contains(&letters) && is_number(&text[letters..]);

    let r1c1 = text
        .strip_prefix(['R', 'r'])
        .and_then(|rest| rest.split_once(['C', 'c']))
        .is_some_and(|(row, column)| is_number(row) && is_number(column));

    a1 || r1c1
}

fn is_number(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

/// A cell address, zero-based internally and rendered one-based (`B3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub column: usize,
    pub row: usize,
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letter(self.column), self.row + 1)
    }
}

/// Rectangular region of a named sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRange {
    pub sheet_title: String,
    pub top_left: CellRef,
    pub bottom_right: CellRef,
}

impl SheetRange {
    /// Range anchored at A1 covering `columns` x `rows` cells.
    pub fn from_origin(sheet_title: &str, columns: usize, rows: usize) -> Self {
        Self {
            sheet_title: sheet_title.to_string(),
            top_left: CellRef { column: 0, row: 0 },
            bottom_right: CellRef {
                column: columns.saturating_sub(1),
                row: rows.saturating_sub(1),
            },
        }
    }
}

impl fmt::Display for SheetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}!{}:{}",
            quote_title(&self.sheet_title),
            self.top_left,
            self.bottom_right
        )
    }
}
