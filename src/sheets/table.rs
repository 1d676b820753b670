use crate::error::Result;
use std::io::{Read, Write};

/// A header row plus data rows. `None` marks a missing cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabularData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl TabularData {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    /// Treat the first raw row as the header.
    ///
    /// The Sheets API drops trailing empty cells, so short rows are padded
    /// back out with empty strings.
    pub fn from_header_row(raw: Vec<Vec<String>>) -> Self {
        let mut raw = raw.into_iter();
        let Some(columns) = raw.next() else {
            return Self::default();
        };

        let rows: Vec<Vec<Option<String>>> = raw
            .map(|row| row.into_iter().map(Some).collect())
            .collect();

        Self::new(columns, rows).filled()
    }

    /// Width of the widest row, header included.
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.columns.len()))
            .max()
            .unwrap_or(0)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Same table with every missing cell replaced by an empty string and every row padded.
    pub fn filled(&self) -> Self {
        let width = self.column_count();
        let pad = |mut row: Vec<Option<String>>| -> Vec<Option<String>> {
            row.resize(width, None);
            row.into_iter()
                .map(|cell| Some(cell.unwrap_or_default()))
                .collect()
        };

        let mut columns = self.columns.clone();
        columns.resize(width, String::new());

        Self {
            columns,
            rows: self.rows.iter().cloned().map(pad).collect(),
        }
    }

    /// Header followed by data rows, as plain strings ready to send.
    pub fn to_values(&self) -> Vec<Vec<String>> {
        let filled = self.filled();
        std::iter::once(filled.columns)
            .chain(
                filled
                    .rows
                    .into_iter()
                    .map(|row| row.into_iter().map(Option::unwrap_or_default).collect()),
            )
            .collect()
    }

    /// Read CSV with the first record as the header. Empty fields become missing cells.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let columns = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(
                record
                    .iter()
                    .map(|field| Some(field.to_string()).filter(|f| !f.is_empty()))
                    .collect(),
            );
        }

        Ok(Self::new(columns, rows))
    }
}

/// Read headerless CSV into raw rows, as used for range updates.
pub fn rows_from_csv<R: Read>(reader: R) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

pub fn write_csv<W: Write>(rows: &[Vec<String>], writer: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_helpers::*;
    use super::*;

    #[test]
    fn test_to_values_fills_missing_cells() {
        let values = mock_table().to_values();

        assert_eq!(
            values,
            vec![
                vec!["Name", "Team", "Score"],
                vec!["Ada", "", "42"],
                vec!["Grace", "Navy", ""],
            ]
        );
    }

    #[test]
    fn test_from_header_row_pads_trimmed_rows() {
        let raw = vec![
            vec!["Name".to_string(), "Team".to_string(), "Score".to_string()],
            vec!["Ada".to_string(), "".to_string(), "42".to_string()],
            vec!["Grace".to_string(), "Navy".to_string()],
        ];

        let table = TabularData::from_header_row(raw);

        assert_eq!(table, mock_table().filled());
    }

    #[test]
    fn test_from_header_row_empty() {
        assert_eq!(TabularData::from_header_row(vec![]), TabularData::default());
    }

    #[test]
    fn test_wide_rows_extend_header() {
        let table = TabularData::new(vec!["A".to_string()], vec![vec![cell("1"), cell("2")]]);

        assert_eq!(table.column_count(), 2);
        assert_eq!(table.to_values()[0], vec!["A", ""]);
    }

    #[test]
    fn test_csv_round_trip() {
        let input = "Name,Team,Score\nAda,,42\nGrace,Navy\n";
        let table = TabularData::from_csv(input.as_bytes()).unwrap();

        assert_eq!(table, mock_table());

        let mut output = Vec::new();
        write_csv(&table.to_values(), &mut output).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Name,Team,Score\nAda,,42\nGrace,Navy,\n"
        );
    }

    #[test]
    fn test_rows_from_csv_keeps_first_row() {
        let rows = rows_from_csv("=SUM(A1:A2),x\n1\n".as_bytes()).unwrap();
        assert_eq!(rows, vec![vec!["=SUM(A1:A2)", "x"], vec!["1"]]);
    }
}
