//! The record store: loads the binary WDBC form or the CSV textual form
//! into one in-memory shape and offers typed column-indexed reads.
//!
//! Reads are total: any out-of-range row or column yields a zero value
//! rather than an error, so schema drift between game versions degrades
//! into zeros instead of failures mid-frame.

use std::{
    cell::RefCell,
    collections::HashMap,
    str,
};
use anyhow::{Result, bail, ensure};


const WDBC_MAGIC: &[u8; 4] = b"WDBC";

/// One loaded table: header, dense record blob, string pool.
///
/// Records are never mutated after load. The id index used by
/// [`DbcTable::find_record_by_id`] is built lazily on first use.
#[derive(Debug)]
pub struct DbcTable {
    record_count: u32,
    field_count: u32,
    record_size: u32,
    records: Vec<u8>,
    string_pool: Vec<u8>,
    id_index: RefCell<Option<HashMap<u32, u32>>>,
}

impl DbcTable {
    /// Load from either the binary WDBC form or the `#`-headed CSV form.
    pub fn load(bytes: &[u8]) -> Result<Self> {
        if bytes.starts_with(WDBC_MAGIC) {
            Self::load_binary(bytes)
        } else if bytes.first() == Some(&b'#') {
            Self::load_csv(bytes)
        } else {
            bail!("dbc: neither WDBC magic nor csv header");
        }
    }

    fn load_binary(bytes: &[u8]) -> Result<Self> {
        ensure!(bytes.len() >= 20, "dbc: truncated header");
        let word = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        let record_count = word(4);
        let field_count = word(8);
        let record_size = word(12);
        let string_size = word(16);

        let field_bytes = field_count
            .checked_mul(4)
            .ok_or_else(|| anyhow::anyhow!("dbc: absurd field count {}", field_count))?;
        ensure!(
            field_bytes <= record_size,
            "dbc: field count {} inconsistent with record size {}",
            field_count, record_size,
        );
        let records_len = record_count as usize * record_size as usize;
        ensure!(
            20 + records_len + string_size as usize <= bytes.len(),
            "dbc: body shorter than header claims",
        );

        let records = bytes[20..20 + records_len].to_vec();
        let string_pool = bytes[20 + records_len..20 + records_len + string_size as usize].to_vec();
        if string_pool.first().map(|&b| b != 0).unwrap_or(false) {
            warn!("dbc: string pool does not start with nul");
        }

        Ok(DbcTable {
            record_count,
            field_count,
            record_size,
            records,
            string_pool,
            id_index: RefCell::new(None),
        })
    }

    /// Reconstitute the CSV textual form into the same record blob and
    /// string pool shape as the binary form, so readers share one path.
    ///
    /// The first line is `# fields=N strings=i,j,...`; string columns are
    /// double-quoted with `""`-escaped quotes, all others are base-10
    /// uint32.
    fn load_csv(bytes: &[u8]) -> Result<Self> {
        let text = str::from_utf8(bytes)?;
        let mut lines = text.lines();
        let header = lines.next().unwrap_or("");
        let (field_count, string_cols) = parse_csv_header(header)?;

        let mut records = Vec::new();
        let mut string_pool = vec![0u8];
        let mut interned: HashMap<String, u32> = HashMap::new();
        let mut record_count = 0u32;

        for line in lines {
            if line.is_empty() {
                continue;
            }
            let cells = split_csv_line(line);
            ensure!(
                cells.len() == field_count as usize,
                "dbc csv: row has {} cells, layout says {}",
                cells.len(), field_count,
            );
            for (col, cell) in cells.into_iter().enumerate() {
                let value = if string_cols.contains(&(col as u32)) {
                    let s = unquote_csv_cell(&cell)?;
                    *interned.entry(s.clone()).or_insert_with(|| {
                        let at = string_pool.len() as u32;
                        string_pool.extend_from_slice(s.as_bytes());
                        string_pool.push(0);
                        at
                    })
                } else {
                    cell.parse::<u32>()
                        .map_err(|_| anyhow::anyhow!("dbc csv: bad uint cell {:?}", cell))?
                };
                records.extend_from_slice(&value.to_le_bytes());
            }
            record_count += 1;
        }

        Ok(DbcTable {
            record_count,
            field_count,
            record_size: field_count * 4,
            records,
            string_pool,
            id_index: RefCell::new(None),
        })
    }

    pub fn record_count(&self) -> u32 {
        self.record_count
    }

    pub fn field_count(&self) -> u32 {
        self.field_count
    }

    /// Raw 32-bit read. Returns 0 out of range.
    pub fn get_u32(&self, row: u32, col: u32) -> u32 {
        if row >= self.record_count || col >= self.field_count {
            return 0;
        }
        let at = row as usize * self.record_size as usize + col as usize * 4;
        u32::from_le_bytes([
            self.records[at],
            self.records[at + 1],
            self.records[at + 2],
            self.records[at + 3],
        ])
    }

    pub fn get_i32(&self, row: u32, col: u32) -> i32 {
        self.get_u32(row, col) as i32
    }

    /// Bit reinterpretation, not a numeric cast.
    pub fn get_f32(&self, row: u32, col: u32) -> f32 {
        f32::from_bits(self.get_u32(row, col))
    }

    /// Treats the column as a string-pool offset. Returns "" out of range
    /// or on a malformed offset.
    pub fn get_string(&self, row: u32, col: u32) -> &str {
        let at = self.get_u32(row, col) as usize;
        if at >= self.string_pool.len() {
            return "";
        }
        let tail = &self.string_pool[at..];
        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        str::from_utf8(&tail[..end]).unwrap_or("")
    }

    /// Row whose column 0 equals `id`. The index over column 0 is built on
    /// first call.
    pub fn find_record_by_id(&self, id: u32) -> Option<u32> {
        let mut index = self.id_index.borrow_mut();
        let index = index.get_or_insert_with(|| {
            (0..self.record_count)
                .map(|row| (self.get_u32(row, 0), row))
                .collect()
        });
        index.get(&id).copied()
    }
}

fn parse_csv_header(header: &str) -> Result<(u32, Vec<u32>)> {
    ensure!(header.starts_with('#'), "dbc csv: missing # header line");
    let mut field_count = None;
    let mut string_cols = Vec::new();
    for part in header.trim_start_matches('#').split_whitespace() {
        if let Some(n) = part.strip_prefix("fields=") {
            field_count = Some(n.parse::<u32>()?);
        } else if let Some(list) = part.strip_prefix("strings=") {
            if !list.is_empty() {
                for idx in list.split(',') {
                    string_cols.push(idx.parse::<u32>()?);
                }
            }
        }
    }
    let field_count = field_count
        .ok_or_else(|| anyhow::anyhow!("dbc csv: header missing fields="))?;
    Ok((field_count, string_cols))
}

/// Split one CSV row on commas outside quotes.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                cell.push('"');
                cell.push('"');
                chars.next();
            }
            '"' => {
                cell.push('"');
                in_quotes = !in_quotes;
            }
            ',' if !in_quotes => cells.push(std::mem::take(&mut cell)),
            c => cell.push(c),
        }
    }
    cells.push(cell);
    cells
}

fn unquote_csv_cell(cell: &str) -> Result<String> {
    ensure!(
        cell.len() >= 2 && cell.starts_with('"') && cell.ends_with('"'),
        "dbc csv: string cell {:?} not quoted", cell,
    );
    Ok(cell[1..cell.len() - 1].replace("\"\"", "\""))
}


#[cfg(test)]
mod tests {
    use super::*;

    /// Assemble a WDBC blob: each record is a row of u32 cells, strings
    /// already interned by the caller.
    fn wdbc(rows: &[&[u32]], pool: &[u8]) -> Vec<u8> {
        let field_count = rows.first().map(|r| r.len()).unwrap_or(0) as u32;
        let mut buf = Vec::new();
        buf.extend_from_slice(WDBC_MAGIC);
        buf.extend_from_slice(&(rows.len() as u32).to_le_bytes());
        buf.extend_from_slice(&field_count.to_le_bytes());
        buf.extend_from_slice(&(field_count * 4).to_le_bytes());
        buf.extend_from_slice(&(pool.len() as u32).to_le_bytes());
        for row in rows {
            for &cell in *row {
                buf.extend_from_slice(&cell.to_le_bytes());
            }
        }
        buf.extend_from_slice(pool);
        buf
    }

    #[test]
    fn binary_round_trip_reads() {
        let pool = b"\0first\0second\0";
        let table = DbcTable::load(&wdbc(
            &[&[1, 100, 1], &[2, 200, 7]],
            pool,
        )).unwrap();
        assert_eq!(table.record_count(), 2);
        assert_eq!(table.get_u32(0, 1), 100);
        assert_eq!(table.get_u32(1, 1), 200);
        assert_eq!(table.get_string(0, 2), "first");
        assert_eq!(table.get_string(1, 2), "second");
    }

    #[test]
    fn out_of_range_reads_are_zero() {
        let table = DbcTable::load(&wdbc(&[&[5, 6]], b"\0")).unwrap();
        assert_eq!(table.get_u32(1, 0), 0);
        assert_eq!(table.get_u32(0, 2), 0);
        assert_eq!(table.get_u32(99, 99), 0);
        assert_eq!(table.get_string(0, 99), "");
        assert_eq!(table.get_f32(9, 9), 0.0);
    }

    #[test]
    fn float_read_is_reinterpretation() {
        let bits = 1.5f32.to_bits();
        let table = DbcTable::load(&wdbc(&[&[bits]], b"\0")).unwrap();
        assert_eq!(table.get_f32(0, 0), 1.5);
    }

    #[test]
    fn find_by_id_uses_column_zero() {
        let table = DbcTable::load(&wdbc(
            &[&[10, 0], &[20, 0], &[30, 0]],
            b"\0",
        )).unwrap();
        assert_eq!(table.find_record_by_id(20), Some(1));
        assert_eq!(table.find_record_by_id(30), Some(2));
        assert_eq!(table.find_record_by_id(40), None);
    }

    #[test]
    fn csv_reconstitutes_like_binary() {
        let text = "# fields=3 strings=2\n1,10,\"Hogger\"\n2,20,\"Says \"\"hi\"\"\"\n";
        let table = DbcTable::load(text.as_bytes()).unwrap();
        assert_eq!(table.record_count(), 2);
        assert_eq!(table.field_count(), 3);
        assert_eq!(table.get_u32(0, 1), 10);
        assert_eq!(table.get_string(0, 2), "Hogger");
        assert_eq!(table.get_string(1, 2), "Says \"hi\"");
        assert_eq!(table.find_record_by_id(2), Some(1));
    }

    #[test]
    fn csv_interns_repeated_strings() {
        let text = "# fields=2 strings=1\n1,\"same\"\n2,\"same\"\n";
        let table = DbcTable::load(text.as_bytes()).unwrap();
        assert_eq!(table.get_u32(0, 1), table.get_u32(1, 1));
    }

    #[test]
    fn rejects_garbage() {
        assert!(DbcTable::load(b"MPQ\x1a....").is_err());
        assert!(DbcTable::load(b"WDBC").is_err());
    }
}
