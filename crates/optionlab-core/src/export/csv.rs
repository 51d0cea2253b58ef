use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::str::FromStr;

use crate::error::OptionLabError;
use crate::simulation::simulator::PlResult;
use crate::types::*;
use crate::OptionLabResult;

pub const CSV_HEADER: [&str; 7] = ["Price", "P/L", "P/L%", "Delta", "Gamma", "Theta", "Vega"];

/// One exported grid row. `pl_percent` is empty in the file when the net
/// premium was zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvRow {
    pub price: Money,
    pub pl: Money,
    pub pl_percent: Option<Decimal>,
    pub delta: Decimal,
    pub gamma: Decimal,
    pub theta: Decimal,
    pub vega: Decimal,
}

/// Figures re-derived from exported rows alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvSummary {
    pub rows: usize,
    pub max_pl: Option<Money>,
    pub max_pl_price: Option<Money>,
    pub min_pl: Option<Money>,
    pub min_pl_price: Option<Money>,
    /// Zero crossings between adjacent rows, linearly interpolated.
    pub breakevens: Vec<Money>,
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Write the price grid of `result`. Values use Decimal's exact text form.
pub fn write_csv<W: Write>(result: &PlResult, writer: W) -> OptionLabResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_HEADER)?;
    for point in &result.price_grid {
        wtr.write_record([
            point.price.to_string(),
            point.pl.to_string(),
            point.pl_percent.map(|p| p.to_string()).unwrap_or_default(),
            point.greeks.delta.to_string(),
            point.greeks.gamma.to_string(),
            point.greeks.theta.to_string(),
            point.greeks.vega.to_string(),
        ])?;
    }
    wtr.flush()
        .map_err(|e| OptionLabError::CsvError(e.to_string()))?;
    Ok(())
}

pub fn to_csv_string(result: &PlResult) -> OptionLabResult<String> {
    let mut buf = Vec::new();
    write_csv(result, &mut buf)?;
    String::from_utf8(buf).map_err(|e| OptionLabError::CsvError(e.to_string()))
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

fn parse_decimal(raw: &str, column: &str, line: usize) -> OptionLabResult<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| OptionLabError::CsvError(format!("line {line}: invalid {column} value '{raw}'")))
}

/// Parse a file produced by [`write_csv`]. The header must match exactly.
pub fn parse_csv(text: &str) -> OptionLabResult<Vec<CsvRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = rdr.headers()?.clone();
    if headers.iter().ne(CSV_HEADER.iter().copied()) {
        return Err(OptionLabError::CsvError(format!(
            "unexpected header '{}', expected '{}'",
            headers.iter().collect::<Vec<_>>().join(","),
            CSV_HEADER.join(",")
        )));
    }

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let line = i + 2;
        if record.len() != CSV_HEADER.len() {
            return Err(OptionLabError::CsvError(format!(
                "line {line}: expected {} fields, found {}",
                CSV_HEADER.len(),
                record.len()
            )));
        }
        let field = |idx: usize| parse_decimal(&record[idx], CSV_HEADER[idx], line);
        let pl_percent = if record[2].is_empty() {
            None
        } else {
            Some(field(2)?)
        };
        rows.push(CsvRow {
            price: field(0)?,
            pl: field(1)?,
            pl_percent,
            delta: field(3)?,
            gamma: field(4)?,
            theta: field(5)?,
            vega: field(6)?,
        });
    }
    Ok(rows)
}

/// Max/min P/L and sign-change breakevens of exported rows, which are
/// expected in ascending price order.
pub fn summarize_rows(rows: &[CsvRow]) -> CsvSummary {
    let max = rows.iter().max_by(|a, b| a.pl.cmp(&b.pl));
    let min = rows.iter().min_by(|a, b| a.pl.cmp(&b.pl));

    let mut breakevens = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        if row.pl.is_zero() {
            let left_flat = i > 0 && rows[i - 1].pl.is_zero();
            let right_flat = rows.get(i + 1).is_some_and(|r| r.pl.is_zero());
            if !left_flat && !right_flat {
                breakevens.push(row.price);
            }
        }
        if let Some(next) = rows.get(i + 1) {
            let crosses = (row.pl < Decimal::ZERO && next.pl > Decimal::ZERO)
                || (row.pl > Decimal::ZERO && next.pl < Decimal::ZERO);
            if crosses {
                let root = row.price - row.pl * (next.price - row.price) / (next.pl - row.pl);
                breakevens.push(root.normalize());
            }
        }
    }

    CsvSummary {
        rows: rows.len(),
        max_pl: max.map(|r| r.pl),
        max_pl_price: max.map(|r| r.price),
        min_pl: min.map(|r| r.pl),
        min_pl_price: min.map(|r| r.price),
        breakevens,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
