use serde_json::Value;
use std::io;

use super::{format_cell, headers, result_object, row_field};

/// Write output as CSV to stdout.
///
/// Row sets (schedule entries, dispatched rows) are written one record per
/// row; anything else becomes a two-column `field,value` listing.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    if let Err(e) = write_csv(&mut wtr, value) {
        tracing::error!(error = %e, "CSV output failed");
    }
}

fn write_csv<W: io::Write>(wtr: &mut csv::Writer<W>, value: &Value) -> csv::Result<()> {
    if let Value::Array(rows) = value {
        write_rows(wtr, rows)?;
        return wtr.flush().map_err(csv::Error::from);
    }

    match result_object(value) {
        Some(result) => {
            let payload_rows = result
                .get("result_payload")
                .and_then(Value::as_array)
                .map(|a| a.as_slice());
            if let Some((_, rows)) = row_field(result) {
                write_rows(wtr, rows)?;
            } else if let Some(rows) = payload_rows {
                write_rows(wtr, rows)?;
            } else {
                wtr.write_record(["field", "value"])?;
                for (key, val) in result {
                    wtr.write_record([key.as_str(), &format_cell(val)])?;
                }
            }
        }
        None => wtr.write_record([&format_cell(value)])?,
    }

    wtr.flush().map_err(csv::Error::from)
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) -> csv::Result<()> {
    let headers = headers(rows);
    if headers.is_empty() {
        for item in rows {
            wtr.write_record([&format_cell(item)])?;
        }
        return Ok(());
    }

    wtr.write_record(&headers)?;
    for item in rows {
        let row: Vec<String> = headers
            .iter()
            .map(|h| item.get(h.as_str()).map(format_cell).unwrap_or_default())
            .collect();
        wtr.write_record(&row)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: &Value) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        write_csv(&mut wtr, value).unwrap();
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_schedule_entries_as_rows() {
        let value = json!({
            "result": {
                "level_payment": "50",
                "entries": [
                    { "period_index": 1, "balance_after": "50" },
                    { "period_index": 2, "balance_after": "0" }
                ]
            }
        });
        // serde_json maps iterate in key order
        assert_eq!(render(&value), "balance_after,period_index\n50,1\n0,2\n");
    }

    #[test]
    fn test_scalar_result_as_fields() {
        let value = json!({ "result": { "applied_interest": "10", "applied_principal": "40" } });
        assert_eq!(
            render(&value),
            "field,value\napplied_interest,10\napplied_principal,40\n"
        );
    }

    #[test]
    fn test_dispatched_rows() {
        let value = json!({
            "result": { "state": "dispatched", "result_payload": [{ "id": "L-1" }] }
        });
        assert_eq!(render(&value), "id\nL-1\n");
    }
}
