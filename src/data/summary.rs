use super::model::{CellValue, Column, ColumnKind};

/// Aggregate statistics of one numeric column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSummary {
    pub sum: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl ColumnSummary {
    /// Summarise the non-missing values of a numeric column.
    pub fn of(column: &Column) -> Option<Self> {
        if column.kind != ColumnKind::Numeric {
            return None;
        }
        let values: Vec<f64> = column.values.iter().filter_map(CellValue::as_f64).collect();
        if values.is_empty() {
            return None;
        }
        let sum: f64 = values.iter().sum();
        let (min, max) = column.numeric_bounds()?;
        Some(ColumnSummary {
            sum,
            mean: sum / values.len() as f64,
            min,
            max,
        })
    }

    /// Labelled figures, formatted for display.
    pub fn metrics(&self) -> [(&'static str, String); 4] {
        [
            ("Sum", format_amount(self.sum)),
            ("Mean", format_amount(self.mean)),
            ("Min", format_amount(self.min)),
            ("Max", format_amount(self.max)),
        ]
    }
}

/// Two decimals with comma thousands separators: `1234567.891` → `1,234,567.89`.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // -0.001 rounds to "0.00" and should not keep its sign
    let sign = if value < 0.0 && fixed.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sales_scenario() {
        let col = Column::new(
            "sales",
            vec![CellValue::Integer(10), CellValue::Integer(20), CellValue::Integer(30)],
        );
        let summary = ColumnSummary::of(&col).unwrap();
        let shown: Vec<String> = summary.metrics().into_iter().map(|(_, v)| v).collect();
        assert_eq!(shown, vec!["60.00", "20.00", "10.00", "30.00"]);
    }

    #[test]
    fn missing_values_are_skipped() {
        let col = Column::new(
            "v",
            vec![CellValue::Float(1.5), CellValue::Null, CellValue::Float(2.5)],
        );
        let summary = ColumnSummary::of(&col).unwrap();
        assert_eq!(summary.mean, 2.0);
        assert_eq!(summary.sum, 4.0);
    }

    #[test]
    fn non_numeric_columns_have_no_summary() {
        let col = Column::new("region", vec![CellValue::Text("west".into())]);
        assert_eq!(ColumnSummary::of(&col), None);
    }

    #[test]
    fn amounts_get_thousands_separators() {
        assert_eq!(format_amount(1_234_567.891), "1,234,567.89");
        assert_eq!(format_amount(999.999), "1,000.00");
        assert_eq!(format_amount(-1234.5), "-1,234.50");
        assert_eq!(format_amount(100.0), "100.00");
        assert_eq!(format_amount(-0.001), "0.00");
        assert_eq!(format_amount(0.0), "0.00");
    }
}
