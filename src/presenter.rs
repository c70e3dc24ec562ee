use crate::models::ReportRow;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayLine {
    pub key: String,
    pub clicks: u64,
    pub impressions: u64,
    pub ctr: String,
    pub position: String,
}

impl DisplayLine {
    fn from_row(row: &ReportRow) -> Self {
        Self {
            key: row.key(),
            clicks: row.clicks,
            impressions: row.impressions,
            ctr: format!("{:.2}", row.ctr),
            position: format!("{:.2}", row.position),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayTable {
    NoData,
    Rows {
        lines: Vec<DisplayLine>,
        /// Only reported when a filter was applied.
        mean_position: Option<f64>,
    },
}

/// Maps rows into display lines, keeping server order.
///
/// With a filter, only rows whose key contains it (case-sensitive) are kept
/// and the mean position of the kept rows is reported.
pub fn present(rows: &[ReportRow], filter: Option<&str>) -> DisplayTable {
    let kept: Vec<&ReportRow> = match filter {
        Some(needle) => rows.iter().filter(|row| row.key().contains(needle)).collect(),
        None => rows.iter().collect(),
    };

    if kept.is_empty() {
        return DisplayTable::NoData;
    }

    let mean_position = filter.map(|_| {
        let total: f64 = kept.iter().map(|row| row.position).sum();
        total / kept.len() as f64
    });

    DisplayTable::Rows {
        lines: kept.into_iter().map(DisplayLine::from_row).collect(),
        mean_position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: &str, clicks: u64, impressions: u64, ctr: f64, position: f64) -> ReportRow {
        ReportRow {
            keys: vec![key.to_string()],
            clicks,
            impressions,
            ctr,
            position,
        }
    }

    fn sample() -> Vec<ReportRow> {
        vec![
            row("/a", 5, 100, 0.05, 3.2),
            row("/b", 2, 50, 0.04, 8.1),
        ]
    }

    #[test]
    fn unfiltered_rows_render_two_decimals() {
        let table = present(&sample(), None);
        let DisplayTable::Rows { lines, mean_position } = table else {
            panic!("expected rows");
        };
        assert_eq!(mean_position, None);
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            DisplayLine {
                key: "/a".into(),
                clicks: 5,
                impressions: 100,
                ctr: "0.05".into(),
                position: "3.20".into(),
            }
        );
        assert_eq!(lines[1].key, "/b");
    }

    #[test]
    fn filter_keeps_matching_rows_and_averages_them() {
        let table = present(&sample(), Some("/a"));
        let DisplayTable::Rows { lines, mean_position } = table else {
            panic!("expected rows");
        };
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].key, "/a");
        assert_eq!(mean_position, Some(3.2));
    }

    #[test]
    fn filter_is_case_sensitive_substring() {
        let rows = vec![
            row("https://x.test/Blog/one", 1, 10, 0.1, 2.0),
            row("https://x.test/blog/two", 1, 10, 0.1, 4.0),
            row("https://x.test/blog/three", 1, 10, 0.1, 9.0),
        ];
        let DisplayTable::Rows { lines, mean_position } = present(&rows, Some("/blog/")) else {
            panic!("expected rows");
        };
        let keys: Vec<_> = lines.iter().map(|line| line.key.as_str()).collect();
        assert_eq!(keys, vec!["https://x.test/blog/two", "https://x.test/blog/three"]);
        assert_eq!(mean_position, Some(6.5));
    }

    #[test]
    fn blank_filter_keeps_every_row() {
        let DisplayTable::Rows { lines, mean_position } = present(&sample(), Some("")) else {
            panic!("expected rows");
        };
        assert_eq!(lines.len(), 2);
        let mean = mean_position.unwrap();
        assert!((mean - 5.65).abs() < 1e-9);
    }

    #[test]
    fn no_match_is_no_data() {
        assert_eq!(present(&sample(), Some("/zzz")), DisplayTable::NoData);
        assert_eq!(present(&[], None), DisplayTable::NoData);
    }
}
