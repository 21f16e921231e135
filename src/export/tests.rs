#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use super::*;

fn entry(day: u32, category: &str, memo: &str) -> SpendingEntry {
    SpendingEntry::new(
        NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
        category.into(),
        dec!(19.99),
        memo.into(),
    )
}

#[test]
fn test_write_spending_with_header() {
    let a = entry(1, "Food", "groceries");
    let b = entry(2, "Child", "shoes, size 3");
    let mut buf = Vec::new();
    let count = write_spending(&mut buf, &[&a, &b]).unwrap();
    assert_eq!(count, 2);
    let text = String::from_utf8(buf).unwrap();
    assert_eq!(
        text,
        "Date,Category,Amount,Memo\n\
         2024-04-01,Food,19.99,groceries\n\
         2024-04-02,Child,19.99,\"shoes, size 3\"\n"
    );
}

#[test]
fn test_write_spending_empty_still_has_header() {
    let mut buf = Vec::new();
    assert_eq!(write_spending(&mut buf, &[]).unwrap(), 0);
    assert_eq!(String::from_utf8(buf).unwrap(), "Date,Category,Amount,Memo\n");
}

#[test]
fn test_export_spending_creates_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("spending.csv");
    let a = entry(3, "Debt", "");
    assert_eq!(export_spending(&path, &[&a]).unwrap(), 1);

    let mut rdr = csv::Reader::from_path(&path).unwrap();
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][1], "Debt");
    assert_eq!(&rows[0][2], "19.99");
}

#[test]
fn test_default_export_path_names_range() {
    let range = DateRange::new(NaiveDate::from_ymd_opt(2024, 4, 1), None);
    let path = default_export_path(&range);
    assert!(path
        .to_string_lossy()
        .ends_with("stewardtui-spending-20240401-all.csv"));
}

#[test]
fn test_shellexpand_only_touches_home_prefix() {
    assert_eq!(shellexpand("/tmp/x.csv"), PathBuf::from("/tmp/x.csv"));
    assert_eq!(shellexpand("rel/x.csv"), PathBuf::from("rel/x.csv"));
    assert!(!shellexpand("~/x.csv").to_string_lossy().starts_with('~'));
}
