//! Clear command: user-initiated reset of one day's buckets.

use anyhow::Result;
use chrono::NaiveDate;

use dw_db::BucketStore;

pub fn run(store: &mut BucketStore, day: NaiveDate) -> Result<()> {
    let removed = store.clear_day(day)?;
    println!("removed {removed} domain(s) for {day}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use dw_core::Category;

    use super::*;

    #[test]
    fn clear_removes_only_the_given_day() {
        let mut store = BucketStore::open_in_memory().unwrap();
        let monday = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
        store.merge_add(monday, "a.com", 100, Category::Neutral).unwrap();
        store.merge_add(tuesday, "a.com", 200, Category::Neutral).unwrap();

        run(&mut store, monday).unwrap();

        assert!(store.read_day(monday).unwrap().is_empty());
        assert_eq!(store.read_day(tuesday).unwrap().len(), 1);
    }
}
