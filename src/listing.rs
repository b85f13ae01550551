//! LIST line formatting.
//!
//! Reproduces the original's fixed-width `printf`-style directory
//! listing line, one entry per line, CRLF-terminated: a permission string,
//! a hardcoded `root root` owner/group, a 7-wide right-aligned size
//! field, a three-letter month abbreviation, day, year, and name.

use crate::fs::{DirEntry, EntryKind};
use std::time::SystemTime;

const MONTHS: [&str; 12] =
    ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

/// Renders one `LIST` line for `entry`, not including the trailing CRLF
/// (the caller appends that when writing to the data socket).
pub fn format_entry(entry: &DirEntry) -> String {
    let is_dir = entry.kind == EntryKind::Directory;
    let dir_flag = if is_dir { 'd' } else { '-' };
    // The original never clears the readonly attribute bit it reads from
    // the host, so every entry this port produces is writable.
    let perms = format!("{dir_flag}rw-rw-rw-");
    let (month, day, year) = split_mtime(entry.mtime);

    format!(
        "{perms}   1 root  root    {size:>7} {month} {day}  {year} {name}",
        perms = perms,
        size = entry.size,
        month = month,
        day = day,
        year = year,
        name = entry.name,
    )
}

fn split_mtime(mtime: SystemTime) -> (&'static str, u32, i32) {
    let secs = mtime
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    let (year, month, day) = civil_from_unix_days(secs.div_euclid(86_400));
    (MONTHS[(month - 1) as usize], day as u32, year)
}

/// Howard Hinnant's `civil_from_days` algorithm: converts a day count
/// since the Unix epoch into a proleptic Gregorian (year, month, day).
fn civil_from_unix_days(z: i64) -> (i32, u32, u32) {
    let z = z + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let year = if m <= 2 { y + 1 } else { y } as i32;
    (year, m, d)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, kind: EntryKind, size: u64, epoch_secs: u64) -> DirEntry {
        DirEntry {
            name: name.to_string(),
            kind,
            size,
            mtime: std::time::UNIX_EPOCH + std::time::Duration::from_secs(epoch_secs),
        }
    }

    #[test]
    fn directory_gets_d_flag() {
        let e = entry("sub", EntryKind::Directory, 0, 0);
        let line = format_entry(&e);
        assert!(line.starts_with('d'));
        assert!(line.ends_with("sub"));
    }

    #[test]
    fn file_gets_dash_flag_and_size_field() {
        let e = entry("a.bin", EntryKind::File, 5, 0);
        let line = format_entry(&e);
        assert!(line.starts_with('-'));
        assert!(line.contains("      5"));
    }

    #[test]
    fn epoch_zero_formats_as_jan_1_1970() {
        let e = entry("x", EntryKind::File, 0, 0);
        let line = format_entry(&e);
        assert!(line.contains("Jan 1  1970"));
    }
}
